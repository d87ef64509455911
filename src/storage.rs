use std::{env, fs, path::{Path, PathBuf}};

use serde::{de::DeserializeOwned, Serialize};

use crate::{account::Account, error::AppError, settings::AppSettings};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "GITPREF_HOME";
/// Data directory name in user's home directory
const DATA_DIR_NAME: &str = ".gitpref";
/// App-wide settings file
const SETTINGS_FILE: &str = "settings.json";
/// Signed-in accounts file
const ACCOUNTS_FILE: &str = "accounts.json";

/// Gets the directory holding settings and accounts
pub fn get_data_dir() -> Result<PathBuf, AppError> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home_dir: PathBuf = dirs::home_dir().ok_or_else(|| {
        AppError::Validation("failed to find the home directory".to_string())
    })?;
    Ok(home_dir.join(DATA_DIR_NAME))
}

/// Reads a JSON file, `None` when it is missing or blank
fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let file_contents: String = fs::read_to_string(path)?;
    if file_contents.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(&file_contents)?))
}

/// Writes a value as pretty JSON, creating the directory if needed
fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json: String = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), "saved");
    Ok(())
}

/// Loads app settings, falling back to defaults
pub fn load_settings(data_dir: &Path) -> Result<AppSettings, AppError> {
    Ok(load_json(&data_dir.join(SETTINGS_FILE))?.unwrap_or_default())
}

/// Saves app settings
pub fn save_settings(data_dir: &Path, settings: &AppSettings) -> Result<(), AppError> {
    save_json(&data_dir.join(SETTINGS_FILE), settings)
}

/// Loads accounts from the JSON file
pub fn load_accounts(data_dir: &Path) -> Result<Vec<Account>, AppError> {
    Ok(load_json(&data_dir.join(ACCOUNTS_FILE))?.unwrap_or_default())
}

/// Saves accounts to the JSON file
///
/// # Arguments
/// * `accounts` - Accounts to save
pub fn save_accounts(data_dir: &Path, accounts: &[Account]) -> Result<(), AppError> {
    save_json(&data_dir.join(ACCOUNTS_FILE), accounts)
}

/// Checks if any accounts exist in storage
pub fn check_if_accounts_exist(accounts: &[Account]) -> Result<(), AppError> {
    if accounts.is_empty() {
        return Err(AppError::Validation("no accounts found".to_string()));
    }
    Ok(())
}
