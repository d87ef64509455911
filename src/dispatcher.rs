use std::path::PathBuf;

use crate::{
    account::Account,
    error::AppError,
    settings::{AppSettings, Theme, UncommittedChangesStrategy},
    storage::{load_accounts, load_settings, save_accounts, save_settings},
    validation::{validate_account_email, validate_account_login},
};

/// Command bus performing app-wide side effects on behalf of the dialog
pub trait Dispatcher {
    /// Current app-wide settings
    fn app_settings(&self) -> AppSettings;
    /// Signed-in accounts
    fn accounts(&self) -> Vec<Account>;

    fn set_opt_out_of_usage_tracking(&mut self, opt_out: bool) -> Result<(), AppError>;
    fn set_confirm_repository_removal(&mut self, confirm: bool) -> Result<(), AppError>;
    fn set_confirm_discard_changes(&mut self, confirm: bool) -> Result<(), AppError>;
    fn set_confirm_force_push(&mut self, confirm: bool) -> Result<(), AppError>;
    fn set_repository_indicators_enabled(&mut self, enabled: bool) -> Result<(), AppError>;
    fn set_selected_editor(&mut self, editor: Option<String>) -> Result<(), AppError>;
    fn set_selected_shell(&mut self, shell: Option<String>) -> Result<(), AppError>;
    fn set_uncommitted_changes_strategy(
        &mut self,
        strategy: UncommittedChangesStrategy,
    ) -> Result<(), AppError>;
    fn set_theme(&mut self, theme: Theme) -> Result<(), AppError>;

    /// Adds an account
    fn sign_in(&mut self, account: Account) -> Result<(), AppError>;
    /// Removes the account with `login`
    fn remove_account(&mut self, login: &str) -> Result<(), AppError>;

    /// Reports an error the dialog could not handle itself
    fn post_error(&mut self, error: AppError);
}

/// `Dispatcher` persisting to the JSON files in the data directory
#[derive(Debug)]
pub struct AppDispatcher {
    data_dir: PathBuf,
    settings: AppSettings,
    accounts: Vec<Account>,
    errors: Vec<AppError>,
}

impl AppDispatcher {
    /// Loads settings and accounts from `data_dir`
    pub fn load(data_dir: PathBuf) -> Result<Self, AppError> {
        let settings = load_settings(&data_dir)?;
        let accounts = load_accounts(&data_dir)?;
        Ok(Self { data_dir, settings, accounts, errors: Vec::new() })
    }

    /// Drains the errors posted so far
    pub fn take_errors(&mut self) -> Vec<AppError> {
        std::mem::take(&mut self.errors)
    }

    fn update<F>(&mut self, setting: &str, apply: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut AppSettings),
    {
        let mut settings = self.settings.clone();
        apply(&mut settings);
        tracing::debug!(setting, "updating app setting");
        save_settings(&self.data_dir, &settings)?;
        self.settings = settings;
        Ok(())
    }
}

impl Dispatcher for AppDispatcher {
    fn app_settings(&self) -> AppSettings {
        self.settings.clone()
    }

    fn accounts(&self) -> Vec<Account> {
        self.accounts.clone()
    }

    fn set_opt_out_of_usage_tracking(&mut self, opt_out: bool) -> Result<(), AppError> {
        self.update("opt_out_of_usage_tracking", |s| s.opt_out_of_usage_tracking = opt_out)
    }

    fn set_confirm_repository_removal(&mut self, confirm: bool) -> Result<(), AppError> {
        self.update("confirm_repository_removal", |s| s.confirm_repository_removal = confirm)
    }

    fn set_confirm_discard_changes(&mut self, confirm: bool) -> Result<(), AppError> {
        self.update("confirm_discard_changes", |s| s.confirm_discard_changes = confirm)
    }

    fn set_confirm_force_push(&mut self, confirm: bool) -> Result<(), AppError> {
        self.update("confirm_force_push", |s| s.confirm_force_push = confirm)
    }

    fn set_repository_indicators_enabled(&mut self, enabled: bool) -> Result<(), AppError> {
        self.update("repository_indicators_enabled", |s| s.repository_indicators_enabled = enabled)
    }

    fn set_selected_editor(&mut self, editor: Option<String>) -> Result<(), AppError> {
        self.update("selected_editor", |s| s.selected_editor = editor)
    }

    fn set_selected_shell(&mut self, shell: Option<String>) -> Result<(), AppError> {
        self.update("selected_shell", |s| s.selected_shell = shell)
    }

    fn set_uncommitted_changes_strategy(
        &mut self,
        strategy: UncommittedChangesStrategy,
    ) -> Result<(), AppError> {
        self.update("uncommitted_changes_strategy", |s| s.uncommitted_changes_strategy = strategy)
    }

    fn set_theme(&mut self, theme: Theme) -> Result<(), AppError> {
        self.update("theme", |s| s.theme = theme)
    }

    fn sign_in(&mut self, account: Account) -> Result<(), AppError> {
        validate_account_login(&account.login, &self.accounts)?;
        validate_account_email(&account.email)?;

        tracing::info!(login = %account.login, endpoint = %account.endpoint, "signing in");
        let mut accounts = self.accounts.clone();
        accounts.push(account);
        save_accounts(&self.data_dir, &accounts)?;
        self.accounts = accounts;
        Ok(())
    }

    fn remove_account(&mut self, login: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.clone();
        accounts.retain(|account| account.login != login);
        if accounts.len() == self.accounts.len() {
            return Err(AppError::AccountNotFound(login.to_string()));
        }

        save_accounts(&self.data_dir, &accounts)?;
        self.accounts = accounts;
        tracing::info!(login, "removed account");
        Ok(())
    }

    fn post_error(&mut self, error: AppError) {
        tracing::error!(%error, "preferences error");
        self.errors.push(error);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::account::DEFAULT_ENDPOINT;

    /// A recorded dispatcher call
    #[derive(Debug, Clone, PartialEq)]
    pub enum Dispatched {
        OptOut(bool),
        ConfirmRepositoryRemoval(bool),
        ConfirmDiscardChanges(bool),
        ConfirmForcePush(bool),
        RepositoryIndicators(bool),
        Editor(Option<String>),
        Shell(Option<String>),
        Strategy(UncommittedChangesStrategy),
        Theme(Theme),
        SignIn(String),
        RemoveAccount(String),
    }

    /// In-memory dispatcher recording every call
    #[derive(Debug, Default)]
    pub struct RecordingDispatcher {
        pub settings: AppSettings,
        pub accounts: Vec<Account>,
        pub calls: Vec<Dispatched>,
        pub errors: Vec<String>,
        /// Makes `set_theme` fail
        pub fail_theme: bool,
    }

    impl RecordingDispatcher {
        fn record(&mut self, call: Dispatched) -> Result<(), AppError> {
            self.calls.push(call);
            Ok(())
        }
    }

    impl Dispatcher for RecordingDispatcher {
        fn app_settings(&self) -> AppSettings {
            self.settings.clone()
        }

        fn accounts(&self) -> Vec<Account> {
            self.accounts.clone()
        }

        fn set_opt_out_of_usage_tracking(&mut self, opt_out: bool) -> Result<(), AppError> {
            self.record(Dispatched::OptOut(opt_out))
        }

        fn set_confirm_repository_removal(&mut self, confirm: bool) -> Result<(), AppError> {
            self.record(Dispatched::ConfirmRepositoryRemoval(confirm))
        }

        fn set_confirm_discard_changes(&mut self, confirm: bool) -> Result<(), AppError> {
            self.record(Dispatched::ConfirmDiscardChanges(confirm))
        }

        fn set_confirm_force_push(&mut self, confirm: bool) -> Result<(), AppError> {
            self.record(Dispatched::ConfirmForcePush(confirm))
        }

        fn set_repository_indicators_enabled(&mut self, enabled: bool) -> Result<(), AppError> {
            self.record(Dispatched::RepositoryIndicators(enabled))
        }

        fn set_selected_editor(&mut self, editor: Option<String>) -> Result<(), AppError> {
            self.record(Dispatched::Editor(editor))
        }

        fn set_selected_shell(&mut self, shell: Option<String>) -> Result<(), AppError> {
            self.record(Dispatched::Shell(shell))
        }

        fn set_uncommitted_changes_strategy(
            &mut self,
            strategy: UncommittedChangesStrategy,
        ) -> Result<(), AppError> {
            self.record(Dispatched::Strategy(strategy))
        }

        fn set_theme(&mut self, theme: Theme) -> Result<(), AppError> {
            if self.fail_theme {
                return Err(AppError::Validation("theme store unavailable".to_string()));
            }
            self.record(Dispatched::Theme(theme))
        }

        fn sign_in(&mut self, account: Account) -> Result<(), AppError> {
            self.calls.push(Dispatched::SignIn(account.login.clone()));
            self.accounts.push(account);
            Ok(())
        }

        fn remove_account(&mut self, login: &str) -> Result<(), AppError> {
            self.accounts.retain(|account| account.login != login);
            self.record(Dispatched::RemoveAccount(login.to_string()))
        }

        fn post_error(&mut self, error: AppError) {
            self.errors.push(error.to_string());
        }
    }

    fn account(login: &str, email: &str) -> Account {
        Account {
            login: login.to_string(),
            name: String::new(),
            email: email.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    #[test]
    fn setters_persist_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = AppDispatcher::load(dir.path().to_path_buf()).unwrap();
        dispatcher.set_theme(Theme::Light).unwrap();
        dispatcher.set_confirm_force_push(false).unwrap();
        dispatcher.set_selected_shell(Some("Zsh".to_string())).unwrap();

        let reloaded = AppDispatcher::load(dir.path().to_path_buf()).unwrap();
        let settings = reloaded.app_settings();
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.confirm_force_push);
        assert_eq!(settings.selected_shell.as_deref(), Some("Zsh"));
    }

    #[test]
    fn sign_in_and_remove_account() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = AppDispatcher::load(dir.path().to_path_buf()).unwrap();
        dispatcher.sign_in(account("octocat", "octocat@example.com")).unwrap();

        let duplicate = dispatcher.sign_in(account("octocat", "other@example.com"));
        assert!(matches!(duplicate, Err(AppError::Validation(_))));

        let reloaded = AppDispatcher::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.accounts().len(), 1);

        dispatcher.remove_account("octocat").unwrap();
        assert!(dispatcher.accounts().is_empty());
        assert!(matches!(
            dispatcher.remove_account("octocat"),
            Err(AppError::AccountNotFound(login)) if login == "octocat"
        ));
    }

    #[test]
    fn sign_in_rejects_bad_email() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = AppDispatcher::load(dir.path().to_path_buf()).unwrap();
        assert!(dispatcher.sign_in(account("octocat", "not-an-email")).is_err());
        assert!(dispatcher.accounts().is_empty());
    }

    #[test]
    fn failed_writes_leave_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        // a plain file where the data directory should be makes every save fail
        let data_dir = dir.path().join("not-a-dir");
        std::fs::write(&data_dir, "").unwrap();
        let mut dispatcher = AppDispatcher {
            data_dir,
            settings: AppSettings::default(),
            accounts: vec![account("octocat", "octocat@example.com")],
            errors: Vec::new(),
        };

        assert!(dispatcher.set_theme(Theme::Dark).is_err());
        assert_eq!(dispatcher.app_settings(), AppSettings::default());

        assert!(dispatcher.sign_in(account("hubot", "hubot@example.com")).is_err());
        assert_eq!(dispatcher.accounts().len(), 1);

        assert!(dispatcher.remove_account("octocat").is_err());
        assert_eq!(dispatcher.accounts().len(), 1);
    }

    #[test]
    fn posted_errors_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let mut dispatcher = AppDispatcher::load(dir.path().to_path_buf()).unwrap();
        dispatcher.post_error(AppError::GitCommand("boom".to_string()));
        assert_eq!(dispatcher.take_errors().len(), 1);
        assert!(dispatcher.take_errors().is_empty());
    }
}
