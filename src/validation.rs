use colored::Colorize;
use inquire::Text;
use validator::ValidateEmail;

use crate::{account::Account, error::AppError, menu::BACK_OPTION};

/// Maximum length for committer name
const MAX_NAME_LENGTH: usize = 100;
/// Maximum length for email addresses
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum length for account login
const MAX_LOGIN_LENGTH: usize = 39;
/// Characters git refuses anywhere in a ref name
const FORBIDDEN_REF_CHARS: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

/// Prompts user for input, prefilled with `initial`, until valid input is provided
pub fn prompt_until_valid<F>(
    prompt_message: &str,
    initial: &str,
    input_validation: F,
) -> Result<String, AppError>
where
    F: Fn(&str) -> Result<(), AppError>,
{
    loop {
        let input: String = Text::new(prompt_message).with_initial_value(initial).prompt()?;
        let input = input.trim().to_string();
        match input_validation(&input) {
            Ok(_) => break Ok(input),
            Err(AppError::Validation(msg)) => println!("{}", msg.red()),
            Err(e) => return Err(e),
        }
    }
}

/// Validates committer name input
pub fn validate_committer_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        Err(AppError::Validation("Name cannot be empty".to_string()))
    } else if name.chars().count() > MAX_NAME_LENGTH {
        Err(AppError::Validation(format!("Name too long (max {} characters)", MAX_NAME_LENGTH)))
    } else if name.contains(['<', '>', '\n']) {
        Err(AppError::Validation("Name cannot contain '<', '>' or newlines".to_string()))
    } else {
        Ok(())
    }
}

/// Validates an email address format
pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        Err(AppError::Validation("Email cannot be empty".to_string()))
    } else if email.len() > MAX_EMAIL_LENGTH {
        Err(AppError::Validation(format!("Email too long (max {} characters)", MAX_EMAIL_LENGTH)))
    } else if !email.validate_email() {
        Err(AppError::Validation("Invalid email format".to_string()))
    } else {
        Ok(())
    }
}

/// Validates a branch name against git's ref naming rules
pub fn validate_branch_name(name: &str) -> Result<(), AppError> {
    let invalid = |reason: &str| {
        Err(AppError::Validation(format!("Invalid branch name '{name}': {reason}")))
    };

    if name.is_empty() {
        return invalid("cannot be empty");
    }
    if name == "@" {
        return invalid("cannot be '@'");
    }
    if name.starts_with('-') {
        return invalid("cannot start with '-'");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return invalid("cannot start or end with '/'");
    }
    if name.ends_with('.') || name.ends_with(".lock") {
        return invalid("cannot end with '.' or '.lock'");
    }
    if name.contains("..") || name.contains("//") || name.contains("@{") {
        return invalid("cannot contain '..', '//' or '@{'");
    }
    if name.chars().any(|c| c.is_control() || FORBIDDEN_REF_CHARS.contains(&c)) {
        return invalid("contains a forbidden character");
    }
    if name.split('/').any(|component| component.starts_with('.')) {
        return invalid("path components cannot start with '.'");
    }
    Ok(())
}

/// Validates account login input
pub fn validate_account_login(login: &str, existing_accounts: &[Account]) -> Result<(), AppError> {
    if login.is_empty() {
        Err(AppError::Validation("Login cannot be empty".to_string()))
    } else if login.len() > MAX_LOGIN_LENGTH {
        Err(AppError::Validation(format!("Login too long (max {} characters)", MAX_LOGIN_LENGTH)))
    } else if !login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        || login.starts_with('-')
    {
        Err(AppError::Validation(
            "Login may only contain letters, digits and inner '-'".to_string(),
        ))
    } else if login == BACK_OPTION {
        Err(AppError::Validation("Login cannot be 'back'".to_string()))
    } else if existing_accounts.iter().any(|account| account.login == login) {
        Err(AppError::Validation("Account already signed in".to_string()))
    } else {
        Ok(())
    }
}

/// Validates account email input
pub fn validate_account_email(email: &str) -> Result<(), AppError> {
    validate_email(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::DEFAULT_ENDPOINT;

    #[test]
    fn branch_names() {
        for ok in ["main", "trunk", "feature/login", "release-1.0", "héllo"] {
            assert!(validate_branch_name(ok).is_ok(), "{ok} should be valid");
        }
        for bad in [
            "", "@", "-main", "/main", "main/", "main.", "main.lock", "a..b", "a//b", "a@{1}",
            "has space", "a~b", "a^b", "a:b", "a?b", "a*b", "a[b", "a\\b", "a/.hidden", ".hidden",
            "tab\there",
        ] {
            assert!(validate_branch_name(bad).is_err(), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn emails() {
        assert!(validate_email("mona@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("mona").is_err());
    }

    #[test]
    fn committer_names() {
        assert!(validate_committer_name("Mona Lisa").is_ok());
        assert!(validate_committer_name("").is_err());
        assert!(validate_committer_name("Mona <mona@example.com>").is_err());
        assert!(validate_committer_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn account_logins() {
        let existing = vec![Account {
            login: "octocat".to_string(),
            name: String::new(),
            email: "octocat@example.com".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }];
        assert!(validate_account_login("hubot", &existing).is_ok());
        assert!(validate_account_login("octocat", &existing).is_err());
        assert!(validate_account_login("back", &existing).is_err());
        assert!(validate_account_login("-dash", &existing).is_err());
        assert!(validate_account_login("under_score", &existing).is_err());
        assert!(validate_account_login(&"a".repeat(MAX_LOGIN_LENGTH + 1), &existing).is_err());
    }
}
