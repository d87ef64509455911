use serde::{Deserialize, Serialize};

/// Endpoint used when an account is added without one
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com";

/// Represents a signed-in account stored in the accounts file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique login on the hosting service
    pub login: String,
    /// Display name, may be empty
    #[serde(default)]
    pub name: String,
    /// Primary email address
    pub email: String,
    /// API endpoint the account belongs to
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Account {
    /// Name suggested for commits: the display name, or the login when it is empty
    pub fn committer_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.login
        } else {
            &self.name
        }
    }
}
