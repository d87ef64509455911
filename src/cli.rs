use clap::{Parser, Subcommand};

use crate::{account::DEFAULT_ENDPOINT, preferences::PreferencesTab};

/// CLI arguments parser using `clap`
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Subcommand chosen to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Opens the interactive preferences dialog
    Open {
        /// Tab to open on
        #[arg(long, value_enum)]
        tab: Option<PreferencesTab>,
    },
    /// Displays current preferences
    Show,
    /// Manages signed-in accounts
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Signs in a new account
    Add {
        /// Login on the hosting service
        login: String,
        /// Display name
        name: String,
        /// Primary email
        email: String,
        /// API endpoint of the hosting service
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },
    /// Removes an account
    Remove {
        /// Login of account to remove
        login: String,
    },
    /// Displays all signed-in accounts
    List,
}
