use std::fmt;

use serde::{Deserialize, Serialize};

/// Appearance theme of the client
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system
    #[default]
    System,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::System];
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };
        f.write_str(label)
    }
}

/// What to do with uncommitted changes when switching branches
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum UncommittedChangesStrategy {
    #[default]
    AskForConfirmation,
    StashOnCurrentBranch,
    MoveToNewBranch,
}

impl UncommittedChangesStrategy {
    pub const ALL: [UncommittedChangesStrategy; 3] = [
        UncommittedChangesStrategy::AskForConfirmation,
        UncommittedChangesStrategy::StashOnCurrentBranch,
        UncommittedChangesStrategy::MoveToNewBranch,
    ];
}

impl fmt::Display for UncommittedChangesStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UncommittedChangesStrategy::AskForConfirmation => {
                "ask me where I want the changes to go"
            }
            UncommittedChangesStrategy::StashOnCurrentBranch => {
                "always stash and leave changes on the current branch"
            }
            UncommittedChangesStrategy::MoveToNewBranch => "always bring changes to the new branch",
        };
        f.write_str(label)
    }
}

/// App-wide settings stored in the settings file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Preferred external editor, by name
    pub selected_editor: Option<String>,
    /// Preferred shell, by name
    pub selected_shell: Option<String>,
    pub theme: Theme,
    /// Opt out of sending usage statistics
    pub opt_out_of_usage_tracking: bool,
    pub confirm_repository_removal: bool,
    pub confirm_discard_changes: bool,
    pub confirm_force_push: bool,
    /// Periodically refresh the ahead/behind indicators of every repository
    pub repository_indicators_enabled: bool,
    pub uncommitted_changes_strategy: UncommittedChangesStrategy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            selected_editor: None,
            selected_shell: None,
            theme: Theme::default(),
            opt_out_of_usage_tracking: false,
            confirm_repository_removal: true,
            confirm_discard_changes: true,
            confirm_force_push: true,
            repository_indicators_enabled: true,
            uncommitted_changes_strategy: UncommittedChangesStrategy::default(),
        }
    }
}
