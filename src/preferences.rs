use std::{fmt, fs, io::ErrorKind, path::PathBuf};

use clap::ValueEnum;

use crate::{
    account::Account,
    dispatcher::Dispatcher,
    error::AppError,
    git::{
        get_default_branch, get_merge_tool, merge_tool_command_key, set_default_branch,
        ConfigStore, MERGE_TOOL_KEY, USER_EMAIL_KEY, USER_NAME_KEY,
    },
    integrations::Integrations,
    settings::{Theme, UncommittedChangesStrategy},
    validation::{validate_branch_name, validate_email},
};

/// Tabs of the preferences dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PreferencesTab {
    #[default]
    Accounts,
    Integrations,
    Git,
    Appearance,
    Prompts,
    Advanced,
}

impl PreferencesTab {
    pub const ALL: [PreferencesTab; 6] = [
        PreferencesTab::Accounts,
        PreferencesTab::Integrations,
        PreferencesTab::Git,
        PreferencesTab::Appearance,
        PreferencesTab::Prompts,
        PreferencesTab::Advanced,
    ];
}

impl fmt::Display for PreferencesTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PreferencesTab::Accounts => "accounts",
            PreferencesTab::Integrations => "integrations",
            PreferencesTab::Git => "git",
            PreferencesTab::Appearance => "appearance",
            PreferencesTab::Prompts => "prompts",
            PreferencesTab::Advanced => "advanced",
        };
        f.write_str(label)
    }
}

/// An editable value together with the value it had when the dialog opened
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    initial: T,
    value: T,
}

impl<T: Clone + PartialEq> Field<T> {
    pub fn new(initial: T) -> Self {
        Self { value: initial.clone(), initial }
    }

    /// A field whose draft starts from a suggestion rather than the stored value
    pub fn suggested(initial: T, value: T) -> Self {
        Self { initial, value }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    pub fn is_changed(&self) -> bool {
        self.value != self.initial
    }
}

/// Buffered edits of every setting shown by the dialog
#[derive(Debug, Clone, PartialEq)]
pub struct PreferencesDraft {
    pub committer_name: Field<String>,
    pub committer_email: Field<String>,
    pub default_branch: Field<String>,
    pub merge_tool_name: Field<String>,
    pub merge_tool_command: Field<String>,
    pub use_custom_merge_tool: Field<bool>,
    pub selected_editor: Field<Option<String>>,
    pub selected_shell: Field<Option<String>>,
    pub theme: Field<Theme>,
    pub opt_out_of_usage_tracking: Field<bool>,
    pub confirm_repository_removal: Field<bool>,
    pub confirm_discard_changes: Field<bool>,
    pub confirm_force_push: Field<bool>,
    pub repository_indicators_enabled: Field<bool>,
    pub uncommitted_changes_strategy: Field<UncommittedChangesStrategy>,
}

impl PreferencesDraft {
    /// True when any field differs from its initial value
    pub fn has_changes(&self) -> bool {
        self.committer_name.is_changed()
            || self.committer_email.is_changed()
            || self.default_branch.is_changed()
            || self.merge_tool_changed()
            || self.selected_editor.is_changed()
            || self.selected_shell.is_changed()
            || self.theme.is_changed()
            || self.opt_out_of_usage_tracking.is_changed()
            || self.confirm_repository_removal.is_changed()
            || self.confirm_discard_changes.is_changed()
            || self.confirm_force_push.is_changed()
            || self.repository_indicators_enabled.is_changed()
            || self.uncommitted_changes_strategy.is_changed()
    }

    fn merge_tool_changed(&self) -> bool {
        self.merge_tool_name.is_changed()
            || self.merge_tool_command.is_changed()
            || self.use_custom_merge_tool.is_changed()
    }
}

/// Whether the dialog is still shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Open,
    Closed,
}

/// Result of pressing save
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Every changed value was written and the dialog closed
    Saved,
    /// The draft did not validate, nothing was written
    Invalid(String),
    /// Git config is locked; the dialog stays open on the git tab
    LockConflict(PathBuf),
    /// Some other write failed; the dialog closed and the error was posted
    Failed,
}

/// Controller of the preferences dialog
///
/// Holds the draft for one open session. All writes go through the injected
/// `ConfigStore` and `Dispatcher`.
pub struct PreferencesDialog<'a> {
    config: &'a mut dyn ConfigStore,
    dispatcher: &'a mut dyn Dispatcher,
    selected_tab: PreferencesTab,
    draft: PreferencesDraft,
    accounts: Vec<Account>,
    available_editors: Vec<String>,
    available_shells: Vec<String>,
    existing_lock_path: Option<PathBuf>,
    state: DialogState,
}

impl<'a> PreferencesDialog<'a> {
    /// Reads current values from the collaborators and opens the dialog on `initial_tab`
    pub fn open(
        config: &'a mut dyn ConfigStore,
        integrations: &dyn Integrations,
        dispatcher: &'a mut dyn Dispatcher,
        initial_tab: PreferencesTab,
    ) -> Result<Self, AppError> {
        let accounts = dispatcher.accounts();
        let settings = dispatcher.app_settings();

        let stored_name = config.get(USER_NAME_KEY)?.unwrap_or_default();
        let stored_email = config.get(USER_EMAIL_KEY)?.unwrap_or_default();
        let committer_name = match accounts.first() {
            Some(account) if stored_name.is_empty() => {
                Field::suggested(stored_name, account.committer_name().to_string())
            }
            _ => Field::new(stored_name),
        };
        let committer_email = match accounts.first() {
            Some(account) if stored_email.is_empty() => {
                Field::suggested(stored_email, account.email.clone())
            }
            _ => Field::new(stored_email),
        };

        let default_branch = get_default_branch(&*config)?;
        let merge_tool = get_merge_tool(&*config)?.unwrap_or_default();

        let available_editors = integrations.available_editors();
        let available_shells = integrations.available_shells();
        let selected_editor = preselect(settings.selected_editor, &available_editors);
        let selected_shell = preselect(settings.selected_shell, &available_shells);

        let draft = PreferencesDraft {
            committer_name,
            committer_email,
            default_branch: Field::new(default_branch),
            merge_tool_name: Field::new(merge_tool.name),
            use_custom_merge_tool: Field::new(merge_tool.command.is_some()),
            merge_tool_command: Field::new(merge_tool.command.unwrap_or_default()),
            selected_editor,
            selected_shell,
            theme: Field::new(settings.theme),
            opt_out_of_usage_tracking: Field::new(settings.opt_out_of_usage_tracking),
            confirm_repository_removal: Field::new(settings.confirm_repository_removal),
            confirm_discard_changes: Field::new(settings.confirm_discard_changes),
            confirm_force_push: Field::new(settings.confirm_force_push),
            repository_indicators_enabled: Field::new(settings.repository_indicators_enabled),
            uncommitted_changes_strategy: Field::new(settings.uncommitted_changes_strategy),
        };

        tracing::debug!(tab = %initial_tab, "opened preferences");
        Ok(Self {
            config,
            dispatcher,
            selected_tab: initial_tab,
            draft,
            accounts,
            available_editors,
            available_shells,
            existing_lock_path: None,
            state: DialogState::Open,
        })
    }

    pub fn selected_tab(&self) -> PreferencesTab {
        self.selected_tab
    }

    pub fn select_tab(&mut self, tab: PreferencesTab) {
        self.selected_tab = tab;
    }

    pub fn draft(&self) -> &PreferencesDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PreferencesDraft {
        &mut self.draft
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn available_editors(&self) -> &[String] {
        &self.available_editors
    }

    pub fn available_shells(&self) -> &[String] {
        &self.available_shells
    }

    /// Lock file found by the last save, shown with a recovery action
    pub fn existing_lock_path(&self) -> Option<&PathBuf> {
        self.existing_lock_path.as_ref()
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    /// Signs in immediately; accounts are not part of the draft
    pub fn sign_in(&mut self, account: Account) -> Result<(), AppError> {
        self.dispatcher.sign_in(account)?;
        self.accounts = self.dispatcher.accounts();
        Ok(())
    }

    /// Removes an account immediately
    pub fn remove_account(&mut self, login: &str) -> Result<(), AppError> {
        self.dispatcher.remove_account(login)?;
        self.accounts = self.dispatcher.accounts();
        Ok(())
    }

    /// Copies an account's name and email into the committer identity
    pub fn use_account_identity(&mut self, login: &str) -> Result<(), AppError> {
        let account = self
            .accounts
            .iter()
            .find(|account| account.login == login)
            .ok_or_else(|| AppError::AccountNotFound(login.to_string()))?;
        let name = account.committer_name().to_string();
        let email = account.email.clone();
        self.draft.committer_name.set(name);
        self.draft.committer_email.set(email);
        Ok(())
    }

    /// Blocking problems with the draft
    pub fn can_save(&self) -> Result<(), String> {
        let branch = self.draft.default_branch.get().trim();
        if !branch.is_empty() {
            if let Err(AppError::Validation(reason)) = validate_branch_name(branch) {
                return Err(reason);
            }
        }
        // an emptied name is a removal; only a brand-new custom tool needs one
        let tool = &self.draft.merge_tool_name;
        let command = self.draft.merge_tool_command.get().trim();
        if *self.draft.use_custom_merge_tool.get()
            && !command.is_empty()
            && tool.get().trim().is_empty()
            && tool.initial().trim().is_empty()
        {
            return Err("A custom merge tool needs a name".to_string());
        }
        Ok(())
    }

    /// Non-blocking remarks about the committer identity
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let email = self.draft.committer_email.get().trim();
        if email.is_empty() {
            return warnings;
        }
        if validate_email(email).is_err() {
            warnings.push(format!("'{email}' does not look like an email address"));
        }
        if !self.accounts.is_empty()
            && !self.accounts.iter().any(|account| account.email.eq_ignore_ascii_case(email))
        {
            warnings.push(format!(
                "'{email}' does not match any signed-in account; \
                 commits may not be attributed to you"
            ));
        }
        warnings
    }

    /// Writes every changed value and closes the dialog
    ///
    /// Git config writes come first. A lock conflict there keeps the dialog
    /// open on the git tab with the draft untouched; any other failure closes
    /// the dialog and posts the error.
    pub fn save(&mut self) -> SaveOutcome {
        if let Err(reason) = self.can_save() {
            return SaveOutcome::Invalid(reason);
        }

        if let Err(error) = self.save_git_config() {
            if let Some(lock_path) = error.lock_path() {
                tracing::warn!(lock = %lock_path.display(), "save interrupted by config lock");
                self.existing_lock_path = Some(lock_path.clone());
                self.selected_tab = PreferencesTab::Git;
                return SaveOutcome::LockConflict(lock_path.clone());
            }
            return self.fail(error);
        }

        if let Err(error) = self.save_app_settings() {
            return self.fail(error);
        }

        self.dismiss();
        SaveOutcome::Saved
    }

    /// Closes the dialog without writing anything
    pub fn cancel(&mut self) {
        self.dismiss();
    }

    /// Deletes the lock file reported by the last save
    pub fn delete_lock_file(&mut self) -> Result<(), AppError> {
        let Some(lock_path) = self.existing_lock_path.take() else {
            return Ok(());
        };
        match fs::remove_file(&lock_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                self.existing_lock_path = Some(lock_path);
                return Err(err.into());
            }
        }
        tracing::info!(lock = %lock_path.display(), "deleted config lock file");
        Ok(())
    }

    fn fail(&mut self, error: AppError) -> SaveOutcome {
        self.dismiss();
        self.dispatcher.post_error(error);
        SaveOutcome::Failed
    }

    fn dismiss(&mut self) {
        if self.state == DialogState::Closed {
            return;
        }
        self.state = DialogState::Closed;
        tracing::debug!("closed preferences");
    }

    fn save_git_config(&mut self) -> Result<(), AppError> {
        let draft = &self.draft;

        if draft.committer_name.is_changed() {
            self.config.set(USER_NAME_KEY, draft.committer_name.get())?;
        }
        if draft.committer_email.is_changed() {
            self.config.set(USER_EMAIL_KEY, draft.committer_email.get())?;
        }

        let branch = draft.default_branch.get().trim();
        if !branch.is_empty() && branch != draft.default_branch.initial().trim() {
            set_default_branch(self.config, branch)?;
        }

        if draft.merge_tool_changed() {
            self.save_merge_tool()?;
        }
        Ok(())
    }

    fn save_merge_tool(&mut self) -> Result<(), AppError> {
        let draft = &self.draft;
        let name = draft.merge_tool_name.get().trim();
        let initial_name = draft.merge_tool_name.initial().trim();

        if name != initial_name {
            if name.is_empty() {
                self.config.remove(MERGE_TOOL_KEY)?;
            } else {
                self.config.set(MERGE_TOOL_KEY, name)?;
            }
        }

        let custom = custom_command(
            name,
            *draft.use_custom_merge_tool.get(),
            draft.merge_tool_command.get(),
        );
        let initial_custom = custom_command(
            initial_name,
            *draft.use_custom_merge_tool.initial(),
            draft.merge_tool_command.initial(),
        );
        if custom == initial_custom {
            return Ok(());
        }

        if let Some((old_name, _)) = initial_custom {
            if custom.is_none_or(|(new_name, _)| new_name != old_name) {
                self.config.remove(&merge_tool_command_key(old_name))?;
            }
        }
        if let Some((new_name, command)) = custom {
            self.config.set(&merge_tool_command_key(new_name), command)?;
        }
        Ok(())
    }

    fn save_app_settings(&mut self) -> Result<(), AppError> {
        let draft = &self.draft;
        let dispatcher = &mut *self.dispatcher;

        if draft.opt_out_of_usage_tracking.is_changed() {
            dispatcher.set_opt_out_of_usage_tracking(*draft.opt_out_of_usage_tracking.get())?;
        }
        if draft.confirm_repository_removal.is_changed() {
            dispatcher.set_confirm_repository_removal(*draft.confirm_repository_removal.get())?;
        }
        if draft.confirm_discard_changes.is_changed() {
            dispatcher.set_confirm_discard_changes(*draft.confirm_discard_changes.get())?;
        }
        if draft.confirm_force_push.is_changed() {
            dispatcher.set_confirm_force_push(*draft.confirm_force_push.get())?;
        }
        if draft.repository_indicators_enabled.is_changed() {
            dispatcher
                .set_repository_indicators_enabled(*draft.repository_indicators_enabled.get())?;
        }
        if draft.selected_editor.is_changed() {
            dispatcher.set_selected_editor(draft.selected_editor.get().clone())?;
        }
        if draft.selected_shell.is_changed() {
            dispatcher.set_selected_shell(draft.selected_shell.get().clone())?;
        }
        if draft.uncommitted_changes_strategy.is_changed() {
            dispatcher.set_uncommitted_changes_strategy(*draft.uncommitted_changes_strategy.get())?;
        }
        if draft.theme.is_changed() {
            dispatcher.set_theme(*draft.theme.get())?;
        }
        Ok(())
    }
}

/// Stored choice, or the first available program when nothing is stored yet
fn preselect(stored: Option<String>, available: &[String]) -> Field<Option<String>> {
    match stored {
        Some(choice) => Field::new(Some(choice)),
        None => Field::suggested(None, available.first().cloned()),
    }
}

/// The `(tool, command)` pair to store under `mergetool.<tool>.cmd`, if any
fn custom_command<'d>(
    name: &'d str,
    enabled: bool,
    command: &'d str,
) -> Option<(&'d str, &'d str)> {
    let command = command.trim();
    (enabled && !name.is_empty() && !command.is_empty()).then_some((name, command))
}
