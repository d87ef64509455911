use colored::Colorize;
use inquire::{Confirm, MultiSelect, Select, Text};

use crate::{
    account::{Account, DEFAULT_ENDPOINT},
    error::AppError,
    preferences::{DialogState, PreferencesDialog, PreferencesTab, SaveOutcome},
    settings::{Theme, UncommittedChangesStrategy},
    validation::{
        prompt_until_valid, validate_account_email, validate_account_login,
        validate_branch_name, validate_committer_name, validate_email,
    },
};

/// Menu entry leading back to the previous menu
pub const BACK_OPTION: &str = "back";
/// Menu entry clearing an optional choice
const NONE_OPTION: &str = "none";

const SWITCH_TAB: &str = "switch tab";
const SAVE: &str = "save";
const CANCEL: &str = "cancel";

/// Runs the interactive preferences dialog until it is saved or cancelled
pub fn run_menu(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    loop {
        render_tab(dialog);

        let mut actions: Vec<&'static str> = tab_actions(dialog);
        actions.extend([SWITCH_TAB, SAVE, CANCEL]);

        let action_selected: &'static str =
            Select::new(&format!("{}", "select action".blue()), actions).prompt()?;

        match action_selected {
            SWITCH_TAB => menu_switch_tab(dialog)?,
            SAVE => {
                if save(dialog)? {
                    break Ok(());
                }
            }
            CANCEL => {
                if dialog.draft().has_changes()
                    && !Confirm::new("discard unsaved changes?").with_default(false).prompt()?
                {
                    continue;
                }
                dialog.cancel();
                println!("{}", "discarded changes".yellow());
                break Ok(());
            }
            action => handle_tab_action(dialog, action)?,
        }
    }
}

/// Saves the draft, returning whether the dialog closed
fn save(dialog: &mut PreferencesDialog<'_>) -> Result<bool, AppError> {
    for warning in dialog.warnings() {
        println!("{}", warning.yellow());
    }

    match dialog.save() {
        SaveOutcome::Saved => println!("{}", "preferences saved".green()),
        SaveOutcome::Invalid(reason) => println!("{}", reason.red()),
        SaveOutcome::LockConflict(lock_path) => println!(
            "{} {}",
            "git config is locked by another process, lock file:".red(),
            lock_path.display()
        ),
        SaveOutcome::Failed => println!("{}", "failed to save preferences".red()),
    }
    Ok(dialog.state() == DialogState::Closed)
}

fn menu_switch_tab(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    let current = PreferencesTab::ALL
        .iter()
        .position(|tab| *tab == dialog.selected_tab())
        .unwrap_or(0);
    let tabs = PreferencesTab::ALL.to_vec();
    let tab: PreferencesTab = Select::new(&format!("{}", "select tab:".blue()), tabs)
        .with_starting_cursor(current)
        .prompt()?;
    dialog.select_tab(tab);
    Ok(())
}

/// Prints one labelled value of the current tab
fn show(label: &str, value: impl std::fmt::Display) {
    println!("{} {}", label.blue(), value);
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Prints the tab strip and the values shown on the selected tab
fn render_tab(dialog: &PreferencesDialog<'_>) {
    let strip: Vec<String> = PreferencesTab::ALL
        .iter()
        .map(|tab| {
            if *tab == dialog.selected_tab() {
                format!("[{tab}]").bold().to_string()
            } else {
                tab.to_string()
            }
        })
        .collect();
    println!("\n{}", strip.join("  "));

    let draft = dialog.draft();
    match dialog.selected_tab() {
        PreferencesTab::Accounts => {
            if dialog.accounts().is_empty() {
                println!("{}", "no accounts signed in".yellow());
            }
            for account in dialog.accounts() {
                println!("{} <{}> ({})", account.login.cyan(), account.email, account.endpoint);
            }
        }
        PreferencesTab::Integrations => {
            show("editor:", draft.selected_editor.get().as_deref().unwrap_or(NONE_OPTION));
            show("shell:", draft.selected_shell.get().as_deref().unwrap_or(NONE_OPTION));
        }
        PreferencesTab::Git => {
            show("name:", draft.committer_name.get());
            show("email:", draft.committer_email.get());
            show("default branch:", draft.default_branch.get());
            let tool = draft.merge_tool_name.get();
            show("merge tool:", if tool.is_empty() { NONE_OPTION } else { tool.as_str() });
            if *draft.use_custom_merge_tool.get() {
                show("merge tool command:", draft.merge_tool_command.get());
            }
            if let Some(lock_path) = dialog.existing_lock_path() {
                println!(
                    "{} {}",
                    "git config is locked; delete the lock file if no other git process runs:"
                        .red(),
                    lock_path.display()
                );
            }
        }
        PreferencesTab::Appearance => {
            show("theme:", draft.theme.get());
        }
        PreferencesTab::Prompts => {
            show("confirm repository removal:", on_off(*draft.confirm_repository_removal.get()));
            show("confirm discarding changes:", on_off(*draft.confirm_discard_changes.get()));
            show("confirm force pushing:", on_off(*draft.confirm_force_push.get()));
        }
        PreferencesTab::Advanced => {
            show("usage statistics opt-out:", on_off(*draft.opt_out_of_usage_tracking.get()));
            show(
                "background repository indicators:",
                on_off(*draft.repository_indicators_enabled.get()),
            );
            show("uncommitted changes:", draft.uncommitted_changes_strategy.get());
        }
    }
}

fn tab_actions(dialog: &PreferencesDialog<'_>) -> Vec<&'static str> {
    match dialog.selected_tab() {
        PreferencesTab::Accounts => vec!["sign in", "remove account"],
        PreferencesTab::Integrations => vec!["choose editor", "choose shell"],
        PreferencesTab::Git => {
            let mut actions = vec![
                "edit name",
                "edit email",
                "use account identity",
                "edit default branch",
                "edit merge tool",
            ];
            if dialog.existing_lock_path().is_some() {
                actions.insert(0, "delete lock file");
            }
            actions
        }
        PreferencesTab::Appearance => vec!["choose theme"],
        PreferencesTab::Prompts => vec!["choose prompts"],
        PreferencesTab::Advanced => vec![
            "toggle usage statistics",
            "toggle repository indicators",
            "choose uncommitted changes strategy",
        ],
    }
}

fn handle_tab_action(dialog: &mut PreferencesDialog<'_>, action: &str) -> Result<(), AppError> {
    match action {
        "sign in" => menu_sign_in(dialog)?,
        "remove account" => menu_remove_account(dialog)?,
        "choose editor" => {
            let choice = choose_program("select editor:", dialog.available_editors())?;
            if let Some(editor) = choice {
                dialog.draft_mut().selected_editor.set(editor);
            }
        }
        "choose shell" => {
            let choice = choose_program("select shell:", dialog.available_shells())?;
            if let Some(shell) = choice {
                dialog.draft_mut().selected_shell.set(shell);
            }
        }
        "delete lock file" => match dialog.delete_lock_file() {
            Ok(()) => println!("{}", "lock file deleted, save again to retry".green()),
            Err(e) => println!("{} {}", "failed to delete lock file:".red(), e),
        },
        "edit name" => {
            let current = dialog.draft().committer_name.get().clone();
            let prompt = format!("{}", "enter name:".blue());
            let name = prompt_until_valid(&prompt, &current, validate_committer_name)?;
            dialog.draft_mut().committer_name.set(name);
        }
        "edit email" => {
            let current = dialog.draft().committer_email.get().clone();
            let prompt = format!("{}", "enter email:".blue());
            let email = prompt_until_valid(&prompt, &current, validate_email)?;
            dialog.draft_mut().committer_email.set(email);
        }
        "use account identity" => menu_use_account_identity(dialog)?,
        "edit default branch" => {
            let current = dialog.draft().default_branch.get().clone();
            let branch = prompt_until_valid(
                &format!("{}", "enter default branch for new repositories:".blue()),
                &current,
                validate_branch_name,
            )?;
            dialog.draft_mut().default_branch.set(branch);
        }
        "edit merge tool" => menu_merge_tool(dialog)?,
        "choose theme" => {
            let current = dialog.draft().theme.get();
            let start = Theme::ALL.iter().position(|theme| theme == current).unwrap_or(0);
            let theme = Select::new(&format!("{}", "select theme:".blue()), Theme::ALL.to_vec())
                .with_starting_cursor(start)
                .prompt()?;
            dialog.draft_mut().theme.set(theme);
        }
        "choose prompts" => menu_prompts(dialog)?,
        "toggle usage statistics" => {
            let draft = dialog.draft_mut();
            let opt_out = !*draft.opt_out_of_usage_tracking.get();
            draft.opt_out_of_usage_tracking.set(opt_out);
        }
        "toggle repository indicators" => {
            let draft = dialog.draft_mut();
            let enabled = !*draft.repository_indicators_enabled.get();
            draft.repository_indicators_enabled.set(enabled);
        }
        "choose uncommitted changes strategy" => {
            let current = dialog.draft().uncommitted_changes_strategy.get();
            let start = UncommittedChangesStrategy::ALL
                .iter()
                .position(|s| s == current)
                .unwrap_or(0);
            let strategy = Select::new(
                &format!("{}", "when switching branches with uncommitted changes:".blue()),
                UncommittedChangesStrategy::ALL.to_vec(),
            )
            .with_starting_cursor(start)
            .prompt()?;
            dialog.draft_mut().uncommitted_changes_strategy.set(strategy);
        }
        _ => unreachable!("unexpected input"),
    }
    Ok(())
}

/// Picks one of `available` or none; `None` when the user went back
fn choose_program(prompt: &str, available: &[String]) -> Result<Option<Option<String>>, AppError> {
    if available.is_empty() {
        println!("{}", "nothing found on this machine".yellow());
        return Ok(None);
    }

    let mut options: Vec<String> = available.to_vec();
    options.push(NONE_OPTION.to_string());
    options.push(BACK_OPTION.to_string());
    let selected: String = Select::new(&format!("{}", prompt.blue()), options).prompt()?;

    Ok(match selected.as_str() {
        BACK_OPTION => None,
        NONE_OPTION => Some(None),
        _ => Some(Some(selected)),
    })
}

fn menu_sign_in(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    let accounts: Vec<Account> = dialog.accounts().to_vec();

    let login: String = prompt_until_valid(
        &format!("{}", "enter login:".blue()),
        "",
        |input| validate_account_login(input, &accounts),
    )?;
    let name: String = Text::new(&format!("{}", "enter display name (optional):".blue())).prompt()?;
    let email: String =
        prompt_until_valid(&format!("{}", "enter email:".blue()), "", validate_account_email)?;
    let endpoint: String = Text::new(&format!("{}", "enter endpoint:".blue()))
        .with_default(DEFAULT_ENDPOINT)
        .prompt()?;

    dialog.sign_in(Account { login, name: name.trim().to_string(), email, endpoint })?;
    println!("{}", "signed in".green());
    Ok(())
}

fn menu_remove_account(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    let Some(login) = select_account(dialog, "select account to remove:")? else {
        return Ok(());
    };
    if Confirm::new(&format!("remove account '{login}'?")).with_default(false).prompt()? {
        dialog.remove_account(&login)?;
        println!("{}", "account removed".green());
    }
    Ok(())
}

fn menu_use_account_identity(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    if let Some(login) = select_account(dialog, "select account:")? {
        dialog.use_account_identity(&login)?;
    }
    Ok(())
}

/// Lets the user pick an account login, `None` when there are none or they went back
fn select_account(
    dialog: &PreferencesDialog<'_>,
    prompt: &str,
) -> Result<Option<String>, AppError> {
    if dialog.accounts().is_empty() {
        println!("{}", "no accounts signed in".red());
        return Ok(None);
    }

    let logins: Vec<String> = build_login_list(dialog.accounts());
    let login: String = Select::new(&format!("{}", prompt.blue()), logins).prompt()?;
    Ok((login != BACK_OPTION).then_some(login))
}

fn menu_merge_tool(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    let current_name = dialog.draft().merge_tool_name.get().clone();
    let name: String = Text::new(&format!("{}", "enter merge tool name (empty for none):".blue()))
        .with_initial_value(&current_name)
        .prompt()?;
    let name = name.trim().to_string();

    let use_custom = !name.is_empty()
        && Confirm::new("use a custom command for this tool?")
            .with_default(*dialog.draft().use_custom_merge_tool.get())
            .prompt()?;

    let draft = dialog.draft_mut();
    draft.merge_tool_name.set(name);
    draft.use_custom_merge_tool.set(use_custom);

    if use_custom {
        let current_command = dialog.draft().merge_tool_command.get().clone();
        let prompt = format!("{}", "enter command ($BASE $LOCAL $REMOTE $MERGED):".blue());
        let command: String = Text::new(&prompt)
            .with_initial_value(&current_command)
            .prompt()?;
        dialog.draft_mut().merge_tool_command.set(command.trim().to_string());
    }
    Ok(())
}

fn menu_prompts(dialog: &mut PreferencesDialog<'_>) -> Result<(), AppError> {
    const PROMPTS: [&str; 3] = ["removing repositories", "discarding changes", "force pushing"];

    let draft = dialog.draft();
    let defaults: Vec<usize> = [
        *draft.confirm_repository_removal.get(),
        *draft.confirm_discard_changes.get(),
        *draft.confirm_force_push.get(),
    ]
    .iter()
    .enumerate()
    .filter_map(|(i, enabled)| enabled.then_some(i))
    .collect();

    let prompt = format!("{}", "show a confirmation before:".blue());
    let selected: Vec<&str> = MultiSelect::new(&prompt, PROMPTS.to_vec())
        .with_default(&defaults)
        .prompt()?;

    let draft = dialog.draft_mut();
    draft.confirm_repository_removal.set(selected.contains(&PROMPTS[0]));
    draft.confirm_discard_changes.set(selected.contains(&PROMPTS[1]));
    draft.confirm_force_push.set(selected.contains(&PROMPTS[2]));
    Ok(())
}

/// Builds list of account logins for menu to display
pub fn build_login_list(accounts: &[Account]) -> Vec<String> {
    let mut logins: Vec<String> = accounts.iter()
        .map(|account| account.login.clone())
        .collect();
    logins.push(BACK_OPTION.to_string());
    logins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_list_ends_with_back() {
        let accounts = vec![Account {
            login: "octocat".to_string(),
            name: String::new(),
            email: "octocat@example.com".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }];
        assert_eq!(build_login_list(&accounts), vec!["octocat".to_string(), "back".to_string()]);
        assert_eq!(build_login_list(&[]), vec!["back".to_string()]);
    }
}
