mod account;
mod cli;
mod dispatcher;
mod error;
mod git;
mod integrations;
mod menu;
mod preferences;
mod settings;
mod storage;
mod validation;

use clap::Parser;
use colored::Colorize;

use crate::{
    account::Account,
    cli::{AccountCommands, Cli, Commands},
    dispatcher::{AppDispatcher, Dispatcher},
    error::AppError,
    git::{
        get_default_branch, get_merge_tool, ConfigStore, GitConfigCli, USER_EMAIL_KEY,
        USER_NAME_KEY,
    },
    integrations::SystemIntegrations,
    menu::run_menu,
    preferences::{PreferencesDialog, PreferencesTab},
    storage::{check_if_accounts_exist, get_data_dir},
};

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}", e.to_string().red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut dispatcher = AppDispatcher::load(get_data_dir()?)?;

    match cli.command {
        Some(Commands::Open { tab }) => open_preferences(&mut dispatcher, tab.unwrap_or_default()),
        Some(Commands::Show) => show_preferences(&dispatcher),
        Some(Commands::Account { action }) => match action {
            AccountCommands::Add { login, name, email, endpoint } => {
                dispatcher.sign_in(Account { login, name, email, endpoint })?;
                println!("{}", "account added".green());
                Ok(())
            }
            AccountCommands::Remove { login } => {
                dispatcher.remove_account(&login)?;
                println!("{}", "account removed".green());
                Ok(())
            }
            AccountCommands::List => list_accounts(&dispatcher),
        },
        None => open_preferences(&mut dispatcher, PreferencesTab::default()),
    }
}

/// Runs the interactive dialog and prints whatever errors it posted
fn open_preferences(dispatcher: &mut AppDispatcher, tab: PreferencesTab) -> Result<(), AppError> {
    let mut config = GitConfigCli::new();
    let integrations = SystemIntegrations::new();

    {
        let mut dialog = PreferencesDialog::open(&mut config, &integrations, dispatcher, tab)?;
        run_menu(&mut dialog)?;
    }

    for error in dispatcher.take_errors() {
        eprintln!("{}", error.to_string().red());
    }
    Ok(())
}

/// Prints current Git identity and app settings
fn show_preferences(dispatcher: &AppDispatcher) -> Result<(), AppError> {
    let config = GitConfigCli::new();
    let name = config.get(USER_NAME_KEY)?.unwrap_or_default();
    let email = config.get(USER_EMAIL_KEY)?.unwrap_or_default();
    let settings = dispatcher.app_settings();

    println!("{} {} <{}>", "committer:".blue(), name, email);
    println!("{} {}", "default branch:".blue(), get_default_branch(&config)?);
    match get_merge_tool(&config)? {
        Some(tool) => println!(
            "{} {} {}",
            "merge tool:".blue(),
            tool.name,
            tool.command.unwrap_or_default()
        ),
        None => println!("{} none", "merge tool:".blue()),
    }
    println!("{} {}", "editor:".blue(), settings.selected_editor.as_deref().unwrap_or("none"));
    println!("{} {}", "shell:".blue(), settings.selected_shell.as_deref().unwrap_or("none"));
    println!("{} {}", "theme:".blue(), settings.theme);
    println!("{} {}", "confirm repository removal:".blue(), settings.confirm_repository_removal);
    println!("{} {}", "confirm discarding changes:".blue(), settings.confirm_discard_changes);
    println!("{} {}", "confirm force pushing:".blue(), settings.confirm_force_push);
    println!("{} {}", "usage statistics opt-out:".blue(), settings.opt_out_of_usage_tracking);
    println!(
        "{} {}",
        "background repository indicators:".blue(),
        settings.repository_indicators_enabled
    );
    println!("{} {}", "uncommitted changes:".blue(), settings.uncommitted_changes_strategy);
    Ok(())
}

/// Lists all signed-in accounts
fn list_accounts(dispatcher: &AppDispatcher) -> Result<(), AppError> {
    let accounts = dispatcher.accounts();
    check_if_accounts_exist(&accounts)?;

    for account in accounts {
        println!(
            "{} {} <{}> ({})",
            account.login.cyan(),
            account.name,
            account.email,
            account.endpoint
        );
    }
    Ok(())
}
