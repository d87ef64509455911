/// Discovery of external editors and shells
pub trait Integrations {
    /// Names of the editors found on this machine
    fn available_editors(&self) -> Vec<String>;
    /// Names of the shells found on this machine
    fn available_shells(&self) -> Vec<String>;
}

/// Well-known editors as (display name, executables to look for)
const KNOWN_EDITORS: &[(&str, &[&str])] = &[
    ("Visual Studio Code", &["code"]),
    ("VSCodium", &["codium"]),
    ("Zed", &["zed", "zeditor"]),
    ("Sublime Text", &["subl"]),
    ("JetBrains IntelliJ IDEA", &["idea"]),
    ("Neovim", &["nvim"]),
    ("Vim", &["vim"]),
    ("Emacs", &["emacs"]),
    ("Helix", &["hx", "helix"]),
    ("Kate", &["kate"]),
];

/// Well-known shells as (display name, executables to look for)
const KNOWN_SHELLS: &[(&str, &[&str])] = &[
    ("Bash", &["bash"]),
    ("Zsh", &["zsh"]),
    ("Fish", &["fish"]),
    ("Nushell", &["nu"]),
    ("PowerShell", &["pwsh", "powershell"]),
    ("Command Prompt", &["cmd"]),
];

/// `Integrations` searching `PATH` for well-known programs
#[derive(Debug, Default)]
pub struct SystemIntegrations;

impl SystemIntegrations {
    pub fn new() -> Self {
        Self
    }
}

impl Integrations for SystemIntegrations {
    fn available_editors(&self) -> Vec<String> {
        find_installed(KNOWN_EDITORS, |exe| which::which(exe).is_ok())
    }

    fn available_shells(&self) -> Vec<String> {
        find_installed(KNOWN_SHELLS, |exe| which::which(exe).is_ok())
    }
}

/// Names from `table` with at least one executable accepted by `is_installed`
fn find_installed<F>(table: &[(&str, &[&str])], is_installed: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let found: Vec<String> = table
        .iter()
        .filter(|(_, executables)| executables.iter().any(|&exe| is_installed(exe)))
        .map(|(name, _)| name.to_string())
        .collect();
    tracing::debug!(?found, "found integrations");
    found
}
