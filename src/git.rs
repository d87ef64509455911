use std::{path::PathBuf, process::{Command, Output}, sync::LazyLock};

use regex::Regex;

use crate::error::AppError;

/// Git config key for the committer name
pub const USER_NAME_KEY: &str = "user.name";
/// Git config key for the committer email
pub const USER_EMAIL_KEY: &str = "user.email";
/// Git config key for the branch name used by `git init`
pub const DEFAULT_BRANCH_KEY: &str = "init.defaultBranch";
/// Git config key for the configured merge tool
pub const MERGE_TOOL_KEY: &str = "merge.tool";
/// Branch name git falls back to when `init.defaultBranch` is unset
pub const DEFAULT_BRANCH_FALLBACK: &str = "main";

/// Exit status of `git config --get` for a missing key
const EXIT_KEY_MISSING: i32 = 1;
/// Exit status of `git config --unset` for a missing key
const EXIT_UNSET_MISSING: i32 = 5;

static CONFIG_LOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^error: could not lock config file (.+?): File exists\r?$")
        .expect("config lock pattern is valid")
});

/// Key-value access to the global Git configuration
pub trait ConfigStore {
    /// Reads a key, `None` when it is not set
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    /// Writes a key
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
    /// Removes a key, succeeding when it is already absent
    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

/// `ConfigStore` backed by the `git` executable
///
/// Uses the `--global` scope unless pointed at a specific config file.
#[derive(Debug, Default)]
pub struct GitConfigCli {
    config_file: Option<PathBuf>,
}

impl GitConfigCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and writes `config_file` instead of the global config
    pub fn with_file(config_file: impl Into<PathBuf>) -> Self {
        Self { config_file: Some(config_file.into()) }
    }

    fn run(&self, args: &[&str]) -> Result<Output, AppError> {
        tracing::debug!(?args, file = ?self.config_file, "running git config");
        let mut command = Command::new("git");
        // lock detection matches git's untranslated messages
        command.env("LC_ALL", "C").arg("config");
        match &self.config_file {
            Some(path) => command.arg("--file").arg(path),
            None => command.arg("--global"),
        };
        let git_command_output: Output = command.args(args).output()?;
        Ok(git_command_output)
    }
}

impl ConfigStore for GitConfigCli {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let git_command_output: Output = self.run(&["--get", key])?;

        if git_command_output.status.code() == Some(EXIT_KEY_MISSING) {
            return Ok(None);
        }
        if !git_command_output.status.success() {
            return Err(command_error(&git_command_output));
        }

        let value = String::from_utf8(git_command_output.stdout)?;
        Ok(Some(value.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        let git_command_output: Output = self.run(&[key, value])?;

        if !git_command_output.status.success() {
            return Err(command_error(&git_command_output));
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let git_command_output: Output = self.run(&["--unset", key])?;

        if git_command_output.status.code() == Some(EXIT_UNSET_MISSING) {
            return Ok(());
        }
        if !git_command_output.status.success() {
            return Err(command_error(&git_command_output));
        }

        Ok(())
    }
}

/// Turns a failed git invocation into an error, recognising lock conflicts
fn command_error(output: &Output) -> AppError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    classify_git_error(stderr.trim())
}

/// Maps git's stderr to `ConfigLocked` when it names a lock file, otherwise `GitCommand`
pub fn classify_git_error(stderr: &str) -> AppError {
    match parse_config_lock_path(stderr) {
        Some(lock_path) => {
            tracing::warn!(lock = %lock_path.display(), "git config is locked");
            AppError::ConfigLocked { lock_path }
        }
        None => AppError::GitCommand(stderr.to_string()),
    }
}

/// Extracts the lock file path from git's "could not lock config file" message
///
/// Git names the config file itself; the lock sits beside it with a `.lock` suffix.
pub fn parse_config_lock_path(stderr: &str) -> Option<PathBuf> {
    let captures = CONFIG_LOCK_RE.captures(stderr)?;
    let config_path = captures.get(1)?.as_str().trim();
    if config_path.is_empty() {
        return None;
    }
    Some(PathBuf::from(format!("{config_path}.lock")))
}

/// Reads the default branch name for new repositories
pub fn get_default_branch(store: &dyn ConfigStore) -> Result<String, AppError> {
    let branch = store
        .get(DEFAULT_BRANCH_KEY)?
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BRANCH_FALLBACK.to_string());
    Ok(branch)
}

/// Writes the default branch name for new repositories
pub fn set_default_branch(store: &mut dyn ConfigStore, branch: &str) -> Result<(), AppError> {
    store.set(DEFAULT_BRANCH_KEY, branch)
}

/// Config key holding the command line of a custom merge tool
pub fn merge_tool_command_key(tool: &str) -> String {
    format!("mergetool.{tool}.cmd")
}

/// Merge tool as stored in Git config
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeTool {
    /// Tool name (`merge.tool`)
    pub name: String,
    /// Custom command (`mergetool.<name>.cmd`), if any
    pub command: Option<String>,
}

/// Reads the configured merge tool, `None` when `merge.tool` is unset
pub fn get_merge_tool(store: &dyn ConfigStore) -> Result<Option<MergeTool>, AppError> {
    let Some(name) = store.get(MERGE_TOOL_KEY)?.filter(|name| !name.trim().is_empty()) else {
        return Ok(None);
    };
    let command = store
        .get(&merge_tool_command_key(&name))?
        .filter(|cmd| !cmd.trim().is_empty());
    Ok(Some(MergeTool { name, command }))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{BTreeMap, HashSet};

    use super::*;

    /// A recorded write against the fake store
    #[derive(Debug, Clone, PartialEq)]
    pub enum ConfigWrite {
        Set(String, String),
        Remove(String),
    }

    /// In-memory config store that records writes and can fail on chosen keys
    #[derive(Debug, Default)]
    pub struct MemoryConfig {
        pub values: BTreeMap<String, String>,
        pub writes: Vec<ConfigWrite>,
        pub locked_keys: HashSet<String>,
        pub failing_keys: HashSet<String>,
    }

    impl MemoryConfig {
        pub fn with(pairs: &[(&str, &str)]) -> Self {
            Self {
                values: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                ..Self::default()
            }
        }

        fn check(&self, key: &str) -> Result<(), AppError> {
            if self.locked_keys.contains(key) {
                return Err(classify_git_error(
                    "error: could not lock config file /home/me/.gitconfig: File exists",
                ));
            }
            if self.failing_keys.contains(key) {
                return Err(AppError::GitCommand(format!("cannot write {key}")));
            }
            Ok(())
        }
    }

    impl ConfigStore for MemoryConfig {
        fn get(&self, key: &str) -> Result<Option<String>, AppError> {
            Ok(self.values.get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
            self.check(key)?;
            self.values.insert(key.to_string(), value.to_string());
            self.writes.push(ConfigWrite::Set(key.to_string(), value.to_string()));
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), AppError> {
            self.check(key)?;
            self.values.remove(key);
            self.writes.push(ConfigWrite::Remove(key.to_string()));
            Ok(())
        }
    }

    #[test]
    fn lock_path_is_config_file_with_lock_suffix() {
        let stderr = "error: could not lock config file /home/me/.gitconfig: File exists\n";
        assert_eq!(
            parse_config_lock_path(stderr),
            Some(PathBuf::from("/home/me/.gitconfig.lock"))
        );
    }

    #[test]
    fn lock_message_found_among_other_lines() {
        let stderr = "warning: something else\n\
                      error: could not lock config file /home/me/.gitconfig: File exists";
        assert_eq!(
            parse_config_lock_path(stderr),
            Some(PathBuf::from("/home/me/.gitconfig.lock"))
        );
    }

    #[test]
    fn lock_message_with_crlf_line_endings() {
        let stderr = "error: could not lock config file C:/Users/me/.gitconfig: File exists\r\n\
                      hint: another git process seems to be running\r\n";
        assert_eq!(
            parse_config_lock_path(stderr),
            Some(PathBuf::from("C:/Users/me/.gitconfig.lock"))
        );
    }

    #[test]
    fn unrelated_errors_are_git_command_errors() {
        let denied = "error: could not lock config file x: Permission denied";
        assert!(parse_config_lock_path(denied).is_none());
        match classify_git_error("fatal: bad config line 3") {
            AppError::GitCommand(msg) => assert_eq!(msg, "fatal: bad config line 3"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lock_errors_are_classified() {
        let err = classify_git_error("error: could not lock config file /tmp/cfg: File exists");
        assert_eq!(err.lock_path(), Some(&PathBuf::from("/tmp/cfg.lock")));
    }

    #[test]
    fn default_branch_falls_back_to_main() {
        let store = MemoryConfig::default();
        assert_eq!(get_default_branch(&store).unwrap(), "main");

        let store = MemoryConfig::with(&[(DEFAULT_BRANCH_KEY, "  ")]);
        assert_eq!(get_default_branch(&store).unwrap(), "main");

        let store = MemoryConfig::with(&[(DEFAULT_BRANCH_KEY, "trunk")]);
        assert_eq!(get_default_branch(&store).unwrap(), "trunk");
    }

    #[test]
    fn merge_tool_reads_custom_command() {
        let store = MemoryConfig::with(&[
            (MERGE_TOOL_KEY, "meld"),
            ("mergetool.meld.cmd", "meld $LOCAL $BASE $REMOTE"),
        ]);
        assert_eq!(
            get_merge_tool(&store).unwrap(),
            Some(MergeTool {
                name: "meld".to_string(),
                command: Some("meld $LOCAL $BASE $REMOTE".to_string()),
            })
        );

        let store = MemoryConfig::with(&[(MERGE_TOOL_KEY, "vimdiff")]);
        assert_eq!(get_merge_tool(&store).unwrap().unwrap().command, None);

        assert_eq!(get_merge_tool(&MemoryConfig::default()).unwrap(), None);
    }

    /// Config file in a fresh temp dir, created empty
    fn temp_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gitconfig");
        std::fs::write(&path, "").unwrap();
        (dir, path)
    }

    #[test]
    fn cli_missing_key_reads_as_none() {
        let (_dir, path) = temp_config();
        let store = GitConfigCli::with_file(&path);
        assert_eq!(store.get(USER_NAME_KEY).unwrap(), None);
        assert_eq!(get_default_branch(&store).unwrap(), "main");
    }

    #[test]
    fn cli_set_then_get_strips_newline() {
        let (_dir, path) = temp_config();
        let mut store = GitConfigCli::with_file(&path);
        store.set(USER_NAME_KEY, "Mona Lisa").unwrap();
        set_default_branch(&mut store, "trunk").unwrap();

        assert_eq!(store.get(USER_NAME_KEY).unwrap().as_deref(), Some("Mona Lisa"));
        assert_eq!(get_default_branch(&store).unwrap(), "trunk");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("name = Mona Lisa"));
    }

    #[test]
    fn cli_remove_succeeds_for_missing_key() {
        let (_dir, path) = temp_config();
        let mut store = GitConfigCli::with_file(&path);
        store.set(MERGE_TOOL_KEY, "meld").unwrap();
        store.remove(MERGE_TOOL_KEY).unwrap();
        assert_eq!(store.get(MERGE_TOOL_KEY).unwrap(), None);

        store.remove(MERGE_TOOL_KEY).unwrap();
    }

    #[test]
    fn cli_reports_lock_file() {
        let (dir, path) = temp_config();
        let lock_path = dir.path().join("gitconfig.lock");
        std::fs::write(&lock_path, "").unwrap();

        let mut store = GitConfigCli::with_file(&path);
        match store.set(USER_NAME_KEY, "Mona") {
            Err(AppError::ConfigLocked { lock_path: reported }) => assert_eq!(reported, lock_path),
            other => panic!("expected a lock conflict, got {other:?}"),
        }
    }

    #[test]
    fn cli_other_failures_are_git_command_errors() {
        let (_dir, path) = temp_config();
        let mut store = GitConfigCli::with_file(&path);
        assert!(matches!(store.set("nosection", "x"), Err(AppError::GitCommand(_))));
    }
}
