//! Policy configuration.
//!
//! [`PolicySettings`] is the raw, serde-friendly form read from a TOML file
//! or assembled from the environment. [`PolicySettings::into_config`]
//! validates it into an immutable [`PolicyConfig`] that is shared read-only
//! by every execution.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default allow-listed commands.
pub const DEFAULT_ALLOWED_COMMANDS: &str = "ls,cat,pwd";

/// Default allow-listed flags.
pub const DEFAULT_ALLOWED_FLAGS: &str = "-l,-a,--help";

/// Default maximum raw command length, in characters.
pub const DEFAULT_MAX_COMMAND_LENGTH: usize = 1024;

/// Default command timeout, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Either every value is admitted, or only the listed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AllowListRepr", into = "AllowListRepr")]
pub enum AllowList {
    All,
    Only(BTreeSet<String>),
}

impl AllowList {
    /// Parses a comma-separated list, or `all` (any case).
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("all") {
            return Self::All;
        }
        Self::only(text.split(','))
    }

    /// Builds an explicit list, trimming entries and skipping blanks.
    pub fn only<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(
            items
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn admits(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(value),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Sorted entries, or `None` for [`AllowList::All`].
    pub fn entries(&self) -> Option<Vec<&str>> {
        match self {
            Self::All => None,
            Self::Only(set) => Some(set.iter().map(String::as_str).collect()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AllowListRepr {
    Text(String),
    List(Vec<String>),
}

impl From<AllowListRepr> for AllowList {
    fn from(repr: AllowListRepr) -> Self {
        match repr {
            AllowListRepr::Text(text) => Self::parse(&text),
            AllowListRepr::List(items) => {
                if items.iter().any(|item| item.trim().eq_ignore_ascii_case("all")) {
                    Self::All
                } else {
                    Self::only(items)
                }
            }
        }
    }
}

impl From<AllowList> for AllowListRepr {
    fn from(list: AllowList) -> Self {
        match list {
            AllowList::All => Self::Text("all".to_string()),
            AllowList::Only(set) => Self::List(set.into_iter().collect()),
        }
    }
}

/// Interprets an on/off toggle the way the environment is expected to set
/// it: `true` or `1` (any case) is on, anything else is off.
pub fn parse_toggle(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Unvalidated policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// Confinement root. Required.
    pub allowed_dir: Option<PathBuf>,

    /// Programs that may be run.
    pub allowed_commands: AllowList,

    /// `-`-prefixed tokens that may be passed.
    pub allowed_flags: AllowList,

    /// Longest raw command accepted, in characters.
    pub max_command_length: usize,

    /// Seconds before a running command is terminated.
    pub command_timeout: u64,

    /// Whether `&&`, `|`, `;` and friends may join commands.
    pub allow_shell_operators: bool,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            allowed_dir: None,
            allowed_commands: AllowList::parse(DEFAULT_ALLOWED_COMMANDS),
            allowed_flags: AllowList::parse(DEFAULT_ALLOWED_FLAGS),
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
            command_timeout: DEFAULT_COMMAND_TIMEOUT_SECS,
            allow_shell_operators: false,
        }
    }
}

impl PolicySettings {
    /// Default settings confined to `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            allowed_dir: Some(root.into()),
            ..Self::default()
        }
    }

    /// Parses settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates the settings and freezes them into a [`PolicyConfig`].
    ///
    /// The root directory must exist; it is stored in canonical form so later
    /// prefix checks compare like with like.
    pub fn into_config(self) -> Result<PolicyConfig, ConfigError> {
        let root = self.allowed_dir.ok_or(ConfigError::MissingRoot)?;
        if root.as_os_str().is_empty() {
            return Err(ConfigError::MissingRoot);
        }

        let root_dir = std::fs::canonicalize(&root).map_err(|e| ConfigError::InvalidRoot {
            path: root.clone(),
            reason: e.to_string(),
        })?;
        if !root_dir.is_dir() {
            return Err(ConfigError::InvalidRoot {
                path: root,
                reason: "not a directory".to_string(),
            });
        }

        if self.max_command_length == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max_command_length",
            });
        }
        if self.command_timeout == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "command_timeout",
            });
        }

        Ok(PolicyConfig {
            root_dir,
            allowed_commands: self.allowed_commands,
            allowed_flags: self.allowed_flags,
            max_command_length: self.max_command_length,
            command_timeout: Duration::from_secs(self.command_timeout),
            allow_shell_operators: self.allow_shell_operators,
        })
    }
}

/// Immutable snapshot of what is allowed.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    root_dir: PathBuf,
    allowed_commands: AllowList,
    allowed_flags: AllowList,
    max_command_length: usize,
    command_timeout: Duration,
    allow_shell_operators: bool,
}

impl PolicyConfig {
    /// Canonical confinement root.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn allowed_commands(&self) -> &AllowList {
        &self.allowed_commands
    }

    pub fn allowed_flags(&self) -> &AllowList {
        &self.allowed_flags
    }

    pub fn max_command_length(&self) -> usize {
        self.max_command_length
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn allow_shell_operators(&self) -> bool {
        self.allow_shell_operators
    }
}
