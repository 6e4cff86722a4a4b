//! External command lines (server start, test run)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::E2eError;

/// A program plus its arguments, as written in the runner config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandLine(Vec<String>);

impl CommandLine {
    pub fn new<I, S>(parts: I) -> Result<Self, E2eError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() || parts[0].trim().is_empty() {
            return Err(E2eError::Config("command line must name a program".into()));
        }
        Ok(Self(parts))
    }

    /// Built-in defaults; callers pass a non-empty literal
    pub(crate) fn builtin(parts: &[&str]) -> Self {
        debug_assert!(!parts.is_empty());
        Self(parts.iter().map(|p| p.to_string()).collect())
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    /// Build a tokio command for this line
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(self.program());
        cmd.args(self.args());
        cmd
    }
}

impl TryFrom<Vec<String>> for CommandLine {
    type Error = E2eError;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(parts)
    }
}

impl From<CommandLine> for Vec<String> {
    fn from(line: CommandLine) -> Self {
        line.0
    }
}

/// Whitespace-separated; no shell quoting
impl FromStr for CommandLine {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split_whitespace())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
