use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::jira::JiraError;

static BROWSE_URL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/browse/([A-Z][A-Z0-9_]+-\d+)").expect("browse url pattern is valid")
});

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([A-Z][A-Z0-9_]+-\d+)").expect("issue key pattern is valid"));

/// Normalized Jira issue key such as `KAN-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueKey(String);

impl IssueKey {
    /// Extract a key from a browse URL, free text, or a bare key.
    ///
    /// A `/browse/<KEY>` segment wins over any other key-shaped text. When no
    /// key pattern is present the trimmed input is used as-is. The result is
    /// always upper-cased and never empty.
    pub fn parse(input: &str) -> Result<Self, JiraError> {
        let trimmed = input.trim();

        let key = BROWSE_URL_KEY
            .captures(trimmed)
            .or_else(|| BARE_KEY.captures(trimmed))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(trimmed)
            .to_uppercase();

        if key.is_empty() {
            return Err(JiraError::EmptyIssueKey {
                input: input.to_string(),
            });
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for IssueKey {
    type Err = JiraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
