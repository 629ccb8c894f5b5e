use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameters understood by snippet finders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetsFinderParams {
    /// Restrict to the caller's own personal snippets plus snippets of projects
    /// the caller is a member of.
    #[serde(default)]
    pub authorized_and_user_personal: bool,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub project_id: Option<i64>,
}

/// Which snippet attributes a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Title, description and file name.
    #[default]
    SnippetTitles,
    /// File content.
    SnippetBlobs,
}

impl SearchScope {
    /// Resolves a requested scope; anything unrecognised searches titles.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("snippet_blobs") => SearchScope::SnippetBlobs,
            _ => SearchScope::SnippetTitles,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::SnippetTitles => "snippet_titles",
            SearchScope::SnippetBlobs => "snippet_blobs",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
