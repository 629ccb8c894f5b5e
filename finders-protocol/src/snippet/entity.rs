use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may see a snippet. Stored as its visibility level code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SnippetVisibility {
    Private = 0,
    Internal = 10,
    Public = 20,
}

impl Default for SnippetVisibility {
    fn default() -> Self {
        SnippetVisibility::Private
    }
}

impl SnippetVisibility {
    pub fn level(self) -> i16 {
        self as i16
    }

    pub fn from_level(level: i16) -> Option<Self> {
        match level {
            0 => Some(SnippetVisibility::Private),
            10 => Some(SnippetVisibility::Internal),
            20 => Some(SnippetVisibility::Public),
            _ => None,
        }
    }
}

/// Code snippet, either personal (`project_id` unset) or owned by a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_name: String,
    #[serde(default)]
    pub content: String,
    pub author_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub visibility: SnippetVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Snippet {
    /// Creates a private personal snippet with timestamps set to now.
    pub fn new(id: i64, author_id: i64, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: None,
            file_name: String::new(),
            content: String::new(),
            author_id,
            project_id: None,
            visibility: SnippetVisibility::Private,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_visibility(mut self, visibility: SnippetVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn in_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_file(mut self, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self.content = content.into();
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }
}
