use finders_protocol::alert::Alert;
use finders_protocol::snippet::Snippet;

use crate::relation::{FieldValue, Record};

impl Record for Alert {
    const TABLE: &'static str = "alert_management_alerts";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "iid",
        "project_id",
        "title",
        "status",
        "severity",
        "events",
        "started_at",
        "ended_at",
        "created_at",
        "updated_at",
    ];

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "iid" => self.iid.into(),
            "project_id" => self.project_id.into(),
            "title" => self.title.as_str().into(),
            "status" => self.status.code().into(),
            "severity" => self.severity.code().into(),
            "events" => self.events.into(),
            "started_at" => self.started_at.into(),
            "ended_at" => self.ended_at.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }
}

impl Record for Snippet {
    const TABLE: &'static str = "snippets";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "file_name",
        "content",
        "author_id",
        "project_id",
        "visibility_level",
        "created_at",
        "updated_at",
    ];

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.clone().into(),
            "file_name" => self.file_name.as_str().into(),
            "content" => self.content.as_str().into(),
            "author_id" => self.author_id.into(),
            "project_id" => self.project_id.into(),
            "visibility_level" => self.visibility.level().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finders_protocol::alert::AlertStatus;
    use finders_protocol::snippet::SnippetVisibility;

    #[test]
    fn alert_fields_use_stored_codes() {
        let alert = Alert::new(4, 2, 9, "disk").with_status(AlertStatus::Resolved);
        assert_eq!(alert.field("status"), FieldValue::Int(2));
        assert_eq!(alert.field("ended_at"), FieldValue::Null);
        assert_eq!(alert.field("nope"), FieldValue::Null);
    }

    #[test]
    fn personal_snippets_have_no_project() {
        let snippet = Snippet::new(1, 3, "notes").with_visibility(SnippetVisibility::Internal);
        assert_eq!(snippet.field("project_id"), FieldValue::Null);
        assert_eq!(snippet.field("visibility_level"), FieldValue::Int(10));
    }
}
