pub mod alert;
pub mod identity;
pub mod page;
pub mod snippet;

pub mod prelude {
    pub use crate::alert::{
        Alert, AlertParams, AlertSeverity, AlertSort, AlertSortField, AlertStatus, SortDirection,
    };
    pub use crate::identity::{AccessLevel, Project, User};
    pub use crate::page::Page;
    pub use crate::snippet::{SearchScope, Snippet, SnippetVisibility, SnippetsFinderParams};
}
