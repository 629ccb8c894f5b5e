mod entity;
mod query;

pub use entity::{Alert, AlertSeverity, AlertStatus};
pub use query::{AlertParams, AlertSort, AlertSortField, SortDirection};
