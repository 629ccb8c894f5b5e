//! Authorization-gated finders over lazy relations.
//!
//! Finders take a caller, a scope and request parameters and hand back a
//! [`Relation`] describing the visible records. Nothing touches a data store
//! until a terminal operation (`load`, `count`, `first`) runs against the
//! relation's [`RecordSource`], either [`MemorySource`] or [`PgSource`].

pub mod ability;
pub mod alerts;
pub mod fuzzy;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod relation;
pub mod snippet_search;
pub mod snippets;

pub use ability::{Ability, Permission, ProjectAuthorizations, RoleAbility};
pub use alerts::{AlertScope, AlertsFinder, ProjectAlerts};
pub use memory::MemorySource;
pub use postgres::{PgRecord, PgSource};
pub use relation::{FieldValue, Filter, Order, QueryPlan, Record, RecordSource, Relation};
pub use snippet_search::{
    formatted_limited_count, AuthorizedPersonalPolicy, DefaultSearchPolicy, SnippetSearchPolicy,
    SnippetSearchResults, SnippetSearchResultsBuilder,
};
pub use snippets::{SnippetsFinder, VisibilitySnippetsFinder};
