mod entity;
mod query;

pub use entity::{Snippet, SnippetVisibility};
pub use query::{SearchScope, SnippetsFinderParams};
