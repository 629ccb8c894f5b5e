use std::sync::Arc;

use finders_core::config::SearchConfig;
use finders_core::CoreResult;
use finders_protocol::alert::SortDirection;
use finders_protocol::identity::User;
use finders_protocol::page::Page;
use finders_protocol::snippet::{SearchScope, Snippet, SnippetsFinderParams};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::relation::Relation;
use crate::snippets::SnippetsFinder;

const TITLE_COLUMNS: &[&str] = &["title", "description", "file_name"];
const CONTENT_COLUMNS: &[&str] = &["content"];

/// Extension point for snippet searches, chosen once when results are built.
pub trait SnippetSearchPolicy: Send + Sync {
    /// Parameters handed to the snippets finder.
    fn finder_params(&self, params: SnippetsFinderParams) -> SnippetsFinderParams {
        params
    }

    /// Last chance to adjust the ordered, visible snippets before searching.
    fn refine(&self, relation: Relation<Snippet>) -> Relation<Snippet> {
        relation
    }
}

/// Searches every snippet the finder lets the user see.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSearchPolicy;

impl SnippetSearchPolicy for DefaultSearchPolicy {}

/// Restricts searches to the user's own personal snippets and the snippets of
/// projects they are authorized for.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorizedPersonalPolicy;

impl SnippetSearchPolicy for AuthorizedPersonalPolicy {
    fn finder_params(&self, mut params: SnippetsFinderParams) -> SnippetsFinderParams {
        params.authorized_and_user_personal = true;
        params
    }
}

/// Full-text snippet search for one request.
///
/// Limited counts are memoized per scope for the lifetime of the instance.
/// An instance belongs to a single request; sharing one across tasks is not
/// supported.
pub struct SnippetSearchResults {
    current_user: Option<User>,
    query: String,
    finder: Arc<dyn SnippetsFinder>,
    policy: Arc<dyn SnippetSearchPolicy>,
    config: SearchConfig,
    limited_titles_count: OnceCell<u64>,
    limited_blobs_count: OnceCell<u64>,
}

impl SnippetSearchResults {
    pub fn builder(
        current_user: Option<User>,
        query: impl Into<String>,
        finder: Arc<dyn SnippetsFinder>,
    ) -> SnippetSearchResultsBuilder {
        SnippetSearchResultsBuilder {
            current_user,
            query: query.into(),
            finder,
            policy: Arc::new(DefaultSearchPolicy),
            config: SearchConfig::default(),
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// One page of matching snippets, most recently updated first.
    pub fn objects(
        &self,
        scope: SearchScope,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Relation<Snippet> {
        let page = Page::resolve(
            page,
            per_page,
            self.config.default_per_page,
            self.config.max_per_page,
        );
        self.matching(scope).page(page)
    }

    /// Number of matches, counted no further than the configured count limit.
    #[instrument(skip(self), fields(query = %self.query))]
    pub async fn limited_count(&self, scope: SearchScope) -> CoreResult<u64> {
        let cell = match scope {
            SearchScope::SnippetTitles => &self.limited_titles_count,
            SearchScope::SnippetBlobs => &self.limited_blobs_count,
        };

        let count = cell
            .get_or_try_init(|| async {
                debug!("counting snippet matches");
                self.matching(scope)
                    .limit(u64::from(self.config.count_limit))
                    .count()
                    .await
            })
            .await?;
        Ok(*count)
    }

    /// Display form of [`SnippetSearchResults::limited_count`], e.g. `42` or `99+`.
    pub async fn formatted_count(&self, scope: SearchScope) -> CoreResult<String> {
        let count = self.limited_count(scope).await?;
        Ok(formatted_limited_count(count, self.config.count_limit))
    }

    fn snippets(&self) -> Relation<Snippet> {
        let params = self.policy.finder_params(SnippetsFinderParams::default());
        let relation = self
            .finder
            .execute(self.current_user.as_ref(), &params)
            .reorder("updated_at", SortDirection::Desc);
        self.policy.refine(relation)
    }

    fn matching(&self, scope: SearchScope) -> Relation<Snippet> {
        let columns = match scope {
            SearchScope::SnippetTitles => TITLE_COLUMNS,
            SearchScope::SnippetBlobs => CONTENT_COLUMNS,
        };
        self.snippets().search(columns, &self.query)
    }
}

/// Renders a limited count; reaching the limit shows as `limit - 1` followed by `+`.
pub fn formatted_limited_count(count: u64, count_limit: u32) -> String {
    if count >= u64::from(count_limit) {
        format!("{}+", count_limit.saturating_sub(1))
    } else {
        count.to_string()
    }
}

pub struct SnippetSearchResultsBuilder {
    current_user: Option<User>,
    query: String,
    finder: Arc<dyn SnippetsFinder>,
    policy: Arc<dyn SnippetSearchPolicy>,
    config: SearchConfig,
}

impl SnippetSearchResultsBuilder {
    pub fn policy(mut self, policy: Arc<dyn SnippetSearchPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> SnippetSearchResults {
        SnippetSearchResults {
            current_user: self.current_user,
            query: self.query,
            finder: self.finder,
            policy: self.policy,
            config: self.config,
            limited_titles_count: OnceCell::new(),
            limited_blobs_count: OnceCell::new(),
        }
    }
}
