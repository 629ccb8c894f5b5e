//! Finders: authorization-gated, parameter-driven collection finders.
//!
//! The workspace is split into three crates:
//!
//! * `finders-core`: errors, configuration, logging and the Postgres pool
//! * `finders-protocol`: alerts, snippets, identities, request parameters
//! * `finders-query`: relations, record sources and the finders themselves
//!
//! [`Finders`] wires them together for an application: it owns the record
//! sources, the membership table used for authorization, and the search
//! configuration.

use std::sync::Arc;

use tracing::info;

pub use finders_core;
pub use finders_protocol;
pub use finders_query;

use finders_core::{init_tracing, load_finder_config, CoreResult, DatabasePool, FinderConfig};
use finders_protocol::prelude::*;
use finders_query::{
    AlertsFinder, MemorySource, PgSource, ProjectAlerts, RecordSource, Relation, RoleAbility,
    SnippetSearchResults, SnippetSearchResultsBuilder, SnippetsFinder, VisibilitySnippetsFinder,
};

pub mod prelude {
    pub use crate::Finders;
    pub use finders_core::{CoreResult, FinderConfig, FinderError, SearchConfig};
    pub use finders_protocol::prelude::*;
    pub use finders_query::{
        Ability, AlertScope, AlertsFinder, AuthorizedPersonalPolicy, DefaultSearchPolicy,
        MemorySource, Permission, ProjectAlerts, Relation, RoleAbility, SnippetSearchPolicy,
        SnippetSearchResults, SnippetsFinder, VisibilitySnippetsFinder,
    };
}

/// Application handle over the alert and snippet stores.
#[derive(Clone)]
pub struct Finders {
    config: FinderConfig,
    alerts: Arc<dyn RecordSource<Alert>>,
    snippets: Arc<dyn RecordSource<Snippet>>,
    roles: RoleAbility,
}

impl Finders {
    /// Connects to Postgres, applies migrations and reads through SQL sources.
    pub async fn connect(config: FinderConfig) -> CoreResult<Self> {
        let pool = DatabasePool::connect(&config).await?;
        pool.migrate().await?;
        info!(environment = ?config.environment, "finders connected");

        Ok(Self {
            alerts: Arc::new(PgSource::<Alert>::new(pool.clone())),
            snippets: Arc::new(PgSource::<Snippet>::new(pool)),
            config,
            roles: RoleAbility::new(),
        })
    }

    /// Serves finders from in-memory rows.
    pub fn in_memory(
        config: FinderConfig,
        alerts: MemorySource<Alert>,
        snippets: MemorySource<Snippet>,
    ) -> Self {
        Self {
            config,
            alerts: alerts.into_source(),
            snippets: snippets.into_source(),
            roles: RoleAbility::new(),
        }
    }

    /// Replaces the membership table used for authorization.
    pub fn with_roles(mut self, roles: RoleAbility) -> Self {
        self.roles = roles;
        self
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn roles(&self) -> &RoleAbility {
        &self.roles
    }

    pub fn project_alerts(&self, project: Project) -> ProjectAlerts {
        ProjectAlerts::new(project, Arc::clone(&self.alerts))
    }

    /// Alerts of `scope` visible to `current_user`, filtered and sorted per `params`.
    pub fn alerts(
        &self,
        current_user: Option<&User>,
        scope: &ProjectAlerts,
        params: AlertParams,
    ) -> Relation<Alert> {
        AlertsFinder::new(&self.roles, current_user, scope, params).execute()
    }

    pub fn snippets_finder(&self) -> Arc<dyn SnippetsFinder> {
        Arc::new(VisibilitySnippetsFinder::new(
            Arc::clone(&self.snippets),
            Arc::new(self.roles.clone()),
        ))
    }

    /// Search results builder preloaded with the configured search bounds.
    pub fn snippet_search(
        &self,
        current_user: Option<User>,
        query: impl Into<String>,
    ) -> SnippetSearchResultsBuilder {
        SnippetSearchResults::builder(current_user, query, self.snippets_finder())
            .config(self.config.search)
    }
}

/// Loads configuration from the environment, installs logging and connects.
pub async fn bootstrap() -> CoreResult<Finders> {
    let config = load_finder_config()?;
    init_tracing(config.log_level.as_deref())?;
    Finders::connect(config).await
}
