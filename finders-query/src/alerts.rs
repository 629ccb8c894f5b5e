use std::sync::Arc;

use finders_protocol::alert::{Alert, AlertParams, AlertSort, AlertSortField, SortDirection};
use finders_protocol::identity::{Project, User};
use tracing::{debug, instrument};

use crate::ability::{Ability, Permission};
use crate::relation::{RecordSource, Relation};

/// Owner of an alert collection.
pub trait AlertScope {
    /// Subject of the authorization check.
    fn project(&self) -> &Project;

    /// Every alert the scope owns, unfiltered.
    fn alert_management_alerts(&self) -> Relation<Alert>;
}

/// Project scope reading alerts from a shared record source.
#[derive(Clone)]
pub struct ProjectAlerts {
    project: Project,
    source: Arc<dyn RecordSource<Alert>>,
}

impl ProjectAlerts {
    pub fn new(project: Project, source: Arc<dyn RecordSource<Alert>>) -> Self {
        Self { project, source }
    }
}

impl AlertScope for ProjectAlerts {
    fn project(&self) -> &Project {
        &self.project
    }

    fn alert_management_alerts(&self) -> Relation<Alert> {
        Relation::new(Arc::clone(&self.source)).where_eq("project_id", self.project.id)
    }
}

/// Finds the alerts of a project visible to the current user.
///
/// Stages run in a fixed order (status, iid, sort) and each one is skipped
/// when its parameter is absent. Callers without
/// [`Permission::ReadAlertManagementAlert`] get an empty relation.
pub struct AlertsFinder<'a, S: AlertScope + ?Sized> {
    ability: &'a dyn Ability,
    current_user: Option<&'a User>,
    scope: &'a S,
    params: AlertParams,
}

impl<'a, S: AlertScope + ?Sized> AlertsFinder<'a, S> {
    pub fn new(
        ability: &'a dyn Ability,
        current_user: Option<&'a User>,
        scope: &'a S,
        params: AlertParams,
    ) -> Self {
        Self {
            ability,
            current_user,
            scope,
            params,
        }
    }

    #[instrument(skip_all, fields(project_id = self.scope.project().id))]
    pub fn execute(&self) -> Relation<Alert> {
        if !self.authorized() {
            debug!("alert access denied, returning empty relation");
            return Relation::none();
        }

        let collection = self.scope.alert_management_alerts();
        let collection = self.by_status(collection);
        let collection = self.by_iid(collection);
        self.sort(collection)
    }

    fn by_status(&self, collection: Relation<Alert>) -> Relation<Alert> {
        match self.params.status.as_ref().filter(|values| !values.is_empty()) {
            Some(values) => collection.where_in("status", values.iter().map(|status| status.code())),
            None => collection,
        }
    }

    fn by_iid(&self, collection: Relation<Alert>) -> Relation<Alert> {
        match self.params.iid {
            Some(iid) => collection.where_eq("iid", iid),
            None => collection,
        }
    }

    fn sort(&self, collection: Relation<Alert>) -> Relation<Alert> {
        match self.params.sort {
            Some(sort) => {
                let (field, direction) = sort_column(sort);
                collection.order_by(field, direction)
            }
            None => collection,
        }
    }

    fn authorized(&self) -> bool {
        self.ability.allowed(
            self.current_user,
            Permission::ReadAlertManagementAlert,
            self.scope.project(),
        )
    }
}

fn sort_column(sort: AlertSort) -> (&'static str, SortDirection) {
    let field = match sort.field {
        AlertSortField::Created => "created_at",
        AlertSortField::Updated => "updated_at",
        AlertSortField::StartTime => "started_at",
        AlertSortField::EndTime => "ended_at",
        AlertSortField::EventCount => "events",
        AlertSortField::Severity => "severity",
        AlertSortField::Status => "status",
    };
    // Severity codes grow as alerts get less serious.
    let direction = match (sort.field, sort.direction) {
        (AlertSortField::Severity, SortDirection::Asc) => SortDirection::Desc,
        (AlertSortField::Severity, SortDirection::Desc) => SortDirection::Asc,
        (_, direction) => direction,
    };
    (field, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::RoleAbility;
    use crate::memory::MemorySource;
    use crate::relation::QueryPlan;
    use async_trait::async_trait;
    use finders_core::CoreResult;
    use finders_protocol::alert::{AlertSeverity, AlertStatus};
    use finders_protocol::identity::AccessLevel;
    use mockall::mock;

    mock! {
        pub AlertStore {}

        #[async_trait]
        impl RecordSource<Alert> for AlertStore {
            async fn fetch(&self, plan: &QueryPlan) -> CoreResult<Vec<Alert>>;
            async fn count(&self, plan: &QueryPlan) -> CoreResult<u64>;
        }
    }

    const REPORTER: i64 = 1;
    const GUEST: i64 = 2;

    fn ability() -> RoleAbility {
        let ability = RoleAbility::new();
        ability.add_member(REPORTER, 10, AccessLevel::Reporter);
        ability.add_member(GUEST, 10, AccessLevel::Guest);
        ability
    }

    fn scope() -> ProjectAlerts {
        let source = MemorySource::with_rows([
            Alert::new(1, 1, 10, "disk full").with_severity(AlertSeverity::Low),
            Alert::new(2, 2, 10, "cpu hot")
                .with_status(AlertStatus::Acknowledged)
                .with_severity(AlertSeverity::Critical),
            Alert::new(3, 3, 10, "oom").with_status(AlertStatus::Resolved),
            Alert::new(4, 1, 20, "elsewhere"),
        ]);
        ProjectAlerts::new(Project::new(10, "ops/app"), source.into_source())
    }

    #[tokio::test]
    async fn denied_users_get_nothing_without_touching_the_store() {
        let mut store = MockAlertStore::new();
        store.expect_fetch().never();
        store.expect_count().never();
        let scope = ProjectAlerts::new(Project::new(10, "ops/app"), Arc::new(store));

        let guest = User::new(GUEST, "guest");
        let params = AlertParams::default().with_status([AlertStatus::Triggered]);
        let relation = AlertsFinder::new(&ability(), Some(&guest), &scope, params).execute();

        assert!(relation.is_none());
        assert!(relation.load().await.unwrap().is_empty());
        assert_eq!(relation.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn no_params_returns_the_project_alerts_in_default_order() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let alerts = AlertsFinder::new(&ability(), Some(&user), &scope, AlertParams::default())
            .execute()
            .load()
            .await
            .unwrap();

        assert_eq!(alerts.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn absent_params_leave_the_base_plan_untouched() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let relation =
            AlertsFinder::new(&ability(), Some(&user), &scope, AlertParams::default()).execute();

        assert_eq!(relation.plan(), scope.alert_management_alerts().plan());
    }

    #[test]
    fn empty_status_set_is_skipped() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let params = AlertParams {
            status: Some(Default::default()),
            ..AlertParams::default()
        };
        let relation = AlertsFinder::new(&ability(), Some(&user), &scope, params).execute();

        assert_eq!(relation.plan(), scope.alert_management_alerts().plan());
    }

    #[tokio::test]
    async fn status_and_iid_intersect() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let ability = ability();

        let params = AlertParams::from_query("status=open&iid=2");
        let alerts = AlertsFinder::new(&ability, Some(&user), &scope, params)
            .execute()
            .load()
            .await
            .unwrap();
        assert_eq!(alerts.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);

        let params = AlertParams::from_query("status=resolved&iid=2");
        let alerts = AlertsFinder::new(&ability, Some(&user), &scope, params)
            .execute()
            .load()
            .await
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn numeric_status_codes_filter_like_names() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let params: AlertParams =
            serde_json::from_value(serde_json::json!({ "status": [1] })).expect("params");
        let alerts = AlertsFinder::new(&ability(), Some(&user), &scope, params)
            .execute()
            .load()
            .await
            .unwrap();

        assert_eq!(alerts.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn severity_desc_lists_critical_first() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let params = AlertParams::from_query("sort=severity_desc");
        let alerts = AlertsFinder::new(&ability(), Some(&user), &scope, params)
            .execute()
            .load()
            .await
            .unwrap();

        assert_eq!(alerts.first().map(|a| a.severity), Some(AlertSeverity::Critical));
        assert_eq!(alerts.last().map(|a| a.severity), Some(AlertSeverity::Unknown));
    }

    #[test]
    fn stages_are_applied_in_order() {
        let scope = scope();
        let user = User::new(REPORTER, "reporter");
        let params = AlertParams::from_query("sort=created_desc&iid=3&status=triggered");
        let relation = AlertsFinder::new(&ability(), Some(&user), &scope, params).execute();

        let expected = scope
            .alert_management_alerts()
            .where_in("status", [AlertStatus::Triggered.code()])
            .where_eq("iid", 3_i64)
            .order_by("created_at", SortDirection::Desc);
        assert_eq!(relation.plan(), expected.plan());
    }
}
