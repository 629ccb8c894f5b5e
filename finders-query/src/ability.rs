use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use finders_protocol::identity::{AccessLevel, Project, User};
use parking_lot::RwLock;

/// Capability a finder asks for before touching data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReadProject,
    ReadAlertManagementAlert,
}

impl Permission {
    /// Lowest membership level granting the permission.
    pub fn minimum_access(self) -> AccessLevel {
        match self {
            Permission::ReadProject => AccessLevel::Guest,
            Permission::ReadAlertManagementAlert => AccessLevel::Reporter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ReadProject => "read_project",
            Permission::ReadAlertManagementAlert => "read_alert_management_alert",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization check consulted by finders. Answers are not cached.
pub trait Ability: Send + Sync {
    fn allowed(&self, actor: Option<&User>, permission: Permission, project: &Project) -> bool;
}

/// Projects whose private content a user may read.
pub trait ProjectAuthorizations: Send + Sync {
    fn authorized_project_ids(&self, user: &User) -> Vec<i64>;
}

/// Membership-table ability: admins may do anything, members are checked
/// against the permission's minimum access level, everyone else is denied.
#[derive(Default, Clone)]
pub struct RoleAbility {
    memberships: Arc<RwLock<HashMap<i64, HashMap<i64, AccessLevel>>>>,
}

impl RoleAbility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or updates a user's membership in a project.
    pub fn add_member(&self, user_id: i64, project_id: i64, level: AccessLevel) {
        self.memberships
            .write()
            .entry(user_id)
            .or_default()
            .insert(project_id, level);
    }

    pub fn access_level(&self, user_id: i64, project_id: i64) -> Option<AccessLevel> {
        self.memberships
            .read()
            .get(&user_id)
            .and_then(|projects| projects.get(&project_id).copied())
    }
}

impl Ability for RoleAbility {
    fn allowed(&self, actor: Option<&User>, permission: Permission, project: &Project) -> bool {
        let Some(user) = actor else {
            return false;
        };
        if user.admin {
            return true;
        }
        self.access_level(user.id, project.id)
            .map(|level| level >= permission.minimum_access())
            .unwrap_or(false)
    }
}

impl ProjectAuthorizations for RoleAbility {
    fn authorized_project_ids(&self, user: &User) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .memberships
            .read()
            .get(&user.id)
            .map(|projects| projects.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}
