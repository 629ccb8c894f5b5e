use std::sync::Arc;

use finders_protocol::identity::User;
use finders_protocol::snippet::{Snippet, SnippetVisibility, SnippetsFinderParams};

use crate::ability::ProjectAuthorizations;
use crate::relation::{FieldValue, Filter, RecordSource, Relation};

/// Resolves which snippets an actor may see.
pub trait SnippetsFinder: Send + Sync {
    fn execute(&self, current_user: Option<&User>, params: &SnippetsFinderParams) -> Relation<Snippet>;
}

/// Visibility-level snippet finder.
///
/// * admins see everything;
/// * anonymous callers see public snippets;
/// * signed-in users see public and internal snippets, their own snippets and
///   the snippets of projects they belong to.
///
/// `authorized_and_user_personal` narrows signed-in users (admins included)
/// to their own personal snippets plus their projects' snippets.
#[derive(Clone)]
pub struct VisibilitySnippetsFinder {
    source: Arc<dyn RecordSource<Snippet>>,
    authorizations: Arc<dyn ProjectAuthorizations>,
}

impl VisibilitySnippetsFinder {
    pub fn new(
        source: Arc<dyn RecordSource<Snippet>>,
        authorizations: Arc<dyn ProjectAuthorizations>,
    ) -> Self {
        Self {
            source,
            authorizations,
        }
    }

    fn visible_to(&self, user: &User) -> Filter {
        Filter::Any(vec![
            Filter::is_in(
                "visibility_level",
                [
                    SnippetVisibility::Public.level(),
                    SnippetVisibility::Internal.level(),
                ],
            ),
            Filter::eq("author_id", user.id),
            self.authorized_projects(user),
        ])
    }

    fn authorized_and_personal(&self, user: &User) -> Filter {
        Filter::Any(vec![
            Filter::All(vec![
                Filter::eq("author_id", user.id),
                Filter::eq("project_id", FieldValue::Null),
            ]),
            self.authorized_projects(user),
        ])
    }

    fn authorized_projects(&self, user: &User) -> Filter {
        Filter::is_in("project_id", self.authorizations.authorized_project_ids(user))
    }
}

impl SnippetsFinder for VisibilitySnippetsFinder {
    fn execute(&self, current_user: Option<&User>, params: &SnippetsFinderParams) -> Relation<Snippet> {
        let mut relation = Relation::new(Arc::clone(&self.source));
        if let Some(author_id) = params.author_id {
            relation = relation.where_eq("author_id", author_id);
        }
        if let Some(project_id) = params.project_id {
            relation = relation.where_eq("project_id", project_id);
        }

        match current_user {
            None => relation.where_eq("visibility_level", SnippetVisibility::Public.level()),
            Some(user) if params.authorized_and_user_personal => {
                relation.filter(self.authorized_and_personal(user))
            }
            Some(user) if user.admin => relation,
            Some(user) => relation.filter(self.visible_to(user)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::RoleAbility;
    use crate::memory::MemorySource;
    use finders_protocol::identity::AccessLevel;

    const AUTHOR: i64 = 1;
    const MEMBER: i64 = 2;
    const STRANGER: i64 = 3;

    fn finder() -> VisibilitySnippetsFinder {
        let source = MemorySource::with_rows([
            Snippet::new(1, AUTHOR, "public personal").with_visibility(SnippetVisibility::Public),
            Snippet::new(2, AUTHOR, "internal personal").with_visibility(SnippetVisibility::Internal),
            Snippet::new(3, AUTHOR, "private personal"),
            Snippet::new(4, AUTHOR, "private project").in_project(50),
            Snippet::new(5, MEMBER, "member private personal"),
        ]);
        let ability = RoleAbility::new();
        ability.add_member(MEMBER, 50, AccessLevel::Guest);
        VisibilitySnippetsFinder::new(source.into_source(), Arc::new(ability))
    }

    async fn visible_ids(user: Option<&User>, params: SnippetsFinderParams) -> Vec<i64> {
        finder()
            .execute(user, &params)
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|snippet| snippet.id)
            .collect()
    }

    #[tokio::test]
    async fn anonymous_users_see_public_snippets() {
        assert_eq!(visible_ids(None, SnippetsFinderParams::default()).await, vec![1]);
    }

    #[tokio::test]
    async fn strangers_see_public_and_internal() {
        let stranger = User::new(STRANGER, "stranger");
        assert_eq!(
            visible_ids(Some(&stranger), SnippetsFinderParams::default()).await,
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn members_see_their_projects_and_their_own() {
        let member = User::new(MEMBER, "member");
        assert_eq!(
            visible_ids(Some(&member), SnippetsFinderParams::default()).await,
            vec![1, 2, 4, 5]
        );
    }

    #[tokio::test]
    async fn admins_see_everything_unless_narrowed() {
        let admin = User::admin(99, "root");
        assert_eq!(
            visible_ids(Some(&admin), SnippetsFinderParams::default()).await,
            vec![1, 2, 3, 4, 5]
        );

        let narrowed = SnippetsFinderParams {
            authorized_and_user_personal: true,
            ..SnippetsFinderParams::default()
        };
        assert!(visible_ids(Some(&admin), narrowed).await.is_empty());
    }

    #[tokio::test]
    async fn authorized_and_personal_excludes_other_public_snippets() {
        let member = User::new(MEMBER, "member");
        let params = SnippetsFinderParams {
            authorized_and_user_personal: true,
            ..SnippetsFinderParams::default()
        };
        assert_eq!(visible_ids(Some(&member), params).await, vec![4, 5]);
    }

    #[tokio::test]
    async fn author_param_narrows_results() {
        let stranger = User::new(STRANGER, "stranger");
        let params = SnippetsFinderParams {
            author_id: Some(MEMBER),
            ..SnippetsFinderParams::default()
        };
        assert!(visible_ids(Some(&stranger), params).await.is_empty());
    }
}
