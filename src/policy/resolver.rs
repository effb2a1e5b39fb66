use tracing::debug;

use super::clause::{build_clauses, PolicyClause};
use super::error::PolicyError;
use super::types::{ContentPolicy, PolicyScope};
use crate::database::models::ChildProfile;
use crate::database::store::ChildProfileStore;

/// Everything a request needs to know about who is watching.
///
/// Resolved once per request; favorites, history and quiz attempts use
/// `active_child` so they always refer to the child the policy came from.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub active_child: Option<ChildProfile>,
    pub scope: PolicyScope,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            active_child: None,
            scope: PolicyScope::Unrestricted,
        }
    }

    pub fn active_child_id(&self) -> Option<&str> {
        self.active_child.as_ref().map(|c| c.id.as_str())
    }

    pub fn clauses(&self) -> Vec<PolicyClause> {
        build_clauses(&self.scope)
    }
}

pub struct PolicyResolver<'a, S: ChildProfileStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ChildProfileStore + ?Sized> PolicyResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The explicitly selected child if the user still owns it, else the
    /// user's earliest-created child.
    pub async fn active_child(
        &self,
        user_id: &str,
        selection: Option<&str>,
    ) -> Result<Option<ChildProfile>, PolicyError> {
        if let Some(child_id) = selection.filter(|id| !id.is_empty()) {
            if let Some(child) = self.store.find_owned_child(user_id, child_id).await? {
                return Ok(Some(child));
            }
            debug!("Active child selection {} is not owned by user {}, falling back", child_id, user_id);
        }

        Ok(self.store.first_child(user_id).await?)
    }

    pub async fn resolve(&self, user_id: Option<&str>, selection: Option<&str>) -> Result<PolicyScope, PolicyError> {
        let user_id = match user_id {
            Some(id) => id,
            None => return Ok(PolicyScope::Unrestricted),
        };
        match self.active_child(user_id, selection).await? {
            Some(child) => Ok(PolicyScope::Restricted(ContentPolicy::from_child(&child)?)),
            None => Ok(PolicyScope::Unrestricted),
        }
    }

    /// Like [`resolve`](Self::resolve), keeping the user and child alongside the scope
    pub async fn viewer(&self, user_id: Option<String>, selection: Option<&str>) -> Result<Viewer, PolicyError> {
        let user_id = match user_id {
            Some(id) => id,
            None => return Ok(Viewer::anonymous()),
        };

        let active_child = self.active_child(&user_id, selection).await?;
        let scope = match &active_child {
            Some(child) => PolicyScope::Restricted(ContentPolicy::from_child(child)?),
            None => PolicyScope::Unrestricted,
        };

        Ok(Viewer {
            user_id: Some(user_id),
            active_child,
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AgeGroup;
    use crate::testing::MemoryStore;
    use chrono::Duration;

    #[tokio::test]
    async fn anonymous_requests_are_unrestricted() {
        let store = MemoryStore::new();
        let resolver = PolicyResolver::new(&store);

        assert_eq!(resolver.resolve(None, Some("child_1")).await.unwrap(), PolicyScope::Unrestricted);
        let viewer = resolver.viewer(None, None).await.unwrap();
        assert!(viewer.user_id.is_none());
        assert!(viewer.clauses().is_empty());
    }

    #[tokio::test]
    async fn childless_account_is_unrestricted() {
        let store = MemoryStore::new();
        store.add_user("parent").await;

        let scope = PolicyResolver::new(&store).resolve(Some("parent"), None).await.unwrap();
        assert_eq!(scope, PolicyScope::Unrestricted);
    }

    #[tokio::test]
    async fn falls_back_to_earliest_created_child() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_child_at("middle", "parent", &["7-9"], false, Duration::minutes(-10)).await;
        store.add_child_at("oldest", "parent", &["4-6"], true, Duration::minutes(-30)).await;
        store.add_child_at("newest", "parent", &["10-13"], false, Duration::minutes(-1)).await;

        let resolver = PolicyResolver::new(&store);
        for _ in 0..3 {
            let scope = resolver.resolve(Some("parent"), None).await.unwrap();
            let policy = scope.policy().expect("restricted");
            assert_eq!(policy.child_id, "oldest");
            assert_eq!(policy.allowed_age_groups, vec![AgeGroup::Preschool]);
            assert!(policy.educational_only);
        }
    }

    #[tokio::test]
    async fn explicit_selection_wins_when_owned() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_child_at("first", "parent", &["4-6"], false, Duration::minutes(-30)).await;
        store.add_child_at("second", "parent", &["10-13"], false, Duration::minutes(-5)).await;

        let viewer = PolicyResolver::new(&store)
            .viewer(Some("parent".to_string()), Some("second"))
            .await
            .unwrap();
        assert_eq!(viewer.active_child_id(), Some("second"));
        assert_eq!(viewer.clauses(), vec![PolicyClause::AgeGroupIn(vec![AgeGroup::Middle])]);
    }

    #[tokio::test]
    async fn stale_selection_falls_back_instead_of_failing() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_user("stranger").await;
        store.add_child_at("mine", "parent", &["4-6"], false, Duration::minutes(-30)).await;
        store.add_child_at("theirs", "stranger", &["10-13"], false, Duration::minutes(-60)).await;

        let resolver = PolicyResolver::new(&store);
        let viewer = resolver.viewer(Some("parent".to_string()), Some("theirs")).await.unwrap();
        assert_eq!(viewer.active_child_id(), Some("mine"));

        let viewer = resolver.viewer(Some("parent".to_string()), Some("deleted")).await.unwrap();
        assert_eq!(viewer.active_child_id(), Some("mine"));
    }

    #[tokio::test]
    async fn store_failure_is_not_downgraded_to_unrestricted() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_child_at("kid", "parent", &["4-6"], true, Duration::minutes(-30)).await;
        store.set_unavailable(true);

        let result = PolicyResolver::new(&store).resolve(Some("parent"), None).await;
        assert!(matches!(result, Err(PolicyError::Store(_))));
    }

    #[tokio::test]
    async fn corrupt_settings_fail_the_resolution() {
        let store = MemoryStore::new();
        store.add_user("parent").await;
        store.add_child_at("kid", "parent", &["4-6", "adults"], false, Duration::minutes(-30)).await;

        let result = PolicyResolver::new(&store).viewer(Some("parent".to_string()), None).await;
        assert!(matches!(result, Err(PolicyError::InvalidSettings { .. })));
    }
}
