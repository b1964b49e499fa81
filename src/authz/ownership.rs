//! Ownership chain resolution
//! 理赔项通过所保物品找到保单：ClaimItem -> Item -> Policy -> 成员关系，每一跳按需加载

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::repository::{ItemRepository, PolicyRepository};

/// 归属链需要的查询，测试里可替换为内存实现
#[async_trait]
pub trait OwnerLookup: Send {
    /// 物品所属保单，物品不存在时为 `None`
    async fn find_item_policy_id(&mut self, item_id: Uuid) -> Result<Option<Uuid>>;
    async fn policy_exists(&mut self, policy_id: Uuid) -> Result<bool>;
    async fn is_policy_member(&mut self, policy_id: Uuid, user_id: Uuid) -> Result<bool>;
}

#[async_trait]
impl OwnerLookup for PgConnection {
    async fn find_item_policy_id(&mut self, item_id: Uuid) -> Result<Option<Uuid>> {
        ItemRepository::find_policy_id(self, item_id).await
    }

    async fn policy_exists(&mut self, policy_id: Uuid) -> Result<bool> {
        PolicyRepository::exists(self, policy_id).await
    }

    async fn is_policy_member(&mut self, policy_id: Uuid, user_id: Uuid) -> Result<bool> {
        PolicyRepository::is_member(self, policy_id, user_id).await
    }
}

/// 理赔项解析出的归属
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipChain {
    pub item_id: Uuid,
    pub policy_id: Uuid,
}

/// 物品 -> 保单。物品 ID 未设置时为 `None`；悬空引用属于内部查询失败，不能静默拒绝
pub async fn resolve_item_chain<L>(lookup: &mut L, item_id: Uuid) -> Result<Option<OwnershipChain>>
where
    L: OwnerLookup + ?Sized,
{
    if item_id.is_nil() {
        return Ok(None);
    }

    let policy_id = lookup.find_item_policy_id(item_id).await?.ok_or_else(|| {
        AppError::internal_error(&format!("claim item references missing item {}", item_id))
    })?;

    if !lookup.policy_exists(policy_id).await? {
        return Err(AppError::internal_error(&format!(
            "item {} references missing policy {}",
            item_id, policy_id
        )));
    }

    Ok(Some(OwnershipChain { item_id, policy_id }))
}

/// `user_id` 是否为 `item_id` 所属保单的成员
pub async fn is_member_through_item<L>(lookup: &mut L, item_id: Uuid, user_id: Uuid) -> Result<bool>
where
    L: OwnerLookup + ?Sized,
{
    match resolve_item_chain(lookup, item_id).await? {
        Some(chain) => lookup.is_policy_member(chain.policy_id, user_id).await,
        None => Ok(false),
    }
}

/// 直接按保单判断成员关系，nil 保单没有成员
pub async fn is_policy_member<L>(lookup: &mut L, policy_id: Uuid, user_id: Uuid) -> Result<bool>
where
    L: OwnerLookup + ?Sized,
{
    if policy_id.is_nil() {
        return Ok(false);
    }
    lookup.is_policy_member(policy_id, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeLookup {
        items: HashMap<Uuid, Uuid>,
        policies: HashSet<Uuid>,
        members: HashSet<(Uuid, Uuid)>,
        queries: usize,
        fail_items: bool,
    }

    #[async_trait]
    impl OwnerLookup for FakeLookup {
        async fn find_item_policy_id(&mut self, item_id: Uuid) -> Result<Option<Uuid>> {
            self.queries += 1;
            if self.fail_items {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            Ok(self.items.get(&item_id).copied())
        }

        async fn policy_exists(&mut self, policy_id: Uuid) -> Result<bool> {
            self.queries += 1;
            Ok(self.policies.contains(&policy_id))
        }

        async fn is_policy_member(&mut self, policy_id: Uuid, user_id: Uuid) -> Result<bool> {
            self.queries += 1;
            Ok(self.members.contains(&(policy_id, user_id)))
        }
    }

    fn fixture() -> (FakeLookup, Uuid, Uuid, Uuid) {
        let item = Uuid::new_v4();
        let policy = Uuid::new_v4();
        let user = Uuid::new_v4();
        let mut lookup = FakeLookup::default();
        lookup.items.insert(item, policy);
        lookup.policies.insert(policy);
        lookup.members.insert((policy, user));
        (lookup, item, policy, user)
    }

    #[tokio::test]
    async fn test_member_resolved_through_three_hops() {
        let (mut lookup, item, policy, user) = fixture();

        let chain = resolve_item_chain(&mut lookup, item).await.unwrap().unwrap();
        assert_eq!(chain.policy_id, policy);

        lookup.queries = 0;
        assert!(is_member_through_item(&mut lookup, item, user).await.unwrap());
        assert_eq!(lookup.queries, 3);
    }

    #[tokio::test]
    async fn test_stranger_is_not_member() {
        let (mut lookup, item, _, _) = fixture();
        assert!(!is_member_through_item(&mut lookup, item, Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_nil_item_is_not_member_and_queries_nothing() {
        let (mut lookup, _, _, user) = fixture();
        assert!(!is_member_through_item(&mut lookup, Uuid::nil(), user).await.unwrap());
        assert_eq!(lookup.queries, 0);
    }

    #[tokio::test]
    async fn test_missing_item_is_internal_failure() {
        let (mut lookup, _, _, user) = fixture();
        let err = is_member_through_item(&mut lookup, Uuid::new_v4(), user).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_missing_policy_is_internal_failure() {
        let (mut lookup, item, policy, user) = fixture();
        lookup.policies.remove(&policy);
        let err = is_member_through_item(&mut lookup, item, user).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_database_errors_propagate() {
        let (mut lookup, item, _, user) = fixture();
        lookup.fail_items = true;
        let err = is_member_through_item(&mut lookup, item, user).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_nil_policy_is_never_member() {
        let (mut lookup, _, _, user) = fixture();
        assert!(!is_policy_member(&mut lookup, Uuid::nil(), user).await.unwrap());
        assert_eq!(lookup.queries, 0);
    }
}
