//! Authable implementations
//! 每种资源有一个纯函数 `allows`，接收已解析的成员关系；
//! `is_actor_allowed_to` 只负责解析成员关系（管理员跳过）再委托给它

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::authable::{Authable, RequestMeta};
use super::ownership;
use super::permission::{Permission, SubResource};
use crate::error::{AppError, Result};
use crate::lifecycle::claim::claim_action_requirement;
use crate::lifecycle::item::is_item_action_allowed;
use crate::models::{
    Claim, ClaimItem, Item, LedgerReport, Policy, PolicyDependent, PolicyUser, Strike, User,
};
use crate::repository::{
    ClaimItemRepository, ClaimRepository, ItemRepository, LedgerRepository,
    PolicyDependentRepository, PolicyRepository, StrikeRepository, UserRepository,
};

fn found<T>(row: Option<T>, what: &str, id: Uuid) -> Result<T> {
    row.ok_or_else(|| AppError::not_found(&format!("{} {}", what, id)))
}

async fn membership(conn: &mut PgConnection, actor: &User, policy_id: Uuid) -> Result<bool> {
    if actor.is_admin() {
        return Ok(false);
    }
    ownership::is_policy_member(conn, policy_id, actor.id).await
}

impl Policy {
    pub fn allows(&self, actor: &User, is_member: bool, permission: Permission, sub: SubResource) -> bool {
        if actor.is_admin() {
            return true;
        }
        use SubResource as S;
        match (permission, sub) {
            // 任何登录用户都可以新建保单，列表按成员过滤
            (Permission::List, S::None) | (Permission::Create, S::None) => self.id.is_nil(),
            (Permission::View, S::None | S::Items | S::Claims | S::Dependents | S::Members | S::Strikes) => {
                is_member
            }
            (Permission::Update, S::None) => is_member,
            (Permission::Create, S::Items | S::Claims | S::Dependents) => is_member,
            _ => false,
        }
    }
}

#[async_trait]
impl Authable for Policy {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(PolicyRepository::find_by_id(conn, id).await?, "policy", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        let is_member = membership(conn, actor, self.id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl PolicyDependent {
    pub fn allows(&self, actor: &User, is_member: bool, permission: Permission, sub: SubResource) -> bool {
        if actor.is_admin() {
            return true;
        }
        matches!(
            (permission, sub),
            (Permission::View | Permission::Update | Permission::Delete, SubResource::None)
        ) && is_member
    }
}

#[async_trait]
impl Authable for PolicyDependent {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(PolicyDependentRepository::find_by_id(conn, id).await?, "policy dependent", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        let is_member = membership(conn, actor, self.policy_id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl PolicyUser {
    pub fn allows(&self, actor: &User, is_member: bool, permission: Permission, sub: SubResource) -> bool {
        if actor.is_admin() {
            return true;
        }
        matches!(
            (permission, sub),
            (Permission::View | Permission::Delete, SubResource::None)
        ) && is_member
    }
}

#[async_trait]
impl Authable for PolicyUser {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(PolicyRepository::find_member_by_id(conn, id).await?, "policy member", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        let is_member = membership(conn, actor, self.policy_id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl User {
    pub fn allows(&self, actor: &User, permission: Permission, sub: SubResource) -> bool {
        if actor.is_admin() {
            return true;
        }
        let is_self = !self.id.is_nil() && self.id == actor.id;
        is_self
            && matches!(
                (permission, sub),
                (Permission::View | Permission::Update, SubResource::None)
            )
    }
}

#[async_trait]
impl Authable for User {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(UserRepository::find_by_id(conn, id).await?, "user", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        _conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        Ok(self.allows(actor, permission, sub_resource))
    }
}

impl Item {
    pub fn allows(&self, actor: &User, is_member: bool, permission: Permission, sub: SubResource) -> bool {
        let is_admin = actor.is_admin();
        if permission.is_read() {
            return sub == SubResource::None && (is_admin || is_member);
        }
        if !is_admin && !is_member {
            return false;
        }
        is_item_action_allowed(is_admin, self.coverage_status, permission, sub)
    }
}

#[async_trait]
impl Authable for Item {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(ItemRepository::find_by_id(conn, id).await?, "item", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        let is_member = membership(conn, actor, self.policy_id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl Claim {
    pub fn allows(&self, actor: &User, is_member: bool, permission: Permission, sub: SubResource) -> bool {
        if permission.is_read() {
            return sub == SubResource::None && (actor.is_admin() || is_member);
        }
        match claim_action_requirement(self.status, permission, sub) {
            Some(requirement) => requirement.is_met_by(actor, is_member),
            None => false,
        }
    }
}

#[async_trait]
impl Authable for Claim {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(ClaimRepository::find_by_id(conn, id).await?, "claim", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        let is_member = membership(conn, actor, self.policy_id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl ClaimItem {
    pub fn allows(&self, actor: &User, is_member: bool, _permission: Permission, sub: SubResource) -> bool {
        if actor.is_admin() {
            return true;
        }
        sub == SubResource::None && is_member
    }
}

#[async_trait]
impl Authable for ClaimItem {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(ClaimItemRepository::find_by_id(conn, id).await?, "claim item", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        if actor.is_admin() {
            return Ok(true);
        }
        let is_member = ownership::is_member_through_item(conn, self.item_id, actor.id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl Strike {
    pub fn allows(&self, actor: &User, is_member: bool, permission: Permission, sub: SubResource) -> bool {
        if actor.is_admin() {
            return true;
        }
        permission == Permission::View && sub == SubResource::None && is_member
    }
}

#[async_trait]
impl Authable for Strike {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(StrikeRepository::find_by_id(conn, id).await?, "strike", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        let is_member = membership(conn, actor, self.policy_id).await?;
        Ok(self.allows(actor, is_member, permission, sub_resource))
    }
}

impl LedgerReport {
    pub fn allows(&self, actor: &User) -> bool {
        actor.is_admin()
    }
}

#[async_trait]
impl Authable for LedgerReport {
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self> {
        found(LedgerRepository::find_report(conn, id).await?, "ledger report", id)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    async fn is_actor_allowed_to(
        &self,
        _conn: &mut PgConnection,
        actor: &User,
        _permission: Permission,
        _sub_resource: SubResource,
        _req: &RequestMeta,
    ) -> Result<bool> {
        Ok(self.allows(actor))
    }
}
