use std::collections::HashSet;

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, GroupRole, ResultEngine, group_memberships, groups, users};

use super::Engine;

impl Engine {
    pub(super) async fn group_role<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<Option<GroupRole>> {
        let row = group_memberships::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref().map(group_memberships::Model::role).transpose()
    }

    /// Loads a group the caller belongs to.
    ///
    /// Non-members get the same error as for a missing group.
    pub(super) async fn require_group_member<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        user_id: &str,
    ) -> ResultEngine<(groups::Model, GroupRole)> {
        let not_found = || EngineError::KeyNotFound("group not exists".to_string());
        let role = self
            .group_role(db, group_id, user_id)
            .await?
            .ok_or_else(not_found)?;
        let model = groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        Ok((model, role))
    }

    pub(super) async fn require_group_owner<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        user_id: &str,
        action: &str,
    ) -> ResultEngine<groups::Model> {
        let (model, role) = self.require_group_member(db, group_id, user_id).await?;
        if !role.can_manage() {
            return Err(EngineError::Forbidden(format!(
                "only the group owner can {action}"
            )));
        }
        Ok(model)
    }

    pub(super) async fn member_ids<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
    ) -> ResultEngine<HashSet<String>> {
        let rows = group_memberships::Entity::find()
            .filter(group_memberships::Column::GroupId.eq(group_id.to_string()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    /// Every id in `user_ids` must be a member of the group.
    pub(super) async fn require_members<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: &str,
        user_ids: &[&str],
    ) -> ResultEngine<()> {
        let members = self.member_ids(db, group_id).await?;
        if let Some(outsider) = user_ids.iter().find(|id| !members.contains(**id)) {
            return Err(EngineError::InvalidSplit(format!(
                "user {outsider} is not a member of this group"
            )));
        }
        Ok(())
    }

    pub(super) async fn find_user_by_email<C: ConnectionTrait>(
        &self,
        db: &C,
        normalized_email: &str,
    ) -> ResultEngine<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(normalized_email.to_string()))
            .one(db)
            .await
            .map_err(Into::into)
    }

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
