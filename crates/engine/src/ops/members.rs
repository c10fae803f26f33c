use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, GroupRole, ResultEngine, User, group_memberships, users, validation::Email,
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds a member by email (owner-only).
    ///
    /// An address nobody has logged in with yet gets an invited account; it
    /// is claimed on the first login with that address.
    pub async fn add_member(&self, group_id: &str, email: &str, user_id: &str) -> ResultEngine<User> {
        let email = Email::parse_field("email", email)?.normalized();
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, user_id, "add members")
                .await?;

            let model = match self.find_user_by_email(&db_tx, &email).await? {
                Some(model) => model,
                None => {
                    let user = User::new(email.clone(), now);
                    let model = users::ActiveModel::from(&user).insert(&db_tx).await?;
                    tracing::info!("invited user {} into group {group_id}", model.id);
                    model
                }
            };

            if self.group_role(&db_tx, group_id, &model.id).await?.is_some() {
                return Err(EngineError::ExistingKey(email.clone()));
            }

            group_memberships::ActiveModel {
                group_id: ActiveValue::Set(group_id.to_string()),
                user_id: ActiveValue::Set(model.id.clone()),
                role: ActiveValue::Set(GroupRole::Member.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            Ok(User::from(model))
        })
    }

    /// Removes `member_id` from the group.
    ///
    /// The owner can remove anyone but themselves; other members can only
    /// leave. A member with a non-zero balance must settle first.
    pub async fn remove_member(
        &self,
        group_id: &str,
        member_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let (_, role) = self.require_group_member(&db_tx, group_id, user_id).await?;
            if member_id != user_id && !role.can_manage() {
                return Err(EngineError::Forbidden(
                    "only the group owner can remove members".to_string(),
                ));
            }

            let member_role = self
                .group_role(&db_tx, group_id, member_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?;
            if member_role == GroupRole::Owner {
                return Err(EngineError::Forbidden(
                    "the group owner cannot be removed".to_string(),
                ));
            }

            let balances = self.ledger_balances(&db_tx, group_id).await?;
            let net = balances
                .iter()
                .find(|b| b.user_id == member_id)
                .map_or(0, |b| b.net_minor);
            if net != 0 {
                return Err(EngineError::InvalidAmount(format!(
                    "member balance must be settled first (net {net})"
                )));
            }

            group_memberships::Entity::delete_by_id((group_id.to_string(), member_id.to_string()))
                .exec(&db_tx)
                .await?;
            tracing::info!("user {member_id} removed from group {group_id} by {user_id}");
            Ok(())
        })
    }
}
