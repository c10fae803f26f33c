use chrono::Utc;
use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Query,
};

use crate::{
    Currency, EngineError, Group, GroupRole, GroupSummary, Member, ResultEngine, User,
    expense_shares, expenses, group_memberships, groups, users,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a group; the caller becomes its owner.
    ///
    /// Group names are unique per creator (case-insensitive).
    pub async fn new_group(
        &self,
        name: &str,
        currency: Option<Currency>,
        user_id: &str,
    ) -> ResultEngine<String> {
        let name = normalize_required_name(name, "group")?;
        let now = Utc::now();
        let group = Group::new(name.clone(), currency.unwrap_or_default(), user_id, now);
        let group_id = group.id.clone();

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_unique_group_name(&db_tx, user_id, &name, None)
                .await?;

            groups::ActiveModel::from(&group).insert(&db_tx).await?;
            group_memberships::ActiveModel {
                group_id: ActiveValue::Set(group_id.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(GroupRole::Owner.as_str().to_string()),
                joined_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!("group {group_id} created by {user_id}");
            Ok(group_id)
        })
    }

    async fn ensure_unique_group_name(
        &self,
        db: &sea_orm::DatabaseTransaction,
        user_id: &str,
        name: &str,
        except_group_id: Option<&str>,
    ) -> ResultEngine<()> {
        // SQLite's LOWER() only folds ASCII, so names are compared here.
        let mut query = groups::Entity::find()
            .filter(groups::Column::CreatedBy.eq(user_id.to_string()));
        if let Some(group_id) = except_group_id {
            query = query.filter(groups::Column::Id.ne(group_id.to_string()));
        }
        let key = name.to_lowercase();
        let taken = query
            .all(db)
            .await?
            .iter()
            .any(|group| group.name.to_lowercase() == key);
        if taken {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Groups the caller belongs to, sorted by name.
    pub async fn list_groups(&self, user_id: &str) -> ResultEngine<Vec<GroupSummary>> {
        let rows = group_memberships::Entity::find()
            .filter(group_memberships::Column::UserId.eq(user_id.to_string()))
            .find_also_related(groups::Entity)
            .all(&self.database)
            .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for (membership, group) in rows {
            let Some(group) = group else {
                continue;
            };
            let member_count = group_memberships::Entity::find()
                .filter(group_memberships::Column::GroupId.eq(group.id.clone()))
                .count(&self.database)
                .await?;
            summaries.push(GroupSummary {
                role: membership.role()?,
                currency: group.currency()?,
                id: group.id,
                name: group.name,
                member_count,
            });
        }
        summaries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(summaries)
    }

    /// A group with its members: owner first, then by join date.
    pub async fn group(&self, group_id: &str, user_id: &str) -> ResultEngine<Group> {
        let (model, _) = self
            .require_group_member(&self.database, group_id, user_id)
            .await?;

        let rows = group_memberships::Entity::find()
            .filter(group_memberships::Column::GroupId.eq(group_id.to_string()))
            .find_also_related(users::Entity)
            .all(&self.database)
            .await?;

        let mut members = Vec::with_capacity(rows.len());
        for (membership, user) in rows {
            let user = user.ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            members.push(Member {
                role: membership.role()?,
                joined_at: membership.joined_at,
                user: User::from(user),
            });
        }
        members.sort_by(|a, b| {
            (a.role != GroupRole::Owner, a.joined_at, &a.user.id)
                .cmp(&(b.role != GroupRole::Owner, b.joined_at, &b.user.id))
        });

        Ok(Group {
            currency: model.currency()?,
            id: model.id,
            name: model.name,
            created_by: model.created_by,
            created_at: model.created_at,
            members,
        })
    }

    /// Renames a group (owner-only).
    pub async fn rename_group(&self, group_id: &str, name: &str, user_id: &str) -> ResultEngine<()> {
        let name = normalize_required_name(name, "group")?;
        with_tx!(self, |db_tx| {
            let model = self
                .require_group_owner(&db_tx, group_id, user_id, "rename it")
                .await?;
            self.ensure_unique_group_name(&db_tx, &model.created_by, &name, Some(group_id))
                .await?;

            groups::ActiveModel {
                id: ActiveValue::Set(model.id),
                name: ActiveValue::Set(name.clone()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(())
        })
    }

    /// Deletes a group and its whole ledger (owner-only).
    pub async fn delete_group(&self, group_id: &str, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_group_owner(&db_tx, group_id, user_id, "delete it")
                .await?;

            // Explicit cascade: shares, expenses, memberships, then the group.
            let group_expenses = Query::select()
                .column(expenses::Column::Id)
                .from(expenses::Entity)
                .and_where(expenses::Column::GroupId.eq(group_id.to_string()))
                .to_owned();
            expense_shares::Entity::delete_many()
                .filter(expense_shares::Column::ExpenseId.in_subquery(group_expenses))
                .exec(&db_tx)
                .await?;
            expenses::Entity::delete_many()
                .filter(expenses::Column::GroupId.eq(group_id.to_string()))
                .exec(&db_tx)
                .await?;
            group_memberships::Entity::delete_many()
                .filter(group_memberships::Column::GroupId.eq(group_id.to_string()))
                .exec(&db_tx)
                .await?;
            groups::Entity::delete_by_id(group_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!("group {group_id} deleted by {user_id}");
            Ok(())
        })
    }
}
