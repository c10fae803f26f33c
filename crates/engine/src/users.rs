//! Users and their login sessions.
//!
//! Accounts are keyed by a stable UUID; the lowercased email is unique and is
//! what people type to log in. Logging in is passwordless: a one-time code
//! is stored on the user row and exchanged for a [`sessions`] token.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered (or invited) person.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            display_name: None,
            created_at,
        }
    }

    /// Name to show in lists: the display name, else the email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: Option<String>,
    pub login_code: Option<String>,
    pub login_code_expires_at: Option<DateTimeUtc>,
    /// Wrong codes entered against the current login code.
    pub login_code_attempts: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id.clone()),
            email: ActiveValue::Set(user.email.clone()),
            display_name: ActiveValue::Set(user.display_name.clone()),
            login_code: ActiveValue::Set(None),
            login_code_expires_at: ActiveValue::Set(None),
            login_code_attempts: ActiveValue::Set(0),
            created_at: ActiveValue::Set(user.created_at),
        }
    }
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_display_name() {
        let mut user = User::new("marie@example.fr".to_string(), Utc::now());
        assert_eq!(user.label(), "marie@example.fr");
        user.display_name = Some("Marie".to_string());
        assert_eq!(user.label(), "Marie");
    }
}
