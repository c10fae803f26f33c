//! Passwordless login.
//!
//! 1. [`Engine::request_login_code`] validates the login form, registers the
//!    address on first use and stores a short-lived 6-digit code.
//! 2. The code is delivered out of band (mail in production, logs locally).
//! 3. [`Engine::verify_login_code`] trades the code for a session token.
//!    After [`LOGIN_CODE_MAX_ATTEMPTS`] wrong guesses the code is discarded
//!    and a new one must be requested.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, LoginForm, ResultEngine, User, sessions, users, util::normalize_optional_text};

use super::{Engine, with_tx};

/// Wrong guesses allowed against one login code.
pub const LOGIN_CODE_MAX_ATTEMPTS: i32 = 5;

/// A freshly issued login code.
#[derive(Clone, Debug)]
pub struct LoginChallenge {
    pub user: User,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// `true` when this login registered the address.
    pub created: bool,
}

/// An authenticated session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

fn generate_login_code() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 1_000_000;
    format!("{value:06}")
}

fn generate_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn invalid_code() -> EngineError {
    EngineError::Unauthorized("invalid or expired login code".to_string())
}

impl Engine {
    /// Validates `form` and issues a login code for its address.
    pub async fn request_login_code(&self, form: &LoginForm) -> ResultEngine<LoginChallenge> {
        let login = form.parse()?;
        let email = login.email.normalized();
        let now = Utc::now();
        let code = generate_login_code();
        let expires_at = now + self.login_code_ttl;

        with_tx!(self, |db_tx| {
            let (model, created) = match self.find_user_by_email(&db_tx, &email).await? {
                Some(model) => (model, false),
                None => {
                    let user = User::new(email.clone(), now);
                    let model = users::ActiveModel::from(&user).insert(&db_tx).await?;
                    tracing::info!("registered user {}", model.id);
                    (model, true)
                }
            };

            let mut active: users::ActiveModel = model.into();
            active.login_code = ActiveValue::Set(Some(code.clone()));
            active.login_code_expires_at = ActiveValue::Set(Some(expires_at));
            active.login_code_attempts = ActiveValue::Set(0);
            let model = active.update(&db_tx).await?;

            Ok(LoginChallenge {
                user: model.into(),
                code,
                expires_at,
                created,
            })
        })
    }

    /// Registers an address without issuing a login code.
    ///
    /// Returns the account and whether it was created by this call.
    pub async fn register_user(&self, form: &LoginForm) -> ResultEngine<(User, bool)> {
        let email = form.parse()?.email.normalized();
        with_tx!(self, |db_tx| {
            if let Some(model) = self.find_user_by_email(&db_tx, &email).await? {
                return Ok((User::from(model), false));
            }
            let user = User::new(email.clone(), Utc::now());
            users::ActiveModel::from(&user).insert(&db_tx).await?;
            tracing::info!("registered user {}", user.id);
            Ok((user, true))
        })
    }

    /// Looks an account up by email, case-insensitively.
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<User> {
        self.find_user_by_email(&self.database, &email.trim().to_lowercase())
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Exchanges a login code for a session. The code can be used once.
    ///
    /// Wrong guesses are counted even though the call fails.
    pub async fn verify_login_code(&self, email: &str, code: &str) -> ResultEngine<Session> {
        let email = email.trim().to_lowercase();
        let now = Utc::now();

        let session = with_tx!(self, |db_tx| {
            let model = self
                .find_user_by_email(&db_tx, &email)
                .await?
                .ok_or_else(invalid_code)?;

            let code_matches = model.login_code.as_deref() == Some(code.trim());
            let code_alive = model.login_code_expires_at.is_some_and(|exp| exp > now);
            if code_matches && code_alive {
                self.open_session(&db_tx, model, now).await.map(Some)
            } else {
                self.record_failed_login(&db_tx, model).await.map(|()| None)
            }
        })?;

        session.ok_or_else(invalid_code)
    }

    async fn record_failed_login<C: ConnectionTrait>(
        &self,
        db: &C,
        model: users::Model,
    ) -> ResultEngine<()> {
        if model.login_code.is_none() {
            return Ok(());
        }

        let attempts = model.login_code_attempts.saturating_add(1);
        let user_id = model.id.clone();
        let mut active: users::ActiveModel = model.into();
        active.login_code_attempts = ActiveValue::Set(attempts);
        if attempts >= LOGIN_CODE_MAX_ATTEMPTS {
            active.login_code = ActiveValue::Set(None);
            active.login_code_expires_at = ActiveValue::Set(None);
            tracing::warn!("login code of user {user_id} discarded after {attempts} wrong guesses");
        }
        active.update(db).await?;
        Ok(())
    }

    async fn open_session<C: ConnectionTrait>(
        &self,
        db: &C,
        model: users::Model,
        now: DateTime<Utc>,
    ) -> ResultEngine<Session> {
        let user_id = model.id.clone();
        let mut active: users::ActiveModel = model.into();
        active.login_code = ActiveValue::Set(None);
        active.login_code_expires_at = ActiveValue::Set(None);
        active.login_code_attempts = ActiveValue::Set(0);
        let model = active.update(db).await?;

        sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id.clone()))
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(db)
            .await?;

        let session = sessions::ActiveModel {
            token: ActiveValue::Set(generate_session_token()),
            user_id: ActiveValue::Set(user_id),
            created_at: ActiveValue::Set(now),
            expires_at: ActiveValue::Set(now + self.session_ttl),
        }
        .insert(db)
        .await?;

        Ok(Session {
            token: session.token,
            user: model.into(),
            expires_at: session.expires_at,
        })
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> ResultEngine<User> {
        let unauthorized = || EngineError::Unauthorized("invalid session".to_string());
        let (session, user) = sessions::Entity::find_by_id(token.to_string())
            .find_also_related(users::Entity)
            .one(&self.database)
            .await?
            .ok_or_else(unauthorized)?;
        if session.expires_at <= Utc::now() {
            return Err(EngineError::Unauthorized("session expired".to_string()));
        }
        user.map(User::from).ok_or_else(unauthorized)
    }

    /// Ends a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> ResultEngine<()> {
        sessions::Entity::delete_by_id(token.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }

    pub async fn user(&self, user_id: &str) -> ResultEngine<User> {
        self.require_user(&self.database, user_id)
            .await
            .map(User::from)
    }

    /// Sets or clears the display name.
    pub async fn update_profile(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> ResultEngine<User> {
        let display_name = normalize_optional_text(display_name);
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            active.display_name = ActiveValue::Set(display_name);
            let model = active.update(&db_tx).await?;
            Ok(User::from(model))
        })
    }
}
