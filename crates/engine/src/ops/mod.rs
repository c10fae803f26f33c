use chrono::TimeDelta;
use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod auth;
mod balances;
mod expenses;
mod groups;
mod members;

pub use auth::{LOGIN_CODE_MAX_ATTEMPTS, LoginChallenge, Session};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    login_code_ttl: TimeDelta,
    session_ttl: TimeDelta,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// How long a login code stays valid.
    pub fn login_code_ttl(&self) -> TimeDelta {
        self.login_code_ttl
    }

    /// How long a session token stays valid.
    pub fn session_ttl(&self) -> TimeDelta {
        self.session_ttl
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    login_code_ttl: TimeDelta,
    session_ttl: TimeDelta,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            login_code_ttl: TimeDelta::minutes(15),
            session_ttl: TimeDelta::days(30),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn login_code_ttl(mut self, ttl: TimeDelta) -> EngineBuilder {
        self.login_code_ttl = ttl;
        self
    }

    pub fn session_ttl(mut self, ttl: TimeDelta) -> EngineBuilder {
        self.session_ttl = ttl;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            login_code_ttl: self.login_code_ttl,
            session_ttl: self.session_ttl,
        })
    }
}
