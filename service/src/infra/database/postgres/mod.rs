//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;
use tracing as log;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::{embed_migrations, Runner as Migrations};

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::{Config, PoolConfig};

/// Postgres [`Database`] client, either [`NonTx`] or [`Tx`].
#[derive(Clone, Copy, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client connecting lazily with the provided
    /// [`Config`].
    ///
    /// # Errors
    ///
    /// If the [`Config`] doesn't describe a valid connection pool.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }

    /// Applies the provided [`Migrations`] not applied to the database yet.
    ///
    /// # Errors
    ///
    /// If any of the [`Migrations`] fails, or diverges from the already
    /// applied one of the same version.
    pub async fn migrate(
        &self,
        migrations: &Migrations,
    ) -> Result<(), Traced<database::Error>> {
        let mut client = self.clone();
        let report = migrations
            .run_async(&mut client)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        for m in report.applied_migrations() {
            log::info!("applied `{m}` Postgres migration");
        }
        Ok(())
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// [`Migrations`] failed to apply.
    #[display("Failed to apply `Migrations`: {_0}")]
    Migration(refinery::Error),

    /// Error of creating a new [`connection::Pool`] client.
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),

    /// Statement issued through a [`Tx`] client after its commit.
    #[display("Transaction is committed already")]
    #[from(ignore)]
    Committed,
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique
    /// `constraint`, or of any unique constraint if it's [`None`].
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        let violated = e.as_db_error().and_then(|e| e.constraint());
        e.code() == Some(&SqlState::UNIQUE_VIOLATION)
            && constraint.map_or(true, |c| violated == Some(c))
    }
}
