//! Raw Postgres connections and the [`Connection`] abstraction over them.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Transaction opened on a [`Pooled`] connection, owning that connection
/// until it's committed or dropped.
///
/// Dropping it without committing rolls the transaction back.
#[self_referencing]
pub struct Session {
    /// [`Pooled`] connection the transaction is opened on.
    conn: Pooled,

    /// Open transaction, taken out on commit.
    #[borrows(mut conn)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_tx(|tx| {
            f.debug_struct("Session")
                .field("open", &tx.is_some())
                .finish_non_exhaustive()
        })
    }
}

impl Session {
    /// Opens a new [`Session`] on the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If Postgres refuses to start the transaction.
    pub async fn begin(conn: Pooled) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(conn, |c| c.transaction().map_ok(Some).boxed())
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Returns the open transaction of this [`Session`].
    ///
    /// # Panics
    ///
    /// Never, as [`Session::commit()`] consumes the [`Session`].
    fn tx(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_tx(|tx| tx.as_ref().expect("open until committed"))
    }

    /// Commits this [`Session`], releasing its [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If Postgres fails to commit the transaction.
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        let Some(tx) = self.with_tx_mut(|tx| tx.take()) else {
            return Ok(());
        };
        tx.commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Queries the provided statement inside this [`Session`].
    pub(super) async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error>
    where
        T: ToStatement + ?Sized,
    {
        self.tx().query(stmt, params).await
    }

    /// Queries the provided statement inside this [`Session`], expecting
    /// at most one row.
    pub(super) async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Error>
    where
        T: ToStatement + ?Sized,
    {
        self.tx().query_opt(stmt, params).await
    }

    /// Executes the provided statement inside this [`Session`].
    pub(super) async fn execute<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Error>
    where
        T: ToStatement + ?Sized,
    {
        self.tx().execute(stmt, params).await
    }

    /// Executes the provided batch of statements inside this [`Session`].
    pub(super) async fn batch_execute(&self, query: &str) -> Result<(), Error> {
        self.tx().batch_execute(query).await
    }
}

/// Postgres connection able to run SQL statements.
pub trait Connection {
    /// Runs the provided statement and returns all the resulting rows.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided statement and returns its single row, if any.
    ///
    /// # Errors
    ///
    /// If the statement fails or returns more than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided statement and returns the number of rows it touched.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the provided `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// If any of the statements fails.
    fn batch_exec(
        &self,
        stmt: &str,
    ) -> impl Future<Output = Result<(), Traced<database::Error>>>;
}
