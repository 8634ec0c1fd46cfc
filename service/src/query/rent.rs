//! [`Query`] collection related to a single [`Rent`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{rent, user, Rent},
    infra::{database, Database},
    Query, Service,
};
#[cfg(doc)]
use crate::domain::User;

/// [`Query`] of a [`Rent`] by its [`rent::Id`], optionally scoped to the
/// [`User`] owning it.
#[derive(Clone, Copy, Debug)]
pub struct ById {
    /// ID of the [`Rent`] to query.
    pub rent_id: rent::Id,

    /// ID of the [`User`] the [`Rent`] must belong to, if any.
    pub user_id: Option<user::Id>,
}

impl<Db> Query<ById> for Service<Db>
where
    Db: Database<
        Select<By<Option<Rent>, rent::Id>>,
        Ok = Option<Rent>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Rent;
    type Err = Traced<ByIdError>;

    async fn execute(
        &self,
        ById { rent_id, user_id }: ById,
    ) -> Result<Self::Ok, Self::Err> {
        use ByIdError as E;

        self.database()
            .execute(Select(By::<Option<Rent>, _>::new(rent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|r| user_id.is_none() || user_id == Some(r.user_id))
            .ok_or(E::RentNotExists(rent_id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`ById`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ByIdError {
    /// [`Rent`] with the provided ID does not exist, or belongs to another
    /// [`User`].
    #[display("`Rent(id: {_0})` does not exist")]
    RentNotExists(#[error(not(source))] rent::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
