//! [`Query`] collection related to a single [`Car`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{car, rent, Car, Rent},
    infra::{database, Database},
    read::rent::{Colliding, Slot},
    Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`Car`] by its [`car::Id`].
pub type ById = DatabaseQuery<By<Option<Car>, car::Id>>;

/// [`Query`] checking whether a [`Car`] may be reserved for a
/// [`rent::Period`].
#[derive(Clone, Copy, Debug)]
pub struct Availability {
    /// ID of the [`Car`] to check.
    pub car_id: car::Id,

    /// [`rent::Period`] to check.
    pub period: rent::Period,
}

impl<Db> Query<Availability> for Service<Db>
where
    Db: Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Colliding<Rent>>, Slot>>,
            Ok = Option<Colliding<Rent>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = bool;
    type Err = Traced<AvailabilityError>;

    async fn execute(
        &self,
        Availability { car_id, period }: Availability,
    ) -> Result<Self::Ok, Self::Err> {
        use AvailabilityError as E;

        self.database()
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let colliding = self
            .database()
            .execute(Select(By::<Option<Colliding<Rent>>, _>::new(Slot {
                car_id,
                period,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(colliding.is_none())
    }
}

/// Error of [`Availability`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum AvailabilityError {
    /// [`Car`] with the provided ID does not exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
