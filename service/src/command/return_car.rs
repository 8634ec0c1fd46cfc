//! [`Command`] for bringing a handed over [`Car`] back.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{car, rent, Car, Rent},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for bringing the [`Car`] of a [`rent::Status::Active`]
/// [`Rent`] back.
///
/// The [`Rent::final_price`] is charged for the actual rental days and the
/// [`Car`] becomes available again.
#[derive(Clone, Copy, Debug, From)]
pub struct ReturnCar {
    /// ID of the [`Rent`] to bring the [`Car`] back by.
    pub rent_id: rent::Id,
}

impl<Db> Command<ReturnCar> for Service<Db>
where
    Db: Database<
            Select<By<Option<Rent>, rent::Id>>,
            Ok = Option<Rent>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Car, car::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rent>, rent::Id>>,
            Ok = Option<Rent>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Update<Rent>, Ok = (), Err = Traced<database::Error>>
        + Database<Update<Car>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Rent;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ReturnCar { rent_id }: ReturnCar,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let car_id = self
            .database()
            .execute(Select(By::<Option<Rent>, _>::new(rent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentNotExists(rent_id))
            .map_err(tracerr::wrap!())?
            .car_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Car`.
        tx.execute(Lock(By::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut rent = tx
            .execute(Select(By::<Option<Rent>, _>::new(rent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentNotExists(rent_id))
            .map_err(tracerr::wrap!())?;
        let status = rent.status();
        if status != rent::Status::Active {
            return Err(tracerr::new!(E::InvalidRentStatus(rent_id, status)));
        }

        let mut car = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;

        rent.finish(DateTime::now().coerce(), car.daily_price())
            .map_err(|e| tracerr::new!(E::InvalidRentStatus(rent_id, e.0)))?;
        car.available = true;

        tx.execute(Update(rent.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Update(car))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Car(id: {car_id})` returned by `Rent(id: {rent_id})`");

        Ok(rent)
    }
}

/// Error of [`ReturnCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] doesn't exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rent`] hasn't been delivered yet, or has been returned already.
    #[display("`Rent(id: {_0})` in `{_1}` status cannot return its `Car`")]
    InvalidRentStatus(rent::Id, rent::Status),

    /// [`Rent`] doesn't exist.
    #[display("`Rent(id: {_0})` does not exist")]
    RentNotExists(#[error(not(source))] rent::Id),
}
