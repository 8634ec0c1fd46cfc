//! [`Command`] for handing a reserved [`Car`] over to its customer.

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

/// [`Command`] for handing the [`Car`] of a [`rent::Status::Reserved`]
/// [`Rent`] over to its customer.
///
/// The [`Car`] becomes unavailable until it's returned.
#[derive(Clone, Copy, Debug, From)]
pub struct DeliverCar {
    /// ID of the [`Rent`] to hand the [`Car`] over by.
    pub rent_id: rent::Id,
}

impl<Db> Command<DeliverCar> for Service<Db>
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
        DeliverCar { rent_id }: DeliverCar,
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
        let mut car = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;
        if !car.available {
            return Err(tracerr::new!(E::CarNotAvailable(car_id)));
        }

        rent.pick_up(DateTime::now().coerce())
            .map_err(|e| tracerr::new!(E::InvalidRentStatus(rent_id, e.0)))?;
        car.available = false;

        tx.execute(Update(rent.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Update(car))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Car(id: {car_id})` delivered by `Rent(id: {rent_id})`");

        Ok(rent)
    }
}

/// Error of [`DeliverCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] is handed over to a customer at the moment.
    #[display("`Car(id: {_0})` is not available")]
    CarNotAvailable(#[error(not(source))] car::Id),

    /// [`Car`] doesn't exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rent`] has been completed already.
    #[display("`Rent(id: {_0})` in `{_1}` status cannot deliver its `Car`")]
    InvalidRentStatus(rent::Id, rent::Status),

    /// [`Rent`] doesn't exist.
    #[display("`Rent(id: {_0})` does not exist")]
    RentNotExists(#[error(not(source))] rent::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{reserved, reserved_for},
        domain::rent,
        infra::memory,
        query, Command as _, Query as _,
    };

    use super::{DeliverCar, ExecutionError};

    #[tokio::test]
    async fn hands_car_over() {
        let service = memory::service();
        let rent = reserved(&service).await;

        let delivered = service
            .execute(DeliverCar { rent_id: rent.id })
            .await
            .unwrap();

        assert_eq!(delivered.status(), rent::Status::Active);
        let car = service
            .execute(query::car::ById::by(rent.car_id))
            .await
            .unwrap()
            .unwrap();
        assert!(!car.available);
    }

    #[tokio::test]
    async fn refuses_car_being_out() {
        let service = memory::service();
        let rent = reserved(&service).await;
        let other = reserved_for(&service, rent.car_id, "2024-06-01").await;
        drop(
            service
                .execute(DeliverCar { rent_id: rent.id })
                .await
                .unwrap(),
        );

        for rent_id in [rent.id, other.id] {
            let err = service
                .execute(DeliverCar { rent_id })
                .await
                .unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::CarNotAvailable(_)),
                "unexpected error: {err}",
            );
        }
    }

    #[tokio::test]
    async fn fails_on_unknown_rent() {
        let service = memory::service();

        let err = service
            .execute(DeliverCar {
                rent_id: rent::Id::new(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::RentNotExists(_)),
            "unexpected error: {err}",
        );
    }
}
