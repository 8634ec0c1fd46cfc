//! [`Command`] for removing a [`Car`] from the fleet.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{car, Car},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`Car`] from the fleet.
///
/// The [`Car`] is only marked as deleted, so the history of its [`Rent`]s
/// stays intact. A [`Car`] being handed over to a customer cannot be
/// removed until it's returned.
///
/// [`Rent`]: crate::domain::Rent
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteCar {
    /// ID of the [`Car`] to remove.
    pub car_id: car::Id,
}

impl<Db> Command<DeleteCar> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Car, car::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Car>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Car;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteCar { car_id }: DeleteCar,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

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

        let mut car = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;
        if !car.available {
            return Err(tracerr::new!(E::CarNotAvailable(car_id)));
        }

        car.deleted_at = Some(DateTime::now().coerce());
        tx.execute(Update(car.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(car)
    }
}

/// Error of [`DeleteCar`] [`Command`] execution.
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
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::new_car, infra::memory, query,
        Command as _, Query as _,
    };

    use super::{DeleteCar, ExecutionError};

    #[tokio::test]
    async fn hides_deleted_car_and_frees_plate() {
        let service = memory::service();
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();

        drop(service.execute(DeleteCar { car_id: car.id }).await.unwrap());

        let found = service
            .execute(query::car::ById::by(car.id))
            .await
            .unwrap();
        assert!(found.is_none());
        let cars = service.execute(query::cars::List::by(())).await.unwrap();
        assert!(cars.is_empty());

        let err = service
            .execute(DeleteCar { car_id: car.id })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::CarNotExists(_)),
            "unexpected error: {err}",
        );

        drop(service.execute(new_car("AA-123-BB")).await.unwrap());
    }
}
