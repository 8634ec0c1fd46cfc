//! [`Command`] for adding a new [`Car`] to the fleet.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::car::{Brand, Model, Plate, Segment};
use crate::{
    domain::{car, Car},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adding a new [`Car`] to the fleet.
#[derive(Clone, Debug)]
pub struct CreateCar {
    /// [`Brand`] of a new [`Car`].
    pub brand: car::Brand,

    /// [`Model`] of a new [`Car`].
    pub model: car::Model,

    /// Registration [`Plate`] of a new [`Car`], unique among non-deleted
    /// [`Car`]s.
    pub plate: car::Plate,

    /// Rental [`Segment`] of a new [`Car`].
    pub segment: car::Segment,

    /// Purchase date of a new [`Car`].
    pub purchased_on: car::PurchaseDate,
}

impl<Db> Command<CreateCar> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: for<'l> Database<
            Select<By<Option<Car>, &'l car::Plate>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<Insert<Car>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Car;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCar {
            brand,
            model,
            plate,
            segment,
            purchased_on,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::new(&plate)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::PlateOccupied(plate)));
        }

        let car = Car {
            id: car::Id::new(),
            brand,
            model,
            plate,
            segment,
            purchased_on,
            available: true,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        tx.execute(Insert(car.clone()))
            .await
            .map_err(|e| {
                // Lost a race against a concurrent insertion.
                if e.as_ref().is_unique_violation(None) {
                    tracerr::new!(E::PlateOccupied(car.plate.clone()))
                } else {
                    tracerr::map_from_and_wrap!(=> E)(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(car)
    }
}

/// Error of [`CreateCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`car::Plate`] is already registered for another [`Car`].
    #[display("`{_0}` plate is occupied")]
    PlateOccupied(#[error(not(source))] car::Plate),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::new_car, infra::memory, Command as _,
    };

    use super::ExecutionError;

    #[tokio::test]
    async fn creates_available_car() {
        let service = memory::service();

        let car = service.execute(new_car("AA-123-BB")).await.unwrap();

        assert!(car.available);
        assert!(car.deleted_at.is_none());
        assert_eq!(AsRef::<str>::as_ref(&car.plate), "AA-123-BB");
    }

    #[tokio::test]
    async fn rejects_occupied_plate() {
        let service = memory::service();
        drop(service.execute(new_car("AA-123-BB")).await.unwrap());

        // Plates are compared in normalized form.
        let err = service
            .execute(new_car("aa-123-bb"))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::PlateOccupied(_)),
            "unexpected error: {err}",
        );
    }
}
