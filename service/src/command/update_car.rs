//! [`Command`] for updating a [`Car`] of the fleet.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for updating a [`Car`] of the fleet.
///
/// Only the provided fields are changed. [`Car::available`] flag is owned by
/// the rent lifecycle and cannot be changed here.
#[derive(Clone, Debug, Default)]
pub struct UpdateCar {
    /// ID of the [`Car`] to update.
    pub car_id: car::Id,

    /// New [`Brand`] of the [`Car`].
    pub brand: Option<car::Brand>,

    /// New [`Model`] of the [`Car`].
    pub model: Option<car::Model>,

    /// New registration [`Plate`] of the [`Car`].
    pub plate: Option<car::Plate>,

    /// New rental [`Segment`] of the [`Car`].
    pub segment: Option<car::Segment>,

    /// New purchase date of the [`Car`].
    pub purchased_on: Option<car::PurchaseDate>,
}

impl<Db> Command<UpdateCar> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<Car>, &'l car::Plate>>,
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

    async fn execute(&self, cmd: UpdateCar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateCar {
            car_id,
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

        if let Some(plate) = plate.filter(|p| *p != car.plate) {
            let occupied = tx
                .execute(Select(By::new(&plate)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if occupied.is_some() {
                return Err(tracerr::new!(E::PlateOccupied(plate)));
            }
            car.plate = plate;
        }
        if let Some(brand) = brand {
            car.brand = brand;
        }
        if let Some(model) = model {
            car.model = model;
        }
        if let Some(segment) = segment {
            car.segment = segment;
        }
        if let Some(date) = purchased_on {
            car.purchased_on = date;
        }

        tx.execute(Update(car.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(car)
    }
}

/// Error of [`UpdateCar`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] doesn't exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

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
        command::fixture::new_car, domain::car, infra::memory,
        Command as _,
    };

    use super::{ExecutionError, UpdateCar};

    #[tokio::test]
    async fn changes_segment_and_keeps_rest() {
        let service = memory::service();
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();

        let updated = service
            .execute(UpdateCar {
                car_id: car.id,
                segment: Some(car::Segment::Luxury),
                ..UpdateCar::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.segment, car::Segment::Luxury);
        assert_eq!(updated.plate, car.plate);
        assert_eq!(updated.daily_price(), car::Segment::Luxury.daily_price());
    }

    #[tokio::test]
    async fn keeps_plate_unique() {
        let service = memory::service();
        drop(service.execute(new_car("AA-123-BB")).await.unwrap());
        let car = service.execute(new_car("CC-456-DD")).await.unwrap();

        let err = service
            .execute(UpdateCar {
                car_id: car.id,
                plate: Some("AA-123-BB".parse().unwrap()),
                ..UpdateCar::default()
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::PlateOccupied(_)),
            "unexpected error: {err}",
        );

        let err = service
            .execute(UpdateCar {
                car_id: car::Id::new(),
                ..UpdateCar::default()
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::CarNotExists(_)),
            "unexpected error: {err}",
        );
    }
}
