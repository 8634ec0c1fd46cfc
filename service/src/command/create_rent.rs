//! [`Command`] for reserving a [`Car`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{car, rent, user, Car, Rent, User},
    infra::{database, Database},
    read::rent::{Colliding, Slot},
    Service,
};

use super::Command;

/// [`Command`] for reserving a [`Car`] by a [`User`] for a [`rent::Period`].
#[derive(Clone, Copy, Debug)]
pub struct CreateRent {
    /// ID of the [`Car`] to reserve.
    pub car_id: car::Id,

    /// ID of the [`User`] reserving the [`Car`].
    pub user_id: user::Id,

    /// [`rent::Period`] to reserve the [`Car`] for.
    pub period: rent::Period,
}

impl<Db> Command<CreateRent> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Car, car::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Car>, car::Id>>,
            Ok = Option<Car>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Colliding<Rent>>, Slot>>,
            Ok = Option<Colliding<Rent>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Rent>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Rent;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRent) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRent {
            car_id,
            user_id,
            period,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reservations of the same `Car`, so the
        // availability check below stays valid until `Commit`.
        tx.execute(Lock(By::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let car = tx
            .execute(Select(By::<Option<Car>, _>::new(car_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CarNotExists(car_id))
            .map_err(tracerr::wrap!())?;

        let colliding = tx
            .execute(Select(By::<Option<Colliding<Rent>>, _>::new(Slot {
                car_id,
                period,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if colliding.is_some() {
            return Err(tracerr::new!(E::CarNotAvailable(car_id)));
        }

        tx.execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let rent = Rent {
            id: rent::Id::new(),
            car_id,
            user_id,
            period,
            expected_price: period.price(car.daily_price()),
            picked_up_at: None,
            returned_at: None,
            final_price: None,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(rent.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Car(id: {car_id})` reserved by `Rent(id: {})` for {}..{}",
            rent.id,
            period.begin(),
            period.end(),
        );

        Ok(rent)
    }
}

/// Error of [`CreateRent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Car`] is already reserved for a colliding [`rent::Period`].
    #[display("`Car(id: {_0})` is not available for the requested period")]
    CarNotAvailable(#[error(not(source))] car::Id),

    /// [`Car`] doesn't exist.
    #[display("`Car(id: {_0})` does not exist")]
    CarNotExists(#[error(not(source))] car::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};

    use crate::{
        command::fixture::{new_car, new_user, period},
        domain::{car, rent, user},
        infra::memory,
        Command as _,
    };

    use super::{CreateRent, ExecutionError};

    #[tokio::test]
    async fn reserves_car_at_expected_price() {
        let service = memory::service();
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();
        let user =
            service.execute(new_user("kate@example.com")).await.unwrap();

        let rent = service
            .execute(CreateRent {
                car_id: car.id,
                user_id: user.id,
                period: period("2024-05-01", "2024-05-04"),
            })
            .await
            .unwrap();

        assert_eq!(rent.status(), rent::Status::Reserved);
        assert_eq!(rent.expected_price, Money::whole(150, Currency::Eur));
        assert!(rent.final_price.is_none());
    }

    #[tokio::test]
    async fn rejects_colliding_period() {
        let service = memory::service();
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();
        let user =
            service.execute(new_user("kate@example.com")).await.unwrap();
        let reserve = |begin, end| CreateRent {
            car_id: car.id,
            user_id: user.id,
            period: period(begin, end),
        };
        drop(
            service
                .execute(reserve("2024-05-10", "2024-05-15"))
                .await
                .unwrap(),
        );

        for (begin, end) in [
            ("2024-05-12", "2024-05-20"),
            ("2024-05-01", "2024-05-10"),
            ("2024-05-15", "2024-05-15"),
        ] {
            let err = service.execute(reserve(begin, end)).await.unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::CarNotAvailable(_)),
                "unexpected error for {begin}..{end}: {err}",
            );
        }

        // Only the boundaries of a new period are checked.
        drop(
            service
                .execute(reserve("2024-05-01", "2024-05-20"))
                .await
                .unwrap(),
        );
        let err = service
            .execute(reserve("2024-05-16", "2024-05-16"))
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::CarNotAvailable(_)),
            "unexpected error: {err}",
        );
        drop(
            service
                .execute(reserve("2024-05-21", "2024-05-21"))
                .await
                .unwrap(),
        );
    }

    #[tokio::test]
    async fn checks_car_before_availability_before_user() {
        let service = memory::service();
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();
        let user =
            service.execute(new_user("kate@example.com")).await.unwrap();
        drop(
            service
                .execute(CreateRent {
                    car_id: car.id,
                    user_id: user.id,
                    period: period("2024-05-01", "2024-05-04"),
                })
                .await
                .unwrap(),
        );

        let err = service
            .execute(CreateRent {
                car_id: car::Id::new(),
                user_id: user::Id::new(),
                period: period("2024-05-01", "2024-05-04"),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::CarNotExists(_)),
            "unexpected error: {err}",
        );

        let err = service
            .execute(CreateRent {
                car_id: car.id,
                user_id: user::Id::new(),
                period: period("2024-05-01", "2024-05-04"),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::CarNotAvailable(_)),
            "unexpected error: {err}",
        );

        let err = service
            .execute(CreateRent {
                car_id: car.id,
                user_id: user::Id::new(),
                period: period("2024-06-01", "2024-06-04"),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::UserNotExists(_)),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn concurrent_reservations_book_car_once() {
        let service = memory::service();
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();
        let user =
            service.execute(new_user("kate@example.com")).await.unwrap();
        let cmd = CreateRent {
            car_id: car.id,
            user_id: user.id,
            period: period("2024-05-01", "2024-05-04"),
        };

        let (first, second) =
            tokio::join!(service.execute(cmd), service.execute(cmd));

        let errs = [first, second]
            .into_iter()
            .filter_map(Result::err)
            .collect::<Vec<_>>();
        assert_eq!(errs.len(), 1, "exactly one reservation must succeed");
        assert!(
            matches!(errs[0].as_ref(), ExecutionError::CarNotAvailable(_)),
            "unexpected error: {}",
            errs[0],
        );
    }
}
