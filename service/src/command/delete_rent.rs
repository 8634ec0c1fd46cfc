//! [`Command`] for cancelling a [`Rent`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
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

/// [`Command`] for cancelling a [`Rent`] whose [`Car`] hasn't been handed
/// over yet.
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteRent {
    /// ID of the [`Rent`] to cancel.
    pub rent_id: rent::Id,
}

impl<Db> Command<DeleteRent> for Service<Db>
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
            Delete<By<Rent, rent::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Rent;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteRent { rent_id }: DeleteRent,
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

        let rent = tx
            .execute(Select(By::<Option<Rent>, _>::new(rent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentNotExists(rent_id))
            .map_err(tracerr::wrap!())?;
        let status = rent.status();
        if status != rent::Status::Reserved {
            return Err(tracerr::new!(E::InvalidRentStatus(rent_id, status)));
        }

        tx.execute(Delete(By::<Rent, _>::new(rent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Rent(id: {rent_id})` of `Car(id: {car_id})` deleted");

        Ok(rent)
    }
}

/// Error of [`DeleteRent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Car`] of the [`Rent`] has been handed over already.
    #[display("`Rent(id: {_0})` in `{_1}` status cannot be deleted")]
    InvalidRentStatus(rent::Id, rent::Status),

    /// [`Rent`] doesn't exist.
    #[display("`Rent(id: {_0})` does not exist")]
    RentNotExists(#[error(not(source))] rent::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture::reserved, DeliverCar},
        domain::rent,
        infra::memory,
        query, Command as _, Query as _,
    };

    use super::{DeleteRent, ExecutionError};

    #[tokio::test]
    async fn cancels_reserved_rent() {
        let service = memory::service();
        let rent = reserved(&service).await;

        drop(service.execute(DeleteRent { rent_id: rent.id }).await.unwrap());

        let err = service
            .execute(query::rent::ById {
                rent_id: rent.id,
                user_id: None,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), query::rent::ByIdError::RentNotExists(_)),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn keeps_delivered_rent() {
        let service = memory::service();
        let rent = reserved(&service).await;
        drop(
            service
                .execute(DeliverCar { rent_id: rent.id })
                .await
                .unwrap(),
        );

        let err = service
            .execute(DeleteRent { rent_id: rent.id })
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::InvalidRentStatus(_, rent::Status::Active),
            ),
            "unexpected error: {err}",
        );
    }
}
