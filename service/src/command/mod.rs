//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_car;
pub mod create_rent;
pub mod create_user;
pub mod create_user_session;
pub mod delete_car;
pub mod delete_rent;
pub mod delete_user;
pub mod deliver_car;
pub mod return_car;
pub mod update_car;
pub mod update_user;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_car::CreateCar,
    create_rent::CreateRent, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_car::DeleteCar,
    delete_rent::DeleteRent, delete_user::DeleteUser,
    deliver_car::DeliverCar, return_car::ReturnCar, update_car::UpdateCar,
    update_user::UpdateUser,
};

#[cfg(test)]
pub(crate) mod fixture {
    //! Shared inputs of [`Command`] tests.

    use common::Date;
    use secrecy::SecretBox;

    use crate::{
        domain::{car, rent, user, Rent},
        infra::memory,
    };

    use super::{Command as _, CreateCar, CreateRent, CreateUser};

    /// Parses a `YYYY-MM-DD` [`rent::Period`].
    pub(crate) fn period(begin: &str, end: &str) -> rent::Period {
        rent::Period::new(
            Date::from_iso8601(begin).unwrap().coerce(),
            Date::from_iso8601(end).unwrap().coerce(),
        )
        .unwrap()
    }

    /// [`CreateCar`] of a [`car::Segment::Standard`] car.
    pub(crate) fn new_car(plate: &str) -> CreateCar {
        CreateCar {
            brand: "Renault".parse().unwrap(),
            model: "Megane".parse().unwrap(),
            plate: plate.parse().unwrap(),
            segment: car::Segment::Standard,
            purchased_on: Date::from_iso8601("2023-03-15").unwrap().coerce(),
        }
    }

    pub(crate) fn new_user(email: &str) -> CreateUser {
        CreateUser {
            first_name: "Kate".parse().unwrap(),
            last_name: "Smith".parse().unwrap(),
            license_id: "B-1234567".parse().unwrap(),
            email: email.parse().unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new("Pa55word").unwrap(),
            )),
        }
    }

    /// Reserves a new car for `2024-05-01..2024-05-04` by a new customer.
    pub(crate) async fn reserved(service: &memory::Service) -> Rent {
        let car = service.execute(new_car("AA-123-BB")).await.unwrap();
        reserved_for(service, car.id, "2024-05-01").await
    }

    /// Reserves the `car_id` for three days since the `begin` by a new
    /// customer.
    pub(crate) async fn reserved_for(
        service: &memory::Service,
        car_id: car::Id,
        begin: &str,
    ) -> Rent {
        let user = service
            .execute(new_user(&format!("{}@example.com", user::Id::new())))
            .await
            .unwrap();
        let begin = Date::from_iso8601(begin).unwrap();
        let end = begin.checked_add_days(3).unwrap();

        service
            .execute(CreateRent {
                car_id,
                user_id: user.id,
                period: rent::Period::new(begin.coerce(), end.coerce())
                    .unwrap(),
            })
            .await
            .unwrap()
    }
}
