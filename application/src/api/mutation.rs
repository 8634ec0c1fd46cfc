//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided credentials and opens a
    /// `Session` for it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied by another
    ///                      `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            first_name = %first_name,
            gql.name = "createUser",
            last_name = %last_name,
            license_id = %license_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user(
        first_name: api::user::Name,
        last_name: api::user::Name,
        license_id: api::user::LicenseId,
        email: api::user::Email,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                first_name: first_name.into(),
                last_name: last_name.into(),
                license_id: license_id.into(),
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        });

        Ok(output.into())
    }

    /// Creates a new `Session` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        email: api::user::Email,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        });

        Ok(output.into())
    }

    /// Updates the provided fields of the specified `User`, leaving the rest
    /// untouched.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist;
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied by another
    ///                      `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = ?email,
            first_name = ?first_name,
            gql.name = "updateUser",
            id = %id,
            last_name = ?last_name,
            license_id = ?license_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_user(
        id: api::user::Id,
        first_name: Option<api::user::Name>,
        last_name: Option<api::user::Name>,
        license_id: Option<api::user::LicenseId>,
        email: Option<api::user::Email>,
        password: Option<api::user::Password>,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::UpdateUser {
                user_id: id.into(),
                first_name: first_name.map(Into::into),
                last_name: last_name.map(Into::into),
                license_id: license_id.map(Into::into),
                email: email.map(Into::into),
                password: password.map(|p| {
                    secrecy::SecretBox::init_with(move || p.into())
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteUser",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::DeleteUser { user_id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Adds a new `Car` to the fleet.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PLATE_OCCUPIED` - provided `CarPlate` is occupied by another `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            brand = %brand,
            gql.name = "createCar",
            model = %model,
            otel.name = Self::SPAN_NAME,
            plate = %plate,
            purchased_on = %purchased_on,
            segment = ?segment,
        ),
    )]
    pub async fn create_car(
        brand: api::car::Brand,
        model: api::car::Model,
        plate: api::car::Plate,
        segment: api::car::Segment,
        purchased_on: Date,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::CreateCar {
                brand: brand.into(),
                model: model.into(),
                plate: plate.into(),
                segment: segment.into(),
                purchased_on: purchased_on.coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided fields of the specified `Car`, leaving the rest
    /// untouched.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CAR_NOT_EXISTS` - the `Car` with the specified ID does not exist;
    /// - `PLATE_OCCUPIED` - provided `CarPlate` is occupied by another `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            brand = ?brand,
            gql.name = "updateCar",
            id = %id,
            model = ?model,
            otel.name = Self::SPAN_NAME,
            plate = ?plate,
            purchased_on = ?purchased_on,
            segment = ?segment,
        ),
    )]
    pub async fn update_car(
        id: api::car::Id,
        brand: Option<api::car::Brand>,
        model: Option<api::car::Model>,
        plate: Option<api::car::Plate>,
        segment: Option<api::car::Segment>,
        purchased_on: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::UpdateCar {
                car_id: id.into(),
                brand: brand.map(Into::into),
                model: model.map(Into::into),
                plate: plate.map(Into::into),
                segment: segment.map(Into::into),
                purchased_on: purchased_on.map(Date::coerce),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Removes the specified `Car` from the fleet.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CAR_NOT_EXISTS` - the `Car` with the specified ID does not exist;
    /// - `CAR_NOT_AVAILABLE` - the `Car` is handed over to some `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteCar",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_car(
        id: api::car::Id,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::DeleteCar { car_id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reserves the specified `Car` for the specified `User` from `beginDate`
    /// until `endDate` inclusively.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PERIOD` - `beginDate` follows `endDate`;
    /// - `CAR_NOT_EXISTS` - the `Car` with the specified ID does not exist;
    /// - `CAR_NOT_AVAILABLE` - the `Car` is already reserved on `beginDate`
    ///                         or `endDate`;
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            begin_date = %begin_date,
            car_id = %car_id,
            end_date = %end_date,
            gql.name = "createRent",
            otel.name = Self::SPAN_NAME,
            user_id = %user_id,
        ),
    )]
    pub async fn create_rent(
        car_id: api::car::Id,
        user_id: api::user::Id,
        begin_date: Date,
        end_date: Date,
        ctx: &Context,
    ) -> Result<api::Rent, Error> {
        _ = ctx.current_session().await?;
        let period =
            api::rent::period(begin_date, end_date).map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateRent {
                car_id: car_id.into(),
                user_id: user_id.into(),
                period,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Hands the `Car` of the specified `Rent` over to its `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_NOT_EXISTS` - the `Rent` with the specified ID does not exist;
    /// - `CAR_NOT_EXISTS` - the `Car` of the `Rent` does not exist anymore;
    /// - `CAR_NOT_AVAILABLE` - the `Car` is handed over to some `User`
    ///                         already;
    /// - `INVALID_RENT_STATUS` - the `Rent` is not `RESERVED`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deliverCar",
            otel.name = Self::SPAN_NAME,
            rent_id = %rent_id,
        ),
    )]
    pub async fn deliver_car(
        rent_id: api::rent::Id,
        ctx: &Context,
    ) -> Result<api::Rent, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::DeliverCar {
                rent_id: rent_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Takes the `Car` of the specified `Rent` back, charging the actual
    /// rental days.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_NOT_EXISTS` - the `Rent` with the specified ID does not exist;
    /// - `CAR_NOT_EXISTS` - the `Car` of the `Rent` does not exist anymore;
    /// - `INVALID_RENT_STATUS` - the `Rent` is not `ACTIVE`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "returnCar",
            otel.name = Self::SPAN_NAME,
            rent_id = %rent_id,
        ),
    )]
    pub async fn return_car(
        rent_id: api::rent::Id,
        ctx: &Context,
    ) -> Result<api::Rent, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::ReturnCar {
                rent_id: rent_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the specified `Rent`, while its `Car` is not handed over yet.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_NOT_EXISTS` - the `Rent` with the specified ID does not exist;
    /// - `INVALID_RENT_STATUS` - the `Car` of the `Rent` was handed over
    ///                           already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteRent",
            otel.name = Self::SPAN_NAME,
            rent_id = %rent_id,
        ),
    )]
    pub async fn delete_rent(
        rent_id: api::rent::Id,
        ctx: &Context,
    ) -> Result<api::Rent, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(command::DeleteRent {
                rent_id: rent_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum CarError {
        #[code = "CAR_NOT_AVAILABLE"]
        #[status = CONFLICT]
        #[message = "`Car` is not available"]
        NotAvailable,

        #[code = "CAR_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the provided ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RentError {
        #[code = "INVALID_RENT_STATUS"]
        #[status = CONFLICT]
        #[message = "`Rent` cannot be changed in its current status"]
        InvalidStatus,

        #[code = "RENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Rent` with the provided ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the provided ID does not exist"]
        NotExists,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Provided `UserEmail` is occupied by another \
                             `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::PasswordHash(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::update_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Provided `UserEmail` is occupied by another \
                             `User`"]
                EmailOccupied,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::EmailOccupied(_) => Error::EmailOccupied.into(),
            Self::PasswordHash(_) => return None,
            Self::UserNotExists(_) => UserError::NotExists.into(),
        })
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
        }
    }
}

impl AsError for command::create_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PLATE_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Provided `CarPlate` is occupied by another `Car`"]
                PlateOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PlateOccupied(_) => Some(Error::PlateOccupied.into()),
        }
    }
}

impl AsError for command::update_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PLATE_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Provided `CarPlate` is occupied by another `Car`"]
                PlateOccupied,
            }
        }

        Some(match self {
            Self::CarNotExists(_) => CarError::NotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::PlateOccupied(_) => Error::PlateOccupied.into(),
        })
    }
}

impl AsError for command::delete_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::CarNotAvailable(_) => CarError::NotAvailable.into(),
            Self::CarNotExists(_) => CarError::NotExists.into(),
            Self::Db(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::create_rent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::CarNotAvailable(_) => CarError::NotAvailable.into(),
            Self::CarNotExists(_) => CarError::NotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::UserNotExists(_) => UserError::NotExists.into(),
        })
    }
}

impl AsError for command::deliver_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::CarNotAvailable(_) => CarError::NotAvailable.into(),
            Self::CarNotExists(_) => CarError::NotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidRentStatus(..) => RentError::InvalidStatus.into(),
            Self::RentNotExists(_) => RentError::NotExists.into(),
        })
    }
}

impl AsError for command::return_car::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_RENT_STATUS"]
                #[status = CONFLICT]
                #[message = "Cannot return `Car` in current `Rent` status"]
                InvalidRentStatus,
            }
        }

        Some(match self {
            Self::CarNotExists(_) => CarError::NotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidRentStatus(..) => Error::InvalidRentStatus.into(),
            Self::RentNotExists(_) => RentError::NotExists.into(),
        })
    }
}

impl AsError for command::delete_rent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_RENT_STATUS"]
                #[status = CONFLICT]
                #[message = "Cannot delete `Rent` whose `Car` was delivered \
                             already"]
                InvalidRentStatus,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidRentStatus(..) => Error::InvalidRentStatus.into(),
            Self::RentNotExists(_) => RentError::NotExists.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command,
        domain::{car, rent},
    };

    use crate::AsError as _;

    #[test]
    fn maps_rent_lifecycle_conflicts() {
        let rent_id = rent::Id::new();

        let err = command::deliver_car::ExecutionError::InvalidRentStatus(
            rent_id,
            rent::Status::Active,
        )
        .as_error();
        assert_eq!(err.code, "INVALID_RENT_STATUS");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);

        let err = command::create_rent::ExecutionError::CarNotAvailable(
            car::Id::new(),
        )
        .as_error();
        assert_eq!(err.code, "CAR_NOT_AVAILABLE");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn maps_missing_entities_to_not_found() {
        let err = command::delete_rent::ExecutionError::RentNotExists(
            rent::Id::new(),
        )
        .as_error();
        assert_eq!(err.code, "RENT_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);

        let err = command::create_rent::ExecutionError::CarNotExists(
            car::Id::new(),
        )
        .as_error();
        assert_eq!(err.code, "CAR_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
