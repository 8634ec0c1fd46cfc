//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{domain, query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        Self::user(my_id, ctx).await
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `User`s, oldest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "users",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn users(ctx: &Context) -> Result<Vec<api::User>, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::users::List::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|users| users.into_iter().map(Into::into).collect())
    }

    /// Returns the `Car` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CAR_NOT_EXISTS` - the `Car` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "car",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn car(
        id: api::car::Id,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::car::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| CarError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Car`s of the fleet, oldest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cars",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cars(ctx: &Context) -> Result<Vec<api::Car>, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::cars::List::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|cars| cars.into_iter().map(Into::into).collect())
    }

    /// Lists all the `CarSegment`s along with their daily prices.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "segments",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn segments(
        ctx: &Context,
    ) -> Result<Vec<api::car::SegmentPrice>, Error> {
        _ = ctx.current_session().await?;

        Ok(domain::car::Segment::ALL
            .iter()
            .copied()
            .map(Into::into)
            .collect())
    }

    /// Checks whether the specified `Car` may be reserved from `beginDate`
    /// until `endDate` inclusively.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CAR_NOT_EXISTS` - the `Car` with the specified ID does not exist;
    /// - `INVALID_PERIOD` - `beginDate` follows `endDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            begin_date = %begin_date,
            car_id = %car_id,
            end_date = %end_date,
            gql.name = "carAvailability",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn car_availability(
        car_id: api::car::Id,
        begin_date: Date,
        end_date: Date,
        ctx: &Context,
    ) -> Result<bool, Error> {
        _ = ctx.current_session().await?;
        let period =
            api::rent::period(begin_date, end_date).map_err(ctx.error())?;

        ctx.service()
            .execute(query::car::Availability {
                car_id: car_id.into(),
                period,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Returns the `Rent` with the specified ID.
    ///
    /// If `userId` is specified, only a `Rent` of that `User` is returned.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENT_NOT_EXISTS` - the `Rent` with the specified ID does not exist
    ///                       or belongs to another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "rent",
            otel.name = Self::SPAN_NAME,
            user_id = ?user_id,
        ),
    )]
    pub async fn rent(
        id: api::rent::Id,
        user_id: Option<api::user::Id>,
        ctx: &Context,
    ) -> Result<api::Rent, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::rent::ById {
                rent_id: id.into(),
                user_id: user_id.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Rent`s, oldest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rents",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rents(ctx: &Context) -> Result<Vec<api::Rent>, Error> {
        _ = ctx.current_session().await?;

        ctx.service()
            .execute(query::rents::List::by(()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rents| rents.into_iter().map(Into::into).collect())
    }
}

impl AsError for query::car::AvailabilityError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CarNotExists(_) => Some(CarError::NotExists.into()),
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for query::rent::ByIdError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RentNotExists(_) => Some(RentError::NotExists.into()),
        }
    }
}

define_error! {
    enum CarError {
        #[code = "CAR_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RentError {
        #[code = "RENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Rent` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
