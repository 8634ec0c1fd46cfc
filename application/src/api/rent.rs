//! [`Rent`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, Context, Error};

/// A reservation of a `Car` by a `User`.
#[derive(Clone, Debug, From)]
pub struct Rent(domain::Rent);

/// A reservation of a `Car` by a `User`.
#[graphql_object(context = Context)]
impl Rent {
    /// Unique identifier of this `Rent`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Reserved `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.car",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn car(&self) -> api::Car {
        #[expect(unsafe_code, reason = "`Rent` references existing `Car`")]
        unsafe {
            api::Car::new_unchecked(self.0.car_id)
        }
    }

    /// `User` renting the `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.user",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn user(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Rent` references existing `User`")]
        unsafe {
            api::User::new_unchecked(self.0.user_id)
        }
    }

    /// Current lifecycle status of this `Rent`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> Status {
        self.0.status().into()
    }

    /// First reserved day of this `Rent`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.beginDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn begin_date(&self) -> Date {
        self.0.period.begin().coerce()
    }

    /// Last reserved day of this `Rent`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.endDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn end_date(&self) -> Date {
        self.0.period.end().coerce()
    }

    /// Price for the reserved days, calculated on reservation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.expectedPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn expected_price(&self) -> Money {
        self.0.expected_price
    }

    /// `DateTime` when the `Car` was handed over, if it was.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.pickedUpAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn picked_up_at(&self) -> Option<DateTime> {
        self.0.picked_up_at.map(|at| at.coerce())
    }

    /// `DateTime` when the `Car` was brought back, if it was.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.returnedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn returned_at(&self) -> Option<DateTime> {
        self.0.returned_at.map(|at| at.coerce())
    }

    /// Price for the actual rental days, once the `Car` is brought back.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.finalPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn final_price(&self) -> Option<Money> {
        self.0.final_price
    }

    /// `DateTime` when this `Rent` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Rent.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Rent`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::rent::Id)]
#[into(domain::rent::Id)]
#[graphql(name = "RentId", transparent)]
pub struct Id(Uuid);

/// Lifecycle status of a `Rent`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentStatus")]
pub enum Status {
    /// `Car` is reserved, but not handed over yet.
    Reserved,

    /// `Car` is handed over and not brought back yet.
    Active,

    /// `Car` is brought back.
    Completed,
}

impl From<domain::rent::Status> for Status {
    fn from(status: domain::rent::Status) -> Self {
        use domain::rent::Status as S;
        match status {
            S::Reserved => Self::Reserved,
            S::Active => Self::Active,
            S::Completed => Self::Completed,
        }
    }
}

/// Builds a [`domain::rent::Period`] out of the provided dates.
///
/// # Errors
///
/// With [`api::PeriodError::Invalid`] if `begin` follows `end`.
pub fn period(
    begin: Date,
    end: Date,
) -> Result<domain::rent::Period, Error> {
    domain::rent::Period::new(begin.coerce(), end.coerce())
        .ok_or_else(|| api::PeriodError::Invalid.into())
}

#[cfg(test)]
mod spec {
    use common::Date;

    use super::period;

    fn date(s: &str) -> Date {
        Date::from_iso8601(s).unwrap()
    }

    #[test]
    fn rejects_reversed_period() {
        assert!(period(date("2024-05-01"), date("2024-05-01")).is_ok());

        let err = period(date("2024-05-02"), date("2024-05-01")).unwrap_err();
        assert_eq!(err.code, "INVALID_PERIOD");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }
}
