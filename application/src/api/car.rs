//! [`Car`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLObject, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A car of the rental fleet.
#[derive(Clone, Debug, From)]
pub struct Car {
    /// ID of this [`Car`].
    id: Id,

    /// Underlying [`domain::Car`].
    car: OnceCell<domain::Car>,
}

impl From<domain::Car> for Car {
    fn from(car: domain::Car) -> Self {
        Self {
            id: car.id.into(),
            car: OnceCell::new_with(Some(car)),
        }
    }
}

impl Car {
    /// Creates a new [`Car`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Car`] with the provided ID exists,
    /// otherwise accessing this [`Car`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            car: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Car`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Car`] doesn't exist.
    async fn car(&self, ctx: &Context) -> Result<&domain::Car, Error> {
        let id = self.id.into();
        self.car
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::car::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(c.ok_or_else(|| {
                            api::query::CarError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A car of the rental fleet.
#[graphql_object(context = Context)]
impl Car {
    /// Unique identifier of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Brand of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.brand",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn brand(&self, ctx: &Context) -> Result<Brand, Error> {
        Ok(self.car(ctx).await?.brand.clone().into())
    }

    /// Model description of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.model",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn model(&self, ctx: &Context) -> Result<Model, Error> {
        Ok(self.car(ctx).await?.model.clone().into())
    }

    /// Registration plate of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.plate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn plate(&self, ctx: &Context) -> Result<Plate, Error> {
        Ok(self.car(ctx).await?.plate.clone().into())
    }

    /// Rental segment of this `Car`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.segment",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn segment(&self, ctx: &Context) -> Result<Segment, Error> {
        Ok(self.car(ctx).await?.segment.into())
    }

    /// Price of renting this `Car` for a single day.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.dailyPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn daily_price(&self, ctx: &Context) -> Result<Money, Error> {
        Ok(self.car(ctx).await?.daily_price())
    }

    /// `Date` when this `Car` was purchased.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.purchasedOn",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn purchased_on(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.car(ctx).await?.purchased_on.coerce())
    }

    /// Indicator whether this `Car` is parked and may be handed over.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.available",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn available(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.car(ctx).await?.available)
    }

    /// `Rent`s of this `Car`, ordered by their `beginDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.rents",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn rents(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Rent>, Error> {
        ctx.service()
            .execute(query::rents::ByCar::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rents| rents.into_iter().map(Into::into).collect())
    }

    /// `DateTime` when this `Car` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Car.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.car(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Car`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::car::Id)]
#[into(domain::car::Id)]
#[graphql(name = "CarId", transparent)]
pub struct Id(Uuid);

/// Brand of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "CarBrand", with = scalar::Via::<domain::car::Brand>)]
pub struct Brand(domain::car::Brand);

/// Model description of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "CarModel", with = scalar::Via::<domain::car::Model>)]
pub struct Model(domain::car::Model);

/// Registration plate of a `Car`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "CarPlate", with = scalar::Via::<domain::car::Plate>)]
pub struct Plate(domain::car::Plate);

/// Rental segment of a `Car`, defining its daily price.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "CarSegment")]
pub enum Segment {
    /// Small city car.
    Economy,

    /// Compact hatchback.
    Compact,

    /// Mid-size family car.
    Standard,

    /// Executive car.
    Premium,

    /// Luxury or sports car.
    Luxury,
}

impl From<domain::car::Segment> for Segment {
    fn from(segment: domain::car::Segment) -> Self {
        use domain::car::Segment as S;
        match segment {
            S::Economy => Self::Economy,
            S::Compact => Self::Compact,
            S::Standard => Self::Standard,
            S::Premium => Self::Premium,
            S::Luxury => Self::Luxury,
        }
    }
}

impl From<Segment> for domain::car::Segment {
    fn from(segment: Segment) -> Self {
        match segment {
            Segment::Economy => Self::Economy,
            Segment::Compact => Self::Compact,
            Segment::Standard => Self::Standard,
            Segment::Premium => Self::Premium,
            Segment::Luxury => Self::Luxury,
        }
    }
}

/// Daily price of a `CarSegment`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "CarSegmentPrice")]
pub struct SegmentPrice {
    /// Priced `CarSegment`.
    pub segment: Segment,

    /// Price of renting a `Car` of the `segment` for a single day.
    pub daily_price: Money,
}

impl From<domain::car::Segment> for SegmentPrice {
    fn from(segment: domain::car::Segment) -> Self {
        Self {
            segment: segment.into(),
            daily_price: segment.daily_price(),
        }
    }
}
