//! [`Rent`] definitions.

#[cfg(doc)]
use common::{Date, DateTime};
use common::{unit, DateOf, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{car, user};
#[cfg(doc)]
use crate::domain::{Car, User};

/// Reservation of a [`Car`] by a [`User`].
///
/// The lifecycle [`Status`] isn't stored, but derived from the
/// [`Rent::picked_up_at`] and [`Rent::returned_at`] timestamps.
#[derive(Clone, Debug)]
pub struct Rent {
    /// ID of this [`Rent`].
    pub id: Id,

    /// ID of the reserved [`Car`].
    pub car_id: car::Id,

    /// ID of the [`User`] renting the [`Car`].
    pub user_id: user::Id,

    /// Requested [`Period`] of this [`Rent`].
    pub period: Period,

    /// Price for the requested [`Period`], calculated on reservation.
    pub expected_price: Money,

    /// [`DateTime`] when the [`Car`] was handed over, if it was.
    pub picked_up_at: Option<PickupDateTime>,

    /// [`DateTime`] when the [`Car`] was brought back, if it was.
    pub returned_at: Option<ReturnDateTime>,

    /// Price for the actual rental days, calculated on return.
    pub final_price: Option<Money>,

    /// [`DateTime`] when this [`Rent`] was created.
    pub created_at: CreationDateTime,
}

impl Rent {
    /// Returns the current [`Status`] of this [`Rent`].
    #[must_use]
    pub fn status(&self) -> Status {
        match (self.picked_up_at, self.returned_at) {
            (_, Some(_)) => Status::Completed,
            (Some(_), None) => Status::Active,
            (None, None) => Status::Reserved,
        }
    }

    /// Marks the [`Car`] of this [`Rent`] as handed over at the provided
    /// [`DateTime`].
    ///
    /// # Errors
    ///
    /// With [`InvalidStatus`] if this [`Rent`] is not [`Status::Reserved`].
    pub fn pick_up(
        &mut self,
        at: PickupDateTime,
    ) -> Result<(), InvalidStatus> {
        match self.status() {
            Status::Reserved => {
                self.picked_up_at = Some(at);
                Ok(())
            }
            s @ (Status::Active | Status::Completed) => Err(InvalidStatus(s)),
        }
    }

    /// Marks the [`Car`] of this [`Rent`] as brought back at the provided
    /// [`DateTime`], charging the `daily` price for each actual rental day.
    ///
    /// # Errors
    ///
    /// With [`InvalidStatus`] if this [`Rent`] is not [`Status::Active`].
    pub fn finish(
        &mut self,
        at: ReturnDateTime,
        daily: Money,
    ) -> Result<(), InvalidStatus> {
        let Some(picked_up_at) = self.picked_up_at else {
            return Err(InvalidStatus(self.status()));
        };
        if self.returned_at.is_some() {
            return Err(InvalidStatus(self.status()));
        }

        self.final_price =
            Some(price(picked_up_at.date::<()>(), at.date::<()>(), daily));
        self.returned_at = Some(at);
        Ok(())
    }
}

/// Lifecycle status of a [`Rent`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Status {
    /// [`Car`] is reserved, but not handed over yet.
    Reserved,

    /// [`Car`] is handed over and not brought back yet.
    Active,

    /// [`Car`] is brought back.
    Completed,
}

/// Error of a [`Rent`] transition not allowed in its current [`Status`].
#[derive(Clone, Copy, Debug, Display, derive_more::Error)]
#[display("`Rent` cannot be changed in `{_0}` status")]
pub struct InvalidStatus(#[error(not(source))] pub Status);

/// Calculates the price of renting a [`Car`] from `begin` until `end` at the
/// `daily` price.
///
/// Each whole day between the dates is charged, but a [`Rent`] is never
/// cheaper than a single day.
#[must_use]
pub fn price<B: ?Sized, E: ?Sized>(
    begin: DateOf<B>,
    end: DateOf<E>,
    daily: Money,
) -> Money {
    daily * begin.days_until(end).max(1)
}

/// Requested period of a [`Rent`], inclusive on both ends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// First reserved day.
    begin: BeginDate,

    /// Last reserved day.
    end: EndDate,
}

impl Period {
    /// Creates a new [`Period`] if `begin` doesn't follow `end`.
    #[must_use]
    pub fn new(begin: BeginDate, end: EndDate) -> Option<Self> {
        (begin.coerce::<()>() <= end.coerce()).then_some(Self { begin, end })
    }

    /// Creates a new [`Period`] without checking the order of its dates.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `begin` doesn't follow `end`.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(begin: BeginDate, end: EndDate) -> Self {
        Self { begin, end }
    }

    /// Returns the first reserved day of this [`Period`].
    #[must_use]
    pub fn begin(&self) -> BeginDate {
        self.begin
    }

    /// Returns the last reserved day of this [`Period`].
    #[must_use]
    pub fn end(&self) -> EndDate {
        self.end
    }

    /// Checks whether the provided `date` lies within this [`Period`].
    #[must_use]
    pub fn contains<Of: ?Sized>(&self, date: DateOf<Of>) -> bool {
        let date = date.coerce::<()>();
        self.begin.coerce() <= date && date <= self.end.coerce()
    }

    /// Checks whether this [`Period`] can't be reserved along with the
    /// `reserved` one.
    ///
    /// Only the boundaries of this [`Period`] are checked: a [`Period`]
    /// wrapping the `reserved` one without touching it isn't a collision.
    #[must_use]
    pub fn collides_with(&self, reserved: &Self) -> bool {
        reserved.contains(self.begin) || reserved.contains(self.end)
    }

    /// Calculates the price of this [`Period`] at the `daily` price.
    #[must_use]
    pub fn price(&self, daily: Money) -> Money {
        price(self.begin, self.end, daily)
    }
}

/// ID of a [`Rent`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// First [`Date`] of a [`Period`].
pub type BeginDate = DateOf<(Rent, unit::Begin)>;

/// Last [`Date`] of a [`Period`].
pub type EndDate = DateOf<(Rent, unit::End)>;

/// [`DateTime`] when a [`Car`] was handed over.
pub type PickupDateTime = DateTimeOf<(Rent, unit::Pickup)>;

/// [`DateTime`] when a [`Car`] was brought back.
pub type ReturnDateTime = DateTimeOf<(Rent, unit::Return)>;

/// [`DateTime`] when a [`Rent`] was created.
pub type CreationDateTime = DateTimeOf<(Rent, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTime, Money};

    use crate::domain::{car, user};

    use super::{price, Period, Rent, Status};

    fn date(s: &str) -> Date {
        Date::from_iso8601(s).unwrap()
    }

    fn period(begin: &str, end: &str) -> Period {
        Period::new(date(begin).coerce(), date(end).coerce()).unwrap()
    }

    fn rent(period: Period) -> Rent {
        let daily = Money::whole(50, Currency::Eur);
        Rent {
            id: super::Id::new(),
            car_id: car::Id::new(),
            user_id: user::Id::new(),
            period,
            expected_price: period.price(daily),
            picked_up_at: None,
            returned_at: None,
            final_price: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn same_day_costs_one_day() {
        let daily = Money::whole(50, Currency::Eur);
        let day = date("2024-05-01");

        assert_eq!(price(day, day, daily), daily);
    }

    #[test]
    fn charges_each_day_in_between() {
        let daily = Money::whole(50, Currency::Eur);

        assert_eq!(
            price(date("2024-05-01"), date("2024-05-04"), daily),
            Money::whole(150, Currency::Eur),
        );
        assert_eq!(
            period("2024-05-01", "2024-05-04").price(daily),
            Money::whole(150, Currency::Eur),
        );
    }

    #[test]
    fn period_requires_ordered_dates() {
        assert!(Period::new(
            date("2024-05-02").coerce(),
            date("2024-05-01").coerce(),
        )
        .is_none());
        assert!(Period::new(
            date("2024-05-01").coerce(),
            date("2024-05-01").coerce(),
        )
        .is_some());
    }

    #[test]
    fn collides_by_endpoints_inclusively() {
        let reserved = period("2024-05-10", "2024-05-15");

        // Begin inside.
        assert!(period("2024-05-12", "2024-05-20").collides_with(&reserved));
        // End inside.
        assert!(period("2024-05-01", "2024-05-12").collides_with(&reserved));
        // Touching boundaries.
        assert!(period("2024-05-15", "2024-05-16").collides_with(&reserved));
        assert!(period("2024-05-05", "2024-05-10").collides_with(&reserved));
        // Fully inside.
        assert!(period("2024-05-11", "2024-05-12").collides_with(&reserved));
        // Same.
        assert!(reserved.collides_with(&reserved));
    }

    #[test]
    fn ignores_wrapping_and_disjoint_periods() {
        let reserved = period("2024-05-10", "2024-05-15");

        assert!(!period("2024-05-01", "2024-05-20").collides_with(&reserved));
        assert!(!period("2024-05-01", "2024-05-09").collides_with(&reserved));
        assert!(!period("2024-05-16", "2024-05-20").collides_with(&reserved));
    }

    #[test]
    fn derives_status_from_timestamps() {
        let mut rent = rent(period("2024-05-01", "2024-05-04"));
        assert_eq!(rent.status(), Status::Reserved);

        rent.pick_up(DateTime::now().coerce()).unwrap();
        assert_eq!(rent.status(), Status::Active);

        rent.finish(DateTime::now().coerce(), Money::whole(50, Currency::Eur))
            .unwrap();
        assert_eq!(rent.status(), Status::Completed);
    }

    #[test]
    fn finishes_with_actual_days() {
        let daily = Money::whole(50, Currency::Eur);
        let mut rent = rent(period("2024-05-01", "2024-05-04"));
        rent.pick_up(
            DateTime::from_rfc3339("2024-05-01T09:00:00Z")
                .unwrap()
                .coerce(),
        )
        .unwrap();

        rent.finish(
            DateTime::from_rfc3339("2024-05-06T08:00:00Z")
                .unwrap()
                .coerce(),
            daily,
        )
        .unwrap();

        assert_eq!(rent.final_price, Some(Money::whole(250, Currency::Eur)));
        assert_eq!(rent.expected_price, Money::whole(150, Currency::Eur));
    }

    #[test]
    fn cannot_finish_unless_active() {
        let daily = Money::whole(50, Currency::Eur);
        let mut rent = rent(period("2024-05-01", "2024-05-04"));

        let err = rent.finish(DateTime::now().coerce(), daily).unwrap_err();
        assert_eq!(err.0, Status::Reserved);
        assert!(rent.returned_at.is_none());

        rent.pick_up(DateTime::now().coerce()).unwrap();
        rent.finish(DateTime::now().coerce(), daily).unwrap();

        let err = rent.finish(DateTime::now().coerce(), daily).unwrap_err();
        assert_eq!(err.0, Status::Completed);
    }

    #[test]
    fn picks_up_only_reserved() {
        let mut rent = rent(period("2024-05-01", "2024-05-04"));
        rent.pick_up(DateTime::now().coerce()).unwrap();

        let err = rent.pick_up(DateTime::now().coerce()).unwrap_err();
        assert_eq!(err.0, Status::Active);
    }
}
