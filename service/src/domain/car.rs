//! [`Car`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::{Date, DateTime};
use common::{define_kind, money::Currency, unit, DateOf, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Car of the rental fleet.
#[derive(Clone, Debug)]
pub struct Car {
    /// ID of this [`Car`].
    pub id: Id,

    /// [`Brand`] of this [`Car`].
    pub brand: Brand,

    /// [`Model`] of this [`Car`].
    pub model: Model,

    /// Registration [`Plate`] of this [`Car`].
    pub plate: Plate,

    /// Rental [`Segment`] of this [`Car`], defining its daily price.
    pub segment: Segment,

    /// [`Date`] when this [`Car`] was purchased.
    pub purchased_on: PurchaseDate,

    /// Indicator whether this [`Car`] is parked and may be handed over.
    ///
    /// `false` exactly while some [`Rent`] has picked this [`Car`] up and
    /// hasn't returned it yet.
    ///
    /// [`Rent`]: crate::domain::Rent
    pub available: bool,

    /// [`DateTime`] when this [`Car`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Car`] was deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Car {
    /// Returns the price of renting this [`Car`] for a single day.
    #[must_use]
    pub fn daily_price(&self) -> Money {
        self.segment.daily_price()
    }
}

/// ID of a [`Car`].
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

/// Brand of a [`Car`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Brand(String);

impl Brand {
    /// Creates a new [`Brand`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `brand` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(brand: impl Into<String>) -> Self {
        Self(brand.into())
    }

    /// Creates a new [`Brand`] if the given `brand` is valid.
    #[must_use]
    pub fn new(brand: impl Into<String>) -> Option<Self> {
        let brand = brand.into();
        Self::check(&brand).then_some(Self(brand))
    }

    /// Checks whether the given `brand` is a valid [`Brand`].
    fn check(brand: impl AsRef<str>) -> bool {
        let brand = brand.as_ref();
        brand.trim() == brand && !brand.is_empty() && brand.len() <= 64
    }
}

impl FromStr for Brand {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Brand`")
    }
}

/// Model description of a [`Car`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Model(String);

impl Model {
    /// Creates a new [`Model`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `model` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(model: impl Into<String>) -> Self {
        Self(model.into())
    }

    /// Creates a new [`Model`] if the given `model` is valid.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Option<Self> {
        let model = model.into();
        Self::check(&model).then_some(Self(model))
    }

    /// Checks whether the given `model` is a valid [`Model`].
    fn check(model: impl AsRef<str>) -> bool {
        let model = model.as_ref();
        model.trim() == model && !model.is_empty() && model.len() <= 256
    }
}

impl FromStr for Model {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Model`")
    }
}

/// Registration plate of a [`Car`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Plate(String);

impl Plate {
    /// Creates a new [`Plate`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `plate` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(plate: impl Into<String>) -> Self {
        Self(plate.into())
    }

    /// Creates a new [`Plate`] if the given `plate` is valid.
    ///
    /// Letters are normalized to upper case.
    #[must_use]
    pub fn new(plate: impl Into<String>) -> Option<Self> {
        let plate = plate.into().to_uppercase();
        Self::check(&plate).then_some(Self(plate))
    }

    /// Checks whether the given `plate` is a valid [`Plate`].
    fn check(plate: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Plate`] invariants:
        /// - Must start and end with a latin letter or a digit;
        /// - May contain single dashes or spaces in between;
        /// - Must be between 2 and 12 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[A-Z0-9](?:[ -]?[A-Z0-9]){1,11}$")
                .expect("valid regex")
        });

        let plate = plate.as_ref();
        plate.len() <= 12 && REGEX.is_match(plate)
    }
}

impl FromStr for Plate {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Plate`")
    }
}

define_kind! {
    #[doc = "Rental segment of a [`Car`]."]
    enum Segment {
        #[doc = "Small city car."]
        Economy = 1,

        #[doc = "Compact hatchback."]
        Compact = 2,

        #[doc = "Mid-size family car."]
        Standard = 3,

        #[doc = "Executive car."]
        Premium = 4,

        #[doc = "Luxury or sports car."]
        Luxury = 5,
    }
}

impl Segment {
    /// Returns the flat daily price of renting a [`Car`] of this [`Segment`].
    #[must_use]
    pub fn daily_price(self) -> Money {
        let euros = match self {
            Self::Economy => 25,
            Self::Compact => 35,
            Self::Standard => 50,
            Self::Premium => 90,
            Self::Luxury => 200,
        };
        Money::whole(euros, Currency::Eur)
    }
}

/// [`Date`] when a [`Car`] was purchased.
pub type PurchaseDate = DateOf<(Car, unit::Purchase)>;

/// [`DateTime`] when a [`Car`] was created.
pub type CreationDateTime = DateTimeOf<(Car, unit::Creation)>;

/// [`DateTime`] when a [`Car`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Car, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};

    use super::{Plate, Segment};

    #[test]
    fn normalizes_plate() {
        assert_eq!(
            Plate::new("aa-12-bb").map(|p| p.to_string()),
            Some("AA-12-BB".to_owned()),
        );
        assert!(Plate::new("AB 123").is_some());
        assert!(Plate::new("-AB123").is_none());
        assert!(Plate::new("AB--123").is_none());
        assert!(Plate::new("A").is_none());
        assert!(Plate::new("ABCDEFGHIJKLM").is_none());
    }

    #[test]
    fn every_segment_is_priced_in_euros() {
        for segment in Segment::ALL {
            let price = segment.daily_price();

            assert_eq!(price.currency, Currency::Eur);
            assert!(price.amount.is_sign_positive());
        }
        assert_eq!(
            Segment::Standard.daily_price(),
            Money::whole(50, Currency::Eur),
        );
    }

    #[test]
    fn renders_segment_names() {
        assert_eq!(Segment::Premium.to_string(), "PREMIUM");
        assert_eq!("LUXURY".parse::<Segment>(), Ok(Segment::Luxury));
        assert!("SPORT".parse::<Segment>().is_err());
    }
}
