//! Timestamp utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{marker::PhantomData, ops, time::Duration};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::well_known::Rfc3339, UtcOffset};

use crate::DateOf;

/// Untyped timestamp.
pub type DateTime = DateTimeOf;

/// UTC timestamp of microsecond precision, the one Postgres `TIMESTAMPTZ`
/// keeps.
///
/// The `Of` tag tells apart timestamps of different events, so a pickup
/// time cannot be passed where a return time is expected.
#[derive(Debug)]
pub struct DateTimeOf<Of: ?Sized = ()> {
    /// Underlying UTC timestamp, truncated to microseconds.
    inner: time::OffsetDateTime,

    /// Tag of this timestamp.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl_tagged_value!(DateTimeOf);

impl<Of: ?Sized> DateTimeOf<Of> {
    /// Returns the current moment.
    #[must_use]
    pub fn now() -> Self {
        time::OffsetDateTime::now_utc().into()
    }

    /// Creates a new [`DateTime`] from the provided count of seconds since
    /// the Unix epoch.
    ///
    /// [`None`] is returned if the result doesn't fit into a year range of
    /// `-9999..=9999`.
    #[must_use]
    pub fn from_unix_timestamp(secs: i64) -> Option<Self> {
        time::OffsetDateTime::from_unix_timestamp(secs)
            .ok()
            .map(Self::from)
    }

    /// Returns the count of whole seconds since the Unix epoch.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.inner.unix_timestamp()
    }

    /// Parses a new [`DateTime`] from an [RFC 3339] string, converting it to
    /// UTC.
    ///
    /// # Errors
    ///
    /// If the string is not a valid [RFC 3339] timestamp.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub fn from_rfc3339(input: &str) -> Result<Self, ParseError> {
        time::OffsetDateTime::parse(input, &Rfc3339)
            .map(Self::from)
            .map_err(ParseError)
    }

    /// Returns this [`DateTime`] as an [RFC 3339] string in UTC.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.inner.format(&Rfc3339).unwrap_or_else(|e| {
            panic!("cannot format `DateTime` as RFC 3339: {e}")
        })
    }

    /// Re-tags this [`DateTime`].
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateTimeOf<NewOf> {
        DateTimeOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }

    /// Returns the UTC calendar [`DateOf`] this [`DateTime`] falls on.
    #[must_use]
    pub fn date<NewOf: ?Sized>(&self) -> DateOf<NewOf> {
        self.inner.date().into()
    }
}

/// Error of parsing a [`DateTime`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid RFC 3339 timestamp: {_0}")]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> From<time::OffsetDateTime> for DateTimeOf<Of> {
    fn from(dt: time::OffsetDateTime) -> Self {
        let utc = dt.to_offset(UtcOffset::UTC);
        let sub_micros = i64::from(utc.nanosecond() % 1_000);
        Self {
            inner: utc - time::Duration::nanoseconds(sub_micros),
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateTimeOf<Of>> for time::OffsetDateTime {
    fn from(dt: DateTimeOf<Of>) -> Self {
        dt.inner
    }
}

impl<Of: ?Sized> ops::Add<Duration> for DateTimeOf<Of> {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        (self.inner + rhs).into()
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::OffsetDateTime::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateTimeOf<Of> {
    accepts!(TIMESTAMPTZ);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! [`serde`] representations of [`DateTimeOf`].

    pub mod unix_timestamp {
        //! [`DateTimeOf`] as whole seconds since the Unix epoch, the way
        //! JWT `exp` claims carry it.
        //!
        //! [`DateTimeOf`]: crate::DateTimeOf

        use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

        use crate::DateTimeOf;

        /// Serializes the provided [`DateTimeOf`] as a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the `serializer` fails.
        pub fn serialize<Of, S>(
            dt: &DateTimeOf<Of>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
            Of: ?Sized,
        {
            serializer.serialize_i64(dt.unix_timestamp())
        }

        /// Deserializes a [`DateTimeOf`] from a Unix timestamp.
        ///
        /// # Errors
        ///
        /// If the input is not an integer or is out of range.
        pub fn deserialize<'de, D, Of>(
            deserializer: D,
        ) -> Result<DateTimeOf<Of>, D::Error>
        where
            D: Deserializer<'de>,
            Of: ?Sized,
        {
            let secs = i64::deserialize(deserializer)?;
            DateTimeOf::from_unix_timestamp(secs).ok_or_else(|| {
                D::Error::custom(format!("out of range timestamp: {secs}"))
            })
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! [`juniper`] scalar of [`DateTime`].
    //!
    //! [`DateTime`]: crate::DateTime

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// UTC timestamp in [RFC 3339] format with microsecond precision.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    #[graphql_scalar(with = Self, parse_token(String))]
    type DateTime = crate::DateTime;

    impl DateTime {
        fn to_output<S: ScalarValue>(dt: &DateTime) -> Value<S> {
            Value::scalar(dt.to_rfc3339())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            let s = input.as_string_value().ok_or_else(|| {
                format!("`DateTime` scalar expects a string, found: {input}")
            })?;
            Self::from_rfc3339(s)
                .map_err(|e| format!("`DateTime` scalar rejects \"{s}\": {e}"))
        }
    }
}

#[cfg(test)]
mod spec {
    use super::DateTime;
    use crate::Date;

    #[test]
    fn date_is_taken_in_utc() {
        let dt = DateTime::from_rfc3339("2024-03-10T23:30:00-02:00").unwrap();

        assert_eq!(dt.date::<()>(), Date::from_iso8601("2024-03-11").unwrap());
        assert_eq!(dt.to_rfc3339(), "2024-03-11T01:30:00Z");
    }

    #[test]
    fn adds_duration() {
        let dt = DateTime::from_rfc3339("2024-03-10T10:00:00Z").unwrap();
        let later = dt + std::time::Duration::from_secs(3 * 24 * 60 * 60);

        assert_eq!(later.to_rfc3339(), "2024-03-13T10:00:00Z");
        assert!(later > dt);
    }

    #[test]
    fn keeps_microseconds_only() {
        let dt =
            DateTime::from_rfc3339("2024-03-10T10:00:00.123456789Z").unwrap();

        assert_eq!(dt.to_rfc3339(), "2024-03-10T10:00:00.123456Z");
        assert_eq!(
            DateTime::from_unix_timestamp(dt.unix_timestamp())
                .unwrap()
                .to_rfc3339(),
            "2024-03-10T10:00:00Z",
        );
    }
}
