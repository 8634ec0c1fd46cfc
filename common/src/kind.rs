//! Fieldless enums with a stable `u8` discriminant.

use derive_more::{Display, Error};

/// Defines a fieldless enum persisted as its `u8` discriminant (`INT2` in
/// Postgres) and rendered in `SCREAMING_SNAKE_CASE` as a string.
///
/// Discriminants are part of the storage format, so they must never be
/// reused for another variant.
///
/// The derived `strum` impls refer to `::strum`, so the calling crate must
/// depend on `strum` itself.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
///
/// define_kind! {
///     #[doc = "Fuel of a vehicle."]
///     enum Fuel {
///         #[doc = "Petrol engine."]
///         Petrol = 1,
///
///         #[doc = "Battery electric."]
///         Electric = 2,
///     }
/// }
///
/// assert_eq!(Fuel::try_from(2_u8), Ok(Fuel::Electric));
/// assert_eq!(Fuel::Petrol.to_string(), "PETROL");
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            PartialEq,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = "SCREAMING_SNAKE_CASE"),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Returns the `u8` discriminant of this variant.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = $crate::kind::UnknownKind;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| k.u8() == value)
                    .ok_or($crate::kind::UnknownKind {
                        kind: ::core::stringify!($name),
                        value,
                    })
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                let value = u8::try_from(i16::from_sql(ty, raw)?)?;
                Ok(Self::try_from(value)?)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}

/// Error of converting a `u8` into a kind enum with no such discriminant.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("invalid `{kind}` value: {value}")]
pub struct UnknownKind {
    /// Name of the kind enum.
    pub kind: &'static str,

    /// Rejected discriminant.
    pub value: u8,
}

#[cfg(test)]
mod spec {
    use super::UnknownKind;

    define_kind! {
        #[doc = "Gearbox of a vehicle."]
        enum Gearbox {
            #[doc = "Manual gearbox."]
            Manual = 1,

            #[doc = "Automatic gearbox."]
            Automatic = 3,
        }
    }

    #[test]
    fn converts_by_discriminant() {
        assert_eq!(Gearbox::ALL, [Gearbox::Manual, Gearbox::Automatic]);
        assert_eq!(Gearbox::try_from(3_u8), Ok(Gearbox::Automatic));
        assert_eq!(
            Gearbox::try_from(2_u8),
            Err(UnknownKind {
                kind: "Gearbox",
                value: 2,
            }),
        );
    }

    #[test]
    fn renders_screaming_snake_case() {
        assert_eq!(Gearbox::Automatic.to_string(), "AUTOMATIC");
        assert_eq!("MANUAL".parse::<Gearbox>(), Ok(Gearbox::Manual));
    }
}
