//! Common primitives shared by the rental service and its API.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

/// Implements value semantics for a `PhantomData`-tagged wrapper by
/// delegating to its `inner` field, regardless of the tag type.
macro_rules! impl_tagged_value {
    ($ty:ident) => {
        impl<Of: ?Sized> Copy for $ty<Of> {}
        impl<Of: ?Sized> Clone for $ty<Of> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<Of: ?Sized> Eq for $ty<Of> {}
        impl<Of: ?Sized> PartialEq for $ty<Of> {
            fn eq(&self, other: &Self) -> bool {
                self.inner == other.inner
            }
        }

        impl<Of: ?Sized> Ord for $ty<Of> {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                self.inner.cmp(&other.inner)
            }
        }
        impl<Of: ?Sized> PartialOrd for $ty<Of> {
            fn partial_cmp(
                &self,
                other: &Self,
            ) -> Option<::std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl<Of: ?Sized> ::std::hash::Hash for $ty<Of> {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                self.inner.hash(state);
            }
        }
    };
}

pub mod date;
pub mod datetime;
pub mod handler;
pub mod kind;
pub mod money;
pub mod operations;
pub mod unit;

pub use self::{
    date::{Date, DateOf},
    datetime::{DateTime, DateTimeOf},
    handler::Handler,
    money::Money,
};

#[doc(hidden)]
pub mod private {
    //! Private definitions used by macros.

    #[cfg(feature = "postgres")]
    pub use postgres_types;
    #[cfg(feature = "serde")]
    pub use serde;
    pub use strum;
}
