//! Storage backends the rental [`Service`] runs on.
//!
//! [`Service`]: crate::Service

pub mod database;

#[cfg(test)]
pub(crate) use self::database::memory;
pub use self::database::Database;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
