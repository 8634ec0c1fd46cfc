//! [`Query`] collection related to the multiple [`Car`]s.

use common::operations::By;

use crate::domain::Car;
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all the non-deleted [`Car`]s of the fleet, oldest first.
pub type List = DatabaseQuery<By<Vec<Car>, ()>>;
