//! [`Rent`] read model definition.

use crate::domain::{car, rent};
#[cfg(doc)]
use crate::domain::{Car, Rent};

/// Wrapper around a [`Rent`] indicating that its [`rent::Period`] collides
/// with the requested [`Slot`].
///
/// [`Rent`]s in any status are considered, so a completed [`Rent`] still
/// occupies its [`rent::Period`].
#[derive(Clone, Copy, Debug)]
pub struct Colliding<T>(pub T);

/// [`rent::Period`] requested for a [`Car`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Slot {
    /// ID of the requested [`Car`].
    pub car_id: car::Id,

    /// Requested [`rent::Period`].
    pub period: rent::Period,
}
