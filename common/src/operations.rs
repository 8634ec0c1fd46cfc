//! Abstract storage operations.
//!
//! Each operation is a thin wrapper around its payload, so a storage may
//! implement [`Handler`] for exactly the operations it supports.

use std::marker::PhantomData;

use crate::Handler;

/// Inserts a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Overwrites an existing value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Removes a value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Reads a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Locks a value until the end of the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Starts a new transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Handler returned by executing [`Transact`].
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Commits the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of a `W`hat by a `B`y value.
///
/// The `W` parameter only disambiguates operations having the same `B`, for
/// example selecting a single entity or a whole list by the same ID.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the selected value.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns the value to select by.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
