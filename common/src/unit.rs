//! Marker types distinguishing otherwise identical dates and timestamps.

/// Entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Expiration of something temporary.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Purchase of something.
#[derive(Clone, Copy, Debug)]
pub struct Purchase;

/// Beginning of a period.
#[derive(Clone, Copy, Debug)]
pub struct Begin;

/// End of a period.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Handing a car over to its renter.
#[derive(Clone, Copy, Debug)]
pub struct Pickup;

/// Bringing a car back.
#[derive(Clone, Copy, Debug)]
pub struct Return;
