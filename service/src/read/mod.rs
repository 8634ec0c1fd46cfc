//! Read entities definitions.

pub mod rent;
