//! Domain definitions.

pub mod car;
pub mod rent;
pub mod user;

pub use self::{car::Car, rent::Rent, user::User};
