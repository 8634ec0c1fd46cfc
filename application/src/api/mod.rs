//! GraphQL API definitions.

pub mod car;
mod mutation;
mod query;
pub mod rent;
pub mod scalar;
pub mod user;

use crate::{define_error, Context};

pub use self::{
    car::Car, mutation::Mutation, query::Query, rent::Rent, user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<
    'static,
    Query,
    Mutation,
    juniper::EmptySubscription<Context>,
>;

define_error! {
    enum PeriodError {
        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "`beginDate` must not follow `endDate`"]
        Invalid,
    }
}
