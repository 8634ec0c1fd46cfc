//! [`Handler`] abstraction shared by commands, queries and databases.

use std::future::Future;

/// Something executing `Args` asynchronously.
///
/// Commands and queries of the service, as well as every storage operation,
/// are expressed as implementations of this trait for a particular `Args`
/// type, so a single value may handle many different operations.
pub trait Handler<Args = ()> {
    /// Value produced on success.
    type Ok;

    /// Error produced on failure.
    type Err;

    /// Executes the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
