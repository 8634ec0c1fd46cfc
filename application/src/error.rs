//! API [`Error`] and the ways domain failures turn into it.

use std::fmt;

use axum_extra::typed_header::TypedHeaderRejection;
use derive_more::Error as StdError;
use itertools::Itertools as _;
use juniper::IntoFieldError;
use service::infra::database;
use tracerr::{Trace, Traced};

/// Defines an enum of client-facing failures convertible into [`Error`].
///
/// Every variant carries its GraphQL error `code`, the HTTP `status` it maps
/// to, and a human-readable `message`.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Client-facing failure.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self::new(
                            $code,
                            ::http::StatusCode::$status_code,
                            $message,
                        ),
                    )*
                }
            }
        }
    };
}

/// Error reported by the GraphQL API to its clients.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// Machine-readable [`Code`] of this [`Error`].
    pub code: Code,

    /// [`http::StatusCode`] the failure corresponds to.
    pub status_code: http::StatusCode,

    /// Trace of where this [`Error`] originated, if known.
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// Human-readable description of this [`Error`].
    pub message: String,
}

impl Error {
    /// Creates a new [`Error`] without a backtrace.
    #[must_use]
    pub fn new(
        code: Code,
        status_code: http::StatusCode,
        message: impl ToString,
    ) -> Self {
        Self {
            code,
            status_code,
            backtrace: None,
            message: message.to_string(),
        }
    }

    /// Creates a new [`Error`] describing a failure the client cannot fix.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self::new(
            "INTERNAL_SERVER_ERROR",
            http::StatusCode::INTERNAL_SERVER_ERROR,
            msg.to_string(),
        )
    }

    /// Creates a new [`Error`] describing a malformed request.
    #[must_use]
    pub fn bad_request(msg: &impl ToString) -> Self {
        Self::new(
            "BAD_REQUEST",
            http::StatusCode::BAD_REQUEST,
            msg.to_string(),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.code, self.message)?;
        if let Some(trace) = &self.backtrace {
            write!(f, "\n{trace}")?;
        }
        Ok(())
    }
}

impl<S> IntoFieldError<S> for Error
where
    S: From<String>,
{
    fn into_field_error(self) -> juniper::FieldError<S> {
        let frames = self
            .backtrace
            .iter()
            .flat_map(|trace| trace.iter())
            .map(|frame| juniper::Value::scalar(frame.to_string()))
            .collect_vec();

        let mut ext = juniper::Object::with_capacity(3);
        drop(
            ext.add_field("code", juniper::Value::scalar(self.code.to_owned())),
        );
        drop(ext.add_field(
            "status",
            juniper::Value::scalar(self.status_code.as_str().to_owned()),
        ));
        if !frames.is_empty() {
            drop(ext.add_field("backtrace", juniper::Value::list(frames)));
        }
        juniper::FieldError::new(self.message, juniper::Value::object(ext))
    }
}

/// [`Error`] code, in `SCREAMING_SNAKE_CASE`.
pub type Code = &'static str;

/// Conversion of a failure into an [`Error`] visible to API clients.
pub trait AsError {
    /// Returns the client-facing [`Error`] for this failure.
    ///
    /// [`None`] means the failure is internal and must not be exposed as is.
    fn try_as_error(&self) -> Option<Error>;

    /// Converts this failure into an [`Error`], falling back to
    /// [`Error::internal()`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts this failure into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        self.as_ref().try_as_error().map(|mut e| {
            e.backtrace = Some(self.trace().clone());
            e
        })
    }
}

impl AsError for TypedHeaderRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::bad_request(self))
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, FieldError, IntoFieldError as _, Value};

    use super::Error;

    crate::define_error! {
        enum TestError {
            #[code = "CAR_NOT_AVAILABLE"]
            #[status = CONFLICT]
            #[message = "`Car` is reserved for the requested period"]
            NotAvailable,
        }
    }

    #[test]
    fn exposes_code_and_status_in_extensions() {
        let err: Error = TestError::NotAvailable.into();
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
        assert_eq!(
            err.to_string(),
            "[CAR_NOT_AVAILABLE]: `Car` is reserved for the requested period",
        );

        let field: FieldError<DefaultScalarValue> = err.into_field_error();
        let ext = field.extensions().as_object_value().unwrap();
        assert_eq!(
            ext.get_field_value("code"),
            Some(&Value::scalar("CAR_NOT_AVAILABLE".to_owned())),
        );
        assert_eq!(
            ext.get_field_value("status"),
            Some(&Value::scalar("409".to_owned())),
        );
        assert!(ext.get_field_value("backtrace").is_none());
    }
}
