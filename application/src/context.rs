//! Per-request [`Context`] of the GraphQL API.
use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use common::DateTime;
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::{
    command::{self, Command as _},
    domain::user::session,
};
use tokio::sync::OnceCell;

#[cfg(doc)]
use crate::api::User;
use crate::{api, define_error, AsError, Error, JuniperResponse, Service};

/// Context of a single GraphQL request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] executing the request.
    service: Service,

    /// [`http::StatusCode`] to respond with if the request fails.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request, holding its `Authorization` header.
    parts: http::request::Parts,

    /// [`Session`] opened while executing the request, if any.
    opened_session: OnceCell<Session>,

    /// Outcome of authenticating the `Authorization` header, resolved at most
    /// once per request.
    authentication: OnceCell<Result<Session, Error>>,
}

impl Context {
    /// Returns the [`Service`] executing the request.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`http::StatusCode`] to respond with if the request fails.
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        let code = self.error_status_code.load(atomic::Ordering::Relaxed);
        http::StatusCode::from_u16(code)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Sets the [`http::StatusCode`] to respond with if the request fails.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Returns a closure for [`Result::map_err()`], remembering the
    /// [`http::StatusCode`] of the passed [`Error`].
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Makes the provided [`Session`] current for the rest of the request.
    ///
    /// Does nothing if a [`Session`] has been opened in this request already.
    pub fn set_current_session(&self, session: Session) {
        _ = self.opened_session.set(session);
    }

    /// Returns the current [`Session`].
    ///
    /// A [`Session`] opened during the request takes precedence over the
    /// `Authorization` header.
    ///
    /// # Errors
    ///
    /// - `AUTHORIZATION_REQUIRED` if the request carries no bearer token;
    /// - `INVALID_TOKEN` if the token is malformed, expired or belongs to
    ///   a deleted [`User`].
    pub async fn current_session(&self) -> Result<Session, Error> {
        if let Some(session) = self.opened_session.get() {
            return Ok(session.clone());
        }
        self.authentication
            .get_or_init(|| self.authenticate())
            .await
            .clone()
    }

    /// Authenticates the bearer token of the `Authorization` header.
    async fn authenticate(&self) -> Result<Session, Error> {
        let TypedHeader(Authorization(bearer)) = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                if e.is_missing() {
                    AuthError::AuthorizationRequired.into()
                } else {
                    e.into_error()
                }
            })
            .map_err(self.error())?;

        #[expect(unsafe_code, reason = "taken from `Authorization` header")]
        let token =
            unsafe { session::Token::new_unchecked(bearer.token().to_owned()) };
        self.service
            .execute(command::AuthorizeUserSession {
                token: token.clone(),
            })
            .await
            .map(|s| Session {
                user_id: s.user_id.into(),
                token,
                expires_at: s.expires_at.coerce(),
            })
            .map_err(AsError::into_error)
            .map_err(self.error())
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let Some(service) = parts.extensions.get::<Service>().cloned() else {
            let err = Error::internal(&"missing `Service` extension");
            return Err(JuniperResponse {
                status_code: err.status_code,
                response: GraphQLBatchResponse::Single(GraphQLResponse::error(
                    err.into_field_error(),
                )),
            });
        };

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            opened_session: OnceCell::new(),
            authentication: OnceCell::new(),
        })
    }
}

/// Authenticated session of a [`User`].
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of the authenticated [`User`].
    pub user_id: api::user::Id,

    /// Bearer token proving this [`Session`].
    pub token: session::Token,

    /// [`DateTime`] when this [`Session`] expires.
    pub expires_at: DateTime,
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => {
                Some(AuthError::InvalidToken.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Provided token is invalid or expired"]
        InvalidToken,
    }
}

#[cfg(test)]
mod spec {
    use service::{command::authorize_user_session, domain::user};

    use crate::AsError as _;

    #[test]
    fn rejects_tokens_of_deleted_users() {
        let err = authorize_user_session::ExecutionError::UserNotExists(
            user::Id::new(),
        )
        .into_error();

        assert_eq!(err.code, "INVALID_TOKEN");
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
    }
}
