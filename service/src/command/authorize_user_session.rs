//! [`Command`] for authorizing a [`Session`] by its [`session::Token`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] by its [`session::Token`].
///
/// Expired [`Session`]s and [`Session`]s of deleted [`User`]s are rejected.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        AuthorizeUserSession { token }: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let session = token
            .verify(&self.config.jwt_decoding_key)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        self.database()
            .execute(Select(By::<Option<User>, _>::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`session::Token`] is malformed, forged or expired.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist anymore.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture::new_user, CreateUserSession, DeleteUser},
        domain::user::session,
        infra::memory,
        Command as _,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn rejects_session_of_deleted_user() {
        let service = memory::service();
        let user =
            service.execute(new_user("nina@example.com")).await.unwrap();
        let out = service
            .execute(CreateUserSession::ByUserId(user.id))
            .await
            .unwrap();

        drop(
            service
                .execute(DeleteUser { user_id: user.id })
                .await
                .unwrap(),
        );

        let err = service
            .execute(AuthorizeUserSession { token: out.token })
            .await
            .unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::UserNotExists(id) if *id == user.id,
            ),
            "unexpected error: {err}",
        );
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let service = memory::service();

        let err = service
            .execute(AuthorizeUserSession {
                token: "not-a-jwt".parse::<session::Token>().unwrap(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::JsonWebTokenDecodeError(_)),
            "unexpected error: {err}",
        );
    }
}
