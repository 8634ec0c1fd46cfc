//! [`Command`] for opening a [`Session`].

#[cfg(doc)]
use common::DateTime;
use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Email, Password};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for opening a [`Session`].
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Open a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Email`] the [`User`] signed up with.
        email: user::Email,

        /// [`Password`] of the [`User`].
        password: SecretBox<user::Password>,
    },

    /// Open a new [`Session`] for a known [`User`], right after sign-up.
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the opened [`Session`].
    pub token: session::Token,

    /// [`User`] the [`Session`] is opened for.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { email, password } => {
                // Unknown email and wrong password are indistinguishable.
                let user = self
                    .database()
                    .execute(Select(By::new(&email)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;

                if !user.password_hash.verify(password.expose_secret()) {
                    return Err(tracerr::new!(E::WrongCredentials));
                }

                user
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let session = Session::open(user.id, self.config.session_ttl);
        let token = session
            .sign(&self.config.jwt_encoding_key)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            token,
            user,
            expires_at: session.expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{fixture::new_user, AuthorizeUserSession},
        domain::user,
        infra::memory,
        Command as _,
    };

    use super::{CreateUserSession, ExecutionError};

    #[tokio::test]
    async fn opens_session_by_credentials() {
        let service = memory::service();
        let created =
            service.execute(new_user("kate@example.com")).await.unwrap();

        let out = service
            .execute(CreateUserSession::ByCredentials {
                email: user::Email::new("kate@example.com").unwrap(),
                password: SecretBox::new(Box::new(
                    user::Password::new("Pa55word").unwrap(),
                )),
            })
            .await
            .unwrap();
        assert_eq!(out.user.id, created.id);

        let session = service
            .execute(AuthorizeUserSession { token: out.token })
            .await
            .unwrap();
        assert_eq!(session.user_id, created.id);
    }

    #[tokio::test]
    async fn rejects_wrong_credentials() {
        let service = memory::service();
        drop(service.execute(new_user("kate@example.com")).await.unwrap());

        for (email, password) in [
            ("kate@example.com", "wrongpass"),
            ("nobody@example.com", "Pa55word"),
        ] {
            let err = service
                .execute(CreateUserSession::ByCredentials {
                    email: user::Email::new(email).unwrap(),
                    password: SecretBox::new(Box::new(
                        user::Password::new(password).unwrap(),
                    )),
                })
                .await
                .unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::WrongCredentials),
                "unexpected error: {err}",
            );
        }
    }
}
