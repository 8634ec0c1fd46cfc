//! [`Session`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Authenticated session of a [`User`], carried by a [`Token`] as its JWT
/// claims.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Opens a new [`Session`] of the [`User`], valid for the provided `ttl`.
    #[must_use]
    pub fn open(user_id: user::Id, ttl: Duration) -> Self {
        Self {
            user_id,
            expires_at: ExpirationDateTime::now() + ttl,
        }
    }

    /// Signs this [`Session`] into a new [`Token`].
    ///
    /// # Errors
    ///
    /// If the `key` cannot sign HS256 JWTs.
    pub fn sign(
        &self,
        key: &EncodingKey,
    ) -> Result<Token, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::default(), self, key).map(Token)
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }

    /// Verifies the signature and expiration of this [`Token`], returning
    /// the [`Session`] it carries.
    ///
    /// # Errors
    ///
    /// If this [`Token`] is malformed, signed by another key or expired.
    pub fn verify(
        &self,
        key: &DecodingKey,
    ) -> Result<Session, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode(&self.0, key, &Validation::default())
            .map(|data| data.claims)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey};

    use crate::domain::user;

    use super::{ExpirationDateTime, Session};

    #[test]
    fn verifies_signed_session() {
        let user_id = user::Id::new();
        let session = Session::open(user_id, Duration::from_secs(60));

        let token = session.sign(&EncodingKey::from_secret(b"key")).unwrap();
        let verified =
            token.verify(&DecodingKey::from_secret(b"key")).unwrap();

        assert_eq!(verified.user_id, user_id);
        assert_eq!(
            verified.expires_at.unix_timestamp(),
            session.expires_at.unix_timestamp(),
        );

        let err = token
            .verify(&DecodingKey::from_secret(b"other"))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn rejects_expired_session() {
        let session = Session {
            user_id: user::Id::new(),
            expires_at: ExpirationDateTime::from_unix_timestamp(
                ExpirationDateTime::now().unix_timestamp() - 3600,
            )
            .unwrap(),
        };

        let err = session
            .sign(&EncodingKey::from_secret(b"key"))
            .unwrap()
            .verify(&DecodingKey::from_secret(b"key"))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }
}
