//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
///
/// Soft-deleted [`User`]s are reported as missing.
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::new_user, domain::user, infra::memory,
        Command as _, Query as _,
    };

    use super::ById;

    #[tokio::test]
    async fn finds_registered_user() {
        let service = memory::service();
        let user =
            service.execute(new_user("lena@example.com")).await.unwrap();

        let found = service
            .execute(ById::by(user.id))
            .await
            .unwrap()
            .expect("`User` should be found");
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, user.email);
        assert_eq!(found.license_id, user.license_id);

        let missing =
            service.execute(ById::by(user::Id::new())).await.unwrap();
        assert!(missing.is_none());
    }
}
