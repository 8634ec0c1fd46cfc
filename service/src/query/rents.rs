//! [`Query`] collection related to the multiple [`Rent`]s.

use common::operations::By;

use crate::domain::{car, user, Rent};
#[cfg(doc)]
use crate::{
    domain::{Car, User},
    Query,
};

use super::DatabaseQuery;

/// Queries all the [`Rent`]s in any status, oldest first.
pub type List = DatabaseQuery<By<Vec<Rent>, ()>>;

/// Queries the [`Rent`]s of a [`User`], oldest first.
pub type ByUser = DatabaseQuery<By<Vec<Rent>, user::Id>>;

/// Queries the [`Rent`]s of a [`Car`], ordered by their beginning.
pub type ByCar = DatabaseQuery<By<Vec<Rent>, car::Id>>;

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, CreateRent},
        domain::user,
        infra::memory,
        Command as _, Query as _,
    };

    use super::{ByCar, ByUser};

    #[tokio::test]
    async fn lists_rents_of_user_and_car() {
        let service = memory::service();
        let later = fixture::reserved(&service).await;
        let earlier = service
            .execute(CreateRent {
                car_id: later.car_id,
                user_id: later.user_id,
                period: fixture::period("2024-04-01", "2024-04-03"),
            })
            .await
            .unwrap();

        let by_user =
            service.execute(ByUser::by(later.user_id)).await.unwrap();
        assert_eq!(
            by_user.iter().map(|r| r.id).collect::<Vec<_>>(),
            [later.id, earlier.id],
        );

        let by_car = service.execute(ByCar::by(later.car_id)).await.unwrap();
        assert_eq!(
            by_car.iter().map(|r| r.id).collect::<Vec<_>>(),
            [earlier.id, later.id],
        );

        let none = service.execute(ByUser::by(user::Id::new())).await.unwrap();
        assert!(none.is_empty());
    }
}
