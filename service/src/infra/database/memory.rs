//! In-memory [`Database`] backing the [`Service`] in unit tests.
//!
//! Transactions behave like Postgres ones in `READ COMMITTED` mode: every
//! read sees the committed [`State`] with the own uncommitted changes of the
//! transaction applied on top, and changes become visible to others only on
//! [`Commit`]. [`Lock`] holds a per-row lock until the transaction is
//! committed or dropped.
//!
//! Every transactional operation yields to the scheduler first, so
//! concurrently executed commands interleave the way they do on a real
//! database.

use std::{collections::HashMap, sync::Arc, time::Duration};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::Debug;
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task,
};
use tracerr::Traced;

use crate::{
    domain::{car, rent, user, Car, Rent, User},
    infra::{database, Database},
    read::rent::{Colliding, Slot},
    Config,
};

/// [`crate::Service`] backed by a [`Memory`] database.
pub(crate) type Service = crate::Service<Memory>;

/// Creates a new [`Service`] with an empty [`Memory`] database.
pub(crate) fn service() -> Service {
    let secret = b"test-secret";
    crate::Service::new(
        Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            session_ttl: Duration::from_secs(30 * 60),
        },
        Memory::default(),
    )
}

/// Stored data, in insertion order.
#[derive(Clone, Debug, Default)]
pub(crate) struct State {
    /// Stored [`Car`]s, including deleted ones.
    cars: Vec<Car>,

    /// Stored [`User`]s, including deleted ones.
    users: Vec<User>,

    /// Stored [`Rent`]s.
    rents: Vec<Rent>,
}

/// Change of a [`State`], replayable on any version of it.
type Change = Box<dyn Fn(&mut State) + Send + Sync>;

/// Row of a [`State`] to be [`Lock`]ed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Row {
    /// [`Car`] row.
    Car(car::Id),

    /// [`User`] row.
    User(user::Id),
}

/// Table of per-[`Row`] locks.
#[derive(Clone, Debug, Default)]
pub(crate) struct Locks(Arc<Mutex<HashMap<Row, Arc<Mutex<()>>>>>);

impl Locks {
    /// Waits until the provided [`Row`] is released by other transactions
    /// and acquires it.
    async fn acquire(&self, row: Row) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.0.lock().await.entry(row).or_default());
        lock.lock_owned().await
    }
}

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory<C = NonTx>(C);

/// Non-transactional [`Memory`] client, applying changes immediately.
#[derive(Clone, Debug, Default)]
pub(crate) struct NonTx {
    /// Committed [`State`].
    committed: Arc<Mutex<State>>,

    /// Row [`Locks`] shared by all the transactions.
    locks: Locks,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub(crate) struct Tx {
    /// Committed [`State`].
    committed: Arc<Mutex<State>>,

    /// Row [`Locks`] shared by all the transactions.
    locks: Locks,

    /// Uncommitted part of this transaction, if it's not committed yet.
    pending: Arc<Mutex<Option<Pending>>>,
}

/// Not yet committed part of a [`Tx`].
#[derive(Debug, Default)]
pub(crate) struct Pending {
    /// [`Change`]s made by the transaction, in order.
    #[debug(skip)]
    changes: Vec<Change>,

    /// [`Row`] locks held until the transaction ends.
    held: Vec<OwnedMutexGuard<()>>,
}

impl Tx {
    /// Holds the provided [`Row`] lock until this [`Tx`] ends.
    async fn lock(&self, row: Row) {
        task::yield_now().await;
        let guard = self.locks.acquire(row).await;
        self.pending
            .lock()
            .await
            .as_mut()
            .expect("`Tx` is committed already")
            .held
            .push(guard);
    }
}

/// Access to the [`State`] visible to a [`Memory`] client.
pub(crate) trait Storage {
    /// Applies the provided function to the visible [`State`].
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R;

    /// Records the provided `change` of the [`State`].
    async fn write(&self, change: impl Fn(&mut State) + Send + Sync + 'static);
}

impl Storage for NonTx {
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&*self.committed.lock().await)
    }

    async fn write(
        &self,
        change: impl Fn(&mut State) + Send + Sync + 'static,
    ) {
        change(&mut *self.committed.lock().await);
    }
}

impl Storage for Tx {
    async fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        task::yield_now().await;
        let mut view = self.committed.lock().await.clone();
        if let Some(pending) = self.pending.lock().await.as_ref() {
            for change in &pending.changes {
                change(&mut view);
            }
        }
        f(&view)
    }

    async fn write(
        &self,
        change: impl Fn(&mut State) + Send + Sync + 'static,
    ) {
        task::yield_now().await;
        self.pending
            .lock()
            .await
            .as_mut()
            .expect("`Tx` is committed already")
            .changes
            .push(Box::new(change));
    }
}

impl Database<Transact> for Memory {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let NonTx { committed, locks } = self.0.clone();
        Ok(Memory(Tx {
            committed,
            locks,
            pending: Arc::new(Mutex::new(Some(Pending::default()))),
        }))
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(Pending { changes, held }) = self.0.pending.lock().await.take()
        else {
            return Ok(());
        };

        let mut committed = self.0.committed.lock().await;
        for change in &changes {
            change(&mut committed);
        }
        drop(committed);
        drop(held);

        Ok(())
    }
}

impl Database<Lock<By<Car, car::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Car, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.lock(Row::Car(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Lock<By<User, user::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.lock(Row::User(by.into_inner())).await;
        Ok(())
    }
}

impl<C: Storage> Database<Select<By<Option<Car>, car::Id>>> for Memory<C> {
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                s.cars
                    .iter()
                    .find(|c| c.id == id && c.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl<C: Storage> Database<Select<By<Option<Car>, &car::Plate>>>
    for Memory<C>
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, &car::Plate>>,
    ) -> Result<Self::Ok, Self::Err> {
        let plate = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                s.cars
                    .iter()
                    .find(|c| c.plate == *plate && c.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl<C: Storage> Database<Select<By<Vec<Car>, ()>>> for Memory<C> {
    type Ok = Vec<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Car>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .read(|s| {
                s.cars
                    .iter()
                    .filter(|c| c.deleted_at.is_none())
                    .cloned()
                    .collect()
            })
            .await)
    }
}

impl<C: Storage> Database<Insert<Car>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(car): Insert<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| s.cars.push(car.clone())).await;
        Ok(())
    }
}

impl<C: Storage> Database<Update<Car>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(car): Update<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(move |s| {
                if let Some(c) = s.cars.iter_mut().find(|c| c.id == car.id) {
                    *c = car.clone();
                }
            })
            .await;
        Ok(())
    }
}

impl<C: Storage> Database<Select<By<Option<User>, user::Id>>> for Memory<C> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                s.users
                    .iter()
                    .find(|u| u.id == id && u.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl<C: Storage> Database<Select<By<Option<User>, &user::Email>>>
    for Memory<C>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                s.users
                    .iter()
                    .find(|u| u.email == *email && u.deleted_at.is_none())
                    .cloned()
            })
            .await)
    }
}

impl<C: Storage> Database<Select<By<Vec<User>, ()>>> for Memory<C> {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<User>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .read(|s| {
                s.users
                    .iter()
                    .filter(|u| u.deleted_at.is_none())
                    .cloned()
                    .collect()
            })
            .await)
    }
}

impl<C: Storage> Database<Insert<User>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| s.users.push(user.clone())).await;
        Ok(())
    }
}

impl<C: Storage> Database<Update<User>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(move |s| {
                if let Some(u) = s.users.iter_mut().find(|u| u.id == user.id)
                {
                    *u = user.clone();
                }
            })
            .await;
        Ok(())
    }
}

impl<C: Storage> Database<Select<By<Option<Rent>, rent::Id>>> for Memory<C> {
    type Ok = Option<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rent>, rent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .0
            .read(|s| s.rents.iter().find(|r| r.id == id).cloned())
            .await)
    }
}

impl<C: Storage> Database<Select<By<Vec<Rent>, ()>>> for Memory<C> {
    type Ok = Vec<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Rent>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.read(|s| s.rents.clone()).await)
    }
}

impl<C: Storage> Database<Select<By<Vec<Rent>, user::Id>>> for Memory<C> {
    type Ok = Vec<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rent>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                s.rents
                    .iter()
                    .filter(|r| r.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .await)
    }
}

impl<C: Storage> Database<Select<By<Vec<Rent>, car::Id>>> for Memory<C> {
    type Ok = Vec<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rent>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                let mut rents = s
                    .rents
                    .iter()
                    .filter(|r| r.car_id == car_id)
                    .cloned()
                    .collect::<Vec<_>>();
                rents.sort_by_key(|r| r.period.begin());
                rents
            })
            .await)
    }
}

impl<C: Storage> Database<Select<By<Option<Colliding<Rent>>, Slot>>>
    for Memory<C>
{
    type Ok = Option<Colliding<Rent>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Colliding<Rent>>, Slot>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Slot { car_id, period } = by.into_inner();
        Ok(self
            .0
            .read(|s| {
                s.rents
                    .iter()
                    .find(|r| {
                        r.car_id == car_id && period.collides_with(&r.period)
                    })
                    .cloned()
                    .map(Colliding)
            })
            .await)
    }
}

impl<C: Storage> Database<Insert<Rent>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rent): Insert<Rent>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0.write(move |s| s.rents.push(rent.clone())).await;
        Ok(())
    }
}

impl<C: Storage> Database<Update<Rent>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rent): Update<Rent>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(move |s| {
                if let Some(r) = s.rents.iter_mut().find(|r| r.id == rent.id)
                {
                    *r = rent.clone();
                }
            })
            .await;
        Ok(())
    }
}

impl<C: Storage> Database<Delete<By<Rent, rent::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Rent, rent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0.write(move |s| s.rents.retain(|r| r.id != id)).await;
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{By, Commit, Lock, Transact};
    use tokio::time;

    use crate::{
        domain::{car, Car},
        infra::Database as _,
    };

    use super::{Memory, NonTx};

    fn lock(id: car::Id) -> Lock<By<Car, car::Id>> {
        Lock(By::new(id))
    }

    #[tokio::test]
    async fn locked_row_waits_for_commit() {
        let db = Memory::<NonTx>::default();
        let id = car::Id::new();

        let first = db.execute(Transact).await.unwrap();
        first.execute(lock(id)).await.unwrap();

        let second = db.execute(Transact).await.unwrap();
        let waited =
            time::timeout(Duration::from_millis(50), second.execute(lock(id)))
                .await;
        assert!(waited.is_err(), "row is locked twice");

        first.execute(Commit).await.unwrap();
        time::timeout(Duration::from_millis(50), second.execute(lock(id)))
            .await
            .expect("row is released on commit")
            .unwrap();
        drop(second);

        let third = db.execute(Transact).await.unwrap();
        third.execute(lock(id)).await.unwrap();
    }
}
