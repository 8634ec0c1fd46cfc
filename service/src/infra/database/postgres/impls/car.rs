//! [`Car`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{car, Car},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `cars` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, brand, model, plate, segment, purchased_on, available, \
    created_at, deleted_at";

/// Reads a [`Car`] from a [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Car {
    Car {
        id: row.get("id"),
        brand: row.get("brand"),
        model: row.get("model"),
        plate: row.get("plate"),
        segment: row.get("segment"),
        purchased_on: row.get("purchased_on"),
        available: row.get("available"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<Car>, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: car::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM cars \
             WHERE id = $1::UUID \
               AND deleted_at IS NULL"
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<Car>, &'l car::Plate>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Car>, &'l car::Plate>>,
    ) -> Result<Self::Ok, Self::Err> {
        let plate = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM cars \
             WHERE plate = $1::VARCHAR \
               AND deleted_at IS NULL \
             LIMIT 1"
        );
        Ok(self
            .query_opt(sql.as_str(), &[plate])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Car>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Car>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Car>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM cars \
             WHERE deleted_at IS NULL \
             ORDER BY created_at, id"
        );
        Ok(self
            .query(sql.as_str(), &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Car>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Car>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(car): Insert<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(car)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Car>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(car): Update<Car>,
    ) -> Result<Self::Ok, Self::Err> {
        let Car {
            id,
            brand,
            model,
            plate,
            segment,
            purchased_on,
            available,
            created_at,
            deleted_at,
        } = car;

        const SQL: &str = "\
            INSERT INTO cars (\
                id, brand, model, plate, \
                segment, purchased_on, available, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::INT2, $6::DATE, $7::BOOL, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET brand = EXCLUDED.brand, \
                model = EXCLUDED.model, \
                plate = EXCLUDED.plate, \
                segment = EXCLUDED.segment, \
                purchased_on = EXCLUDED.purchased_on, \
                available = EXCLUDED.available, \
                created_at = EXCLUDED.created_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &brand,
                &model,
                &plate,
                &segment,
                &purchased_on,
                &available,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Car, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Car, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: car::Id = by.into_inner();

        // Touching the existing row holds its lock until the end of the
        // transaction.
        const SQL: &str = "\
            INSERT INTO cars_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
