//! [`Rent`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{car, rent, user, Rent},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::rent::{Colliding, Slot},
};

/// Columns of the `rents` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, car_id, user_id, \
    expected_begin, expected_end, \
    expected_price, expected_price_currency, \
    picked_up_at, returned_at, \
    final_price, final_price_currency, \
    created_at";

/// Reads a [`Rent`] from a [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Rent {
    // SAFETY: Ordering of the dates is guaranteed by the
    //         `rents_period_check` constraint.
    #[expect(unsafe_code, reason = "invariants are preserved")]
    let period = unsafe {
        rent::Period::new_unchecked(
            row.get("expected_begin"),
            row.get("expected_end"),
        )
    };

    Rent {
        id: row.get("id"),
        car_id: row.get("car_id"),
        user_id: row.get("user_id"),
        period,
        expected_price: Money {
            amount: row.get("expected_price"),
            currency: row.get("expected_price_currency"),
        },
        picked_up_at: row.get("picked_up_at"),
        returned_at: row.get("returned_at"),
        final_price: row.get::<_, Option<Decimal>>("final_price").map(
            |amount| Money {
                amount,
                currency: row.get("final_price_currency"),
            },
        ),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Rent>, rent::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rent>, rent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rent::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rents \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Rent>, ()>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Rent>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rents \
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

impl<C> Database<Select<By<Vec<Rent>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rent>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rents \
             WHERE user_id = $1::UUID \
             ORDER BY created_at, id"
        );
        Ok(self
            .query(sql.as_str(), &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Rent>, car::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rent>, car::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let car_id: car::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rents \
             WHERE car_id = $1::UUID \
             ORDER BY expected_begin, created_at"
        );
        Ok(self
            .query(sql.as_str(), &[&car_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Option<Colliding<Rent>>, Slot>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Colliding<Rent>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Colliding<Rent>>, Slot>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Slot { car_id, period } = by.into_inner();

        // Only the boundaries of the requested period are checked against
        // the reserved ones, in any status.
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rents \
             WHERE car_id = $1::UUID \
               AND ($2::DATE BETWEEN expected_begin AND expected_end \
                    OR $3::DATE BETWEEN expected_begin AND expected_end) \
             LIMIT 1"
        );
        Ok(self
            .query_opt(
                sql.as_str(),
                &[&car_id, &period.begin(), &period.end()],
            )
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .map(Colliding))
    }
}

impl<C> Database<Insert<Rent>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Rent>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rent): Insert<Rent>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(rent)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Rent>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rent): Update<Rent>,
    ) -> Result<Self::Ok, Self::Err> {
        let Rent {
            id,
            car_id,
            user_id,
            period,
            expected_price,
            picked_up_at,
            returned_at,
            final_price,
            created_at,
        } = rent;
        let final_currency = final_price.map(|p| p.currency);
        let final_price = final_price.map(|p| p.amount);

        const SQL: &str = "\
            INSERT INTO rents (\
                id, car_id, user_id, \
                expected_begin, expected_end, \
                expected_price, expected_price_currency, \
                picked_up_at, returned_at, \
                final_price, final_price_currency, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::DATE, $5::DATE, \
                $6::NUMERIC, $7::INT2, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ, \
                $10::NUMERIC, $11::INT2, \
                $12::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET picked_up_at = EXCLUDED.picked_up_at, \
                returned_at = EXCLUDED.returned_at, \
                final_price = EXCLUDED.final_price, \
                final_price_currency = EXCLUDED.final_price_currency";
        self.exec(
            SQL,
            &[
                &id,
                &car_id,
                &user_id,
                &period.begin(),
                &period.end(),
                &expected_price.amount,
                &expected_price.currency,
                &picked_up_at,
                &returned_at,
                &final_price,
                &final_currency,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Rent, rent::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Rent, rent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rent::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM rents \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
