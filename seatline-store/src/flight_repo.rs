use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seatline_core::{Flight, FlightFilter, FlightStore, Seat, SeatStatus, StoreError};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

const FLIGHT_COLUMNS: &str = r#"
    id, airline, origin, destination, departure_time, arrival_time,
    price_amount, price_currency, total_seats, available_seats, version
"#;

pub struct PostgresFlightStore {
    pool: PgPool,
}

impl PostgresFlightStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline: String,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price_amount: i32,
    price_currency: String,
    total_seats: i32,
    available_seats: i32,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    flight_id: Uuid,
    label: String,
    position: i32,
    status: String,
}

fn store_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Corrupt(err.to_string())
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn to_db_count(value: u32, field: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} out of range: {}", field, value)))
}

fn from_db_count(value: i32, field: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {}: {}", field, value)))
}

fn into_flight(row: FlightRow, seat_rows: Vec<SeatRow>) -> Result<Flight, StoreError> {
    let seats = seat_rows
        .into_iter()
        .map(|s| {
            let status = SeatStatus::parse(&s.status).ok_or_else(|| {
                StoreError::Corrupt(format!("seat {} has unknown status {}", s.label, s.status))
            })?;
            Ok(Seat {
                flight_id: s.flight_id,
                label: s.label,
                position: from_db_count(s.position, "seat position")?,
                status,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

    Ok(Flight {
        id: row.id,
        airline: row.airline,
        origin: row.origin,
        destination: row.destination,
        departure_time: row.departure_time,
        arrival_time: row.arrival_time,
        price_amount: row.price_amount,
        price_currency: row.price_currency,
        total_seats: from_db_count(row.total_seats, "total_seats")?,
        available_seats: from_db_count(row.available_seats, "available_seats")?,
        version: u64::try_from(row.version)
            .map_err(|_| StoreError::Corrupt(format!("negative version: {}", row.version)))?,
        seats,
    })
}

async fn fetch_flight(conn: &mut PgConnection, id: Uuid) -> Result<Option<Flight>, StoreError> {
    let row = sqlx::query_as::<_, FlightRow>(&format!("SELECT {} FROM flights WHERE id = $1", FLIGHT_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(store_err)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let seats = sqlx::query_as::<_, SeatRow>(
        "SELECT flight_id, label, position, status FROM seats WHERE flight_id = $1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(store_err)?;

    into_flight(row, seats).map(Some)
}

async fn begin_snapshot(pool: &PgPool) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, StoreError> {
    let mut tx = pool.begin().await.map_err(store_err)?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
    Ok(tx)
}

#[async_trait]
impl FlightStore for PostgresFlightStore {
    async fn load_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let mut tx = begin_snapshot(&self.pool).await?;
        let flight = fetch_flight(&mut *tx, id).await?;
        tx.commit().await.map_err(store_err)?;
        Ok(flight)
    }

    async fn save_flight(&self, mut flight: Flight) -> Result<Flight, StoreError> {
        let total_seats = to_db_count(flight.total_seats, "total_seats")?;
        let available_seats = to_db_count(flight.available_seats, "available_seats")?;
        let expected_version = i64::try_from(flight.version)
            .map_err(|_| StoreError::Corrupt(format!("version out of range: {}", flight.version)))?;

        let labels: Vec<String> = flight.seats.iter().map(|s| s.label.clone()).collect();
        let statuses: Vec<String> = flight.seats.iter().map(|s| s.status.as_str().to_string()).collect();

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        if flight.version == 0 {
            let inserted = sqlx::query(
                r#"
                INSERT INTO flights (id, airline, origin, destination, departure_time, arrival_time,
                                     price_amount, price_currency, total_seats, available_seats, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1)
                "#,
            )
            .bind(flight.id)
            .bind(&flight.airline)
            .bind(&flight.origin)
            .bind(&flight.destination)
            .bind(flight.departure_time)
            .bind(flight.arrival_time)
            .bind(flight.price_amount)
            .bind(&flight.price_currency)
            .bind(total_seats)
            .bind(available_seats)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                if let sqlx::Error::Database(db_err) = &err {
                    if db_err.is_unique_violation() {
                        warn!("Flight {} already exists", flight.id);
                        return Err(StoreError::Conflict(flight.id));
                    }
                }
                return Err(store_err(err));
            }

            let positions = flight
                .seats
                .iter()
                .map(|s| to_db_count(s.position, "seat position"))
                .collect::<Result<Vec<i32>, StoreError>>()?;

            sqlx::query(
                r#"
                INSERT INTO seats (flight_id, label, position, status)
                SELECT $1, s.label, s.position, s.status
                FROM UNNEST($2::text[], $3::int4[], $4::text[]) AS s(label, position, status)
                "#,
            )
            .bind(flight.id)
            .bind(&labels)
            .bind(&positions)
            .bind(&statuses)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        } else {
            let updated = sqlx::query(
                r#"
                UPDATE flights
                SET airline = $3, origin = $4, destination = $5, departure_time = $6, arrival_time = $7,
                    price_amount = $8, price_currency = $9, available_seats = $10, version = version + 1
                WHERE id = $1 AND version = $2
                "#,
            )
            .bind(flight.id)
            .bind(expected_version)
            .bind(&flight.airline)
            .bind(&flight.origin)
            .bind(&flight.destination)
            .bind(flight.departure_time)
            .bind(flight.arrival_time)
            .bind(flight.price_amount)
            .bind(&flight.price_currency)
            .bind(available_seats)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

            if updated.rows_affected() == 0 {
                tx.rollback().await.map_err(store_err)?;
                debug!("Version {} of flight {} is stale", flight.version, flight.id);
                return Err(StoreError::Conflict(flight.id));
            }

            sqlx::query(
                r#"
                UPDATE seats AS s
                SET status = u.status
                FROM UNNEST($2::text[], $3::text[]) AS u(label, status)
                WHERE s.flight_id = $1 AND s.label = u.label AND s.status <> u.status
                "#,
            )
            .bind(flight.id)
            .bind(&labels)
            .bind(&statuses)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;

        flight.version += 1;
        Ok(flight)
    }

    async fn delete_flight(&self, id: Uuid) -> Result<Option<Flight>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query("SELECT id FROM flights WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        let Some(flight) = fetch_flight(&mut *tx, id).await? else {
            tx.rollback().await.map_err(store_err)?;
            return Ok(None);
        };

        // Seats go with the flight (ON DELETE CASCADE)
        sqlx::query("DELETE FROM flights WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(Some(flight))
    }

    async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<Flight>, StoreError> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let rows = sqlx::query_as::<_, FlightRow>(&format!(
            "SELECT {} FROM flights WHERE ($1 OR available_seats > 0) ORDER BY departure_time, id",
            FLIGHT_COLUMNS
        ))
        .bind(filter == FlightFilter::All)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let seat_rows = sqlx::query_as::<_, SeatRow>(
            "SELECT flight_id, label, position, status FROM seats WHERE flight_id = ANY($1) ORDER BY flight_id, position",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        let mut seats_by_flight: HashMap<Uuid, Vec<SeatRow>> = HashMap::new();
        for seat in seat_rows {
            seats_by_flight.entry(seat.flight_id).or_default().push(seat);
        }

        rows.into_iter()
            .map(|row| {
                let seats = seats_by_flight.remove(&row.id).unwrap_or_default();
                into_flight(row, seats)
            })
            .collect()
    }
}
