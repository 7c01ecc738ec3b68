use std::time::Duration;

use async_trait::async_trait;
use common::{
    BookingId, BookingStatus, LocationId, Money, PaymentId, RoomId, RoomStatus, UserId,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Result, StoreError,
    record::{
        Booking, Location, NewBooking, NewLocation, NewPayment, NewRoom, NewUser, Payment, Room,
        RoomDetails, User,
    },
    store::{EntityStore, StoreTransaction},
};

/// Partial unique index allowing one pending/confirmed booking per room.
const ACTIVE_BOOKING_INDEX: &str = "one_active_booking_per_room";

const USER_COLUMNS: &str = "id, name, email, role, created_at";
const LOCATION_COLUMNS: &str = "id, name, description, address, maps_url, thumbnail_url, price_range_start, price_range_end, created_at";
const ROOM_COLUMNS: &str =
    "id, pg_location_id, room_number, price, with_attached_bath, status, created_at";
const BOOKING_COLUMNS: &str = "id, user_id, room_id, booking_date, status, notes_or_requests";
const PAYMENT_COLUMNS: &str = "id, booking_id, amount, upi_reference, screenshot_url, verified_by_admin, verified_by_id, created_at";

/// Default time a transaction waits for a row lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed entity store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStore {
    /// Creates a new PostgreSQL entity store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a transaction waits for a contended row lock.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn row_to_user(row: PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: role.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_location(row: PgRow) -> Result<Location> {
    Ok(Location {
        id: LocationId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        address: row.try_get("address")?,
        maps_url: row.try_get("maps_url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        price_range_start: Money::from_minor(row.try_get("price_range_start")?),
        price_range_end: Money::from_minor(row.try_get("price_range_end")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_room(row: PgRow) -> Result<Room> {
    let status: String = row.try_get("status")?;
    Ok(Room {
        id: RoomId::new(row.try_get("id")?),
        location_id: LocationId::new(row.try_get("pg_location_id")?),
        room_number: row.try_get("room_number")?,
        price: Money::from_minor(row.try_get("price")?),
        with_attached_bath: row.try_get("with_attached_bath")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_booking(row: PgRow) -> Result<Booking> {
    let status: String = row.try_get("status")?;
    Ok(Booking {
        id: BookingId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        room_id: RoomId::new(row.try_get("room_id")?),
        booking_date: row.try_get("booking_date")?,
        status: status.parse()?,
        notes: row.try_get("notes_or_requests")?,
    })
}

fn row_to_payment(row: PgRow) -> Result<Payment> {
    Ok(Payment {
        id: PaymentId::new(row.try_get("id")?),
        booking_id: BookingId::new(row.try_get("booking_id")?),
        amount: Money::from_minor(row.try_get("amount")?),
        upi_reference: row.try_get("upi_reference")?,
        screenshot_url: row.try_get("screenshot_url")?,
        verified: row.try_get("verified_by_admin")?,
        verified_by: row
            .try_get::<Option<i64>, _>("verified_by_id")?
            .map(UserId::new),
        created_at: row.try_get("created_at")?,
    })
}

/// Translates constraint violations into store-level errors.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_foreign_key_violation()
    {
        return StoreError::ForeignKey(db_err.message().to_string());
    }
    StoreError::Database(err)
}

#[async_trait]
impl EntityStore for PostgresStore {
    type Tx = PgStoreTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let mut tx = self.pool.begin().await?;
        // Transaction-local, equivalent to SET LOCAL lock_timeout.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await?;
        Ok(PgStoreTransaction { tx })
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row_to_user(row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(row_to_user)
            .transpose()
    }

    async fn insert_location(&self, location: NewLocation) -> Result<Location> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO pg_locations
                (name, description, address, maps_url, thumbnail_url, price_range_start, price_range_end)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&location.name)
        .bind(&location.description)
        .bind(&location.address)
        .bind(&location.maps_url)
        .bind(&location.thumbnail_url)
        .bind(location.price_range_start.minor())
        .bind(location.price_range_end.minor())
        .fetch_one(&self.pool)
        .await?;

        row_to_location(row)
    }

    async fn get_location(&self, id: LocationId) -> Result<Option<Location>> {
        sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM pg_locations WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(row_to_location)
        .transpose()
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOCATION_COLUMNS} FROM pg_locations ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_location).collect()
    }

    async fn insert_room(&self, room: NewRoom) -> Result<Room> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO rooms (pg_location_id, room_number, price, with_attached_bath)
            VALUES ($1, $2, $3, $4)
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(room.location_id.as_i64())
        .bind(&room.room_number)
        .bind(room.price.minor())
        .bind(room.with_attached_bath)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row_to_room(row)
    }

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>> {
        sqlx::query(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .map(row_to_room)
            .transpose()
    }

    async fn rooms_by_location(&self, location_id: LocationId) -> Result<Vec<Room>> {
        let rows = sqlx::query(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE pg_location_id = $1 ORDER BY id ASC"
        ))
        .bind(location_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_room).collect()
    }

    async fn update_room_details(&self, id: RoomId, details: RoomDetails) -> Result<Option<Room>> {
        sqlx::query(&format!(
            r#"
            UPDATE rooms SET
                room_number = COALESCE($2, room_number),
                price = COALESCE($3, price),
                with_attached_bath = COALESCE($4, with_attached_bath)
            WHERE id = $1
            RETURNING {ROOM_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(details.room_number)
        .bind(details.price.map(|p| p.minor()))
        .bind(details.with_attached_bath)
        .fetch_optional(&self.pool)
        .await?
        .map(row_to_room)
        .transpose()
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Booking submission locks the room first, so this serializes with it.
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(id.as_i64())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE room_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&mut *tx)
                .await?;
        if referenced {
            return Err(StoreError::RoomInUse(id));
        }

        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(row_to_booking)
        .transpose()
    }

    async fn bookings_by_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC, id DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn bookings_by_room(&self, room_id: RoomId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE room_id = $1 ORDER BY booking_date DESC, id DESC"
        ))
        .bind(room_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn bookings_with_status(&self, status: BookingStatus) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = $1 ORDER BY booking_date DESC, id DESC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn all_bookings(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY booking_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .map(row_to_payment)
        .transpose()
    }

    async fn payments_by_booking(&self, booking_id: BookingId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(booking_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_payment).collect()
    }
}

/// An open PostgreSQL transaction.
///
/// Dropping it without calling `commit` rolls back.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn lock_room(&mut self, id: RoomId) -> Result<Option<Room>> {
        sqlx::query(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_room)
        .transpose()
    }

    async fn set_room_status(&mut self, id: RoomId, status: RoomStatus) -> Result<Option<Room>> {
        sqlx::query(&format!(
            "UPDATE rooms SET status = $2 WHERE id = $1 RETURNING {ROOM_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_room)
        .transpose()
    }

    async fn insert_booking(&mut self, booking: NewBooking) -> Result<Booking> {
        let room_id = booking.room_id;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bookings (user_id, room_id, status, notes_or_requests)
            VALUES ($1, $2, 'Pending', $3)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking.user_id.as_i64())
        .bind(room_id.as_i64())
        .bind(&booking.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(ACTIVE_BOOKING_INDEX)
            {
                return StoreError::ActiveBookingExists(room_id);
            }
            map_write_error(e)
        })?;

        row_to_booking(row)
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_booking)
        .transpose()
    }

    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<Option<Booking>> {
        sqlx::query(&format!(
            "UPDATE bookings SET status = $2 WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_write_error)?
        .map(row_to_booking)
        .transpose()
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Payment> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payments (booking_id, amount, upi_reference, screenshot_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment.booking_id.as_i64())
        .bind(payment.amount.minor())
        .bind(&payment.upi_reference)
        .bind(&payment.screenshot_url)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;

        row_to_payment(row)
    }

    async fn lock_payment(&mut self, id: PaymentId) -> Result<Option<Payment>> {
        sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_payment)
        .transpose()
    }

    async fn latest_payment_for_booking(
        &mut self,
        booking_id: BookingId,
    ) -> Result<Option<Payment>> {
        sqlx::query(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE booking_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(booking_id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(row_to_payment)
        .transpose()
    }

    async fn mark_payment_verified(
        &mut self,
        id: PaymentId,
        admin_id: UserId,
    ) -> Result<Option<Payment>> {
        sqlx::query(&format!(
            r#"
            UPDATE payments SET verified_by_admin = TRUE, verified_by_id = $2
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(admin_id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_write_error)?
        .map(row_to_payment)
        .transpose()
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
