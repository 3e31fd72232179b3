use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{debug, info};
use ulid::Ulid;

use crate::auth::Access;
use crate::model::*;
use crate::notify::Notification;
use crate::observability::record_outcome;

use super::conflict::{check_no_conflict, required_phone, validate_request};
use super::{Engine, EngineError};

impl Engine {
    /// Validate, conflict-check and persist a new booking.
    ///
    /// An explicit `price` is used whenever present (zero included) and only a
    /// privileged caller may supply one; otherwise the price table decides.
    pub async fn create_booking(&self, access: Access, request: BookingRequest) -> Result<Booking, EngineError> {
        let result = self.create_booking_inner(access, request).await;
        record_outcome("create_booking", &result);
        result
    }

    async fn create_booking_inner(&self, access: Access, request: BookingRequest) -> Result<Booking, EngineError> {
        let valid = validate_request(&request)?;
        if valid.price.is_some() {
            access.require_privileged()?;
        }
        let span = valid.span();

        let _guard = self.lock_date(valid.date).await;
        let same_day = self.store.list_by_date(valid.date).await?;
        if let Err(e) = check_no_conflict(&same_day, &span) {
            debug!("rejected {} {} +{}m: {e}", valid.date, valid.time, valid.duration);
            return Err(e);
        }

        let price = valid.price.unwrap_or_else(|| self.prices.price_for(valid.duration));
        let booking = Booking {
            id: Ulid::new(),
            name: valid.name,
            phone: valid.phone,
            date: valid.date,
            time: valid.time,
            duration: valid.duration,
            price,
            created_at: Local::now().naive_local(),
        };
        self.store.insert(booking.clone()).await?;
        info!(
            "booking {} confirmed for {} {} +{}m at {}",
            booking.id, booking.date, booking.time, booking.duration, booking.price
        );
        self.publish(Notification::BookingCreated(booking.clone()));
        Ok(booking)
    }

    /// Self-service cancellation. The phone must match the booking and the booking
    /// must start strictly after `now` (local wall clock).
    pub async fn cancel_booking(&self, id: Ulid, phone: &str, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let result = self.cancel_booking_inner(id, phone, now).await;
        record_outcome("cancel_booking", &result);
        result
    }

    async fn cancel_booking_inner(&self, id: Ulid, phone: &str, now: NaiveDateTime) -> Result<Booking, EngineError> {
        let phone = required_phone(phone)?;
        let booking = self.store.get(id).await?.ok_or(EngineError::NotFound(id))?;
        if booking.phone != phone {
            return Err(EngineError::Forbidden(id));
        }
        if booking.starts_at() <= now {
            return Err(EngineError::TooLate(id));
        }
        if !self.store.delete(id).await? {
            // Lost a race with another delete.
            return Err(EngineError::NotFound(id));
        }
        info!("booking {id} cancelled by requester");
        self.publish(Notification::BookingDeleted { id, date: booking.date });
        Ok(booking)
    }

    /// Unconditional delete. Returns whether the booking existed; a missing id is
    /// a silent no-op.
    pub async fn admin_delete(&self, access: Access, id: Ulid) -> Result<bool, EngineError> {
        let result = self.admin_delete_inner(access, id).await;
        record_outcome("admin_delete", &result);
        result
    }

    async fn admin_delete_inner(&self, access: Access, id: Ulid) -> Result<bool, EngineError> {
        access.require_privileged()?;
        let Some(booking) = self.store.get(id).await? else {
            return Ok(false);
        };
        if !self.store.delete(id).await? {
            return Ok(false);
        }
        info!("booking {id} deleted by admin");
        self.publish(Notification::BookingDeleted { id, date: booking.date });
        Ok(true)
    }

    /// Remove every booking. One `bookings-cleared` event regardless of count.
    pub async fn admin_delete_all(&self, access: Access) -> Result<u64, EngineError> {
        let result = self.admin_delete_all_inner(access).await;
        record_outcome("admin_delete_all", &result);
        result
    }

    async fn admin_delete_all_inner(&self, access: Access) -> Result<u64, EngineError> {
        access.require_privileged()?;
        let removed = self.store.delete_all().await?;
        info!("cleared all bookings ({removed} removed)");
        self.publish(Notification::BookingsCleared {});
        Ok(removed)
    }

    /// Remove bookings dated strictly before `reference`.
    pub async fn admin_delete_past(&self, access: Access, reference: NaiveDate) -> Result<u64, EngineError> {
        let result = self.admin_delete_past_inner(access, reference).await;
        record_outcome("admin_delete_past", &result);
        result
    }

    async fn admin_delete_past_inner(&self, access: Access, reference: NaiveDate) -> Result<u64, EngineError> {
        access.require_privileged()?;
        let removed = self.store.delete_before(reference).await?;
        self.prune_date_locks(reference);
        info!("purged {removed} bookings dated before {reference}");
        self.publish(Notification::BookingsCleared {});
        Ok(removed)
    }
}
