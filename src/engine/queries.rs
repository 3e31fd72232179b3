use chrono::NaiveDate;

use crate::auth::Access;
use crate::limits::*;
use crate::model::*;
use crate::observability::record_outcome;

use super::availability::availability;
use super::conflict::required_phone;
use super::slots::daily_slots;
use super::{Engine, EngineError};

impl Engine {
    /// Day view over the fixed slot grid.
    pub async fn availability(&self, date: NaiveDate) -> Result<Vec<Slot>, EngineError> {
        let bookings = self.store.list_by_date(date).await?;
        Ok(availability(date, &daily_slots(), &bookings))
    }

    /// Admin listing. With both bounds: bookings in `[from, to]`, ascending. With
    /// either bound missing: the latest bookings, descending.
    pub async fn list_bookings(
        &self,
        access: Access,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Booking>, EngineError> {
        let result = async {
            access.require_privileged()?;
            let rows = match (from, to) {
                (Some(from), Some(to)) => self.store.list_by_range(from, to).await?,
                _ => self.store.list_recent(RECENT_BOOKINGS_LIMIT).await?,
            };
            Ok::<_, EngineError>(rows)
        }
        .await;
        record_outcome("list_bookings", &result);
        result
    }

    /// A requester's own bookings, ascending. No privilege needed.
    pub async fn list_by_phone(&self, phone: &str) -> Result<Vec<Booking>, EngineError> {
        let phone = required_phone(phone)?;
        Ok(self.store.list_by_phone(phone).await?)
    }

    /// Revenue per booked date in `[from, to]` plus the grand total.
    pub async fn report(&self, access: Access, from: NaiveDate, to: NaiveDate) -> Result<Report, EngineError> {
        access.require_privileged()?;
        let rows = self.store.aggregate_by_date(from, to).await?;
        let total = rows.iter().map(|r| r.revenue).sum();
        Ok(Report { rows, total })
    }
}
