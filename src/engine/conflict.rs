use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// A booking request that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidRequest {
    pub name: String,
    pub phone: String,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub duration: Minutes,
    pub price: Option<f64>,
}

impl ValidRequest {
    pub fn span(&self) -> Span {
        Span::of(self.time, self.duration)
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, EngineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub(crate) fn required_phone(phone: &str) -> Result<&str, EngineError> {
    required(phone, "phone")
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, EngineError> {
    let value = required(value, "date")?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| EngineError::Validation(format!("malformed date: {value:?} (expected YYYY-MM-DD)")))
}

pub(crate) fn validate_request(req: &BookingRequest) -> Result<ValidRequest, EngineError> {
    let name = required(&req.name, "name")?;
    let phone = required(&req.phone, "phone")?;
    let date = parse_date(&req.date)?;
    let time: ClockTime = required(&req.time, "time")?
        .parse()
        .map_err(|e: MalformedTime| EngineError::Validation(e.to_string()))?;
    if req.duration <= 0 {
        return Err(EngineError::Validation(
            "duration must be a positive number of minutes".into(),
        ));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("name too long"));
    }
    if phone.len() > MAX_PHONE_LEN {
        return Err(EngineError::LimitExceeded("phone too long"));
    }
    if req.duration > i64::from(MAX_DURATION_MINUTES) {
        return Err(EngineError::LimitExceeded("duration too long"));
    }

    if let Some(price) = req.price
        && (!price.is_finite() || price < 0.0)
    {
        return Err(EngineError::Validation("price must be a non-negative amount".into()));
    }

    Ok(ValidRequest {
        name: name.to_string(),
        phone: phone.to_string(),
        date,
        time,
        duration: req.duration as Minutes,
        price: req.price,
    })
}

/// Reject `candidate` if it overlaps any booking in `same_day`.
pub(crate) fn check_no_conflict(same_day: &[Booking], candidate: &Span) -> Result<(), EngineError> {
    match same_day.iter().find(|b| b.span().overlaps(candidate)) {
        Some(existing) => Err(EngineError::Conflict(existing.id)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use ulid::Ulid;

    fn request() -> BookingRequest {
        BookingRequest {
            name: "  Alice ".into(),
            phone: " 555 ".into(),
            date: "2024-06-01".into(),
            time: "18:00".into(),
            duration: 90,
            price: None,
        }
    }

    fn validation_message(req: &BookingRequest) -> String {
        match validate_request(req) {
            Err(EngineError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn trims_and_parses() {
        let valid = validate_request(&request()).unwrap();
        assert_eq!(valid.name, "Alice");
        assert_eq!(valid.phone, "555");
        assert_eq!(valid.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(valid.time, ClockTime::hm(18, 0));
        assert_eq!(valid.span(), Span::new(1080, 1170));
    }

    #[test]
    fn missing_fields_rejected() {
        for field in ["name", "phone", "date", "time"] {
            let mut req = request();
            match field {
                "name" => req.name = "   ".into(),
                "phone" => req.phone.clear(),
                "date" => req.date.clear(),
                _ => req.time.clear(),
            }
            assert_eq!(validation_message(&req), format!("{field} is required"));
        }
    }

    #[test]
    fn non_positive_duration_rejected() {
        for duration in [0, -30] {
            let mut req = request();
            req.duration = duration;
            assert!(validation_message(&req).contains("duration"));
        }
    }

    #[test]
    fn malformed_date_and_time_rejected() {
        let mut req = request();
        req.date = "01/06/2024".into();
        assert!(validation_message(&req).contains("malformed date"));

        let mut req = request();
        req.time = "6pm".into();
        assert!(validation_message(&req).contains("malformed time"));
    }

    #[test]
    fn negative_or_nan_price_rejected() {
        for price in [-1.0, f64::NAN, f64::INFINITY] {
            let mut req = request();
            req.price = Some(price);
            assert!(validation_message(&req).contains("price"));
        }
        let mut req = request();
        req.price = Some(0.0);
        assert_eq!(validate_request(&req).unwrap().price, Some(0.0));
    }

    #[test]
    fn limits_enforced() {
        let mut req = request();
        req.name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(validate_request(&req), Err(EngineError::LimitExceeded(_))));

        let mut req = request();
        req.phone = "5".repeat(MAX_PHONE_LEN + 1);
        assert!(matches!(validate_request(&req), Err(EngineError::LimitExceeded(_))));

        let mut req = request();
        req.duration = i64::from(MAX_DURATION_MINUTES) + 1;
        assert!(matches!(validate_request(&req), Err(EngineError::LimitExceeded(_))));
    }

    #[test]
    fn conflict_reports_existing_id() {
        let existing = Booking {
            id: Ulid::new(),
            name: "A".into(),
            phone: "555".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: ClockTime::hm(18, 0),
            duration: 90,
            price: 15.0,
            created_at: NaiveDateTime::default(),
        };
        let same_day = [existing.clone()];

        let err = check_no_conflict(&same_day, &Span::of(ClockTime::hm(18, 30), 30)).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(id) if id == existing.id));
        assert!(check_no_conflict(&same_day, &Span::of(ClockTime::hm(19, 30), 60)).is_ok());
        assert!(check_no_conflict(&same_day, &Span::of(ClockTime::hm(17, 0), 60)).is_ok());
        assert!(check_no_conflict(&[], &Span::of(ClockTime::hm(18, 0), 60)).is_ok());
    }
}
