use std::collections::BTreeMap;
use std::str::FromStr;

use crate::model::Minutes;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid price table entry {entry:?}: {reason}")]
pub struct PriceTableError {
    pub entry: String,
    pub reason: &'static str,
}

/// Duration → price lookup. Unknown durations cost nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    prices: BTreeMap<Minutes, f64>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::from_iter([(60, 10.0), (90, 15.0), (120, 20.0)])
    }
}

impl FromIterator<(Minutes, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (Minutes, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

impl PriceTable {
    pub fn price_for(&self, duration: Minutes) -> f64 {
        self.prices.get(&duration).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Minutes, f64)> + '_ {
        self.prices.iter().map(|(d, p)| (*d, *p))
    }
}

/// Parses `"60:10,90:15,120:20"`. Empty entries are skipped; a later entry for the
/// same duration wins.
impl FromStr for PriceTable {
    type Err = PriceTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut prices = BTreeMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let err = |reason| PriceTableError {
                entry: entry.to_string(),
                reason,
            };
            let (duration, price) = entry.split_once(':').ok_or_else(|| err("expected DURATION:PRICE"))?;
            let duration: Minutes = duration
                .trim()
                .parse()
                .map_err(|_| err("duration is not a whole number of minutes"))?;
            if duration == 0 {
                return Err(err("duration must be positive"));
            }
            let price: f64 = price.trim().parse().map_err(|_| err("price is not a number"))?;
            if !price.is_finite() || price < 0.0 {
                return Err(err("price must be a non-negative amount"));
            }
            prices.insert(duration, price);
        }
        Ok(Self { prices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let table = PriceTable::default();
        assert_eq!(table.price_for(60), 10.0);
        assert_eq!(table.price_for(90), 15.0);
        assert_eq!(table.price_for(120), 20.0);
    }

    #[test]
    fn unknown_duration_is_free() {
        let table = PriceTable::default();
        assert_eq!(table.price_for(30), 0.0);
        assert_eq!(table.price_for(61), 0.0);
    }

    #[test]
    fn parse_promotional_table() {
        let table: PriceTable = "60:10, 90:12.5 ,120:15".parse().unwrap();
        assert_eq!(table.price_for(90), 12.5);
        assert_eq!(table.price_for(120), 15.0);
        assert_eq!(table.iter().count(), 3);
    }

    #[test]
    fn parse_empty_is_empty_table() {
        let table: PriceTable = "".parse().unwrap();
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.price_for(60), 0.0);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("60=10".parse::<PriceTable>().is_err());
        assert!("sixty:10".parse::<PriceTable>().is_err());
        assert!("0:10".parse::<PriceTable>().is_err());
        assert!("60:-1".parse::<PriceTable>().is_err());
        assert!("60:NaN".parse::<PriceTable>().is_err());
    }

    #[test]
    fn later_entry_wins() {
        let table: PriceTable = "60:10,60:8".parse().unwrap();
        assert_eq!(table.price_for(60), 8.0);
    }
}
