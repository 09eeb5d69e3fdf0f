/// In-memory `ClimateStore` backed by a shared, immutable dataset.
///
/// Follows the SQL templates in `store` row for row: text comparison on
/// dates, `(date, station)` ordering, and a one-row aggregate. Backs the
/// endpoint tests.

use std::sync::Arc;

use crate::error::StoreError;
use crate::model::{Measurement, Station, TemperatureSummary};
use crate::store::{ClimateStore, Connector};

/// The two tables, loaded once and shared across requests.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub measurements: Vec<Measurement>,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone)]
pub struct MemoryConnector {
    dataset: Arc<Dataset>,
}

impl MemoryConnector {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset: Arc::new(dataset) }
    }
}

impl Connector for MemoryConnector {
    type Store = MemoryStore;

    fn open(&self) -> Result<MemoryStore, StoreError> {
        Ok(MemoryStore { dataset: Arc::clone(&self.dataset) })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    dataset: Arc<Dataset>,
}

impl MemoryStore {
    fn in_range<'a>(&'a self, start: &'a str, end: Option<&'a str>) -> impl Iterator<Item = &'a Measurement> + 'a {
        self.dataset
            .measurements
            .iter()
            .filter(move |m| m.date.as_str() >= start && end.is_none_or(|end| m.date.as_str() <= end))
    }
}

fn sorted_by_date(mut rows: Vec<Measurement>) -> Vec<Measurement> {
    rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.station.cmp(&b.station)));
    rows
}

impl ClimateStore for MemoryStore {
    fn precipitation(&mut self, start: &str, end: &str) -> Result<Vec<Measurement>, StoreError> {
        Ok(sorted_by_date(self.in_range(start, Some(end)).cloned().collect()))
    }

    fn stations(&mut self) -> Result<Vec<Station>, StoreError> {
        let mut stations = self.dataset.stations.clone();
        stations.sort_by_key(|s| s.id);
        Ok(stations)
    }

    fn temperature_observations(
        &mut self,
        start: &str,
        end: &str,
        station_name: &str,
    ) -> Result<Vec<Measurement>, StoreError> {
        let codes: Vec<&str> = self
            .dataset
            .stations
            .iter()
            .filter(|s| s.name == station_name)
            .map(|s| s.station.as_str())
            .collect();

        let rows = self
            .in_range(start, Some(end))
            .filter(|m| codes.contains(&m.station.as_str()))
            .cloned()
            .collect();

        Ok(sorted_by_date(rows))
    }

    fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureSummary, StoreError> {
        Ok(TemperatureSummary::from_values(self.in_range(start, end).map(|m| m.tobs)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
