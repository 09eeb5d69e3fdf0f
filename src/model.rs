/// Shared data types for the climate service.
///
/// Rows come out of the store as `Measurement` / `Station`; the HTTP layer
/// reshapes them into the payload types below, whose serde representation
/// is the wire format.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dataset constants
// ---------------------------------------------------------------------------

/// First day (inclusive) of the "last 12 months" window.
pub const WINDOW_START: &str = "2016-08-23";

/// Last day (inclusive) of the "last 12 months" window. This is the most
/// recent date in the dataset.
pub const WINDOW_END: &str = "2017-08-23";

/// Earliest date in the dataset, shown on the home page.
pub const DATASET_START: &str = "2010-01-01";

/// Most active station in the dataset; the tobs route reports only its readings.
pub const REFERENCE_STATION_NAME: &str = "WAIHEE 837.5, HI US";

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One observation row from the `measurement` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Station code, e.g. "USC00519281".
    pub station: String,
    /// `yyyy-mm-dd`
    pub date: String,
    /// Precipitation in inches; missing readings are NULL.
    pub prcp: Option<f64>,
    /// Observed temperature in °F.
    pub tobs: f64,
}

/// One row from the `station` table, serialized with capitalized keys in
/// column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Station {
    pub id: i32,
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A value keyed by its date, serialized as the singleton object
/// `{"<date>": value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedValue {
    pub date: String,
    pub value: Option<f64>,
}

impl DatedValue {
    pub fn new(date: impl Into<String>, value: Option<f64>) -> Self {
        Self { date: date.into(), value }
    }
}

impl Serialize for DatedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date, &self.value)?;
        map.end()
    }
}

/// Min/avg/max of observed temperature over a filtered set of rows.
///
/// All three are `None` when no rows matched: the aggregate query still
/// yields exactly one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSummary {
    #[serde(rename = "Min")]
    pub min: Option<f64>,
    #[serde(rename = "Avg")]
    pub avg: Option<f64>,
    #[serde(rename = "Max")]
    pub max: Option<f64>,
}

impl TemperatureSummary {
    /// Computes the summary over an in-memory set of temperatures, with the
    /// same semantics as SQL `MIN`/`AVG`/`MAX`.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut summary = Self::default();
        let mut count = 0usize;
        let mut sum = 0.0;

        for value in values {
            summary.min = Some(summary.min.map_or(value, |m| m.min(value)));
            summary.max = Some(summary.max.map_or(value, |m| m.max(value)));
            sum += value;
            count += 1;
        }

        if count > 0 {
            summary.avg = Some(sum / count as f64);
        }
        summary
    }
}

/// Reshapes measurements into the precipitation time series.
pub fn precipitation_series(rows: &[Measurement]) -> Vec<DatedValue> {
    rows.iter().map(|m| DatedValue::new(m.date.clone(), m.prcp)).collect()
}

/// Reshapes measurements into the observed-temperature time series.
pub fn temperature_series(rows: &[Measurement]) -> Vec<DatedValue> {
    rows.iter().map(|m| DatedValue::new(m.date.clone(), Some(m.tobs))).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
