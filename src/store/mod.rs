/// Query layer over the climate dataset.
///
/// The schema is fixed and declared here rather than discovered at runtime:
/// table and column names, and one SQL template per route. Backends
/// implement `ClimateStore`; a `Connector` hands out one store per request,
/// which is dropped (closing its connection) once the request is answered.
///
/// Date parameters are plain text compared against the `yyyy-mm-dd` text
/// column, so a malformed date narrows the result instead of failing.

pub mod memory;

use crate::error::StoreError;
use crate::model::{Measurement, Station, TemperatureSummary};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Types accepted for columns decoded as `String`.
pub const TEXT_TYPES: &[&str] = &["text", "character varying"];
/// `Station.id` decodes as `i32`.
pub const INTEGER_TYPES: &[&str] = &["integer"];
/// Every real-valued column decodes as `f64`.
pub const FLOAT_TYPES: &[&str] = &["double precision"];

/// A column and the `information_schema` data types its decoder accepts.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub data_types: &'static [&'static str],
}

const fn column(name: &'static str, data_types: &'static [&'static str]) -> ColumnSchema {
    ColumnSchema { name, data_types }
}

/// A table the service reads, with the columns it expects to find.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [ColumnSchema],
}

pub const MEASUREMENT_TABLE: TableSchema = TableSchema {
    name: "measurement",
    columns: &[
        column("station", TEXT_TYPES),
        column("date", TEXT_TYPES),
        column("prcp", FLOAT_TYPES),
        column("tobs", FLOAT_TYPES),
    ],
};

pub const STATION_TABLE: TableSchema = TableSchema {
    name: "station",
    columns: &[
        column("id", INTEGER_TYPES),
        column("station", TEXT_TYPES),
        column("name", TEXT_TYPES),
        column("latitude", FLOAT_TYPES),
        column("longitude", FLOAT_TYPES),
        column("elevation", FLOAT_TYPES),
    ],
};

pub const REQUIRED_TABLES: &[TableSchema] = &[MEASUREMENT_TABLE, STATION_TABLE];

// ---------------------------------------------------------------------------
// SQL templates
// ---------------------------------------------------------------------------

/// Measurements in `[$1, $2]`, oldest first.
pub const PRECIPITATION_SQL: &str = "\
    SELECT station, date, prcp, tobs
    FROM measurement
    WHERE date >= $1 AND date <= $2
    ORDER BY date, station";

pub const STATIONS_SQL: &str = "\
    SELECT id, station, name, latitude, longitude, elevation
    FROM station
    ORDER BY id";

/// Measurements in `[$1, $2]` for the station named `$3`, oldest first.
pub const TOBS_SQL: &str = "\
    SELECT m.station, m.date, m.prcp, m.tobs
    FROM measurement m
    JOIN station s ON s.station = m.station
    WHERE m.date >= $1 AND m.date <= $2 AND s.name = $3
    ORDER BY m.date";

/// Aggregates always yield one row; all NULL when nothing matches.
pub const SUMMARY_FROM_SQL: &str = "\
    SELECT MIN(tobs)::float8, AVG(tobs)::float8, MAX(tobs)::float8
    FROM measurement
    WHERE date >= $1";

pub const SUMMARY_RANGE_SQL: &str = "\
    SELECT MIN(tobs)::float8, AVG(tobs)::float8, MAX(tobs)::float8
    FROM measurement
    WHERE date >= $1 AND date <= $2";

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read-only access to the dataset. Each method issues exactly one query.
pub trait ClimateStore {
    /// Measurements with `start <= date <= end`, ordered by date.
    fn precipitation(&mut self, start: &str, end: &str) -> Result<Vec<Measurement>, StoreError>;

    /// Every station.
    fn stations(&mut self) -> Result<Vec<Station>, StoreError>;

    /// Measurements with `start <= date <= end` taken at the station called
    /// `station_name`, ordered by date.
    fn temperature_observations(
        &mut self,
        start: &str,
        end: &str,
        station_name: &str,
    ) -> Result<Vec<Measurement>, StoreError>;

    /// Min/avg/max of `tobs` over `date >= start` (and `date <= end` when given).
    fn temperature_summary(
        &mut self,
        start: &str,
        end: Option<&str>,
    ) -> Result<TemperatureSummary, StoreError>;
}

/// Opens a request-scoped store.
pub trait Connector: Send + Sync + 'static {
    type Store: ClimateStore;

    fn open(&self) -> Result<Self::Store, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_only_read() {
        for sql in [PRECIPITATION_SQL, STATIONS_SQL, TOBS_SQL, SUMMARY_FROM_SQL, SUMMARY_RANGE_SQL] {
            let upper = sql.to_uppercase();
            assert!(upper.trim_start().starts_with("SELECT"), "{}", sql);
            for verb in ["INSERT", "UPDATE", "DELETE", "DROP"] {
                assert!(!upper.contains(verb), "{} should not appear in {}", verb, sql);
            }
        }
    }

    #[test]
    fn test_templates_reference_declared_columns() {
        for column in MEASUREMENT_TABLE.columns {
            assert!(PRECIPITATION_SQL.contains(column.name));
        }
        for column in STATION_TABLE.columns {
            assert!(STATIONS_SQL.contains(column.name));
        }
    }

    #[test]
    fn test_series_templates_order_by_date() {
        assert!(PRECIPITATION_SQL.contains("ORDER BY date"));
        assert!(TOBS_SQL.contains("ORDER BY m.date"));
    }
}
