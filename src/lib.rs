/// climate_service: read-only HTTP API over the Honolulu, Hawaii climate dataset.
///
/// # Module structure
///
/// ```text
/// climate_service
/// ├── model       — row types (Measurement, Station) and JSON payload shapes
/// ├── routes      — request path → Route (fixed routes, <start>, <start>/<end>)
/// ├── store       — declared schema, SQL templates, ClimateStore/Connector traits
/// │   └── memory  — in-memory store over a shared Dataset
/// ├── db          — PostgreSQL connector, startup validation (DATABASE_URL)
/// ├── endpoint    — router + tiny_http server with a worker pool
/// ├── config      — climate.toml loader with environment overrides
/// └── error       — StoreError / ApiError and their HTTP status codes
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod routes;
pub mod store;
