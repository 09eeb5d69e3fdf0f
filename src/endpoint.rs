/// HTTP endpoint for the climate API
///
/// Endpoints:
/// - GET / - HTML listing of the available routes
/// - GET /health - Service health check
/// - GET /api/v1.0/precipitation - Last 12 months of precipitation
/// - GET /api/v1.0/stations - All stations
/// - GET /api/v1.0/tobs - Last 12 months of temperature at the reference station
/// - GET /api/v1.0/{start} - Min/avg/max temperature from `start`
/// - GET /api/v1.0/{start}/{end} - Min/avg/max temperature over `[start, end]`
///
/// The accept loop hands each request to a worker thread. A worker opens a
/// store for that request alone, runs one query and drops the store before
/// the next request.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use thiserror::Error;
use threadpool::ThreadPool;

use crate::error::ApiError;
use crate::model::{
    self, DATASET_START, REFERENCE_STATION_NAME, WINDOW_END, WINDOW_START,
};
use crate::routes::{Route, AVAILABLE_ENDPOINTS};
use crate::store::{ClimateStore, Connector};

#[derive(Debug, Error)]
#[error("Failed to start HTTP server on {addr}: {source}")]
pub struct EndpointError {
    addr: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";

/// A fully rendered response, independent of the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    fn html(body: String) -> Self {
        Self { status: 200, content_type: HTML, body }
    }

    /// Pretty-printed JSON with a two-space indent.
    fn json<T: Serialize>(status: u16, payload: &T) -> Result<Self, ApiError> {
        Ok(Self {
            status,
            content_type: JSON,
            body: serde_json::to_string_pretty(payload)?,
        })
    }

    fn error(err: &ApiError, path: &str) -> Self {
        let payload = match err {
            ApiError::NotFound => serde_json::json!({
                "error": err.to_string(),
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
            _ => serde_json::json!({
                "error": err.to_string(),
                "route": path,
            }),
        };

        Self {
            status: err.status_code(),
            content_type: JSON,
            // A `Value` built from strings always serializes.
            body: serde_json::to_string_pretty(&payload).unwrap_or_default(),
        }
    }

    fn into_tiny_http(self) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
        let response = tiny_http::Response::from_string(self.body).with_status_code(self.status);

        match tiny_http::Header::from_bytes(&b"Content-Type"[..], self.content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Landing page listing every route.
pub fn home_page() -> String {
    format!(
        "<strong>Climate Data for Honolulu, Hawaii Area from {DATASET_START} to {WINDOW_END}</strong> <br><br>\
         <strong>Available Routes:</strong> <br><br>\
         /api/v1.0/precipitation<br>\
         <em>Shows last 12 months of precipitation data.</em> <br><br>\
         /api/v1.0/stations<br/>\
         <em>Shows list of climate stations.</em> <br><br>\
         /api/v1.0/tobs<br/>\
         <em>Shows temperature observations (TOBS) for last 12 months of most active station: '{REFERENCE_STATION_NAME}'.</em> <br><br>\
         /api/v1.0/yyyy-mm-dd<br/>\
         <em>Shows list of minimum temperature, average temperature and max temperature for given start date (yyyy-mm-dd).</em><br><br>\
         /api/v1.0/yyyy-mm-dd/yyyy-mm-dd<br/>\
         <em>Shows list of minimum temperature, average temperature and max temperature for given start-end range of dates (yyyy-mm-dd/yyyy-mm-dd).</em><br><br>"
    )
}

fn health() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps requests onto store queries.
#[derive(Debug)]
pub struct Router<C> {
    connector: C,
    strict_dates: bool,
}

impl<C: Connector> Router<C> {
    pub fn new(connector: C) -> Self {
        Self { connector, strict_dates: false }
    }

    /// Answer malformed start/end dates with 400 instead of an empty result.
    pub fn with_strict_dates(mut self, strict: bool) -> Self {
        self.strict_dates = strict;
        self
    }

    /// Handles one request. Never fails: errors become JSON error responses.
    pub fn handle(&self, method: &str, url: &str) -> ApiResponse {
        match self.dispatch(method, url) {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    ApiError::Store(_) | ApiError::Serialize(_) => error!("{} {} failed: {}", method, url, e),
                    _ => warn!("{} {}: {}", method, url, e),
                }
                ApiResponse::error(&e, url)
            }
        }
    }

    fn dispatch(&self, method: &str, url: &str) -> Result<ApiResponse, ApiError> {
        if !matches!(method, "GET" | "HEAD") {
            return Err(ApiError::MethodNotAllowed(method.to_string()));
        }

        let route = Route::parse(url).ok_or(ApiError::NotFound)?;
        info!("Server received request for '{}' page...", route.page_name());

        match route {
            Route::Home => Ok(ApiResponse::html(home_page())),
            Route::Health => ApiResponse::json(200, &health()),
            route => {
                if self.strict_dates {
                    route.validate_dates()?;
                }
                let mut store = self.connector.open()?;
                query_route(&mut store, &route)
            }
        }
    }
}

/// Runs the single query behind a data route and renders its payload.
fn query_route<S: ClimateStore>(store: &mut S, route: &Route) -> Result<ApiResponse, ApiError> {
    match route {
        Route::Precipitation => {
            let rows = store.precipitation(WINDOW_START, WINDOW_END)?;
            ApiResponse::json(200, &model::precipitation_series(&rows))
        }
        Route::Stations => ApiResponse::json(200, &store.stations()?),
        Route::Tobs => {
            let rows = store.temperature_observations(WINDOW_START, WINDOW_END, REFERENCE_STATION_NAME)?;
            ApiResponse::json(200, &model::temperature_series(&rows))
        }
        Route::Start { start } => {
            let summary = store.temperature_summary(start, None)?;
            ApiResponse::json(200, &[summary])
        }
        Route::StartEnd { start, end } => {
            let summary = store.temperature_summary(start, Some(end))?;
            ApiResponse::json(200, &[summary])
        }
        Route::Home | Route::Health => Err(ApiError::NotFound),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

pub struct EndpointServer<C> {
    server: tiny_http::Server,
    router: Arc<Router<C>>,
    pool: ThreadPool,
}

impl<C: Connector> EndpointServer<C> {
    /// Binds the listener. Use port 0 to let the OS pick one.
    pub fn bind(addr: &str, router: Router<C>, workers: usize) -> Result<Self, EndpointError> {
        let server = tiny_http::Server::http(addr).map_err(|source| EndpointError {
            addr: addr.to_string(),
            source,
        })?;

        Ok(Self {
            server,
            router: Arc::new(router),
            pool: ThreadPool::new(workers.max(1)),
        })
    }

    /// The bound address (useful after binding to port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serves requests until the listener shuts down.
    pub fn run(self) {
        if let Some(addr) = self.local_addr() {
            info!("📡 HTTP endpoint listening on http://{}", addr);
        }

        for request in self.server.incoming_requests() {
            let router = Arc::clone(&self.router);
            self.pool.execute(move || {
                let method = request.method().to_string();
                let response = router.handle(&method, request.url());

                if let Err(e) = request.respond(response.into_tiny_http()) {
                    error!("Failed to send response: {}", e);
                }
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::{Measurement, Station};
    use crate::store::memory::{Dataset, MemoryConnector};
    use serde_json::{json, Value};

    fn obs(code: &str, date: &str, prcp: Option<f64>, tobs: f64) -> Measurement {
        Measurement {
            station: code.to_string(),
            date: date.to_string(),
            prcp,
            tobs,
        }
    }

    fn router() -> Router<MemoryConnector> {
        let dataset = Dataset {
            stations: vec![
                Station {
                    id: 1,
                    station: "USC00519397".to_string(),
                    name: "WAIKIKI 717.2, HI US".to_string(),
                    latitude: 21.2716,
                    longitude: -157.8168,
                    elevation: 3.0,
                },
                Station {
                    id: 7,
                    station: "USC00519281".to_string(),
                    name: REFERENCE_STATION_NAME.to_string(),
                    latitude: 21.45167,
                    longitude: -157.84889,
                    elevation: 32.9,
                },
            ],
            measurements: vec![
                obs("USC00519397", "2016-08-22", Some(0.5), 75.0),
                obs("USC00519397", "2016-08-23", Some(0.08), 81.0),
                obs("USC00519281", "2016-08-23", Some(1.79), 77.0),
                obs("USC00519397", "2017-08-23", None, 81.0),
                obs("USC00519281", "2017-08-24", Some(0.0), 82.0),
            ],
        };
        Router::new(MemoryConnector::new(dataset))
    }

    fn body(response: &ApiResponse) -> Value {
        serde_json::from_str(&response.body).expect("body should be JSON")
    }

    struct DownConnector;

    impl Connector for DownConnector {
        type Store = crate::store::memory::MemoryStore;

        fn open(&self) -> Result<Self::Store, StoreError> {
            Err(StoreError::connect("connection refused"))
        }
    }

    #[test]
    fn test_home_page_is_html() {
        let response = router().handle("GET", "/");
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, HTML);
        assert!(response.body.contains("/api/v1.0/precipitation"));
        assert!(response.body.contains(REFERENCE_STATION_NAME));
    }

    #[test]
    fn test_precipitation_window_is_inclusive() {
        let response = router().handle("GET", "/api/v1.0/precipitation");
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, JSON);
        assert_eq!(
            body(&response),
            json!([
                {"2016-08-23": 1.79},
                {"2016-08-23": 0.08},
                {"2017-08-23": null},
            ])
        );
    }

    #[test]
    fn test_stations_payload() {
        let response = router().handle("GET", "/api/v1.0/stations");
        let stations = body(&response);
        assert_eq!(stations.as_array().unwrap().len(), 2);
        assert_eq!(stations[0]["Id"], 1);
        assert_eq!(stations[1]["Name"], REFERENCE_STATION_NAME);
        assert!(response.body.starts_with("[\n  {"), "two-space indent expected");
    }

    #[test]
    fn test_tobs_only_reference_station_in_window() {
        let response = router().handle("GET", "/api/v1.0/tobs");
        assert_eq!(body(&response), json!([{"2016-08-23": 77.0}]));
    }

    #[test]
    fn test_start_summary() {
        let response = router().handle("GET", "/api/v1.0/2017-01-01");
        assert_eq!(body(&response), json!([{"Min": 81.0, "Avg": 81.5, "Max": 82.0}]));
    }

    #[test]
    fn test_start_end_summary_without_matches_is_single_null_row() {
        let response = router().handle("GET", "/api/v1.0/2017-01-01/2017-01-31");
        assert_eq!(response.status, 200);
        assert_eq!(body(&response), json!([{"Min": null, "Avg": null, "Max": null}]));
    }

    #[test]
    fn test_malformed_date_is_permissive_by_default() {
        let response = router().handle("GET", "/api/v1.0/garbage/2017-01-31");
        assert_eq!(response.status, 200);
        assert_eq!(body(&response), json!([{"Min": null, "Avg": null, "Max": null}]));
    }

    #[test]
    fn test_malformed_date_rejected_in_strict_mode() {
        let response = router().with_strict_dates(true).handle("GET", "/api/v1.0/2017-1-1");
        assert_eq!(response.status, 400);
        assert_eq!(body(&response)["route"], "/api/v1.0/2017-1-1");
    }

    #[test]
    fn test_strict_mode_accepts_valid_dates() {
        let response = router().with_strict_dates(true).handle("GET", "/api/v1.0/2016-08-23/2016-08-23");
        assert_eq!(body(&response), json!([{"Min": 77.0, "Avg": 79.0, "Max": 81.0}]));
    }

    #[test]
    fn test_unknown_route_lists_endpoints() {
        let response = router().handle("GET", "/api/v1.0/a/b/c");
        assert_eq!(response.status, 404);
        let payload = body(&response);
        assert_eq!(payload["error"], "Not found");
        assert_eq!(payload["available_endpoints"].as_array().unwrap().len(), AVAILABLE_ENDPOINTS.len());
    }

    #[test]
    fn test_only_get_and_head_allowed() {
        assert_eq!(router().handle("POST", "/api/v1.0/stations").status, 405);
        assert_eq!(router().handle("DELETE", "/").status, 405);
        assert_eq!(router().handle("HEAD", "/api/v1.0/stations").status, 200);
    }

    #[test]
    fn test_store_failure_is_server_error() {
        let response = Router::new(DownConnector).handle("GET", "/api/v1.0/stations");
        assert_eq!(response.status, 500);
        let payload = body(&response);
        assert!(payload["error"].as_str().unwrap().contains("connection refused"));
        assert_eq!(payload["route"], "/api/v1.0/stations");
    }

    #[test]
    fn test_home_and_health_do_not_touch_store() {
        let router = Router::new(DownConnector);
        assert_eq!(router.handle("GET", "/").status, 200);

        let response = router.handle("GET", "/health");
        assert_eq!(response.status, 200);
        assert_eq!(body(&response)["status"], "ok");
        assert_eq!(body(&response)["service"], "climate_service");
    }

    #[test]
    fn test_repeated_requests_are_identical() {
        let router = router();
        for url in ["/api/v1.0/precipitation", "/api/v1.0/stations", "/api/v1.0/2016-01-01"] {
            assert_eq!(router.handle("GET", url), router.handle("GET", url));
        }
    }
}
