/// URL routing for the climate API.
///
/// Maps a request path onto one of the fixed routes. The named routes
/// (`precipitation`, `stations`, `tobs`) win over the `<start>` pattern, so a
/// start date can never shadow them.

use chrono::NaiveDate;

use crate::error::ApiError;

pub const API_PREFIX: &str = "/api/v1.0/";

/// Every path the service answers, as listed in 404 responses.
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/{start}",
    "/api/v1.0/{start}/{end}",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Health,
    Precipitation,
    Stations,
    Tobs,
    /// Temperature summary from `start` (inclusive) onwards.
    Start { start: String },
    /// Temperature summary over `[start, end]`.
    StartEnd { start: String, end: String },
}

impl Route {
    /// Parses a request URL (path plus optional query string).
    ///
    /// Path parameters are percent-decoded but otherwise taken verbatim:
    /// they are compared as text against stored dates.
    pub fn parse(url: &str) -> Option<Route> {
        let path = url.split(['?', '#']).next().unwrap_or_default();

        match path {
            "/" => return Some(Route::Home),
            "/health" => return Some(Route::Health),
            _ => {}
        }

        let rest = path.strip_prefix(API_PREFIX)?;
        let mut segments = Vec::new();
        for raw in rest.split('/') {
            if raw.is_empty() {
                return None;
            }
            segments.push(urlencoding::decode(raw).ok()?.into_owned());
        }

        match segments.as_slice() {
            [name] if name == "precipitation" => Some(Route::Precipitation),
            [name] if name == "stations" => Some(Route::Stations),
            [name] if name == "tobs" => Some(Route::Tobs),
            [start] => Some(Route::Start { start: start.clone() }),
            [start, end] => Some(Route::StartEnd {
                start: start.clone(),
                end: end.clone(),
            }),
            _ => None,
        }
    }

    /// Page name used in request logs.
    pub fn page_name(&self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Health => "Health",
            Route::Precipitation => "Precipitation",
            Route::Stations => "Stations",
            Route::Tobs => "Temperature",
            Route::Start { .. } => "Start Date",
            Route::StartEnd { .. } => "Start and End Date",
        }
    }

    /// Rejects path dates that are not real `yyyy-mm-dd` calendar dates.
    /// Only consulted in strict date mode.
    pub fn validate_dates(&self) -> Result<(), ApiError> {
        match self {
            Route::Start { start } => validate_date(start),
            Route::StartEnd { start, end } => {
                validate_date(start)?;
                validate_date(end)
            }
            _ => Ok(()),
        }
    }
}

fn validate_date(value: &str) -> Result<(), ApiError> {
    // chrono accepts unpadded fields; require the canonical form so the
    // lexical comparison in SQL stays meaningful.
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) if date.format("%Y-%m-%d").to_string() == value => Ok(()),
        _ => Err(ApiError::InvalidDate(value.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
