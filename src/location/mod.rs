//! Geolocation: coordinates used to enrich location-aware task prompts.
//!
//! Every request is fresh (no cached fix) and is bounded by
//! [`TimedLocation`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::{LocationConfig, LocationSource};
use crate::locale::Locale;

/// Default upper bound for a location request.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the source reports one.
    pub accuracy_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("location not supported")]
    Unsupported,
}

impl LocationError {
    pub fn user_message(&self, locale: &Locale) -> &'static str {
        let e = &locale.errors;
        match self {
            LocationError::PermissionDenied => e.location_denied,
            LocationError::PositionUnavailable => e.location_unavailable,
            LocationError::Timeout => e.location_timeout,
            LocationError::Unsupported => e.location_unsupported,
        }
    }
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn request_location(&self) -> Result<Coordinates, LocationError>;
}

/// Bind the adapter selected in settings, wrapped in the request timeout.
pub fn from_config(config: &LocationConfig) -> Arc<dyn LocationProvider> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.source {
        LocationSource::Disabled => Arc::new(UnsupportedLocation),
        LocationSource::Fixed => match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => {
                Arc::new(TimedLocation::new(FixedLocation::new(lat, lon), timeout))
            }
            _ => {
                log::warn!("location: fixed source without latitude/longitude; disabled");
                Arc::new(UnsupportedLocation)
            }
        },
        LocationSource::Ip => Arc::new(TimedLocation::new(
            IpLocation::new(config.lookup_url.clone()),
            timeout,
        )),
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Always answers with the configured coordinates.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coordinates: Coordinates,
}

impl FixedLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates {
                latitude,
                longitude,
                accuracy_m: None,
            },
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_location(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coordinates)
    }
}

/// Coarse position from an IP-geolocation HTTP service.
pub struct IpLocation {
    client: reqwest::Client,
    url: String,
}

#[derive(Deserialize)]
struct IpLookup {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

impl IpLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LocationProvider for IpLocation {
    async fn request_location(&self) -> Result<Coordinates, LocationError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            log::warn!("location: lookup failed: {e}");
            LocationError::PositionUnavailable
        })?;

        match response.status() {
            s if s == reqwest::StatusCode::FORBIDDEN => return Err(LocationError::PermissionDenied),
            s if !s.is_success() => {
                log::warn!("location: lookup returned {s}");
                return Err(LocationError::PositionUnavailable);
            }
            _ => {}
        }

        let body: IpLookup = response
            .json()
            .await
            .map_err(|_| LocationError::PositionUnavailable)?;

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
                accuracy_m: None,
            }),
            _ => Err(LocationError::PositionUnavailable),
        }
    }
}

/// Bound when no location capability is configured.
pub struct UnsupportedLocation;

#[async_trait]
impl LocationProvider for UnsupportedLocation {
    async fn request_location(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Fails with [`LocationError::Timeout`] when the inner provider takes
/// longer than `timeout`.
pub struct TimedLocation<P> {
    inner: P,
    timeout: Duration,
}

impl<P: LocationProvider> TimedLocation<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<P: LocationProvider> LocationProvider for TimedLocation<P> {
    async fn request_location(&self) -> Result<Coordinates, LocationError> {
        tokio::time::timeout(self.timeout, self.inner.request_location())
            .await
            .unwrap_or(Err(LocationError::Timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    struct Never;

    #[async_trait]
    impl LocationProvider for Never {
        async fn request_location(&self) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out_after_ten_seconds() {
        let timed = TimedLocation::new(Never, LOCATION_TIMEOUT);
        let start = tokio::time::Instant::now();
        assert_eq!(timed.request_location().await, Err(LocationError::Timeout));
        assert!(start.elapsed() >= LOCATION_TIMEOUT);
    }

    #[tokio::test]
    async fn fixed_returns_configured_point() {
        let fix = FixedLocation::new(13.75, 100.5).request_location().await.unwrap();
        assert_eq!((fix.latitude, fix.longitude), (13.75, 100.5));
    }

    #[tokio::test]
    async fn ip_lookup_parses_lat_lon() {
        let app = Router::new().route(
            "/json",
            get(|| async { Json(serde_json::json!({"status": "success", "lat": 40.4, "lon": -3.7})) }),
        );
        let base = serve(app).await;
        let fix = IpLocation::new(format!("{base}/json"))
            .request_location()
            .await
            .unwrap();
        assert_eq!((fix.latitude, fix.longitude), (40.4, -3.7));
    }

    #[tokio::test]
    async fn ip_lookup_without_coordinates_is_unavailable() {
        let app = Router::new().route(
            "/json",
            get(|| async { Json(serde_json::json!({"status": "fail"})) }),
        );
        let base = serve(app).await;
        assert_eq!(
            IpLocation::new(format!("{base}/json")).request_location().await,
            Err(LocationError::PositionUnavailable)
        );
    }

    #[tokio::test]
    async fn ip_lookup_forbidden_is_permission_denied() {
        let app = Router::new().route("/json", get(|| async { StatusCode::FORBIDDEN }));
        let base = serve(app).await;
        assert_eq!(
            IpLocation::new(format!("{base}/json")).request_location().await,
            Err(LocationError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn disabled_source_is_unsupported() {
        let cfg = LocationConfig {
            source: LocationSource::Disabled,
            ..LocationConfig::default()
        };
        assert_eq!(
            from_config(&cfg).request_location().await,
            Err(LocationError::Unsupported)
        );
    }

    #[tokio::test]
    async fn fixed_source_without_coordinates_is_unsupported() {
        let cfg = LocationConfig {
            source: LocationSource::Fixed,
            ..LocationConfig::default()
        };
        assert_eq!(
            from_config(&cfg).request_location().await,
            Err(LocationError::Unsupported)
        );
    }

    #[test]
    fn every_error_has_a_message() {
        let en = crate::locale::default_locale();
        for e in [
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unsupported,
        ] {
            assert!(!e.user_message(en).is_empty());
        }
    }
}
