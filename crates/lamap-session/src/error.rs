use thiserror::Error;

/// User-visible error taxonomy.
///
/// Every failure a session can hit is converted into one of these at the
/// coordinator boundary and shown through the single message slot in
/// [`crate::ViewState`]; the most recent error wins and no error is
/// fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    /// The device has no geolocation capability at all.
    #[error("Geolocation is not supported by this device")]
    GeolocationUnavailable,

    /// Geolocation exists but was denied or timed out.
    #[error("Unable to get your location. Please enable location services.")]
    GeolocationFailed,

    /// A search was submitted before any coordinate was known.
    #[error("Location not available for search")]
    LocationNotReady,

    /// A backend call failed (network, HTTP, malformed payload).
    #[error("{context} failed: {detail}")]
    Network {
        context: &'static str,
        detail: String,
    },

    /// A search produced no results.
    #[error("No places found for query: {0}")]
    NotFound(String),
}
