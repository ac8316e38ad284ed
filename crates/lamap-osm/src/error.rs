use thiserror::Error;

/// Errors returned by the OSM service clients.
#[derive(Debug, Error)]
pub enum OsmError {
    /// Network or TLS failure from the underlying HTTP client, including
    /// non-2xx statuses surfaced via `error_for_status`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered 2xx but the body is not the expected shape
    /// (e.g. Overpass returning an HTML rate-limit page).
    #[error("unexpected {service} payload: {detail}")]
    UnexpectedPayload {
        service: &'static str,
        detail: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL does not parse.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
