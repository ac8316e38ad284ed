//! Typed HTTP clients for the OpenStreetMap services the map consumes:
//! Overpass (POIs inside a zone polygon) and Nominatim (place search).
//!
//! Both clients wrap `reqwest` with explicit timeouts, a required
//! user-agent, transient-failure retry, and a `with_base_url`
//! constructor so tests can point them at a wiremock server.

mod error;
mod nominatim;
mod overpass;
mod retry;
mod types;

pub use error::OsmError;
pub use nominatim::NominatimClient;
pub use overpass::OverpassClient;
