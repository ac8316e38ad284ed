//! Application state coordination for a map session.
//!
//! One [`Coordinator`] owns one [`ViewState`] and mutates it through
//! discrete transitions: locate, zone click, reset-to-home, category
//! click, search, error dismissal. External collaborators (geolocation,
//! zone detection, POI fetch, search) sit behind async provider traits
//! so the whole flow is testable with fakes.

mod coordinator;
mod error;
mod providers;
mod state;

pub use coordinator::Coordinator;
pub use error::UserError;
pub use providers::{
    LocationError, LocationProvider, PoiProvider, ProviderError, SearchProvider, ZoneDirectory,
};
pub use state::{ViewState, ZoneSelection};
