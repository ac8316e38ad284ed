//! The session's single view-model instance.

use lamap_core::{filter_by_category, Category, Coordinate, Place, Poi};

use crate::error::UserError;

/// Which zone drives POI fetching.
///
/// Making the override a tagged variant (instead of an independently
/// settable optional string) keeps the authority rule in one place:
/// explicit if present, else home.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ZoneSelection {
    /// Follow the user's home zone.
    #[default]
    Home,
    /// A zone the user clicked, overriding home until reset.
    Explicit(String),
}

/// Snapshot of everything the UI renders.
///
/// Created empty at session start (category defaults to `All`), mutated
/// only by the [`crate::Coordinator`], never persisted.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Resolved user position; the fallback city center after a
    /// geolocation failure, absent only before the first locate.
    pub user: Option<Coordinate>,
    /// Zone containing the user's last successfully resolved location
    /// (or the fallback zone name after a failed resolution).
    pub home_zone: Option<String>,
    pub selection: ZoneSelection,
    pub category: Category,
    /// Working POI set for the authoritative zone, unfiltered.
    pub pois: Vec<Poi>,
    pub loading: bool,
    /// Single message slot: most recent error wins, cleared on the next
    /// transition or by dismissal.
    pub error: Option<UserError>,
    pub search_result: Option<Place>,
}

impl ViewState {
    /// The zone driving POI fetching: the explicit selection if any,
    /// else the home zone.
    #[must_use]
    pub fn authoritative_zone(&self) -> Option<&str> {
        match &self.selection {
            ZoneSelection::Explicit(name) => Some(name.as_str()),
            ZoneSelection::Home => self.home_zone.as_deref(),
        }
    }

    /// The zone shown as "current" in the UI; same rule as
    /// [`ViewState::authoritative_zone`].
    #[must_use]
    pub fn current_zone(&self) -> Option<&str> {
        self.authoritative_zone()
    }

    /// The working set narrowed to the selected category. Pure view:
    /// recomputable any number of times without touching the network.
    #[must_use]
    pub fn visible_pois(&self) -> Vec<Poi> {
        filter_by_category(&self.pois, self.category)
    }
}
