//! The application state coordinator.
//!
//! Each public method is one external trigger (geolocation resolved,
//! zone clicked, category clicked, search submitted). A trigger applies
//! all of its synchronous state updates first, then reconciles once:
//! the derived fetch key (coordinate present, authoritative zone) is
//! compared against the last fetched key and a POI fetch is issued only
//! when it changed. Responses are tagged with the key they were issued
//! for and discarded if that key is no longer authoritative.

use std::collections::BTreeMap;
use std::sync::Arc;

use lamap_core::{Category, Poi, Zone, FALLBACK_ZONE, LA_CENTER};

use crate::error::UserError;
use crate::providers::{
    LocationError, LocationProvider, PoiProvider, ProviderError, SearchProvider, ZoneDirectory,
};
use crate::state::{ViewState, ZoneSelection};

/// The stable combination a POI fetch is issued for. Only the zone is
/// part of the key: a coordinate merely has to be present, its exact
/// value does not retrigger fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchKey {
    zone: String,
}

/// Owns the session's [`ViewState`] and applies every transition.
pub struct Coordinator {
    location: Arc<dyn LocationProvider>,
    zones: Arc<dyn ZoneDirectory>,
    pois: Arc<dyn PoiProvider>,
    search: Arc<dyn SearchProvider>,
    state: ViewState,
    last_fetched: Option<FetchKey>,
}

impl Coordinator {
    #[must_use]
    pub fn new(
        location: Arc<dyn LocationProvider>,
        zones: Arc<dyn ZoneDirectory>,
        pois: Arc<dyn PoiProvider>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            location,
            zones,
            pois,
            search,
            state: ViewState::default(),
            last_fetched: None,
        }
    }

    /// Current view-model snapshot.
    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// The full zone list, for rendering polygons and the legend.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the zone source is unavailable.
    pub async fn zones(&self) -> Result<Vec<Zone>, ProviderError> {
        self.zones.list_zones().await
    }

    /// Acquires the user's position and resolves their home zone.
    ///
    /// Geolocation failure falls back to the LA city center so every
    /// downstream feature stays usable; zone-detection failure (or no
    /// containing zone) falls back to the default zone name. Either way
    /// the session continues — this is never fatal. Ends with a single
    /// reconcile, so the initial load issues exactly one POI fetch.
    pub async fn locate(&mut self) {
        match self.location.current_position().await {
            Ok(coordinate) => {
                self.state.user = Some(coordinate);
                self.state.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "geolocation failed, using city-center fallback");
                self.state.error = Some(match err {
                    LocationError::Unavailable => UserError::GeolocationUnavailable,
                    LocationError::Denied(_) => UserError::GeolocationFailed,
                });
                self.state.user = Some(LA_CENTER);
            }
        }

        // Fallback coordinate included: the zone flow runs either way.
        if let Some(coordinate) = self.state.user {
            let resolved = match self.zones.detect_zone(coordinate).await {
                Ok(Some(name)) => name,
                Ok(None) => {
                    tracing::debug!(%coordinate, "no zone contains the user, using fallback zone");
                    FALLBACK_ZONE.to_owned()
                }
                Err(err) => {
                    tracing::warn!(error = %err, "zone detection failed, using fallback zone");
                    self.state.error = Some(UserError::Network {
                        context: "zone detection",
                        detail: err.to_string(),
                    });
                    FALLBACK_ZONE.to_owned()
                }
            };
            // A fresh home context invalidates any explicit selection.
            self.state.home_zone = Some(resolved);
            self.state.selection = ZoneSelection::Home;
        }

        self.reconcile().await;
    }

    /// The user clicked a zone on the map. Home is untouched; the
    /// explicit selection becomes authoritative.
    pub async fn select_zone(&mut self, name: &str) {
        self.state.error = None;
        self.state.selection = ZoneSelection::Explicit(name.to_owned());
        self.reconcile().await;
    }

    /// Clears the explicit selection; the home zone is authoritative
    /// again.
    pub async fn reset_to_home(&mut self) {
        self.state.error = None;
        self.state.selection = ZoneSelection::Home;
        self.reconcile().await;
    }

    /// Replaces the selected category. Filtering is client-side over the
    /// already-fetched working set, so this never refetches.
    pub fn set_category(&mut self, category: Category) {
        self.state.error = None;
        self.state.category = category;
    }

    /// Clears the error slot.
    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    /// Searches for a place near the user's position.
    pub async fn search(&mut self, query: &str) {
        self.state.error = None;
        let Some(user) = self.state.user else {
            self.state.error = Some(UserError::LocationNotReady);
            return;
        };

        self.state.loading = true;
        match self.search.search(query, user).await {
            Ok(Some(place)) => {
                self.state.search_result = Some(place);
            }
            Ok(None) => {
                self.state.error = Some(UserError::NotFound(query.to_owned()));
            }
            Err(err) => {
                tracing::warn!(error = %err, query, "place search failed");
                self.state.error = Some(UserError::Network {
                    context: "search",
                    detail: err.to_string(),
                });
            }
        }
        self.state.loading = false;
    }

    /// Issues a POI fetch iff the derived fetch key changed since the
    /// last applied fetch. Called exactly once per external trigger.
    async fn reconcile(&mut self) {
        let Some(key) = self.fetch_key() else {
            return;
        };
        if self.last_fetched.as_ref() == Some(&key) {
            return;
        }

        self.state.loading = true;
        let user = self.state.user;
        let result = self.pois.fetch_pois(&key.zone, &[], user).await;
        self.apply_fetch_result(&key, result);
    }

    fn fetch_key(&self) -> Option<FetchKey> {
        self.state.user?;
        self.state.authoritative_zone().map(|zone| FetchKey {
            zone: zone.to_owned(),
        })
    }

    /// Applies a fetch resolution. A response whose key no longer
    /// matches the current authoritative target is discarded silently —
    /// an earlier, slower response must not overwrite a later one.
    fn apply_fetch_result(
        &mut self,
        key: &FetchKey,
        result: Result<BTreeMap<Category, Vec<Poi>>, ProviderError>,
    ) {
        if self.fetch_key().as_ref() != Some(key) {
            tracing::debug!(zone = %key.zone, "discarding stale POI response");
            return;
        }

        match result {
            Ok(groups) => {
                // The error slot is left alone: a geolocation warning from
                // the same trigger must survive a successful fetch.
                self.state.pois = flatten_groups(groups);
                self.state.loading = false;
                self.last_fetched = Some(key.clone());
            }
            Err(err) => {
                // Keep the previous working set: stale-but-present beats
                // flickering to empty. last_fetched stays unchanged so
                // retrying the trigger refetches.
                tracing::warn!(zone = %key.zone, error = %err, "POI fetch failed");
                self.state.loading = false;
                self.state.error = Some(UserError::Network {
                    context: "POI fetch",
                    detail: err.to_string(),
                });
            }
        }
    }
}

/// Flattens the per-category grouping into one ordered sequence, in the
/// fixed category display order.
fn flatten_groups(mut groups: BTreeMap<Category, Vec<Poi>>) -> Vec<Poi> {
    let mut flat = Vec::new();
    for category in Category::FETCHABLE {
        if let Some(mut pois) = groups.remove(&category) {
            flat.append(&mut pois);
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lamap_core::{Coordinate, Place};

    use super::*;

    const HOLLYWOOD_POINT: Coordinate = Coordinate::new(34.095, -118.34);

    struct FakeLocation(Result<Coordinate, LocationError>);

    #[async_trait]
    impl LocationProvider for FakeLocation {
        async fn current_position(&self) -> Result<Coordinate, LocationError> {
            self.0.clone()
        }
    }

    struct FakeZones(Result<Option<String>, ProviderError>);

    #[async_trait]
    impl ZoneDirectory for FakeZones {
        async fn detect_zone(&self, _point: Coordinate) -> Result<Option<String>, ProviderError> {
            self.0.clone()
        }

        async fn list_zones(&self) -> Result<Vec<Zone>, ProviderError> {
            Ok(lamap_core::builtin_zones())
        }
    }

    /// Records fetched zone names; `fail_next` makes one call fail.
    struct FakePois {
        calls: Mutex<Vec<String>>,
        fail_next: AtomicBool,
    }

    impl FakePois {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_next: AtomicBool::new(false),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PoiProvider for FakePois {
        async fn fetch_pois(
            &self,
            zone: &str,
            _categories: &[Category],
            _user: Option<Coordinate>,
        ) -> Result<BTreeMap<Category, Vec<Poi>>, ProviderError> {
            self.calls.lock().unwrap().push(zone.to_owned());
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ProviderError("overpass unreachable".to_owned()));
            }
            let mut groups = BTreeMap::new();
            groups.insert(
                Category::Restaurants,
                vec![poi(&format!("{zone} Diner"), "restaurant")],
            );
            groups.insert(Category::Utilities, vec![poi("Restroom", "toilets")]);
            Ok(groups)
        }
    }

    struct FakeSearch(Result<Option<Place>, ProviderError>);

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(
            &self,
            _query: &str,
            _user: Coordinate,
        ) -> Result<Option<Place>, ProviderError> {
            self.0.clone()
        }
    }

    fn poi(name: &str, amenity: &str) -> Poi {
        Poi {
            name: name.to_owned(),
            lat: 34.05,
            lon: -118.25,
            amenity_type: Some(amenity.to_owned()),
            description: "POI".to_owned(),
            address: None,
            distance_km: None,
            tags: None,
        }
    }

    fn coordinator(
        location: Result<Coordinate, LocationError>,
        detect: Result<Option<String>, ProviderError>,
        pois: Arc<FakePois>,
    ) -> Coordinator {
        Coordinator::new(
            Arc::new(FakeLocation(location)),
            Arc::new(FakeZones(detect)),
            pois,
            Arc::new(FakeSearch(Ok(None))),
        )
    }

    #[tokio::test]
    async fn geolocation_failure_falls_back_to_city_center_and_default_zone() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Err(LocationError::Unavailable),
            Ok(None),
            Arc::clone(&pois),
        );
        c.locate().await;

        let state = c.state();
        assert_eq!(state.user, Some(LA_CENTER));
        assert_eq!(state.home_zone.as_deref(), Some("Downtown LA"));
        assert_eq!(state.current_zone(), Some("Downtown LA"));
        assert_eq!(state.error, Some(UserError::GeolocationUnavailable));
        assert_eq!(pois.calls(), ["Downtown LA"]);
    }

    #[tokio::test]
    async fn successful_locate_sets_home_and_fetches_once() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(HOLLYWOOD_POINT),
            Ok(Some("Hollywood".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;

        let state = c.state();
        assert_eq!(state.user, Some(HOLLYWOOD_POINT));
        assert_eq!(state.home_zone.as_deref(), Some("Hollywood"));
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert!(!state.pois.is_empty());
        assert_eq!(
            pois.calls(),
            ["Hollywood"],
            "initial load must fetch exactly once for the final authoritative zone"
        );
    }

    #[tokio::test]
    async fn zone_detect_failure_falls_back_and_sets_error() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(HOLLYWOOD_POINT),
            Err(ProviderError("503".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;

        let state = c.state();
        assert_eq!(state.home_zone.as_deref(), Some(FALLBACK_ZONE));
        assert!(
            matches!(
                state.error,
                Some(UserError::Network { context: "zone detection", .. })
            ),
            "expected zone-detection error, got: {:?}",
            state.error
        );
        assert_eq!(pois.calls(), [FALLBACK_ZONE]);
    }

    #[tokio::test]
    async fn repeated_locate_with_same_zone_does_not_refetch() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(HOLLYWOOD_POINT),
            Ok(Some("Hollywood".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        c.locate().await;
        assert_eq!(pois.calls(), ["Hollywood"], "unchanged fetch key must coalesce");
    }

    #[tokio::test]
    async fn select_and_reset_fetch_for_each_authority_change() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(LA_CENTER),
            Ok(Some("Downtown LA".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        c.select_zone("Hollywood").await;

        assert_eq!(c.state().current_zone(), Some("Hollywood"));
        assert_eq!(
            c.state().home_zone.as_deref(),
            Some("Downtown LA"),
            "explicit selection must not alter home"
        );

        c.reset_to_home().await;
        assert_eq!(c.state().current_zone(), Some("Downtown LA"));
        assert_eq!(c.state().selection, ZoneSelection::Home);
        assert_eq!(pois.calls(), ["Downtown LA", "Hollywood", "Downtown LA"]);
    }

    #[tokio::test]
    async fn reselecting_the_current_zone_is_idempotent() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(LA_CENTER),
            Ok(Some("Downtown LA".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        c.select_zone("Hollywood").await;
        c.select_zone("Hollywood").await;
        assert_eq!(pois.calls(), ["Downtown LA", "Hollywood"]);
    }

    #[tokio::test]
    async fn category_change_filters_without_refetch() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(LA_CENTER),
            Ok(Some("Downtown LA".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        let fetches_before = pois.calls().len();

        c.set_category(Category::Utilities);
        let visible = c.state().visible_pois();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Restroom");
        assert_eq!(pois.calls().len(), fetches_before, "no refetch on category change");

        c.set_category(Category::All);
        assert_eq!(c.state().visible_pois().len(), c.state().pois.len());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_pois_and_sets_error() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(LA_CENTER),
            Ok(Some("Downtown LA".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        let stale: Vec<String> = c.state().pois.iter().map(|p| p.name.clone()).collect();
        assert!(!stale.is_empty());

        pois.fail_next.store(true, Ordering::SeqCst);
        c.select_zone("Hollywood").await;

        let state = c.state();
        let kept: Vec<String> = state.pois.iter().map(|p| p.name.clone()).collect();
        assert_eq!(kept, stale, "previous POI set must survive a failed fetch");
        assert!(matches!(
            state.error,
            Some(UserError::Network { context: "POI fetch", .. })
        ));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn retrying_after_failure_refetches() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(LA_CENTER),
            Ok(Some("Downtown LA".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        pois.fail_next.store(true, Ordering::SeqCst);
        c.select_zone("Hollywood").await;
        // Re-clicking the same zone after a failure must retry.
        c.select_zone("Hollywood").await;
        assert_eq!(pois.calls(), ["Downtown LA", "Hollywood", "Hollywood"]);
        assert!(c.state().error.is_none());
        assert_eq!(c.state().pois[0].name, "Hollywood Diner");
    }

    #[tokio::test]
    async fn stale_response_for_old_key_is_discarded() {
        let pois = FakePois::new();
        let mut c = coordinator(
            Ok(LA_CENTER),
            Ok(Some("Downtown LA".to_owned())),
            Arc::clone(&pois),
        );
        c.locate().await;
        let current: Vec<String> = c.state().pois.iter().map(|p| p.name.clone()).collect();

        // A slow response for a zone that is no longer authoritative.
        let mut groups = BTreeMap::new();
        groups.insert(Category::Bars, vec![poi("Ghost Bar", "bar")]);
        c.apply_fetch_result(
            &FetchKey {
                zone: "Hollywood".to_owned(),
            },
            Ok(groups),
        );

        let kept: Vec<String> = c.state().pois.iter().map(|p| p.name.clone()).collect();
        assert_eq!(kept, current, "stale response must not overwrite newer state");
    }

    #[tokio::test]
    async fn flatten_preserves_category_display_order() {
        let mut groups = BTreeMap::new();
        groups.insert(Category::Utilities, vec![poi("Fountain", "drinking_water")]);
        groups.insert(Category::Restaurants, vec![poi("Diner", "restaurant")]);
        groups.insert(Category::Bars, vec![poi("Tavern", "pub")]);
        let flat = flatten_groups(groups);
        let names: Vec<_> = flat.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Diner", "Tavern", "Fountain"]);
    }

    #[tokio::test]
    async fn search_requires_a_location() {
        let pois = FakePois::new();
        let mut c = coordinator(Ok(LA_CENTER), Ok(None), pois);
        c.search("tacos").await;
        assert_eq!(c.state().error, Some(UserError::LocationNotReady));
    }

    #[tokio::test]
    async fn search_stores_result_or_not_found() {
        let hit = Place {
            name: "Grand Central Market".to_owned(),
            lat: 34.0508,
            lon: -118.2487,
            description: "Category: amenity | Type: food_court".to_owned(),
        };
        let mut c = Coordinator::new(
            Arc::new(FakeLocation(Ok(LA_CENTER))),
            Arc::new(FakeZones(Ok(Some("Downtown LA".to_owned())))),
            FakePois::new(),
            Arc::new(FakeSearch(Ok(Some(hit.clone())))),
        );
        c.locate().await;
        c.search("market").await;
        assert_eq!(c.state().search_result, Some(hit));
        assert!(c.state().error.is_none());

        let mut c = Coordinator::new(
            Arc::new(FakeLocation(Ok(LA_CENTER))),
            Arc::new(FakeZones(Ok(None))),
            FakePois::new(),
            Arc::new(FakeSearch(Ok(None))),
        );
        c.locate().await;
        c.search("atlantis").await;
        assert_eq!(
            c.state().error,
            Some(UserError::NotFound("atlantis".to_owned()))
        );
    }

    #[tokio::test]
    async fn dismiss_error_clears_the_slot() {
        let pois = FakePois::new();
        let mut c = coordinator(Err(LocationError::Unavailable), Ok(None), pois);
        c.locate().await;
        assert!(c.state().error.is_some());
        c.dismiss_error();
        assert!(c.state().error.is_none());
    }
}
