//! In-memory check-in store.
//!
//! Demo-grade by design: check-ins are fire-and-forget writes that live
//! only as long as the process. Each zone gets a seeded feed of recent
//! check-ins and a "top locations" ranking that absorbs new writes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::prelude::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct CheckIn {
    pub id: String,
    pub user_name: String,
    pub poi_name: String,
    pub poi_id: String,
    pub poi_lat: f64,
    pub poi_lon: f64,
    pub zone_name: String,
    pub photo_url: String,
    pub caption: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub amenity_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopLocation {
    pub poi_name: String,
    pub poi_id: String,
    pub lat: f64,
    pub lon: f64,
    pub amenity_type: String,
    pub checkin_count: u32,
}

/// Payload for a new check-in.
#[derive(Debug, Deserialize)]
pub struct NewCheckIn {
    pub user_name: String,
    pub poi_name: String,
    #[serde(default)]
    pub poi_id: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub zone_name: String,
    #[serde(default)]
    pub amenity_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

struct Venue {
    name: &'static str,
    lat: f64,
    lon: f64,
    kind: &'static str,
}

/// Well-known venues per built-in zone, used only for seeding.
const ZONE_VENUES: &[(&str, &[Venue])] = &[
    (
        "Downtown LA",
        &[
            Venue { name: "The Broad", lat: 34.0545, lon: -118.2507, kind: "museum" },
            Venue { name: "Grand Central Market", lat: 34.0508, lon: -118.2487, kind: "restaurant" },
            Venue { name: "Walt Disney Concert Hall", lat: 34.0553, lon: -118.2498, kind: "attraction" },
            Venue { name: "The Last Bookstore", lat: 34.0477, lon: -118.2500, kind: "attraction" },
            Venue { name: "Angels Flight Railway", lat: 34.0516, lon: -118.2505, kind: "attraction" },
        ],
    ),
    (
        "Hollywood",
        &[
            Venue { name: "TCL Chinese Theatre", lat: 34.1022, lon: -118.3410, kind: "attraction" },
            Venue { name: "Hollywood Walk of Fame", lat: 34.1016, lon: -118.3267, kind: "attraction" },
            Venue { name: "Dolby Theatre", lat: 34.1026, lon: -118.3402, kind: "attraction" },
            Venue { name: "Musso & Frank Grill", lat: 34.1017, lon: -118.3355, kind: "restaurant" },
        ],
    ),
    (
        "Santa Monica",
        &[
            Venue { name: "Santa Monica Pier", lat: 34.0094, lon: -118.4973, kind: "attraction" },
            Venue { name: "Third Street Promenade", lat: 34.0161, lon: -118.4960, kind: "attraction" },
            Venue { name: "Palisades Park", lat: 34.0195, lon: -118.5004, kind: "park" },
        ],
    ),
    (
        "Pasadena",
        &[
            Venue { name: "Rose Bowl Stadium", lat: 34.1613, lon: -118.1677, kind: "stadium" },
            Venue { name: "Norton Simon Museum", lat: 34.1463, lon: -118.1587, kind: "museum" },
            Venue { name: "Old Pasadena", lat: 34.1461, lon: -118.1514, kind: "attraction" },
            Venue { name: "Gamble House", lat: 34.1516, lon: -118.1588, kind: "attraction" },
        ],
    ),
];

const CAPTIONS: &[&str] = &[
    "Best spot in LA! 🌟",
    "Amazing vibes here ✨",
    "Had to check this place out 👀",
    "Finally made it! Worth the hype 🙌",
    "Can't beat these views 📸",
    "Hidden gem in {zone} 💎",
    "My new favorite spot 🎯",
    "{venue} never disappoints ⭐",
    "Living my best LA life 🌞",
    "Weekend fun in {zone} 🎉",
];

const USERS: &[&str] = &[
    "Alex Chen", "Maria Garcia", "James Kim", "Sarah Lee", "David Patel",
    "Emma Wilson", "Michael Lopez", "Sofia Rodriguez", "Ryan Park", "Lisa Nguyen",
];

struct Inner {
    checkins: HashMap<String, Vec<CheckIn>>,
    top: HashMap<String, Vec<TopLocation>>,
    next_id: u64,
}

/// Shared handle to the store; cheap to clone into axum state.
#[derive(Clone)]
pub struct CheckinStore {
    inner: Arc<RwLock<Inner>>,
}

impl CheckinStore {
    /// An empty store with no seed data.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                checkins: HashMap::new(),
                top: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// A store seeded with 20–30 mock check-ins per known zone, spread
    /// over the last 7 days, plus a top-locations ranking.
    #[must_use]
    pub fn seeded() -> Self {
        let mut rng = rand::rng();
        let now = Utc::now();
        let mut checkins: HashMap<String, Vec<CheckIn>> = HashMap::new();
        let mut top: HashMap<String, Vec<TopLocation>> = HashMap::new();
        let mut next_id = 1u64;

        for (zone, venues) in ZONE_VENUES {
            let mut feed = Vec::new();
            let mut venue_counts: HashMap<&str, u32> = HashMap::new();

            let count = rng.random_range(20..=30);
            for _ in 0..count {
                let venue = venues.choose(&mut rng).expect("venue table is non-empty");
                *venue_counts.entry(venue.name).or_default() += 1;

                let minutes_ago = rng.random_range(0..7 * 24 * 60);
                let caption = CAPTIONS
                    .choose(&mut rng)
                    .expect("caption table is non-empty")
                    .replace("{zone}", zone)
                    .replace("{venue}", venue.name);

                feed.push(CheckIn {
                    id: next_id.to_string(),
                    user_name: (*USERS.choose(&mut rng).expect("user table is non-empty"))
                        .to_owned(),
                    poi_name: venue.name.to_owned(),
                    poi_id: poi_id(zone, venue.name),
                    poi_lat: venue.lat,
                    poi_lon: venue.lon,
                    zone_name: (*zone).to_owned(),
                    photo_url: format!("https://picsum.photos/400/300?random={next_id}"),
                    caption: Some(caption),
                    timestamp: now - Duration::minutes(minutes_ago),
                    amenity_type: venue.kind.to_owned(),
                });
                next_id += 1;
            }
            feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            checkins.insert((*zone).to_owned(), feed);

            let mut ranked: Vec<TopLocation> = venues
                .iter()
                .map(|venue| TopLocation {
                    poi_name: venue.name.to_owned(),
                    poi_id: poi_id(zone, venue.name),
                    lat: venue.lat,
                    lon: venue.lon,
                    amenity_type: venue.kind.to_owned(),
                    checkin_count: rng.random_range(15..=75)
                        + venue_counts.get(venue.name).copied().unwrap_or(0) * 2,
                })
                .collect();
            ranked.sort_by(|a, b| b.checkin_count.cmp(&a.checkin_count));
            ranked.truncate(10);
            top.insert((*zone).to_owned(), ranked);
        }

        Self {
            inner: Arc::new(RwLock::new(Inner {
                checkins,
                top,
                next_id,
            })),
        }
    }

    /// Most recent check-ins for a zone, newest first. Unknown zones
    /// yield an empty feed.
    pub async fn recent(&self, zone: &str, limit: usize) -> Vec<CheckIn> {
        let inner = self.inner.read().await;
        inner
            .checkins
            .get(zone)
            .map(|feed| feed.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Top locations for a zone by check-in count.
    pub async fn top(&self, zone: &str, limit: usize) -> Vec<TopLocation> {
        let inner = self.inner.read().await;
        inner
            .top
            .get(zone)
            .map(|ranked| ranked.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Records a check-in at the head of its zone's feed and bumps the
    /// matching top-location counter.
    pub async fn add(&self, new: NewCheckIn) -> CheckIn {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let checkin = CheckIn {
            id: id.to_string(),
            poi_id: new
                .poi_id
                .unwrap_or_else(|| poi_id(&new.zone_name, &new.poi_name)),
            user_name: new.user_name,
            poi_name: new.poi_name,
            poi_lat: new.lat,
            poi_lon: new.lon,
            zone_name: new.zone_name,
            photo_url: format!("https://picsum.photos/400/300?random={id}"),
            caption: new.caption,
            timestamp: Utc::now(),
            amenity_type: new.amenity_type.unwrap_or_else(|| "attraction".to_owned()),
        };

        inner
            .checkins
            .entry(checkin.zone_name.clone())
            .or_default()
            .insert(0, checkin.clone());

        if let Some(ranked) = inner.top.get_mut(&checkin.zone_name) {
            if let Some(entry) = ranked.iter_mut().find(|l| l.poi_name == checkin.poi_name) {
                entry.checkin_count += 1;
            }
            ranked.sort_by(|a, b| b.checkin_count.cmp(&a.checkin_count));
        }

        checkin
    }
}

/// URL-safe POI identifier: `<zone>-<name>` lowercased with dashes.
fn poi_id(zone: &str, name: &str) -> String {
    let slug: String = format!("{zone}-{name}")
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c == ' ' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect();
    slug.split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_checkin(zone: &str, poi: &str) -> NewCheckIn {
        NewCheckIn {
            user_name: "Test User".to_owned(),
            poi_name: poi.to_owned(),
            poi_id: None,
            lat: 34.0545,
            lon: -118.2507,
            zone_name: zone.to_owned(),
            amenity_type: None,
            caption: Some("hello".to_owned()),
        }
    }

    #[tokio::test]
    async fn seeded_store_has_recent_feeds_per_zone() {
        let store = CheckinStore::seeded();
        for (zone, _) in ZONE_VENUES {
            let feed = store.recent(zone, 50).await;
            assert!(
                (20..=30).contains(&feed.len()),
                "zone {zone} should have 20-30 seeded check-ins, got {}",
                feed.len()
            );
            for pair in feed.windows(2) {
                assert!(
                    pair[0].timestamp >= pair[1].timestamp,
                    "feed must be newest-first"
                );
            }
        }
    }

    #[tokio::test]
    async fn recent_respects_limit_and_unknown_zone() {
        let store = CheckinStore::seeded();
        assert_eq!(store.recent("Downtown LA", 5).await.len(), 5);
        assert!(store.recent("Atlantis", 5).await.is_empty());
    }

    #[tokio::test]
    async fn add_prepends_and_bumps_top_count() {
        let store = CheckinStore::seeded();
        let before = store.top("Downtown LA", 10).await;
        let broad_before = before
            .iter()
            .find(|l| l.poi_name == "The Broad")
            .map(|l| l.checkin_count)
            .expect("The Broad is seeded");

        let added = store.add(new_checkin("Downtown LA", "The Broad")).await;
        assert_eq!(added.poi_id, "downtown-la-the-broad");

        let feed = store.recent("Downtown LA", 1).await;
        assert_eq!(feed[0].id, added.id, "new check-in must lead the feed");

        let after = store.top("Downtown LA", 10).await;
        let broad_after = after
            .iter()
            .find(|l| l.poi_name == "The Broad")
            .map(|l| l.checkin_count)
            .expect("The Broad still ranked");
        assert_eq!(broad_after, broad_before + 1);
    }

    #[tokio::test]
    async fn add_to_unknown_zone_creates_feed() {
        let store = CheckinStore::empty();
        store.add(new_checkin("Echo Park", "Echo Park Lake")).await;
        let feed = store.recent("Echo Park", 10).await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].poi_name, "Echo Park Lake");
    }

    #[test]
    fn poi_id_is_url_safe() {
        assert_eq!(
            poi_id("Downtown LA", "Musso & Frank Grill"),
            "downtown-la-musso-frank-grill"
        );
    }
}
