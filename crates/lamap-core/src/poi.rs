//! POI model and the fixed amenity-tag → category table.
//!
//! Categories are the coarse display grouping; the amenity tag is the raw
//! OSM classification (`amenity`/`tourism`/`historic` values). Filtering
//! by category is pure and order-preserving, so it can run client-side
//! over an already-fetched working set without a refetch.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A point of interest inside a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Raw amenity value, e.g. `restaurant`, `pub`, `toilets`.
    pub amenity_type: Option<String>,
    pub description: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Distance from the user in kilometers, when a user coordinate was
    /// known at fetch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

impl Poi {
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// A place returned by free-text search: the single closest match to
/// the user's location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub description: String,
}

impl Place {
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// An OSM `key=value` pair admitted by a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFilter {
    pub key: &'static str,
    pub value: &'static str,
}

const RESTAURANT_TAGS: &[TagFilter] = &[TagFilter {
    key: "amenity",
    value: "restaurant",
}];

const BAR_TAGS: &[TagFilter] = &[
    TagFilter {
        key: "amenity",
        value: "bar",
    },
    TagFilter {
        key: "amenity",
        value: "pub",
    },
];

const ATTRACTION_TAGS: &[TagFilter] = &[
    TagFilter {
        key: "tourism",
        value: "attraction",
    },
    TagFilter {
        key: "tourism",
        value: "museum",
    },
    TagFilter {
        key: "tourism",
        value: "gallery",
    },
    TagFilter {
        key: "historic",
        value: "monument",
    },
];

const UTILITY_TAGS: &[TagFilter] = &[
    TagFilter {
        key: "amenity",
        value: "toilets",
    },
    TagFilter {
        key: "amenity",
        value: "drinking_water",
    },
];

/// Display category for POIs. `All` matches every tag; the rest map to a
/// fixed set of allowed amenity values. Unknown tags belong to no
/// category and only appear under `All`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Restaurants,
    Bars,
    Attractions,
    Utilities,
}

impl Category {
    /// The fetchable categories in their fixed display order, used both
    /// for building upstream queries and for flattening grouped results.
    pub const FETCHABLE: [Category; 4] = [
        Category::Restaurants,
        Category::Bars,
        Category::Attractions,
        Category::Utilities,
    ];

    /// OSM tag filters this category admits. Empty for [`Category::All`].
    #[must_use]
    pub const fn tag_filters(self) -> &'static [TagFilter] {
        match self {
            Category::All => &[],
            Category::Restaurants => RESTAURANT_TAGS,
            Category::Bars => BAR_TAGS,
            Category::Attractions => ATTRACTION_TAGS,
            Category::Utilities => UTILITY_TAGS,
        }
    }

    /// Amenity values this category admits, e.g. `["bar", "pub"]`.
    /// Empty for [`Category::All`], which admits everything.
    #[must_use]
    pub fn allowed_values(self) -> Vec<&'static str> {
        self.tag_filters().iter().map(|t| t.value).collect()
    }

    /// Category for a raw amenity value, or `None` for unknown values.
    #[must_use]
    pub fn from_amenity(value: &str) -> Option<Category> {
        Category::FETCHABLE
            .into_iter()
            .find(|c| c.tag_filters().iter().any(|t| t.value == value))
    }

    /// Category for a full OSM tag map. Values may be `;`-separated
    /// lists; any element matching counts.
    #[must_use]
    pub fn from_tags(tags: &HashMap<String, String>) -> Option<Category> {
        Category::FETCHABLE.into_iter().find(|c| {
            c.tag_filters().iter().any(|t| {
                tags.get(t.key)
                    .is_some_and(|v| v.split(';').any(|part| part.trim() == t.value))
            })
        })
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Category::All => "all",
            Category::Restaurants => "restaurants",
            Category::Bars => "bars",
            Category::Attractions => "attractions",
            Category::Utilities => "utilities",
        };
        write!(f, "{label}")
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Category::All),
            "restaurants" => Ok(Category::Restaurants),
            "bars" => Ok(Category::Bars),
            "attractions" => Ok(Category::Attractions),
            "utilities" => Ok(Category::Utilities),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// POIs from `pois` admitted by `category`, original order preserved.
///
/// Identity for [`Category::All`]. Pure and idempotent: filtering an
/// already-filtered set by the same category returns the same set.
#[must_use]
pub fn filter_by_category(pois: &[Poi], category: Category) -> Vec<Poi> {
    if category == Category::All {
        return pois.to_vec();
    }
    let allowed = category.allowed_values();
    pois.iter()
        .filter(|poi| {
            poi.amenity_type
                .as_deref()
                .is_some_and(|a| allowed.contains(&a))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(name: &str, amenity: Option<&str>) -> Poi {
        Poi {
            name: name.to_owned(),
            lat: 34.05,
            lon: -118.25,
            amenity_type: amenity.map(ToOwned::to_owned),
            description: "POI".to_owned(),
            address: None,
            distance_km: None,
            tags: None,
        }
    }

    #[test]
    fn from_amenity_maps_known_values() {
        assert_eq!(Category::from_amenity("restaurant"), Some(Category::Restaurants));
        assert_eq!(Category::from_amenity("pub"), Some(Category::Bars));
        assert_eq!(Category::from_amenity("museum"), Some(Category::Attractions));
        assert_eq!(Category::from_amenity("monument"), Some(Category::Attractions));
        assert_eq!(Category::from_amenity("drinking_water"), Some(Category::Utilities));
    }

    #[test]
    fn from_amenity_unknown_is_none() {
        assert_eq!(Category::from_amenity("car_wash"), None);
    }

    #[test]
    fn from_tags_matches_semicolon_lists() {
        let mut tags = HashMap::new();
        tags.insert("amenity".to_owned(), "cafe;bar".to_owned());
        assert_eq!(Category::from_tags(&tags), Some(Category::Bars));
    }

    #[test]
    fn from_tags_prefers_first_category_in_order() {
        let mut tags = HashMap::new();
        tags.insert("amenity".to_owned(), "restaurant".to_owned());
        tags.insert("tourism".to_owned(), "attraction".to_owned());
        assert_eq!(Category::from_tags(&tags), Some(Category::Restaurants));
    }

    #[test]
    fn from_tags_unmatched_is_none() {
        let mut tags = HashMap::new();
        tags.insert("shop".to_owned(), "bakery".to_owned());
        assert_eq!(Category::from_tags(&tags), None);
    }

    #[test]
    fn filter_all_is_identity() {
        let pois = vec![poi("a", Some("restaurant")), poi("b", None), poi("c", Some("x"))];
        let filtered = filter_by_category(&pois, Category::All);
        assert_eq!(filtered.len(), pois.len());
        let names: Vec<_> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn filter_utilities_keeps_exact_matches_in_order() {
        let pois = vec![
            poi("diner", Some("restaurant")),
            poi("restroom", Some("toilets")),
            poi("fountain", Some("drinking_water")),
        ];
        let filtered = filter_by_category(&pois, Category::Utilities);
        let names: Vec<_> = filtered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["restroom", "fountain"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let pois = vec![
            poi("bar", Some("bar")),
            poi("pub", Some("pub")),
            poi("diner", Some("restaurant")),
        ];
        let once = filter_by_category(&pois, Category::Bars);
        let twice = filter_by_category(&once, Category::Bars);
        assert_eq!(once.len(), twice.len());
        let a: Vec<_> = once.iter().map(|p| p.name.as_str()).collect();
        let b: Vec<_> = twice.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn filter_excludes_untagged_pois_from_specific_categories() {
        let pois = vec![poi("mystery", None), poi("bar", Some("bar"))];
        let filtered = filter_by_category(&pois, Category::Bars);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "bar");
    }

    #[test]
    fn category_round_trips_through_strings() {
        for c in Category::FETCHABLE {
            let parsed: Category = c.to_string().parse().expect("should parse");
            assert_eq!(parsed, c);
        }
        assert_eq!("all".parse::<Category>(), Ok(Category::All));
        assert!("plumbing".parse::<Category>().is_err());
    }
}
