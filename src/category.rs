//! Rule-based POI categorization
//!
//! Raw OpenStreetMap-style tags are mapped to a single [`Category`] by walking
//! one ordered rule table. Table order is priority: the first category with a
//! satisfied tag wins, so a record tagged both `shop=*` and
//! `building=residential` is a storefront.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::poi::Poi;

/// Normalized POI label derived from source tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Storefront,
    University,
    Cafe,
    GroceryStore,
    Restaurant,
    Market,
    Residential,
    Pub,
    TouristPlaces,
    Park,
    School,
    Office,
    Plaza,
    Gym,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Storefront,
        Category::University,
        Category::Cafe,
        Category::GroceryStore,
        Category::Restaurant,
        Category::Market,
        Category::Residential,
        Category::Pub,
        Category::TouristPlaces,
        Category::Park,
        Category::School,
        Category::Office,
        Category::Plaza,
        Category::Gym,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Storefront => "storefront",
            Category::University => "university",
            Category::Cafe => "cafe",
            Category::GroceryStore => "grocery_store",
            Category::Restaurant => "restaurant",
            Category::Market => "market",
            Category::Residential => "residential",
            Category::Pub => "pub",
            Category::TouristPlaces => "tourist_places",
            Category::Park => "park",
            Category::School => "school",
            Category::Office => "office",
            Category::Plaza => "plaza",
            Category::Gym => "gym",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

/// How a single tag value satisfies a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// Any non-null value
    Present,
    /// Exact string value
    Is(&'static str),
    /// Any of the listed string values
    OneOf(&'static [&'static str]),
}

impl TagMatch {
    /// Null and absent values never match.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let value = match value {
            None | Some(Value::Null) => return false,
            Some(v) => v,
        };
        match self {
            TagMatch::Present => true,
            TagMatch::Is(expected) => value.as_str() == Some(*expected),
            TagMatch::OneOf(accepted) => value
                .as_str()
                .is_some_and(|v| accepted.contains(&v)),
        }
    }
}

/// A category and the tags, in evaluation order, that select it.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: Category,
    pub tags: &'static [(&'static str, TagMatch)],
}

/// The category rule table. Every categorization step reads this table.
pub const RULES: &[Rule] = &[
    Rule {
        category: Category::Storefront,
        tags: &[("shop", TagMatch::Present)],
    },
    Rule {
        category: Category::University,
        tags: &[("amenity", TagMatch::Is("university"))],
    },
    Rule {
        category: Category::Cafe,
        tags: &[("amenity", TagMatch::Is("cafe"))],
    },
    Rule {
        category: Category::GroceryStore,
        tags: &[
            ("shop", TagMatch::OneOf(&["supermarket", "convenience"])),
            ("amenity", TagMatch::Is("marketplace")),
        ],
    },
    Rule {
        category: Category::Restaurant,
        tags: &[("amenity", TagMatch::Is("restaurant"))],
    },
    Rule {
        category: Category::Market,
        tags: &[("amenity", TagMatch::Is("marketplace"))],
    },
    Rule {
        category: Category::Residential,
        tags: &[
            ("building", TagMatch::Is("residential")),
            ("landuse", TagMatch::Is("residential")),
        ],
    },
    Rule {
        category: Category::Pub,
        tags: &[("amenity", TagMatch::Is("pub"))],
    },
    Rule {
        category: Category::TouristPlaces,
        tags: &[("tourism", TagMatch::OneOf(&["attraction", "museum", "viewpoint"]))],
    },
    Rule {
        category: Category::Park,
        tags: &[("leisure", TagMatch::Is("park"))],
    },
    Rule {
        category: Category::School,
        tags: &[("amenity", TagMatch::Is("school"))],
    },
    Rule {
        category: Category::Office,
        tags: &[("office", TagMatch::Present)],
    },
    Rule {
        category: Category::Plaza,
        tags: &[
            ("leisure", TagMatch::Is("plaza")),
            ("amenity", TagMatch::Is("town_square")),
        ],
    },
    Rule {
        category: Category::Gym,
        tags: &[
            ("amenity", TagMatch::Is("gym")),
            ("leisure", TagMatch::Is("fitness_centre")),
            ("sport", TagMatch::OneOf(&["fitness", "gymnastics"])),
        ],
    },
];

/// Ordered rule matcher.
#[derive(Debug, Clone, Copy)]
pub struct Categorizer<'a> {
    rules: &'a [Rule],
}

impl Default for Categorizer<'static> {
    fn default() -> Self {
        Self { rules: RULES }
    }
}

impl<'a> Categorizer<'a> {
    pub fn with_rules(rules: &'a [Rule]) -> Self {
        Self { rules }
    }

    /// Categorize a tag map.
    ///
    /// Falls back to `fallback` (the coarse label assigned at ingestion) when
    /// no rule matches. Labels outside [`Category`] are treated as absent.
    pub fn categorize(
        &self,
        tags: &Map<String, Value>,
        fallback: Option<&str>,
    ) -> Option<Category> {
        for rule in self.rules {
            if rule.tags.iter().any(|(key, m)| m.matches(tags.get(*key))) {
                return Some(rule.category);
            }
        }

        let label = fallback?;
        match label.parse() {
            Ok(category) => Some(category),
            Err(()) => {
                debug!(label, "Ignoring unknown fallback category");
                None
            }
        }
    }

    /// Assign a category to every record in place.
    pub fn categorize_all(&self, pois: &mut [Poi]) -> CategoryReport {
        let mut report = CategoryReport::default();
        for poi in pois.iter_mut() {
            poi.category = self.categorize(&poi.tags, poi.fallback_label());
            match poi.category {
                Some(category) => *report.counts.entry(category).or_default() += 1,
                None => report.unmatched += 1,
            }
        }
        report
    }
}

/// Per-category tallies from a categorization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryReport {
    pub counts: BTreeMap<Category, usize>,
    pub unmatched: usize,
}

impl CategoryReport {
    pub fn total(&self) -> usize {
        self.counts.values().sum::<usize>() + self.unmatched
    }
}
