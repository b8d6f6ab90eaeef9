//! Participant profiles and their itinerary quotas

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::Error;

/// Participant archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Elderly,
    Student,
    OfficeWorker,
    Tourist,
    Families,
    ShopOwner,
}

/// How many POIs of each category one set draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    /// One POI per category
    Uniform(&'static [Category]),
    /// Fixed count per category
    Weighted(&'static [(Category, usize)]),
}

impl Quota {
    /// Flatten into (category, count) picks in declaration order.
    pub fn picks(&self) -> Vec<(Category, usize)> {
        match self {
            Quota::Uniform(categories) => categories.iter().map(|c| (*c, 1)).collect(),
            Quota::Weighted(picks) => picks.to_vec(),
        }
    }
}

impl Profile {
    /// Every profile, in the order they are presented to participants.
    pub const ALL: [Profile; 6] = [
        Profile::Elderly,
        Profile::Student,
        Profile::OfficeWorker,
        Profile::Tourist,
        Profile::Families,
        Profile::ShopOwner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Elderly => "elderly",
            Profile::Student => "student",
            Profile::OfficeWorker => "office_worker",
            Profile::Tourist => "tourist",
            Profile::Families => "families",
            Profile::ShopOwner => "shop_owner",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Profile::Elderly => "Older adults",
            Profile::Student => "University students",
            Profile::OfficeWorker => "Office workers",
            Profile::Tourist => "Tourists",
            Profile::Families => "Families with children",
            Profile::ShopOwner => "Local shop owners",
        }
    }

    pub fn quota(&self) -> Quota {
        match self {
            Profile::Elderly => Quota::Uniform(&[
                Category::Residential,
                Category::GroceryStore,
                Category::Park,
            ]),
            Profile::Student => {
                Quota::Uniform(&[Category::University, Category::Pub, Category::Gym])
            }
            Profile::OfficeWorker => Quota::Uniform(&[
                Category::Office,
                Category::Restaurant,
                Category::Residential,
            ]),
            Profile::Tourist => {
                Quota::Weighted(&[(Category::TouristPlaces, 2), (Category::Pub, 1)])
            }
            Profile::Families => {
                Quota::Uniform(&[Category::Park, Category::School, Category::Residential])
            }
            Profile::ShopOwner => {
                Quota::Weighted(&[(Category::Storefront, 2), (Category::Residential, 1)])
            }
        }
    }

    /// Source tag values each quota category is meant to cover.
    ///
    /// Reference only: matching is done by [`crate::category::RULES`], which
    /// must agree with this list.
    pub fn source_tags(&self) -> &'static [(Category, &'static [&'static str])] {
        match self {
            Profile::Elderly => &[
                (Category::Residential, &["residential"]),
                (Category::GroceryStore, &["supermarket", "convenience", "marketplace"]),
                (Category::Park, &["square", "park"]),
            ],
            Profile::Student => &[
                (Category::University, &["university", "college", "school"]),
                (Category::Pub, &["pub", "bar", "nightclub"]),
                (Category::Gym, &["gym", "fitness_centre", "sports_centre"]),
            ],
            Profile::OfficeWorker => &[
                (Category::Office, &["office", "commercial"]),
                (Category::Restaurant, &["restaurant", "cafe", "fast_food"]),
                (Category::Residential, &["residential"]),
            ],
            Profile::Tourist => &[
                (
                    Category::TouristPlaces,
                    &[
                        "museum",
                        "art_gallery",
                        "viewpoint",
                        "attraction",
                        "monument",
                        "historic",
                        "tourism",
                    ],
                ),
                (Category::Pub, &["pub", "bar", "nightclub"]),
            ],
            Profile::Families => &[
                (Category::Park, &["park", "playground", "garden"]),
                (Category::School, &["school", "kindergarten"]),
                (Category::Residential, &["residential"]),
            ],
            Profile::ShopOwner => &[
                (Category::Residential, &["residential"]),
                (Category::Storefront, &["shop", "marketplace", "supermarket", "convenience"]),
            ],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::ProfileUnknown(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profiles() {
        assert_eq!("tourist".parse::<Profile>().unwrap(), Profile::Tourist);
        assert_eq!("office_worker".parse::<Profile>().unwrap(), Profile::OfficeWorker);
        assert!(matches!(
            "astronaut".parse::<Profile>(),
            Err(Error::ProfileUnknown(name)) if name == "astronaut"
        ));
    }

    #[test]
    fn test_weighted_quotas() {
        assert_eq!(
            Profile::Tourist.quota().picks(),
            vec![(Category::TouristPlaces, 2), (Category::Pub, 1)]
        );
        assert_eq!(
            Profile::ShopOwner.quota().picks(),
            vec![(Category::Storefront, 2), (Category::Residential, 1)]
        );
    }

    #[test]
    fn test_uniform_quota_picks_one_each() {
        assert_eq!(
            Profile::Elderly.quota().picks(),
            vec![
                (Category::Residential, 1),
                (Category::GroceryStore, 1),
                (Category::Park, 1)
            ]
        );
    }

    #[test]
    fn test_source_tags_cover_quota_categories() {
        for profile in Profile::ALL {
            for (category, _) in profile.quota().picks() {
                assert!(
                    profile.source_tags().iter().any(|(c, _)| *c == category),
                    "{profile} has no source tags for {category}"
                );
            }
        }
    }
}
