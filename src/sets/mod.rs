//! Itinerary set generation
//!
//! Each profile's quota is drawn from a pool of categorized point POIs.
//! Within one draw a POI is used at most once; across draws the pool is not
//! depleted, so the same POI may appear in several sets.

pub mod sampler;
pub mod writer;

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::category::Category;
use crate::poi::Poi;
use crate::profile::Profile;

pub use sampler::{FirstSampler, RandomSampler, Sampler};
pub use writer::{GenerationReport, SetWriter};

/// Candidate POIs grouped by category, geometry already reduced to points.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    by_category: HashMap<Category, Vec<Poi>>,
}

impl CandidatePool {
    /// Build a pool, dropping uncategorized records and those without geometry.
    /// Records sharing an [`Poi::identity`] are kept once, first copy wins.
    pub fn new(pois: impl IntoIterator<Item = Poi>) -> Self {
        let mut by_category: HashMap<Category, Vec<Poi>> = HashMap::new();
        let mut seen = HashSet::new();
        let mut duplicates = 0usize;
        for poi in pois {
            let Some(category) = poi.category else {
                continue;
            };
            let Some(point) = poi.to_point() else {
                continue;
            };
            if !seen.insert(poi.identity()) {
                duplicates += 1;
                continue;
            }
            by_category.entry(category).or_default().push(point);
        }
        if duplicates > 0 {
            debug!(duplicates, "Dropped duplicate candidates");
        }
        Self { by_category }
    }

    pub fn candidates(&self, category: Category) -> &[Poi] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A category that could not fill its quota in one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Starvation {
    pub category: Category,
    pub requested: usize,
    pub available: usize,
}

/// One generated itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct PoiSet {
    pub profile: Profile,
    /// 1-based
    pub index: usize,
    pub pois: Vec<Poi>,
}

/// Result of one draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    Complete(PoiSet),
    Partial { set: PoiSet, starved: Vec<Starvation> },
    /// Nothing was selected; the set is not written.
    Empty { index: usize, starved: Vec<Starvation> },
}

impl Draw {
    pub fn index(&self) -> usize {
        match self {
            Draw::Complete(set) | Draw::Partial { set, .. } => set.index,
            Draw::Empty { index, .. } => *index,
        }
    }

    pub fn set(&self) -> Option<&PoiSet> {
        match self {
            Draw::Complete(set) | Draw::Partial { set, .. } => Some(set),
            Draw::Empty { .. } => None,
        }
    }

    pub fn starved(&self) -> &[Starvation] {
        match self {
            Draw::Complete(_) => &[],
            Draw::Partial { starved, .. } | Draw::Empty { starved, .. } => starved.as_slice(),
        }
    }
}

pub struct SetBuilder<'a, S: Sampler> {
    pool: &'a CandidatePool,
    sampler: S,
}

impl<'a, S: Sampler> SetBuilder<'a, S> {
    pub fn new(pool: &'a CandidatePool, sampler: S) -> Self {
        Self { pool, sampler }
    }

    /// Draw one set for `profile`.
    pub fn draw(&mut self, profile: Profile, index: usize) -> Draw {
        let mut pois = Vec::new();
        let mut starved = Vec::new();

        for (category, requested) in profile.quota().picks() {
            let candidates = self.pool.candidates(category);
            let take = requested.min(candidates.len());
            if take < requested {
                warn!(
                    profile = %profile,
                    set = index,
                    category = %category,
                    requested,
                    available = candidates.len(),
                    "Not enough candidates for category"
                );
                starved.push(Starvation {
                    category,
                    requested,
                    available: candidates.len(),
                });
            }
            if take == candidates.len() {
                pois.extend(candidates.iter().cloned());
            } else {
                pois.extend(
                    self.sampler
                        .pick(candidates.len(), take)
                        .into_iter()
                        .map(|i| candidates[i].clone()),
                );
            }
        }

        if pois.is_empty() {
            Draw::Empty { index, starved }
        } else if starved.is_empty() {
            Draw::Complete(PoiSet { profile, index, pois })
        } else {
            Draw::Partial {
                set: PoiSet { profile, index, pois },
                starved,
            }
        }
    }

    /// `count` independent draws numbered from 1.
    pub fn build_sets(&mut self, profile: Profile, count: usize) -> Vec<Draw> {
        (1..=count).map(|index| self.draw(profile, index)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::Geometry;
    use serde_json::json;

    fn poi(id: &str, category: Category) -> Poi {
        let mut poi = Poi::new(
            json!({ "name": id }).as_object().cloned().unwrap(),
            Some(Geometry::Point(vec![0.0, 0.0])),
        );
        poi.id = Some(json!(id));
        poi.category = Some(category);
        poi
    }

    fn pool(counts: &[(Category, usize)]) -> CandidatePool {
        CandidatePool::new(counts.iter().flat_map(|(category, n)| {
            (0..*n).map(move |i| poi(&format!("{category}-{i}"), *category))
        }))
    }

    #[test]
    fn test_tourist_takes_two_places_and_one_pub() {
        let pool = pool(&[(Category::TouristPlaces, 3), (Category::Pub, 1)]);
        let mut builder = SetBuilder::new(&pool, RandomSampler::seeded(3));

        for draw in builder.build_sets(Profile::Tourist, 20) {
            let Draw::Complete(set) = draw else {
                panic!("expected a complete draw");
            };
            let places: HashSet<_> = set
                .pois
                .iter()
                .filter(|p| p.category == Some(Category::TouristPlaces))
                .map(Poi::identity)
                .collect();
            assert_eq!(places.len(), 2);
            let pubs: Vec<_> = set
                .pois
                .iter()
                .filter(|p| p.category == Some(Category::Pub))
                .collect();
            assert_eq!(pubs.len(), 1);
            assert_eq!(pubs[0].name(), Some("pub-0"));
        }
    }

    #[test]
    fn test_elderly_without_grocery_is_partial() {
        let pool = pool(&[(Category::Residential, 4), (Category::Park, 2)]);
        let mut builder = SetBuilder::new(&pool, RandomSampler::seeded(11));

        let draw = builder.draw(Profile::Elderly, 1);
        let Draw::Partial { set, starved } = draw else {
            panic!("expected a partial draw");
        };
        let categories: Vec<_> = set.pois.iter().filter_map(|p| p.category).collect();
        assert_eq!(categories, vec![Category::Residential, Category::Park]);
        assert_eq!(
            starved,
            vec![Starvation {
                category: Category::GroceryStore,
                requested: 1,
                available: 0
            }]
        );
    }

    #[test]
    fn test_short_category_yields_all_available() {
        let pool = pool(&[(Category::Storefront, 1), (Category::Residential, 1)]);
        let mut builder = SetBuilder::new(&pool, RandomSampler::seeded(5));

        let draw = builder.draw(Profile::ShopOwner, 1);
        let set = draw.set().unwrap();
        assert_eq!(set.pois.len(), 2);
        assert_eq!(
            draw.starved(),
            &[Starvation {
                category: Category::Storefront,
                requested: 2,
                available: 1
            }]
        );
    }

    #[test]
    fn test_empty_pool_gives_empty_draw() {
        let pool = pool(&[(Category::Cafe, 5)]);
        let mut builder = SetBuilder::new(&pool, FirstSampler);

        let draws = builder.build_sets(Profile::Student, 2);
        assert_eq!(draws.len(), 2);
        for (i, draw) in draws.iter().enumerate() {
            assert!(matches!(draw, Draw::Empty { .. }));
            assert_eq!(draw.index(), i + 1);
            assert_eq!(draw.starved().len(), 3);
            assert!(draw.set().is_none());
        }
    }

    #[test]
    fn test_no_duplicates_within_a_set() {
        let pool = pool(&[(Category::TouristPlaces, 2), (Category::Pub, 7)]);
        let mut builder = SetBuilder::new(&pool, RandomSampler::seeded(99));

        for draw in builder.build_sets(Profile::Tourist, 50) {
            let set = draw.set().unwrap();
            let ids: HashSet<_> = set.pois.iter().map(Poi::identity).collect();
            assert_eq!(ids.len(), set.pois.len());
        }
    }

    #[test]
    fn test_pois_reused_across_sets() {
        let pool = pool(&[(Category::University, 1), (Category::Pub, 1), (Category::Gym, 1)]);
        let mut builder = SetBuilder::new(&pool, FirstSampler);

        let draws = builder.build_sets(Profile::Student, 3);
        assert!(draws.iter().all(|d| matches!(d, Draw::Complete(_))));
        assert_eq!(draws[0].set().unwrap().pois, draws[2].set().unwrap().pois);
    }

    #[test]
    fn test_pool_reduces_areas_and_skips_uncategorized() {
        let mut area = Poi::new(
            serde_json::Map::new(),
            Some(Geometry::Polygon(vec![vec![
                vec![0.0, 0.0],
                vec![2.0, 0.0],
                vec![2.0, 2.0],
                vec![0.0, 2.0],
                vec![0.0, 0.0],
            ]])),
        );
        area.category = Some(Category::Park);
        let uncategorized = Poi::new(serde_json::Map::new(), Some(Geometry::Point(vec![1.0, 1.0])));

        let pool = CandidatePool::new(vec![area, uncategorized]);
        assert_eq!(pool.len(), 1);
        assert_eq!(
            pool.candidates(Category::Park)[0].geometry,
            Some(Geometry::Point(vec![1.0, 1.0]))
        );
        assert!(pool.candidates(Category::Gym).is_empty());
    }

    #[test]
    fn test_duplicate_ids_never_repeat_in_a_set() {
        let pool = CandidatePool::new(vec![
            poi("node/42", Category::Storefront),
            poi("node/42", Category::Storefront),
            poi("way/7", Category::Residential),
        ]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.candidates(Category::Storefront).len(), 1);

        let mut builder = SetBuilder::new(&pool, RandomSampler::seeded(1));
        for draw in builder.build_sets(Profile::ShopOwner, 10) {
            let set = draw.set().unwrap();
            let ids: HashSet<_> = set.pois.iter().map(Poi::identity).collect();
            assert_eq!(ids.len(), set.pois.len());
            assert_eq!(
                draw.starved(),
                &[Starvation {
                    category: Category::Storefront,
                    requested: 2,
                    available: 1
                }]
            );
        }
    }

    #[test]
    fn test_duplicate_across_categories_keeps_first() {
        let pool = CandidatePool::new(vec![
            poi("node/1", Category::Cafe),
            poi("node/1", Category::Pub),
        ]);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.candidates(Category::Cafe).len(), 1);
        assert!(pool.candidates(Category::Pub).is_empty());
    }
}
