//! urban-explore: POI sets for a mobility workshop
//!
//! Offline, raw OpenStreetMap POIs are categorized, clipped to the workshop
//! region, cleaned of unusable names and packaged into numbered sets per
//! participant profile. Online, a small HTTP service hands each participant
//! one set and sends them to a map viewer.

pub mod category;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod poi;
pub mod profile;
pub mod refine;
pub mod region;
pub mod server;
pub mod sets;
pub mod store;

pub use category::{Categorizer, Category};
pub use config::Config;
pub use error::{Error, Result};
pub use poi::Poi;
pub use profile::{Profile, Quota};
pub use store::{Assignment, AssignmentStore};
