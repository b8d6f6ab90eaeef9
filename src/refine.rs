//! Name-based refinement of filtered POIs
//!
//! Unnamed records cannot be shown to participants, and some named records are
//! curated out by hand. The banned list is a text file with one name per line.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::poi::Poi;

#[derive(Debug, Clone, Default)]
pub struct BannedNames(HashSet<String>);

impl BannedNames {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InputMissing(path.to_path_buf()));
        }
        let names: BannedNames = fs::read_to_string(path)?.lines().collect();
        info!(path = %path.display(), count = names.len(), "Loaded banned names");
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for BannedNames {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
pub struct RefineReport {
    pub kept: Vec<Poi>,
    pub unnamed: usize,
    pub banned: usize,
}

pub fn refine(pois: Vec<Poi>, banned: &BannedNames) -> RefineReport {
    let mut report = RefineReport::default();
    for poi in pois {
        match poi.name().map(str::trim) {
            None | Some("") => report.unnamed += 1,
            Some(name) if banned.contains(name) => report.banned += 1,
            Some(_) => report.kept.push(poi),
        }
    }
    report
}
