//! Enumerating the set files a profile can hand out

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::sets::writer::SET_EXTENSION;

/// Set files on disk, addressed relative to the static directory.
#[derive(Debug, Clone)]
pub struct SetCatalog {
    static_dir: PathBuf,
    sets_dir: PathBuf,
}

impl SetCatalog {
    pub fn new(static_dir: impl Into<PathBuf>, sets_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
            sets_dir: sets_dir.into(),
        }
    }

    /// The profile's sets in allocation order: numeric file stem first, then
    /// file name. Missing directory or no files is [`Error::NoSetsAvailable`].
    pub fn available(&self, profile: Profile) -> Result<Vec<String>> {
        let dir = self.sets_dir.join(profile.as_str());
        if !dir.is_dir() {
            return Err(Error::NoSetsAvailable(profile));
        }

        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == SET_EXTENSION))
            .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        if names.is_empty() {
            return Err(Error::NoSetsAvailable(profile));
        }
        names.sort_by_key(|name| (set_index(name).unwrap_or(u64::MAX), name.clone()));

        let prefix = self.relative_sets_dir();
        Ok(names
            .into_iter()
            .map(|name| join_url_path(&[prefix.as_str(), profile.as_str(), name.as_str()]))
            .collect())
    }

    /// URL path segment(s) of the sets directory below the static directory.
    fn relative_sets_dir(&self) -> String {
        let relative = self
            .sets_dir
            .strip_prefix(&self.static_dir)
            .unwrap_or(&self.sets_dir);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }
}

fn set_index(file_name: &str) -> Option<u64> {
    Path::new(file_name).file_stem()?.to_str()?.parse().ok()
}

fn join_url_path(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sets_sorted_numerically() {
        let dir = TempDir::new().unwrap();
        let profile_dir = dir.path().join("places").join("student");
        fs::create_dir_all(&profile_dir).unwrap();
        for name in ["10.geojson", "2.geojson", "1.geojson", "extra.geojson", "notes.txt"] {
            fs::write(profile_dir.join(name), "{}").unwrap();
        }

        let catalog = SetCatalog::new(dir.path(), dir.path().join("places"));
        assert_eq!(
            catalog.available(Profile::Student).unwrap(),
            vec![
                "places/student/1.geojson",
                "places/student/2.geojson",
                "places/student/10.geojson",
                "places/student/extra.geojson",
            ]
        );
    }

    #[test]
    fn test_missing_or_empty_profile_dir() {
        let dir = TempDir::new().unwrap();
        let catalog = SetCatalog::new(dir.path(), dir.path().join("places"));
        assert!(matches!(
            catalog.available(Profile::Elderly),
            Err(Error::NoSetsAvailable(Profile::Elderly))
        ));

        fs::create_dir_all(dir.path().join("places").join("elderly")).unwrap();
        assert!(matches!(
            catalog.available(Profile::Elderly),
            Err(Error::NoSetsAvailable(Profile::Elderly))
        ));
    }
}
