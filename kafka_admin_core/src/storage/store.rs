use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{error, info, warn};

use super::profile::ClusterProfile;
use crate::core::errors::AdminError;

pub const PROFILE_FILE_NAME: &str = "kafka_cluster_configs.json";

/// Durable list of cluster profiles backed by a single JSON file.
///
/// Every mutation is written through immediately. The in-memory copy keeps the
/// change even when the write fails; the failure is returned so the caller can
/// tell the user their edit is not on disk.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<ClusterProfile>,
}

impl ProfileStore {
    /// Opens the store at the default location,
    /// `~/.config/kafka_admin/kafka_cluster_configs.json` on Linux,
    /// `%APPDATA%\kafka_admin\config\…` on Windows, etc.
    pub fn new() -> Result<Self, AdminError> {
        Ok(Self::open(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf, AdminError> {
        let proj = ProjectDirs::from("", "", "kafka_admin").ok_or_else(|| {
            AdminError::persistence(
                PROFILE_FILE_NAME,
                io::Error::new(io::ErrorKind::NotFound, "Unable to locate config dir"),
            )
        })?;
        Ok(proj.config_dir().join(PROFILE_FILE_NAME))
    }

    /// Opens the store backed by `path`, loading whatever it holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let profiles = Self::load(&path);
        let mut store = Self { path, profiles };
        store.assign_missing_ids();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every profile stored in `path`.
    ///
    /// A missing, empty, unreadable or corrupt file yields an empty list; the
    /// problem is logged, never returned.
    pub fn load(path: &Path) -> Vec<ClusterProfile> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "Profile file {:?} not found. Starting with no saved profiles.",
                    path
                );
                return Vec::new();
            }
            Err(e) => {
                error!("Failed to read profiles from {:?}: {e}", path);
                return Vec::new();
            }
        };
        if contents.trim().is_empty() {
            info!("Profile file {:?} is empty. Starting with no saved profiles.", path);
            return Vec::new();
        }
        match serde_json::from_str::<Vec<ClusterProfile>>(&contents) {
            Ok(profiles) => {
                info!("Loaded {} cluster profiles from {:?}", profiles.len(), path);
                profiles
            }
            Err(e) => {
                error!("Failed to parse profiles from {:?}: {e}", path);
                Vec::new()
            }
        }
    }

    /// Discards the in-memory list and re-reads the backing file.
    pub fn reload(&mut self) {
        self.profiles = Self::load(&self.path);
        self.assign_missing_ids();
    }

    /// Hand-edited files may carry entries without an id, which `get` and
    /// `remove` could never reach. Give them one and write it back.
    fn assign_missing_ids(&mut self) {
        let missing = self
            .profiles
            .iter()
            .filter(|p| p.id.trim().is_empty())
            .count();
        if missing == 0 {
            return;
        }
        self.profiles
            .iter_mut()
            .for_each(ClusterProfile::assign_id_if_missing);
        warn!("Assigned ids to {missing} profiles loaded from {:?}", self.path);
        if let Err(e) = self.save() {
            warn!("Could not persist assigned ids: {e}");
        }
    }

    /// Returns a copy of every stored profile, in stored order.
    pub fn list(&self) -> Vec<ClusterProfile> {
        self.profiles.clone()
    }

    pub fn get(&self, id: &str) -> Option<ClusterProfile> {
        self.profiles.iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Stores `profile` at the end of the list, assigning an id when it has
    /// none and dropping any older profile with the same id.
    pub fn add(&mut self, mut profile: ClusterProfile) -> Result<ClusterProfile, AdminError> {
        profile.assign_id_if_missing();
        self.profiles.retain(|p| p.id != profile.id);
        self.profiles.push(profile.clone());
        self.save()?;
        Ok(profile)
    }

    /// Replaces the profile with the same id in place, or adds it.
    pub fn update(&mut self, profile: ClusterProfile) -> Result<ClusterProfile, AdminError> {
        if !profile.id.trim().is_empty() {
            if let Some(index) = self.profiles.iter().position(|p| p.id == profile.id) {
                self.profiles[index] = profile.clone();
                self.save()?;
                return Ok(profile);
            }
        }
        self.add(profile)
    }

    /// Deletes a profile (`Ok(true)` if removed, `Ok(false)` if it didn't exist).
    pub fn remove(&mut self, id: &str) -> Result<bool, AdminError> {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        if self.profiles.len() == before {
            return Ok(false);
        }
        self.save()?;
        info!("Removed profile with id {id}");
        Ok(true)
    }

    /// Writes the whole list to a temporary sibling file and renames it over
    /// the backing file.
    pub fn save(&self) -> Result<(), AdminError> {
        let tmp = temp_path_for(&self.path);
        let result = write_atomically(&self.path, &tmp, &self.profiles);
        match result {
            Ok(()) => {
                info!("Saved {} cluster profiles to {:?}", self.profiles.len(), self.path);
                Ok(())
            }
            Err(e) => {
                error!("Failed to save profiles to {:?}: {e}", self.path);
                if tmp.exists() {
                    if let Err(cleanup) = fs::remove_file(&tmp) {
                        warn!("Could not remove {:?}: {cleanup}", tmp);
                    }
                }
                Err(AdminError::persistence(&self.path, e))
            }
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| PROFILE_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomically(path: &Path, tmp: &Path, profiles: &[ClusterProfile]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(profiles).map_err(io::Error::from)?;
    let mut file = fs::File::create(tmp)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, path)
}
