//! Persistence collaborator for captured artifacts.
//!
//! Every store is scoped to one authenticated owner; identity checks happen
//! before a store is constructed, so the core never sees unauthenticated calls.

use crate::{
    capture::{ArtifactMetadata, CapturedArtifact},
    Error, Result,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Identifier assigned by a store on save
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing entry: id and metadata without the pixel data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub id: ArtifactId,
    #[serde(flatten)]
    pub metadata: ArtifactMetadata,
}

/// Persistence operations consumed by the capture flow and the gallery
pub trait PoseStore {
    /// Persist an artifact and return its new id
    ///
    /// # Errors
    ///
    /// Returns [`Error::SaveFailed`] when the artifact could not be written
    fn save(&mut self, artifact: CapturedArtifact) -> Result<ArtifactId>;

    /// All artifacts owned by this store's identity, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn list(&self) -> Result<Vec<ArtifactSummary>>;

    /// Delete an artifact
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id
    fn delete(&mut self, id: &ArtifactId) -> Result<()>;

    /// Fetch an artifact, `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact exists but cannot be read
    fn get_by_id(&self, id: &ArtifactId) -> Result<Option<CapturedArtifact>>;
}

/// In-memory store, one per owner
#[derive(Debug, Default)]
pub struct MemoryStore {
    owner: String,
    next_id: u64,
    items: BTreeMap<u64, (ArtifactId, CapturedArtifact)>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            next_id: 1,
            items: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn find(&self, id: &ArtifactId) -> Option<u64> {
        self.items
            .iter()
            .find_map(|(key, (item_id, _))| (item_id == id).then_some(*key))
    }
}

impl PoseStore for MemoryStore {
    fn save(&mut self, artifact: CapturedArtifact) -> Result<ArtifactId> {
        let key = self.next_id;
        self.next_id += 1;
        let id = ArtifactId::new(format!("{}-{key}", self.owner));
        self.items.insert(key, (id.clone(), artifact));
        Ok(id)
    }

    fn list(&self) -> Result<Vec<ArtifactSummary>> {
        Ok(self
            .items
            .values()
            .map(|(id, artifact)| ArtifactSummary {
                id: id.clone(),
                metadata: artifact.metadata.clone(),
            })
            .collect())
    }

    fn delete(&mut self, id: &ArtifactId) -> Result<()> {
        let key = self.find(id).ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.items.remove(&key);
        Ok(())
    }

    fn get_by_id(&self, id: &ArtifactId) -> Result<Option<CapturedArtifact>> {
        Ok(self
            .find(id)
            .and_then(|key| self.items.get(&key))
            .map(|(_, artifact)| artifact.clone()))
    }
}

/// Directory-backed store: `<root>/<owner>/<id>.png` plus a `<id>.json` metadata sidecar
#[derive(Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
    sequence: u64,
}

impl DirectoryStore {
    /// Open (creating if needed) the directory for `owner` under `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn open<P: AsRef<Path>>(root: P, owner: &str) -> Result<Self> {
        if owner.is_empty() || owner.contains(['/', '\\']) || owner.starts_with('.') {
            return Err(Error::InvalidInput(format!("Invalid owner name: {owner:?}")));
        }
        let dir = root.as_ref().join(owner);
        fs::create_dir_all(&dir)?;
        info!("Opened artifact store at {}", dir.display());
        Ok(Self { dir, sequence: 0 })
    }

    fn image_path(&self, id: &ArtifactId) -> PathBuf {
        self.dir.join(format!("{id}.png"))
    }

    fn metadata_path(&self, id: &ArtifactId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn next_id(&mut self, metadata: &ArtifactMetadata) -> ArtifactId {
        let millis = metadata
            .created_at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        loop {
            self.sequence += 1;
            let id = ArtifactId::new(format!("{millis}-{}", self.sequence));
            if !self.metadata_path(&id).exists() {
                return id;
            }
        }
    }

    fn write(&self, id: &ArtifactId, artifact: &CapturedArtifact) -> Result<()> {
        artifact.image.save(self.image_path(id))?;
        let file = fs::File::create(self.metadata_path(id))?;
        serde_json::to_writer_pretty(file, &artifact.metadata)?;
        Ok(())
    }
}

impl PoseStore for DirectoryStore {
    fn save(&mut self, artifact: CapturedArtifact) -> Result<ArtifactId> {
        let id = self.next_id(&artifact.metadata);
        self.write(&id, &artifact).map_err(|e| {
            // Leave no half-written artifact behind
            let _ = fs::remove_file(self.image_path(&id));
            let _ = fs::remove_file(self.metadata_path(&id));
            Error::SaveFailed(e.to_string())
        })?;
        debug!("Wrote artifact {} to {}", id, self.dir.display());
        Ok(id)
    }

    fn list(&self) -> Result<Vec<ArtifactSummary>> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let metadata: ArtifactMetadata = serde_json::from_reader(fs::File::open(&path)?)?;
            summaries.push(ArtifactSummary {
                id: ArtifactId::new(stem),
                metadata,
            });
        }
        summaries.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(summaries)
    }

    fn delete(&mut self, id: &ArtifactId) -> Result<()> {
        let metadata_path = self.metadata_path(id);
        if !metadata_path.exists() {
            return Err(Error::NotFound(id.to_string()));
        }
        fs::remove_file(metadata_path)?;
        let image_path = self.image_path(id);
        if image_path.exists() {
            fs::remove_file(image_path)?;
        }
        Ok(())
    }

    fn get_by_id(&self, id: &ArtifactId) -> Result<Option<CapturedArtifact>> {
        let metadata_path = self.metadata_path(id);
        if !metadata_path.exists() {
            return Ok(None);
        }
        let metadata: ArtifactMetadata = serde_json::from_reader(fs::File::open(metadata_path)?)?;
        let image = image::open(self.image_path(id))?.to_rgba8();
        Ok(Some(CapturedArtifact { image, metadata }))
    }
}
