use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the data dir that holds per-scene save files.
pub const SAVE_DIR: &str = "SavedScenes";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no saved scene at {path}")]
    NotFound { path: PathBuf },
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file exists but is not a readable snapshot. Corruption is fatal:
    /// it is never silently replaced by an empty snapshot.
    #[error("saved scene at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Model,
    Audio,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Model => "Model",
            EntityKind::Audio => "Audio",
        }
    }
}

/// One generated object as persisted. Quaternion components are stored in
/// x, y, z, w order and round-trip exactly as captured, without normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    #[serde(rename = "isLooping", default)]
    pub is_looping: bool,
}

impl EntityRecord {
    pub fn position_vec(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_xyzw(self.rotation[0], self.rotation[1], self.rotation[2], self.rotation[3])
    }

    pub fn scale_vec(&self) -> Vec3 {
        Vec3::from_array(self.scale)
    }
}

fn default_light_intensity() -> f32 {
    1.0
}

/// The sole unit of persisted truth for one scene: every generated entity in
/// discovery order, plus directional-light state and the cached environment
/// job id. Live entities are ephemeral views projected from or onto this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub objects: Vec<EntityRecord>,
    #[serde(rename = "lightIntensity", default = "default_light_intensity")]
    pub light_intensity: f32,
    #[serde(rename = "lightRotation", default)]
    pub light_rotation: Option<Vec<f32>>,
    #[serde(rename = "environmentName", default)]
    pub environment_name: Option<String>,
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            light_intensity: default_light_intensity(),
            light_rotation: None,
            environment_name: None,
        }
    }
}

impl SceneSnapshot {
    /// Deterministic save path for a scene name.
    pub fn save_path(data_dir: &Path, scene_name: &str) -> PathBuf {
        data_dir.join(SAVE_DIR).join(format!("SaveData_{scene_name}.json"))
    }

    /// The stored light rotation, but only when it is well formed: exactly
    /// four components. Anything else is treated as absent.
    pub fn light_rotation_quat(&self) -> Option<Quat> {
        match self.light_rotation.as_deref() {
            Some(&[x, y, z, w]) => Some(Quat::from_xyzw(x, y, z, w)),
            _ => None,
        }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SnapshotError::NotFound { path: path.to_path_buf() });
        }
        let bytes = fs::read(path)
            .map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_slice(&bytes)
            .map_err(|source| SnapshotError::Corrupt { path: path.to_path_buf(), source })
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| SnapshotError::Io { path: parent.to_path_buf(), source })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(SnapshotError::Encode)?;
        fs::write(path, json.as_bytes())
            .map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })
    }
}
