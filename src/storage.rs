use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MODELS_DIR: &str = "Models";
pub const AUDIO_DIR: &str = "GeneratedAudio";
pub const SCENES_DIR: &str = "Scenes";

/// On-disk layout for generated assets under the application data directory.
///
/// Meshes live in `Models/`, generated audio in `GeneratedAudio/` (named by
/// the generation job id), and environment caches in `Scenes/` keyed by job
/// id (`<job>_skybox.png`, `<job>_mesh.glb`).
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    data_dir: PathBuf,
}

impl AssetLibrary {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join(MODELS_DIR)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.data_dir.join(AUDIO_DIR)
    }

    pub fn scenes_dir(&self) -> PathBuf {
        self.data_dir.join(SCENES_DIR)
    }

    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.models_dir().join(file_name)
    }

    pub fn audio_path(&self, file_name: &str) -> PathBuf {
        self.audio_dir().join(file_name)
    }

    pub fn skybox_path(&self, job_id: &str) -> PathBuf {
        self.scenes_dir().join(format!("{job_id}_skybox.png"))
    }

    pub fn environment_mesh_path(&self, job_id: &str) -> PathBuf {
        self.scenes_dir().join(format!("{job_id}_mesh.glb"))
    }

    /// Path of a stored model file, existence-checked.
    pub fn resolve_model(&self, file_name: &str) -> Option<PathBuf> {
        existing(self.model_path(file_name))
    }

    /// Path of a stored audio file, existence-checked.
    pub fn resolve_audio(&self, file_name: &str) -> Option<PathBuf> {
        existing(self.audio_path(file_name))
    }

    pub fn store_model(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        write_bytes(self.model_path(file_name), bytes)
    }

    pub fn store_audio(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        write_bytes(self.audio_path(file_name), bytes)
    }

    pub fn store_skybox(&self, job_id: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        write_bytes(self.skybox_path(job_id), bytes)
    }

    pub fn store_environment_mesh(&self, job_id: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        write_bytes(self.environment_mesh_path(job_id), bytes)
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.is_file() {
        Some(path)
    } else {
        None
    }
}

fn write_bytes(path: PathBuf, bytes: &[u8]) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;
    Ok(path)
}
