use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Endpoints of the three generative services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "ServiceConfig::default_world_server_url")]
    pub world_server_url: String,
    #[serde(default = "ServiceConfig::default_mesh_server_url")]
    pub mesh_server_url: String,
    #[serde(default = "ServiceConfig::default_audio_server_url")]
    pub audio_server_url: String,
}

impl ServiceConfig {
    fn default_world_server_url() -> String {
        "http://localhost:9191".to_string()
    }

    fn default_mesh_server_url() -> String {
        "http://localhost:9292".to_string()
    }

    fn default_audio_server_url() -> String {
        "http://localhost:9393".to_string()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            world_server_url: Self::default_world_server_url(),
            mesh_server_url: Self::default_mesh_server_url(),
            audio_server_url: Self::default_audio_server_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "GenerationConfig::default_mesh_steps")]
    pub mesh_steps: u32,
    #[serde(default = "GenerationConfig::default_generate_texture")]
    pub generate_texture: bool,
    #[serde(default = "GenerationConfig::default_model_scale")]
    pub model_scale: f32,
    #[serde(default = "GenerationConfig::default_audio_duration")]
    pub audio_duration: f32,
    #[serde(default = "GenerationConfig::default_world_classes")]
    pub world_classes: String,
    #[serde(default = "GenerationConfig::default_world_seed")]
    pub world_seed: i32,
}

impl GenerationConfig {
    const fn default_mesh_steps() -> u32 {
        30
    }

    const fn default_generate_texture() -> bool {
        true
    }

    const fn default_model_scale() -> f32 {
        0.5
    }

    const fn default_audio_duration() -> f32 {
        5.0
    }

    fn default_world_classes() -> String {
        "outdoor".to_string()
    }

    const fn default_world_seed() -> i32 {
        42
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mesh_steps: Self::default_mesh_steps(),
            generate_texture: Self::default_generate_texture(),
            model_scale: Self::default_model_scale(),
            audio_duration: Self::default_audio_duration(),
            world_classes: Self::default_world_classes(),
            world_seed: Self::default_world_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub services: ServiceConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default = "AppConfig::default_scene_name")]
    pub scene_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            services: ServiceConfig::default(),
            generation: GenerationConfig::default(),
            scene_name: Self::default_scene_name(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub scene_name: Option<String>,
    pub world_server_url: Option<String>,
    pub mesh_server_url: Option<String>,
    pub audio_server_url: Option<String>,
}

impl AppConfig {
    pub const FILE_NAME: &'static str = "config.json";

    fn default_scene_name() -> String {
        "Main".to_string()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes())
            .with_context(|| format!("Writing config file {}", path.display()))?;
        Ok(())
    }

    /// On first run the default config is written back so users have a file
    /// to edit. An unreadable file degrades to defaults; config is ambient
    /// state, unlike scene snapshots.
    pub fn load_or_init(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            let cfg = Self::default();
            if let Err(err) = cfg.save(path) {
                eprintln!("[config] failed to write default config {}: {err:?}", path.display());
            }
            return cfg;
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(scene_name) = &overrides.scene_name {
            self.scene_name = scene_name.clone();
        }
        if let Some(url) = &overrides.world_server_url {
            self.services.world_server_url = url.clone();
        }
        if let Some(url) = &overrides.mesh_server_url {
            self.services.mesh_server_url = url.clone();
        }
        if let Some(url) = &overrides.audio_server_url {
            self.services.audio_server_url = url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_writes_defaults_back() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join(AppConfig::FILE_NAME);
        let cfg = AppConfig::load_or_init(&path);
        assert_eq!(cfg.services.mesh_server_url, "http://localhost:9292");
        assert!(path.is_file(), "default config should be written on first run");
        let reloaded = AppConfig::load(&path).expect("written config loads");
        assert_eq!(reloaded.scene_name, "Main");
    }

    #[test]
    fn unreadable_config_degrades_to_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join(AppConfig::FILE_NAME);
        std::fs::write(&path, b"not json").expect("write junk");
        let cfg = AppConfig::load_or_init(&path);
        assert_eq!(cfg.generation.mesh_steps, 30);
    }

    #[test]
    fn overrides_replace_only_named_fields() {
        let mut cfg = AppConfig::default();
        cfg.apply_overrides(&AppConfigOverrides {
            scene_name: Some("Atrium".to_string()),
            audio_server_url: Some("http://10.0.0.2:9393".to_string()),
            ..AppConfigOverrides::default()
        });
        assert_eq!(cfg.scene_name, "Atrium");
        assert_eq!(cfg.services.audio_server_url, "http://10.0.0.2:9393");
        assert_eq!(cfg.services.world_server_url, "http://localhost:9191");
    }

    #[test]
    fn partial_config_files_fill_missing_sections() {
        let cfg: AppConfig = serde_json::from_str("{\"scene_name\":\"Loft\"}")
            .expect("partial config parses");
        assert_eq!(cfg.scene_name, "Loft");
        assert_eq!(cfg.generation.world_seed, 42);
        assert_eq!(cfg.services.world_server_url, "http://localhost:9191");
        assert_eq!(cfg.generation.world_classes, "outdoor");
    }
}
