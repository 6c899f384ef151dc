use crate::audio::AudioClip;
use crate::config::GenerationConfig;
use crate::mesh::Mesh;
use crate::reconcile::{self, EnvironmentOutcome};
use crate::storage::AssetLibrary;
use crate::world::{AudioInstance, EntityId, SceneWorld, Transform};
use glam::Vec3;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const MESH_TIMEOUT: Duration = Duration::from_secs(300);
const AUDIO_TIMEOUT: Duration = Duration::from_secs(180);
const WORLD_TIMEOUT: Duration = Duration::from_secs(600);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Single-flight latch. Each client holds at most one outstanding request;
/// a second call while not `Idle` is refused with `GenerateError::Busy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Requesting,
    Downloading,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("a generation request is already in flight")]
    Busy,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("generation service rejected the request: {reason}")]
    Rejected { reason: String },
    #[error("no {kind} file in generation response")]
    MissingFile { kind: &'static str },
    #[error("failed to store downloaded asset {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("downloaded audio could not be decoded: {reason}")]
    UndecodableAudio { reason: String },
}

#[derive(Debug, Deserialize)]
struct GeneratedFile {
    #[serde(default)]
    filename: String,
    #[serde(rename = "type", default)]
    file_type: String,
    #[serde(default)]
    download_url: String,
}

#[derive(Debug, Serialize)]
struct MeshGenerateRequest<'a> {
    prompt: &'a str,
    steps: u32,
    generate_texture: bool,
}

#[derive(Debug, Deserialize)]
struct MeshGenerateResponse {
    #[serde(default)]
    #[allow(dead_code)]
    success: bool,
    #[serde(default)]
    files: Vec<GeneratedFile>,
}

/// Text-to-3D client. Generates a mesh, caches it under `Models/` and spawns
/// a selectable model entity at the configured default scale.
pub struct ModelGenClient {
    server_url: String,
    steps: u32,
    generate_texture: bool,
    model_scale: f32,
    http: Client,
    phase: GenerationPhase,
}

impl ModelGenClient {
    pub fn new(server_url: impl Into<String>, generation: &GenerationConfig) -> Self {
        Self {
            server_url: server_url.into(),
            steps: generation.mesh_steps,
            generate_texture: generation.generate_texture,
            model_scale: generation.model_scale,
            http: Client::new(),
            phase: GenerationPhase::Idle,
        }
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn is_generating(&self) -> bool {
        self.phase != GenerationPhase::Idle
    }

    pub fn generate(
        &mut self,
        prompt: &str,
        assets: &AssetLibrary,
        world: &mut SceneWorld,
    ) -> Result<EntityId, GenerateError> {
        if self.is_generating() {
            return Err(GenerateError::Busy);
        }
        if prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }
        let result = self.run(prompt, assets, world);
        self.phase = GenerationPhase::Idle;
        result
    }

    fn run(
        &mut self,
        prompt: &str,
        assets: &AssetLibrary,
        world: &mut SceneWorld,
    ) -> Result<EntityId, GenerateError> {
        self.phase = GenerationPhase::Requesting;
        let url = format!("{}/generate", self.server_url);
        let request =
            MeshGenerateRequest { prompt, steps: self.steps, generate_texture: self.generate_texture };
        let response: MeshGenerateResponse = post_json(&self.http, &url, &request, MESH_TIMEOUT)?;

        let mesh_file = response
            .files
            .iter()
            .find(|file| file.file_type == "mesh")
            .ok_or(GenerateError::MissingFile { kind: "mesh" })?;

        self.phase = GenerationPhase::Downloading;
        let bytes = download(&self.http, &self.server_url, &mesh_file.download_url)?;
        let path = assets.store_model(&mesh_file.filename, &bytes).map_err(|source| {
            GenerateError::Store { path: assets.model_path(&mesh_file.filename), source }
        })?;
        eprintln!("[meshgen] stored model at {}", path.display());

        let (mesh, placeholder) = match Mesh::load_gltf(&path) {
            Ok(mesh) => (mesh, false),
            Err(err) => {
                eprintln!(
                    "[meshgen] generated mesh '{}' failed to parse: {err:?}; using placeholder",
                    mesh_file.filename
                );
                (Mesh::cube(1.0), true)
            }
        };
        let transform =
            Transform::new(Vec3::ZERO, glam::Quat::IDENTITY, Vec3::splat(self.model_scale));
        Ok(world.spawn_model(mesh_file.filename.clone(), transform, mesh, placeholder))
    }
}

#[derive(Debug, Serialize)]
struct AudioGenerateRequest<'a> {
    text: &'a str,
    duration: f32,
}

#[derive(Debug, Deserialize)]
struct AudioGenerateResponse {
    #[serde(default)]
    job_id: String,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    files: Vec<GeneratedFile>,
}

/// Text-to-audio client. Stores the downloaded WAV under `GeneratedAudio/`,
/// named by the generation job id, and spawns a non-looping audio entity.
pub struct AudioGenClient {
    server_url: String,
    duration: f32,
    http: Client,
    phase: GenerationPhase,
}

impl AudioGenClient {
    pub fn new(server_url: impl Into<String>, generation: &GenerationConfig) -> Self {
        Self {
            server_url: server_url.into(),
            duration: generation.audio_duration,
            http: Client::new(),
            phase: GenerationPhase::Idle,
        }
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn is_generating(&self) -> bool {
        self.phase != GenerationPhase::Idle
    }

    pub fn generate(
        &mut self,
        prompt: &str,
        assets: &AssetLibrary,
        world: &mut SceneWorld,
    ) -> Result<EntityId, GenerateError> {
        if self.is_generating() {
            return Err(GenerateError::Busy);
        }
        if prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }
        let result = self.run(prompt, assets, world);
        self.phase = GenerationPhase::Idle;
        result
    }

    fn run(
        &mut self,
        prompt: &str,
        assets: &AssetLibrary,
        world: &mut SceneWorld,
    ) -> Result<EntityId, GenerateError> {
        self.phase = GenerationPhase::Requesting;
        let url = format!("{}/generate", self.server_url);
        let request = AudioGenerateRequest { text: prompt, duration: self.duration };
        let response: AudioGenerateResponse = post_json(&self.http, &url, &request, AUDIO_TIMEOUT)?;

        if !response.success {
            return Err(GenerateError::Rejected {
                reason: response.error.unwrap_or_else(|| "unspecified".to_string()),
            });
        }
        let audio_file = response
            .files
            .iter()
            .find(|file| file.file_type == "audio")
            .ok_or(GenerateError::MissingFile { kind: "audio" })?;

        self.phase = GenerationPhase::Downloading;
        let bytes = download(&self.http, &self.server_url, &audio_file.download_url)?;
        // Audio caches are keyed by job id, not the service-side file name.
        let path = assets.store_audio(&response.job_id, &bytes).map_err(|source| {
            GenerateError::Store { path: assets.audio_path(&response.job_id), source }
        })?;
        eprintln!("[audiogen] stored clip at {}", path.display());

        let clip = AudioClip::decode_wav(&path)
            .map_err(|err| GenerateError::UndecodableAudio { reason: format!("{err:#}") })?;
        let id = world.spawn_audio(response.job_id.clone(), Transform::IDENTITY, AudioInstance::new(clip));
        world.audio.add(id);
        Ok(id)
    }
}

#[derive(Debug, Serialize)]
struct WorldGenerateRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    labels_fg1: Vec<String>,
    labels_fg2: Vec<String>,
    classes: &'a str,
    seed: i32,
    export_drc: bool,
}

#[derive(Debug, Deserialize)]
struct WorldGenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    job_id: String,
}

/// Text-to-scene client. Downloads the job's skybox and layer-0 mesh into the
/// per-job `Scenes/` cache, then installs the environment into the world.
pub struct WorldGenClient {
    server_url: String,
    classes: String,
    seed: i32,
    http: Client,
    phase: GenerationPhase,
}

impl WorldGenClient {
    pub fn new(server_url: impl Into<String>, generation: &GenerationConfig) -> Self {
        Self {
            server_url: server_url.into(),
            classes: generation.world_classes.clone(),
            seed: generation.world_seed,
            http: Client::new(),
            phase: GenerationPhase::Idle,
        }
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn is_generating(&self) -> bool {
        self.phase != GenerationPhase::Idle
    }

    pub fn generate(
        &mut self,
        prompt: &str,
        assets: &AssetLibrary,
        world: &mut SceneWorld,
    ) -> Result<String, GenerateError> {
        if self.is_generating() {
            return Err(GenerateError::Busy);
        }
        if prompt.trim().is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }
        let result = self.run(prompt, assets, world);
        self.phase = GenerationPhase::Idle;
        result
    }

    fn run(
        &mut self,
        prompt: &str,
        assets: &AssetLibrary,
        world: &mut SceneWorld,
    ) -> Result<String, GenerateError> {
        self.phase = GenerationPhase::Requesting;
        let url = format!("{}/generate_scene", self.server_url);
        let request = WorldGenerateRequest {
            prompt,
            negative_prompt: "",
            labels_fg1: Vec::new(),
            labels_fg2: Vec::new(),
            classes: &self.classes,
            seed: self.seed,
            export_drc: false,
        };
        let response: WorldGenerateResponse = post_json(&self.http, &url, &request, WORLD_TIMEOUT)?;
        if !response.success {
            return Err(GenerateError::Rejected { reason: "scene generation failed".to_string() });
        }
        let job_id = response.job_id;

        self.phase = GenerationPhase::Downloading;
        // Skybox download failures are non-fatal; the mesh is the scene.
        let skybox_url = format!("/api/file/{job_id}/sky_image_sr.png");
        match download(&self.http, &self.server_url, &skybox_url) {
            Ok(bytes) => {
                assets.store_skybox(&job_id, &bytes).map_err(|source| GenerateError::Store {
                    path: assets.skybox_path(&job_id),
                    source,
                })?;
            }
            Err(err) => eprintln!("[worldgen] skybox download failed: {err}"),
        }

        let mesh_url = format!("/api/file/{job_id}/mesh_layer0.glb");
        let mesh_bytes = download(&self.http, &self.server_url, &mesh_url)?;
        assets.store_environment_mesh(&job_id, &mesh_bytes).map_err(|source| {
            GenerateError::Store { path: assets.environment_mesh_path(&job_id), source }
        })?;

        let outcome: EnvironmentOutcome = reconcile::load_environment(world, assets, &job_id);
        if !outcome.mesh_loaded {
            eprintln!("[worldgen] environment mesh for job {job_id} did not install");
        }
        Ok(job_id)
    }
}

fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
    http: &Client,
    url: &str,
    request: &Req,
    timeout: Duration,
) -> Result<Resp, GenerateError> {
    http.post(url)
        .timeout(timeout)
        .json(request)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json::<Resp>())
        .map_err(|source| GenerateError::Http { url: url.to_string(), source })
}

fn download(
    http: &Client,
    server_url: &str,
    download_url: &str,
) -> Result<Vec<u8>, GenerateError> {
    let url = format!("{server_url}{download_url}");
    http.get(&url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map(|bytes| bytes.to_vec())
        .map_err(|source| GenerateError::Http { url, source })
}
