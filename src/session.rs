use crate::audio::{AmbienceCue, AmbienceTimer, SpeechCue, SpeechPlaylist};
use crate::camera::{billboard_rotation, Camera3D, FreeflyCamera, OrbitCamera};
use crate::config::AppConfig;
use crate::events::{EditorEvent, EventBus};
use crate::generate::{AudioGenClient, GenerateError, ModelGenClient, WorldGenClient};
use crate::interaction::InteractionController;
use crate::reconcile::{self, ReconcileReport};
use crate::snapshot::{SceneSnapshot, SnapshotError};
use crate::state::{AppState, StateMachine};
use crate::storage::AssetLibrary;
use crate::world::{EntityId, SceneWorld};
use glam::Vec3;
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

const CAMERA_FOV_Y: f32 = 60.0 * std::f32::consts::PI / 180.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 1000.0;
const MENU_ORBIT_SPEED: f32 = 0.2;

/// Which parts of the stage are active in a given application state. Mirrors
/// the per-state toggling a host front end performs: cameras, UI panels,
/// speech, cursor capture and audio markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLayout {
    pub free_camera_active: bool,
    pub player_active: bool,
    pub rotating_camera_active: bool,
    pub editor_ui_visible: bool,
    pub speech_active: bool,
    pub menu_visible: bool,
    pub exit_play_button_visible: bool,
    pub cursor_unlocked: bool,
    pub audio_markers_visible: bool,
}

impl StageLayout {
    pub fn for_state(state: AppState) -> Self {
        match state {
            AppState::Editing => Self {
                free_camera_active: true,
                player_active: false,
                rotating_camera_active: false,
                editor_ui_visible: true,
                speech_active: false,
                menu_visible: false,
                exit_play_button_visible: false,
                cursor_unlocked: true,
                audio_markers_visible: true,
            },
            AppState::Playing => Self {
                free_camera_active: false,
                player_active: true,
                rotating_camera_active: false,
                editor_ui_visible: false,
                speech_active: true,
                menu_visible: false,
                exit_play_button_visible: true,
                cursor_unlocked: false,
                audio_markers_visible: false,
            },
            AppState::MainMenu => Self {
                free_camera_active: false,
                player_active: false,
                rotating_camera_active: true,
                editor_ui_visible: false,
                speech_active: false,
                menu_visible: true,
                exit_play_button_visible: false,
                cursor_unlocked: true,
                audio_markers_visible: false,
            },
        }
    }
}

/// Owns the whole editing stack: config, state machine, live world, asset
/// library, generation clients and interaction. Reacts to state changes by
/// recomputing the stage layout and starting or stopping play-mode ambience.
pub struct EditorSession {
    config: AppConfig,
    assets: AssetLibrary,
    pub world: SceneWorld,
    pub states: StateMachine,
    pub events: EventBus,
    pub interaction: InteractionController,
    pub free_camera: FreeflyCamera,
    pub menu_camera: OrbitCamera,
    layout: StageLayout,
    speech: SpeechPlaylist,
    ambience: AmbienceTimer,
    model_gen: ModelGenClient,
    audio_gen: AudioGenClient,
    world_gen: WorldGenClient,
}

impl EditorSession {
    pub fn new(config: AppConfig, data_dir: impl Into<PathBuf>) -> Self {
        let assets = AssetLibrary::new(data_dir);
        let model_gen = ModelGenClient::new(config.services.mesh_server_url.clone(), &config.generation);
        let audio_gen = AudioGenClient::new(config.services.audio_server_url.clone(), &config.generation);
        let world_gen = WorldGenClient::new(config.services.world_server_url.clone(), &config.generation);
        Self {
            config,
            assets,
            world: SceneWorld::new(),
            states: StateMachine::new(),
            events: EventBus::default(),
            interaction: InteractionController::new(),
            free_camera: FreeflyCamera::new(Vec3::new(0.0, 2.0, 8.0)),
            menu_camera: OrbitCamera::new(Vec3::ZERO, 12.0),
            layout: StageLayout::for_state(AppState::MainMenu),
            speech: SpeechPlaylist::new(Vec::new(), Duration::from_secs(10)),
            ambience: AmbienceTimer::default(),
            model_gen,
            audio_gen,
            world_gen,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    pub fn layout(&self) -> &StageLayout {
        &self.layout
    }

    pub fn set_speech_playlist(&mut self, playlist: SpeechPlaylist) {
        self.speech = playlist;
    }

    pub fn set_state(&mut self, state: AppState) {
        let previous = self.states.current();
        self.states.update_state(state);
        let current = self.states.current();
        self.layout = StageLayout::for_state(current);
        self.interaction.set_enabled(current == AppState::Editing);
        self.events.push(EditorEvent::StateChanged { previous, current });
    }

    /// The camera the current state looks through: the free-fly rig while
    /// editing, the slow orbit shot behind the main menu, and the free-fly
    /// pose again as the play-mode stand-in for the player rig.
    pub fn active_camera(&self) -> Camera3D {
        if self.layout.rotating_camera_active {
            self.menu_camera.to_camera(CAMERA_FOV_Y, CAMERA_NEAR, CAMERA_FAR)
        } else {
            self.free_camera.to_camera(CAMERA_FOV_Y, CAMERA_NEAR, CAMERA_FAR)
        }
    }

    /// Per-frame camera motion: only the menu orbit advances on its own.
    pub fn advance_cameras(&mut self, dt: f32) {
        if self.layout.rotating_camera_active {
            self.menu_camera.advance(dt, MENU_ORBIT_SPEED);
        }
    }

    /// Turns every tracked audio marker toward the active camera.
    pub fn face_audio_markers(&mut self) {
        let camera_position = self.active_camera().position;
        let ids: Vec<EntityId> = self.world.audio.ids().to_vec();
        for id in ids {
            if let Some(entity) = self.world.entity_mut(id) {
                entity.transform.rotation =
                    billboard_rotation(entity.transform.position, camera_position);
            }
        }
    }

    /// Destroys the current selection and records the despawn.
    pub fn delete_selected(&mut self) -> Option<EntityId> {
        let id = self.interaction.delete_selected(&mut self.world)?;
        self.events.push(EditorEvent::EntityDespawned { id });
        Some(id)
    }

    /// Speech cues for the current play session, or nothing outside play mode.
    pub fn speech_schedule(&self) -> Option<Vec<SpeechCue>> {
        if self.layout.speech_active && !self.speech.is_empty() {
            Some(self.speech.timeline())
        } else {
            None
        }
    }

    /// Rolls the next randomized trigger for every tracked ambient emitter.
    /// Ambience only runs while playing.
    pub fn ambience_cues(&self, rng: &mut impl Rng) -> Vec<(EntityId, AmbienceCue)> {
        if self.states.current() != AppState::Playing {
            return Vec::new();
        }
        self.world.audio.ids().iter().map(|id| (*id, self.ambience.roll(rng))).collect()
    }

    pub fn save_path(&self) -> PathBuf {
        SceneSnapshot::save_path(self.assets.data_dir(), &self.config.scene_name)
    }

    pub fn save_scene(&mut self) -> Result<PathBuf, SnapshotError> {
        let snapshot = reconcile::capture(&self.world);
        let path = self.save_path();
        snapshot.save_to_path(&path)?;
        self.events.push(EditorEvent::SnapshotSaved {
            path: path.display().to_string(),
            entities: snapshot.objects.len(),
        });
        Ok(path)
    }

    /// Reconciles the live world against the saved snapshot for the active
    /// scene. No save file yet is not an error; corruption is.
    pub fn load_scene(&mut self) -> Result<Option<ReconcileReport>, SnapshotError> {
        let path = self.save_path();
        let snapshot = match SceneSnapshot::load_from_path(&path) {
            Ok(snapshot) => snapshot,
            Err(SnapshotError::NotFound { path }) => {
                eprintln!("[save] no saved scene at {}", path.display());
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let report = reconcile::reconcile(&mut self.world, &snapshot, &self.assets, &mut self.events);
        self.events.push(EditorEvent::SnapshotLoaded {
            path: path.display().to_string(),
            spawned: report.spawned,
            skipped: report.skipped.len(),
        });
        Ok(Some(report))
    }

    pub fn generate_model(&mut self, prompt: &str) -> Result<EntityId, GenerateError> {
        self.model_gen.generate(prompt, &self.assets, &mut self.world)
    }

    pub fn generate_audio(&mut self, prompt: &str) -> Result<EntityId, GenerateError> {
        self.audio_gen.generate(prompt, &self.assets, &mut self.world)
    }

    pub fn generate_world(&mut self, prompt: &str) -> Result<String, GenerateError> {
        self.world_gen.generate(prompt, &self.assets, &mut self.world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_application_states() {
        let editing = StageLayout::for_state(AppState::Editing);
        assert!(editing.free_camera_active && editing.editor_ui_visible && editing.cursor_unlocked);
        assert!(!editing.player_active && !editing.speech_active && !editing.menu_visible);
        assert!(editing.audio_markers_visible);

        let playing = StageLayout::for_state(AppState::Playing);
        assert!(playing.player_active && playing.speech_active && playing.exit_play_button_visible);
        assert!(!playing.free_camera_active && !playing.editor_ui_visible);
        assert!(!playing.audio_markers_visible && !playing.cursor_unlocked);

        let menu = StageLayout::for_state(AppState::MainMenu);
        assert!(menu.rotating_camera_active && menu.menu_visible);
        assert!(!menu.player_active && !menu.free_camera_active && !menu.speech_active);
    }

    #[test]
    fn state_changes_retune_interaction_and_layout() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = EditorSession::new(AppConfig::default(), temp.path());
        assert!(!session.interaction.enabled());

        session.set_state(AppState::Editing);
        assert!(session.interaction.enabled());
        assert!(session.layout().editor_ui_visible);

        session.set_state(AppState::Playing);
        assert!(!session.interaction.enabled());
        assert!(session.layout().speech_active);

        let events = session.events.drain();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn menu_state_switches_to_the_orbit_camera() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = EditorSession::new(AppConfig::default(), temp.path());
        session.set_state(AppState::MainMenu);
        let before = session.active_camera().position;
        session.advance_cameras(1.0);
        let after = session.active_camera().position;
        assert!(before != after, "menu orbit keeps moving");

        session.set_state(AppState::Editing);
        let editing = session.active_camera().position;
        session.advance_cameras(1.0);
        assert_eq!(editing, session.active_camera().position, "free camera holds still");
    }

    #[test]
    fn audio_markers_turn_toward_the_camera() {
        use crate::audio::AudioClip;
        use crate::world::{AudioInstance, Transform};
        use glam::Quat;

        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = EditorSession::new(AppConfig::default(), temp.path());
        session.set_state(AppState::Editing);
        let clip =
            AudioClip { channels: 1, sample_rate: 44_100, duration: Duration::from_secs(1) };
        let id = session.world.spawn_audio(
            "wind",
            Transform::new(Vec3::new(2.0, 0.0, -4.0), Quat::IDENTITY, Vec3::ONE),
            AudioInstance::new(clip),
        );
        session.world.audio.add(id);

        session.face_audio_markers();
        let rotation = session.world.entity(id).unwrap().transform.rotation;
        assert!(rotation != Quat::IDENTITY, "marker yawed toward the free camera");
    }

    #[test]
    fn speech_schedule_exists_only_in_play_mode() {
        let temp = tempfile::tempdir().expect("temp dir");
        let mut session = EditorSession::new(AppConfig::default(), temp.path());
        session.set_speech_playlist(SpeechPlaylist::new(
            vec![Duration::from_secs(4)],
            Duration::from_secs(10),
        ));
        assert!(session.speech_schedule().is_none());
        session.set_state(AppState::Playing);
        let cues = session.speech_schedule().expect("speech runs while playing");
        assert_eq!(cues.len(), 1);
        session.set_state(AppState::Editing);
        assert!(session.speech_schedule().is_none());
    }
}
