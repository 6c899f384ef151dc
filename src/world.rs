use crate::audio::{AudioClip, AudioRegistry};
use crate::mesh::Mesh;
use crate::snapshot::EntityKind;
use glam::{Quat, Vec3};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identity of one generated entity for the lifetime of the process. Ids are
/// never persisted; a reload always destroys and recreates, so every load
/// mints fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform =
        Transform { position: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { position, rotation, scale }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub mesh: Mesh,
    /// True when the source file existed but could not be parsed and a stand-in
    /// mesh was used instead.
    pub placeholder: bool,
}

#[derive(Debug, Clone)]
pub struct AudioInstance {
    pub clip: AudioClip,
    pub looping: bool,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl AudioInstance {
    pub fn new(clip: AudioClip) -> Self {
        Self { clip, looping: false, min_distance: 1.0, max_distance: 20.0 }
    }
}

#[derive(Debug, Clone)]
pub enum EntityPayload {
    Model(ModelInstance),
    Audio(AudioInstance),
}

impl EntityPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityPayload::Model(_) => EntityKind::Model,
            EntityPayload::Audio(_) => EntityKind::Audio,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiveEntity {
    pub id: EntityId,
    pub file_name: String,
    pub transform: Transform,
    pub selectable: bool,
    pub payload: EntityPayload,
}

impl LiveEntity {
    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.payload, EntityPayload::Audio(_))
    }

    pub fn as_audio(&self) -> Option<&AudioInstance> {
        match &self.payload {
            EntityPayload::Audio(audio) => Some(audio),
            EntityPayload::Model(_) => None,
        }
    }

    pub fn as_audio_mut(&mut self) -> Option<&mut AudioInstance> {
        match &mut self.payload {
            EntityPayload::Audio(audio) => Some(audio),
            EntityPayload::Model(_) => None,
        }
    }

    pub fn as_model(&self) -> Option<&ModelInstance> {
        match &self.payload {
            EntityPayload::Model(model) => Some(model),
            EntityPayload::Audio(_) => None,
        }
    }
}

/// Generated world environment: mesh loaded from the per-job cache, placed at
/// a fixed transform under the scene origin.
#[derive(Debug, Clone)]
pub struct EnvironmentInstance {
    pub job_id: String,
    pub transform: Transform,
    pub mesh: Mesh,
}

impl EnvironmentInstance {
    pub fn new(job_id: impl Into<String>, mesh: Mesh) -> Self {
        Self { job_id: job_id.into(), transform: Self::placement(), mesh }
    }

    /// Generated environment meshes arrive Z-up and unit-scaled.
    pub fn placement() -> Transform {
        Transform {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_x(270.0_f32.to_radians()),
            scale: Vec3::splat(15.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Skybox {
    pub job_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub intensity: f32,
    pub rotation: Quat,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self { intensity: 1.0, rotation: Quat::IDENTITY }
    }
}

/// The live scene: an explicit ownership table of generated entities plus the
/// single environment, skybox and directional light slots.
pub struct SceneWorld {
    entities: HashMap<EntityId, LiveEntity>,
    pub audio: AudioRegistry,
    environment: Option<EnvironmentInstance>,
    skybox: Option<Skybox>,
    light: Option<DirectionalLight>,
    ground_plane_visible: bool,
}

impl SceneWorld {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            audio: AudioRegistry::default(),
            environment: None,
            skybox: None,
            light: Some(DirectionalLight::default()),
            ground_plane_visible: true,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = &LiveEntity> {
        self.entities.values()
    }

    pub fn entity(&self, id: EntityId) -> Option<&LiveEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut LiveEntity> {
        self.entities.get_mut(&id)
    }

    pub fn spawn_model(
        &mut self,
        file_name: impl Into<String>,
        transform: Transform,
        mesh: Mesh,
        placeholder: bool,
    ) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(
            id,
            LiveEntity {
                id,
                file_name: file_name.into(),
                transform,
                selectable: true,
                payload: EntityPayload::Model(ModelInstance { mesh, placeholder }),
            },
        );
        id
    }

    pub fn spawn_audio(
        &mut self,
        file_name: impl Into<String>,
        transform: Transform,
        instance: AudioInstance,
    ) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(
            id,
            LiveEntity {
                id,
                file_name: file_name.into(),
                transform,
                selectable: true,
                payload: EntityPayload::Audio(instance),
            },
        );
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    /// Synchronously destroys every generated entity. Returns how many were
    /// removed. The audio registry is a separate collaborator and is cleared
    /// by the caller.
    pub fn clear_generated(&mut self) -> usize {
        let destroyed = self.entities.len();
        self.entities.clear();
        destroyed
    }

    pub fn environment(&self) -> Option<&EnvironmentInstance> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: Option<EnvironmentInstance>) {
        if environment.is_some() {
            self.ground_plane_visible = false;
        }
        self.environment = environment;
    }

    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }

    pub fn set_skybox(&mut self, skybox: Option<Skybox>) {
        self.skybox = skybox;
    }

    pub fn light(&self) -> Option<&DirectionalLight> {
        self.light.as_ref()
    }

    /// Detaches or replaces the directional light reference.
    pub fn configure_light(&mut self, light: Option<DirectionalLight>) {
        self.light = light;
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.light = Some(light);
    }

    pub fn ground_plane_visible(&self) -> bool {
        self.ground_plane_visible
    }
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn clip() -> AudioClip {
        AudioClip { channels: 1, sample_rate: 44_100, duration: Duration::from_secs(2) }
    }

    #[test]
    fn spawn_and_despawn_round_trip() {
        let mut world = SceneWorld::new();
        let model = world.spawn_model("cube.glb", Transform::IDENTITY, Mesh::cube(1.0), false);
        let audio = world.spawn_audio("tone.wav", Transform::IDENTITY, AudioInstance::new(clip()));
        assert_eq!(world.entity_count(), 2);
        assert!(world.entity(model).is_some());
        assert!(world.entity(audio).map_or(false, LiveEntity::is_audio));
        assert!(world.despawn(model));
        assert!(!world.despawn(model));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn clear_generated_empties_the_table() {
        let mut world = SceneWorld::new();
        for _ in 0..4 {
            world.spawn_model("m.glb", Transform::IDENTITY, Mesh::cube(1.0), false);
        }
        assert_eq!(world.clear_generated(), 4);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.clear_generated(), 0);
    }

    #[test]
    fn installing_an_environment_hides_the_ground_plane() {
        let mut world = SceneWorld::new();
        assert!(world.ground_plane_visible());
        world.set_environment(Some(EnvironmentInstance::new("job-1", Mesh::cube(1.0))));
        assert!(!world.ground_plane_visible());
        // Removing the environment does not bring the plane back on its own.
        world.set_environment(None);
        assert!(!world.ground_plane_visible());
    }

    #[test]
    fn environment_placement_is_fixed() {
        let placement = EnvironmentInstance::placement();
        assert_eq!(placement.position, Vec3::ZERO);
        assert_eq!(placement.scale, Vec3::splat(15.0));
        let rotated = placement.rotation * Vec3::Y;
        assert!((rotated - Vec3::NEG_Z).length() < 1e-4, "270 degrees about X sends +Y to -Z");
    }
}
