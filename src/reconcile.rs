use crate::audio::AudioClip;
use crate::events::{EditorEvent, EventBus};
use crate::mesh::Mesh;
use crate::snapshot::{EntityKind, EntityRecord, SceneSnapshot};
use crate::storage::AssetLibrary;
use crate::world::{
    AudioInstance, DirectionalLight, EnvironmentInstance, SceneWorld, Skybox, Transform,
};
use image::{GenericImageView, ImageReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The referenced file does not exist in the per-kind storage folder.
    MissingAsset,
    /// The audio file exists but could not be decoded into a clip.
    UndecodableAudio,
}

#[derive(Debug, Clone)]
pub struct SkippedEntity {
    pub kind: EntityKind,
    pub file_name: String,
    pub reason: SkipReason,
}

/// Outcome of one reconciliation run. Every recoverable condition shows up
/// here instead of terminating in a log line, so callers can assert on it.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub destroyed: usize,
    pub spawned: usize,
    pub skipped: Vec<SkippedEntity>,
    pub light_applied: bool,
    pub skybox_applied: bool,
    pub environment_mesh_loaded: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentOutcome {
    pub skybox_applied: bool,
    pub mesh_loaded: bool,
}

/// Projects the live world into a snapshot. Pure read: entity enumeration
/// order is whatever the table yields, which is all the persisted order
/// promises.
pub fn capture(world: &SceneWorld) -> SceneSnapshot {
    let mut snapshot = SceneSnapshot::default();
    for entity in world.entities() {
        let transform = entity.transform;
        let rotation = transform.rotation;
        snapshot.objects.push(EntityRecord {
            kind: entity.kind(),
            file_name: entity.file_name.clone(),
            position: transform.position.to_array(),
            rotation: [rotation.x, rotation.y, rotation.z, rotation.w],
            scale: transform.scale.to_array(),
            is_looping: entity.as_audio().map(|audio| audio.looping).unwrap_or(false),
        });
    }
    if let Some(light) = world.light() {
        snapshot.light_intensity = light.intensity;
        let rotation = light.rotation;
        snapshot.light_rotation = Some(vec![rotation.x, rotation.y, rotation.z, rotation.w]);
    }
    snapshot.environment_name = world.environment().map(|env| env.job_id.clone());
    snapshot
}

/// Brings the live world into correspondence with a snapshot, replacing all
/// previously generated content.
///
/// The destroy phase (entities, environment, audio bookkeeping) always
/// completes before anything new is created. Creation is sequential in
/// snapshot order and every missing or undecodable asset is skipped
/// individually; the run itself never aborts mid-way.
pub fn reconcile(
    world: &mut SceneWorld,
    snapshot: &SceneSnapshot,
    assets: &AssetLibrary,
    events: &mut EventBus,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    report.destroyed = world.clear_generated();
    world.set_environment(None);
    world.audio.clear();

    // Intensity and rotation apply together, and only when the stored
    // rotation is a well-formed quaternion.
    if let Some(rotation) = snapshot.light_rotation_quat() {
        if world.light().is_some() {
            world.set_light(DirectionalLight { intensity: snapshot.light_intensity, rotation });
            events.push(EditorEvent::LightChanged { intensity: snapshot.light_intensity });
            report.light_applied = true;
        }
    }

    if let Some(job_id) = snapshot.environment_name.as_deref().filter(|id| !id.is_empty()) {
        let outcome = load_environment(world, assets, job_id);
        report.skybox_applied = outcome.skybox_applied;
        report.environment_mesh_loaded = outcome.mesh_loaded;
        if outcome.mesh_loaded {
            events.push(EditorEvent::EnvironmentReplaced { job_id: job_id.to_string() });
        }
    }

    for record in &snapshot.objects {
        let spawned = match record.kind {
            EntityKind::Model => instantiate_model(world, assets, record),
            EntityKind::Audio => instantiate_audio(world, assets, record),
        };
        match spawned {
            Ok(id) => {
                report.spawned += 1;
                events.push(EditorEvent::EntitySpawned { id, kind: record.kind });
            }
            Err(reason) => {
                eprintln!(
                    "[reconcile] skipping {} '{}': {reason:?}",
                    record.kind.label(),
                    record.file_name
                );
                report.skipped.push(SkippedEntity {
                    kind: record.kind,
                    file_name: record.file_name.clone(),
                    reason,
                });
            }
        }
    }

    report
}

/// Installs the cached environment for `job_id`: skybox image first, then the
/// environment mesh. Either half missing or unreadable is warned about and
/// skipped without affecting the other.
pub fn load_environment(
    world: &mut SceneWorld,
    assets: &AssetLibrary,
    job_id: &str,
) -> EnvironmentOutcome {
    let mut outcome = EnvironmentOutcome::default();

    let skybox_path = assets.skybox_path(job_id);
    if skybox_path.is_file() {
        let decoded = ImageReader::open(&skybox_path)
            .map_err(anyhow::Error::from)
            .and_then(|reader| reader.decode().map_err(anyhow::Error::from));
        match decoded {
            Ok(img) => {
                world.set_skybox(Some(Skybox {
                    job_id: job_id.to_string(),
                    width: img.width(),
                    height: img.height(),
                }));
                outcome.skybox_applied = true;
            }
            Err(err) => {
                eprintln!("[environment] skybox {} failed to decode: {err:?}", skybox_path.display());
            }
        }
    } else {
        eprintln!("[environment] skybox file not found: {}", skybox_path.display());
    }

    let mesh_path = assets.environment_mesh_path(job_id);
    if mesh_path.is_file() {
        match Mesh::load_gltf(&mesh_path) {
            Ok(mesh) => {
                world.set_environment(Some(EnvironmentInstance::new(job_id, mesh)));
                outcome.mesh_loaded = true;
            }
            Err(err) => {
                eprintln!("[environment] mesh {} failed to load: {err:?}", mesh_path.display());
            }
        }
    } else {
        eprintln!("[environment] mesh file not found: {}", mesh_path.display());
    }

    outcome
}

fn record_transform(record: &EntityRecord) -> Transform {
    Transform::new(record.position_vec(), record.rotation_quat(), record.scale_vec())
}

fn instantiate_model(
    world: &mut SceneWorld,
    assets: &AssetLibrary,
    record: &EntityRecord,
) -> Result<crate::world::EntityId, SkipReason> {
    let Some(path) = assets.resolve_model(&record.file_name) else {
        return Err(SkipReason::MissingAsset);
    };
    // A present-but-unparseable model keeps its entity: the container exists
    // with a stand-in mesh, matching fire-and-forget engine asset loads.
    let (mesh, placeholder) = match Mesh::load_gltf(&path) {
        Ok(mesh) => (mesh, false),
        Err(err) => {
            eprintln!(
                "[reconcile] model '{}' failed to parse: {err:?}; using placeholder mesh",
                record.file_name
            );
            (Mesh::cube(1.0), true)
        }
    };
    Ok(world.spawn_model(record.file_name.clone(), record_transform(record), mesh, placeholder))
}

fn instantiate_audio(
    world: &mut SceneWorld,
    assets: &AssetLibrary,
    record: &EntityRecord,
) -> Result<crate::world::EntityId, SkipReason> {
    let Some(path) = assets.resolve_audio(&record.file_name) else {
        return Err(SkipReason::MissingAsset);
    };
    let clip = match AudioClip::decode_wav(&path) {
        Ok(clip) => clip,
        Err(err) => {
            eprintln!("[reconcile] audio '{}' failed to decode: {err:?}", record.file_name);
            return Err(SkipReason::UndecodableAudio);
        }
    };
    let mut instance = AudioInstance::new(clip);
    instance.looping = record.is_looping;
    let id = world.spawn_audio(record.file_name.clone(), record_transform(record), instance);
    world.audio.add(id);
    Ok(id)
}
