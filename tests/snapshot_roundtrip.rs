use glam::{Quat, Vec3};
use scenesmith::audio::AudioClip;
use scenesmith::events::EventBus;
use scenesmith::mesh::Mesh;
use scenesmith::reconcile;
use scenesmith::snapshot::{EntityKind, EntityRecord, SceneSnapshot, SnapshotError};
use scenesmith::storage::AssetLibrary;
use scenesmith::world::{AudioInstance, SceneWorld, Transform};
use std::time::Duration;

fn wav_bytes() -> Vec<u8> {
    let sample_count: u32 = 4_410;
    let data_len = sample_count * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&44_100u32.to_le_bytes());
    bytes.extend_from_slice(&88_200u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    bytes
}

fn clip() -> AudioClip {
    AudioClip { channels: 1, sample_rate: 44_100, duration: Duration::from_millis(100) }
}

#[test]
fn codec_round_trip_preserves_entity_records() {
    let snapshot = SceneSnapshot {
        objects: vec![
            EntityRecord {
                kind: EntityKind::Model,
                file_name: "driftwood.glb".to_string(),
                position: [1.25, -3.5, 0.125],
                rotation: [0.1, 0.2, 0.3, 0.9],
                scale: [0.5, 0.5, 0.5],
                is_looping: false,
            },
            EntityRecord {
                kind: EntityKind::Audio,
                file_name: "surf".to_string(),
                position: [-8.0, 0.0, 2.0],
                rotation: [0.0, 0.707, 0.0, 0.707],
                scale: [1.0, 1.0, 1.0],
                is_looping: true,
            },
        ],
        light_intensity: 0.8,
        light_rotation: Some(vec![0.3, 0.0, 0.0, 0.95]),
        environment_name: Some("job-77".to_string()),
    };

    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("SaveData_Test.json");
    snapshot.save_to_path(&path).expect("snapshot saves");
    let loaded = SceneSnapshot::load_from_path(&path).expect("snapshot loads");

    assert_eq!(loaded.objects.len(), snapshot.objects.len());
    for (original, reloaded) in snapshot.objects.iter().zip(loaded.objects.iter()) {
        assert_eq!(original.kind, reloaded.kind);
        assert_eq!(original.file_name, reloaded.file_name);
        for (a, b) in original.position.iter().zip(reloaded.position.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
        for (a, b) in original.rotation.iter().zip(reloaded.rotation.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
        for (a, b) in original.scale.iter().zip(reloaded.scale.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
        assert_eq!(original.is_looping, reloaded.is_looping);
    }
    assert!((loaded.light_intensity - 0.8).abs() < 1e-4);
    assert_eq!(loaded.environment_name.as_deref(), Some("job-77"));
}

#[test]
fn saved_scene_reloads_with_model_and_looping_audio() {
    let temp = tempfile::tempdir().expect("temp dir");
    let library = AssetLibrary::new(temp.path());
    library.store_model("cube.glb", b"placeholder bytes").expect("store model file");
    library.store_audio("tone.wav", &wav_bytes()).expect("store audio file");

    let mut world = SceneWorld::new();
    world.spawn_model(
        "cube.glb",
        Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_xyzw(0.0, 0.0, 0.0, 1.0), Vec3::ONE),
        Mesh::cube(1.0),
        false,
    );
    let mut audio = AudioInstance::new(clip());
    audio.looping = true;
    world.spawn_audio("tone.wav", Transform::IDENTITY, audio);

    let snapshot = reconcile::capture(&world);
    let path = SceneSnapshot::save_path(temp.path(), "Main");
    snapshot.save_to_path(&path).expect("snapshot saves");

    // The persisted JSON carries exactly these two records.
    let raw = std::fs::read_to_string(&path).expect("read save file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("save file is json");
    let objects = value["objects"].as_array().expect("objects array");
    assert_eq!(objects.len(), 2);
    let model = objects
        .iter()
        .find(|record| record["type"] == "Model")
        .expect("model record present");
    assert_eq!(model["fileName"], "cube.glb");
    assert_eq!(model["position"][0], 1.0);
    assert_eq!(model["position"][1], 2.0);
    assert_eq!(model["position"][2], 3.0);
    let audio = objects
        .iter()
        .find(|record| record["type"] == "Audio")
        .expect("audio record present");
    assert_eq!(audio["fileName"], "tone.wav");
    assert_eq!(audio["isLooping"], true);

    // Reloading instantiates exactly the persisted entities.
    let reloaded = SceneSnapshot::load_from_path(&path).expect("snapshot loads");
    let mut fresh = SceneWorld::new();
    let mut events = EventBus::default();
    let report = reconcile::reconcile(&mut fresh, &reloaded, &library, &mut events);
    assert_eq!(report.spawned, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(fresh.entity_count(), 2);
    let restored_audio = fresh
        .entities()
        .find(|entity| entity.is_audio())
        .and_then(|entity| entity.as_audio())
        .expect("audio entity restored");
    assert!(restored_audio.looping);
}

#[test]
fn missing_save_is_not_found() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("SaveData_Nope.json");
    match SceneSnapshot::load_from_path(&path) {
        Err(SnapshotError::NotFound { .. }) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn corrupt_save_is_fatal_not_defaulted() {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = temp.path().join("SaveData_Main.json");
    std::fs::write(&path, b"{ this is not json").expect("write corrupt file");
    match SceneSnapshot::load_from_path(&path) {
        Err(SnapshotError::Corrupt { .. }) => {}
        other => panic!("expected Corrupt, got {other:?}"),
    }
}
