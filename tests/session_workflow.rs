use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scenesmith::audio::{AudioClip, SpeechPlaylist};
use scenesmith::config::AppConfig;
use scenesmith::events::EditorEvent;
use scenesmith::mesh::Mesh;
use scenesmith::session::EditorSession;
use scenesmith::state::AppState;
use scenesmith::world::{AudioInstance, Transform};
use std::time::Duration;

fn wav_bytes() -> Vec<u8> {
    let sample_count: u32 = 2_205;
    let data_len = sample_count * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
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
    AudioClip { channels: 1, sample_rate: 44_100, duration: Duration::from_millis(50) }
}

fn session_in(temp: &tempfile::TempDir) -> EditorSession {
    EditorSession::new(AppConfig::default(), temp.path())
}

#[test]
fn loading_without_a_save_file_is_a_clean_start() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut session = session_in(&temp);
    let report = session.load_scene().expect("load tolerates absent file");
    assert!(report.is_none());
    assert_eq!(session.world.entity_count(), 0);
}

#[test]
fn save_and_reload_round_trips_through_the_session() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut session = session_in(&temp);
    session.set_state(AppState::Editing);

    session.assets().store_model("arch.glb", b"placeholder bytes").expect("store model");
    session.assets().store_audio("wind", &wav_bytes()).expect("store audio");

    session.world.spawn_model(
        "arch.glb",
        Transform::new(Vec3::new(4.0, 0.0, -2.0), Quat::IDENTITY, Vec3::splat(0.5)),
        Mesh::cube(1.0),
        false,
    );
    let mut wind = AudioInstance::new(clip());
    wind.looping = true;
    let audio_id = session.world.spawn_audio("wind", Transform::IDENTITY, wind);
    session.world.audio.add(audio_id);

    let path = session.save_scene().expect("scene saves");
    assert_eq!(path, session.save_path());
    assert!(path.is_file());
    assert!(path.ends_with("SavedScenes/SaveData_Main.json"));

    let mut fresh = session_in(&temp);
    let report = fresh.load_scene().expect("scene loads").expect("snapshot existed");
    assert_eq!(report.spawned, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(fresh.world.entity_count(), 2);
    assert_eq!(fresh.world.audio.len(), 1);

    let drained = fresh.events.drain();
    assert!(drained
        .iter()
        .any(|event| matches!(event, EditorEvent::SnapshotLoaded { spawned: 2, .. })));
}

#[test]
fn state_transitions_gate_interaction_and_speech() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut session = session_in(&temp);
    session.set_speech_playlist(SpeechPlaylist::new(
        vec![Duration::from_secs(6), Duration::from_secs(9)],
        Duration::from_secs(10),
    ));

    session.set_state(AppState::Editing);
    assert!(session.interaction.enabled());
    assert!(session.layout().free_camera_active);
    assert!(session.speech_schedule().is_none());

    session.set_state(AppState::Playing);
    assert!(!session.interaction.enabled());
    assert!(session.layout().player_active);
    let cues = session.speech_schedule().expect("speech active while playing");
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[1].start, Duration::from_secs(16));

    session.set_state(AppState::MainMenu);
    assert!(session.layout().rotating_camera_active);
    assert!(session.speech_schedule().is_none());

    let drained = session.events.drain();
    let transitions: Vec<_> = drained
        .iter()
        .filter(|event| matches!(event, EditorEvent::StateChanged { .. }))
        .collect();
    assert_eq!(transitions.len(), 3);
}

#[test]
fn ambience_rolls_only_while_playing() {
    let temp = tempfile::tempdir().expect("temp dir");
    let mut session = session_in(&temp);
    let id = session.world.spawn_audio("wind", Transform::IDENTITY, AudioInstance::new(clip()));
    session.world.audio.add(id);

    let mut rng = StdRng::seed_from_u64(11);
    assert!(session.ambience_cues(&mut rng).is_empty());

    session.set_state(AppState::Playing);
    let cues = session.ambience_cues(&mut rng);
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].0, id);
    assert!(cues[0].1.delay >= Duration::from_secs(7));
    assert!(cues[0].1.volume >= 0.1 && cues[0].1.volume < 1.0);
}
