use anyhow::Result;
use scenesmith::cli::CliOverrides;
use scenesmith::config::AppConfig;
use scenesmith::session::EditorSession;
use scenesmith::state::AppState;
use std::path::PathBuf;
use std::process;

fn main() {
    let overrides = match CliOverrides::parse_from_env() {
        Ok(overrides) => overrides,
        Err(err) => {
            eprintln!("[cli] {err}");
            process::exit(2);
        }
    };
    if let Err(err) = run(overrides) {
        eprintln!("Application error: {err:?}");
        process::exit(1);
    }
}

fn run(overrides: CliOverrides) -> Result<()> {
    let data_dir = overrides.data_dir().map(PathBuf::from).unwrap_or_else(default_data_dir);
    let mut config = AppConfig::load_or_init(data_dir.join(AppConfig::FILE_NAME));
    config.apply_overrides(&overrides.into_config_overrides());

    let mut session = EditorSession::new(config, data_dir);
    session.set_state(AppState::Editing);

    match session.load_scene()? {
        Some(report) => {
            eprintln!(
                "[save] restored scene '{}': {} spawned, {} skipped",
                session.config().scene_name,
                report.spawned,
                report.skipped.len()
            );
        }
        None => eprintln!("[save] starting with an empty scene"),
    }

    for event in session.events.drain() {
        eprintln!("[session] {event}");
    }

    println!(
        "scene '{}' — {} entities ({} audio), environment: {}, skybox: {}, light: {}",
        session.config().scene_name,
        session.world.entity_count(),
        session.world.audio.len(),
        session.world.environment().map(|env| env.job_id.as_str()).unwrap_or("none"),
        session.world.skybox().map(|sky| sky.job_id.as_str()).unwrap_or("none"),
        session
            .world
            .light()
            .map(|light| format!("intensity {:.2}", light.intensity))
            .unwrap_or_else(|| "none".to_string()),
    );
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().map(|dir| dir.join("scenesmith")).unwrap_or_else(|| PathBuf::from("scenesmith_data"))
}
