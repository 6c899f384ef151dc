use anyhow::{anyhow, Context, Result};
use scenesmith::snapshot::{EntityKind, SceneSnapshot};
use scenesmith::storage::AssetLibrary;
use std::env;
use std::path::Path;
use std::process;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "list" => {
            let snapshot_path = args
                .next()
                .ok_or_else(|| anyhow!("list requires a path: snapshot_tool list <snapshot>"))?;
            cmd_list(&snapshot_path)
        }
        "info" => {
            let snapshot_path = args
                .next()
                .ok_or_else(|| anyhow!("info requires a path: snapshot_tool info <snapshot>"))?;
            cmd_info(&snapshot_path)
        }
        "validate" => {
            let data_dir = args.next().ok_or_else(|| {
                anyhow!("validate requires arguments: snapshot_tool validate <data-dir> <scene-name>")
            })?;
            let scene_name = args.next().ok_or_else(|| anyhow!("validate missing scene name argument"))?;
            cmd_validate(&data_dir, &scene_name)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'")),
    }
}

fn print_usage() {
    eprintln!(
        "Snapshot Tool

Usage:
  snapshot_tool list <snapshot_path>            List persisted entities
  snapshot_tool info <snapshot_path>            Summarize light and environment state
  snapshot_tool validate <data_dir> <scene>     Check that every referenced asset exists
  snapshot_tool help                            Show this message
"
    );
}

fn cmd_list(snapshot_path: &str) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    println!("{:<5} {:<7} {:<40} {}", "Idx", "Type", "File", "Looping");
    println!("{}", "-".repeat(64));
    for (index, record) in snapshot.objects.iter().enumerate() {
        let looping = if record.kind == EntityKind::Audio {
            if record.is_looping { "yes" } else { "no" }
        } else {
            "-"
        };
        println!("{:<5} {:<7} {:<40} {}", index, record.kind.label(), record.file_name, looping);
    }
    Ok(())
}

fn cmd_info(snapshot_path: &str) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let models = snapshot.objects.iter().filter(|r| r.kind == EntityKind::Model).count();
    let audio = snapshot.objects.len() - models;
    println!("Entities: {} ({} models, {} audio)", snapshot.objects.len(), models, audio);
    println!("Light intensity: {}", snapshot.light_intensity);
    match snapshot.light_rotation_quat() {
        Some(rotation) => println!("Light rotation: [{}, {}, {}, {}]", rotation.x, rotation.y, rotation.z, rotation.w),
        None => println!("Light rotation: absent or malformed (light untouched on load)"),
    }
    match snapshot.environment_name.as_deref() {
        Some(job_id) if !job_id.is_empty() => println!("Environment job: {job_id}"),
        _ => println!("Environment job: none"),
    }
    Ok(())
}

fn cmd_validate(data_dir: &str, scene_name: &str) -> Result<()> {
    let library = AssetLibrary::new(data_dir);
    let snapshot_path = SceneSnapshot::save_path(Path::new(data_dir), scene_name);
    let snapshot = load_snapshot(&snapshot_path.display().to_string())?;

    let mut issues = Vec::new();
    for record in &snapshot.objects {
        let resolved = match record.kind {
            EntityKind::Model => library.resolve_model(&record.file_name),
            EntityKind::Audio => library.resolve_audio(&record.file_name),
        };
        if resolved.is_none() {
            issues.push(format!(
                "{} '{}' is missing from storage (will be skipped on load)",
                record.kind.label(),
                record.file_name
            ));
        }
    }
    if let Some(job_id) = snapshot.environment_name.as_deref().filter(|id| !id.is_empty()) {
        if !library.skybox_path(job_id).is_file() {
            issues.push(format!("environment '{job_id}' has no cached skybox"));
        }
        if !library.environment_mesh_path(job_id).is_file() {
            issues.push(format!("environment '{job_id}' has no cached mesh"));
        }
    }

    if issues.is_empty() {
        println!(
            "Snapshot '{}' is valid. Entities: {}.",
            snapshot_path.display(),
            snapshot.objects.len()
        );
        Ok(())
    } else {
        Err(anyhow!(format!(
            "snapshot '{}' has issues:\n  - {}",
            snapshot_path.display(),
            issues.join("\n  - ")
        )))
    }
}

fn load_snapshot(path: &str) -> Result<SceneSnapshot> {
    SceneSnapshot::load_from_path(Path::new(path))
        .with_context(|| format!("loading snapshot '{path}'"))
}
