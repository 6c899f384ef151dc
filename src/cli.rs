use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    data_dir: Option<String>,
    scene: Option<String>,
    world_server: Option<String>,
    mesh_server: Option<String>,
    audio_server: Option<String>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "data-dir" => overrides.data_dir = Some(value),
                "scene" => overrides.scene = Some(value),
                "world-server" => overrides.world_server = Some(value),
                "mesh-server" => overrides.mesh_server = Some(value),
                "audio-server" => overrides.audio_server = Some(value),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --data-dir, --scene, --world-server, --mesh-server, --audio-server."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn data_dir(&self) -> Option<&str> {
        self.data_dir.as_deref()
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            scene_name: self.scene,
            world_server_url: self.world_server,
            mesh_server_url: self.mesh_server,
            audio_server_url: self.audio_server,
        }
    }
}
