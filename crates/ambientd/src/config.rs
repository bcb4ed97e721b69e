//! Daemon settings: `config.json` in the data directory, overridden by flags.

use std::fs;
use std::path::Path;

use ambient::protocol::DEFAULT_ADDR;
use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 240;
pub const DEFAULT_FPS: u32 = 60;

pub fn clamp_fps(fps: u32) -> u32 {
    fps.clamp(MIN_FPS, MAX_FPS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DaemonConfig {
    pub bind_addr: String,
    pub target_fps: u32,
    /// Write `widgets.json` after every change instead of only on save/shutdown.
    pub autosave: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            target_fps: DEFAULT_FPS,
            autosave: true,
        }
    }
}

impl DaemonConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, DaemonError> {
        let mut config: Self = serde_json::from_str(text)?;
        config.target_fps = clamp_fps(config.target_fps);
        Ok(config)
    }

    /// Apply `--addr host:port`, `--fps n` and `--no-autosave`.
    pub fn apply_args<I>(&mut self, args: I) -> Result<(), DaemonError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--addr" => {
                    self.bind_addr = args
                        .next()
                        .ok_or_else(|| DaemonError::Args("--addr needs a value".into()))?;
                }
                "--fps" => {
                    let value = args
                        .next()
                        .ok_or_else(|| DaemonError::Args("--fps needs a value".into()))?;
                    let fps: u32 = value
                        .parse()
                        .map_err(|_| DaemonError::Args(format!("--fps expects a number, got {value:?}")))?;
                    self.target_fps = clamp_fps(fps);
                }
                "--no-autosave" => self.autosave = false,
                other => return Err(DaemonError::Args(format!("unknown flag {other:?}"))),
            }
        }
        Ok(())
    }
}
