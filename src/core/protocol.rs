//! Newline-delimited JSON protocol between `ambientd` and its clients.

use serde::{Deserialize, Serialize};

use crate::registry::InstanceInfo;
use crate::render::DrawPrimitive;
use crate::resolver::{ConfigPatch, SimConfig};

pub const DEFAULT_ADDR: &str = "127.0.0.1:9877";

/// Kinds travel as text and are parsed with `WidgetKind::from_str`, so a bad
/// name gets a readable error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Activate {
        kind: String,
        #[serde(default)]
        config: SimConfig,
    },
    Duplicate {
        kind: String,
        #[serde(default)]
        config: SimConfig,
    },
    Deactivate {
        kind: String,
    },
    Toggle {
        kind: String,
        #[serde(default)]
        config: SimConfig,
    },
    Remove {
        id: String,
    },
    Resize {
        id: String,
        width: f32,
        height: f32,
    },
    /// Only the fields present in `config` change.
    Configure {
        id: String,
        config: ConfigPatch,
    },
    ConfigureKind {
        kind: String,
        config: ConfigPatch,
    },
    Render {
        id: String,
    },
    List,
    Start,
    Stop,
    SetFramerate {
        fps: u32,
    },
    Save,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Success {
        message: String,
    },
    Created {
        id: String,
    },
    Frame {
        id: String,
        primitives: Vec<DrawPrimitive>,
    },
    Instances {
        running: bool,
        frame: u64,
        #[serde(default)]
        target_fps: u32,
        instances: Vec<InstanceInfo>,
    },
    Error {
        message: String,
    },
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Response::Success {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
        }
    }
}

/// One protocol line, newline included.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}
