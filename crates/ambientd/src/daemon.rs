//! Request handling over the widget registry.

use std::fs;

use ambient::kind::{Dimensions, WidgetKind};
use ambient::protocol::{Request, Response};
use ambient::registry::{ActiveWidgets, WidgetRegistry};
use tracing::{error, info};

use crate::config::{clamp_fps, DaemonConfig};
use crate::error::DaemonError;
use crate::paths::AppPaths;

/// What a handled request asks of the connection loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub response: Response,
    pub shutdown: bool,
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self {
            response,
            shutdown: false,
        }
    }
}

pub struct Daemon {
    registry: WidgetRegistry,
    paths: AppPaths,
    target_fps: u32,
    autosave: bool,
}

impl Daemon {
    pub fn new(config: &DaemonConfig, paths: AppPaths) -> Self {
        Self::with_registry(WidgetRegistry::new(), config, paths)
    }

    pub fn with_registry(registry: WidgetRegistry, config: &DaemonConfig, paths: AppPaths) -> Self {
        registry.start();
        Self {
            registry,
            paths,
            target_fps: clamp_fps(config.target_fps),
            autosave: config.autosave,
        }
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Recreate the instances from the last save, if there is one.
    pub fn load(&mut self) -> Result<usize, DaemonError> {
        let path = self.paths.widgets_file();
        if !path.exists() {
            return Ok(0);
        }
        let saved: ActiveWidgets = serde_json::from_slice(&fs::read(&path)?)?;
        Ok(self.registry.restore(&saved))
    }

    pub fn save(&self) -> Result<(), DaemonError> {
        let path = self.paths.widgets_file();
        let bytes = serde_json::to_vec_pretty(&self.registry.snapshot())?;
        fs::write(&path, bytes)?;
        info!("Saved {} widget(s) to {:?}", self.registry.len(), path);
        Ok(())
    }

    pub fn handle(&mut self, req: Request) -> Reply {
        let mutates = mutates(&req);
        let shutdown = matches!(req, Request::Shutdown);
        let response = match self.dispatch(req) {
            Ok(response) => response,
            Err(e) => Response::error(e.to_string()),
        };
        if mutates && self.autosave && !matches!(response, Response::Error { .. }) {
            if let Err(e) = self.save() {
                error!("Autosave failed: {}", e);
            }
        }
        Reply { response, shutdown }
    }

    fn dispatch(&mut self, req: Request) -> Result<Response, DaemonError> {
        let reg = &mut self.registry;
        let response = match req {
            Request::Activate { kind, config } => Response::Created {
                id: reg.activate(kind.parse()?, &config),
            },
            Request::Duplicate { kind, config } => Response::Created {
                id: reg.duplicate(kind.parse()?, &config),
            },
            Request::Deactivate { kind } => {
                let kind: WidgetKind = kind.parse()?;
                if reg.deactivate(kind) {
                    Response::success(format!("Deactivated {kind}"))
                } else {
                    Response::error(format!("{kind} is not active"))
                }
            }
            Request::Toggle { kind, config } => {
                let kind: WidgetKind = kind.parse()?;
                match reg.toggle(kind, &config) {
                    Some(id) => Response::Created { id },
                    None => Response::success(format!("Deactivated {kind}")),
                }
            }
            Request::Remove { id } => {
                reg.remove(&id)?;
                Response::success(format!("Removed {id}"))
            }
            Request::Resize { id, width, height } => {
                reg.resize(&id, Dimensions::new(width, height))?;
                Response::success(format!("Resized {id} to {width}x{height}"))
            }
            Request::Configure { id, config } => {
                reg.update(&id, &config)?;
                Response::success(format!("Configured {id}"))
            }
            Request::ConfigureKind { kind, config } => {
                let kind: WidgetKind = kind.parse()?;
                let n = reg.update_kind(kind, &config);
                Response::success(format!("Configured {n} {kind} instance(s)"))
            }
            Request::Render { id } => Response::Frame {
                primitives: reg.render(&id)?,
                id,
            },
            Request::List => Response::Instances {
                running: reg.is_running(),
                frame: reg.frame(),
                target_fps: self.target_fps,
                instances: reg.instances(),
            },
            Request::Start => {
                reg.start();
                Response::success("Clock started")
            }
            Request::Stop => {
                reg.stop();
                Response::success("Clock stopped")
            }
            Request::SetFramerate { fps } => {
                self.target_fps = clamp_fps(fps);
                info!("Frame rate set to {} fps", self.target_fps);
                Response::success(format!("Frame rate set to {} fps", self.target_fps))
            }
            Request::Save => {
                self.save()?;
                Response::success("Saved")
            }
            Request::Shutdown => {
                self.save()?;
                Response::success("Shutting down")
            }
        };
        Ok(response)
    }
}

/// Requests that change what gets persisted.
fn mutates(req: &Request) -> bool {
    matches!(
        req,
        Request::Activate { .. }
            | Request::Duplicate { .. }
            | Request::Deactivate { .. }
            | Request::Toggle { .. }
            | Request::Remove { .. }
            | Request::Configure { .. }
            | Request::ConfigureKind { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambient::resolver::SimConfig;
    use std::time::Duration;

    fn scratch(name: &str) -> AppPaths {
        let dir = std::env::temp_dir().join(format!("ambientd-test-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        AppPaths::at(dir).unwrap()
    }

    fn daemon(name: &str, autosave: bool) -> Daemon {
        let config = DaemonConfig {
            autosave,
            ..DaemonConfig::default()
        };
        Daemon::with_registry(WidgetRegistry::with_seed(5), &config, scratch(name))
    }

    fn created(reply: Reply) -> String {
        match reply.response {
            Response::Created { id } => id,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    fn activate(kind: &str) -> Request {
        Request::Activate {
            kind: kind.into(),
            config: SimConfig::default(),
        }
    }

    #[test]
    fn activate_then_list() {
        let mut d = daemon("list", false);
        assert_eq!(created(d.handle(activate("snake"))), "snake");
        assert_eq!(created(d.handle(activate("Snake"))), "snake");
        match d.handle(Request::List).response {
            Response::Instances {
                running,
                target_fps,
                instances,
                ..
            } => {
                assert!(running);
                assert_eq!(target_fps, 60);
                assert_eq!(instances.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_an_error_response() {
        let mut d = daemon("unknown", false);
        let reply = d.handle(activate("tetris"));
        assert!(matches!(reply.response, Response::Error { .. }));
        assert!(d.registry().is_empty());
    }

    #[test]
    fn registry_errors_become_error_responses() {
        let mut d = daemon("errors", false);
        d.handle(activate("life"));
        let reply = d.handle(Request::Remove { id: "life".into() });
        assert!(matches!(reply.response, Response::Error { .. }));
        let reply = d.handle(Request::Render { id: "nope".into() });
        assert!(matches!(reply.response, Response::Error { .. }));
    }

    #[test]
    fn render_returns_primitives() {
        let mut d = daemon("render", false);
        let id = created(d.handle(activate("life")));
        d.handle(Request::Resize {
            id: id.clone(),
            width: 200.0,
            height: 100.0,
        });
        match d.handle(Request::Render { id: id.clone() }).response {
            Response::Frame { id: got, .. } => assert_eq!(got, id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn speed_change_keeps_explosion_size() {
        let mut d = daemon("patch", false);
        let id = created(d.handle(Request::Activate {
            kind: "fireworks".into(),
            config: SimConfig {
                speed: 1.0,
                explosion_size: 3.0,
            },
        }));
        let req: Request = serde_json::from_str(
            r#"{"type":"ConfigureKind","kind":"fireworks","config":{"speed":2}}"#,
        )
        .unwrap();
        assert!(matches!(d.handle(req).response, Response::Success { .. }));
        let info = d.registry().instances().into_iter().find(|i| i.id == id).unwrap();
        assert_eq!(
            info.config,
            SimConfig {
                speed: 2.0,
                explosion_size: 3.0
            }
        );
    }

    #[test]
    fn framerate_is_clamped() {
        let mut d = daemon("fps", false);
        d.handle(Request::SetFramerate { fps: 0 });
        assert_eq!(d.target_fps(), 1);
        d.handle(Request::SetFramerate { fps: 10_000 });
        assert_eq!(d.target_fps(), 240);
    }

    #[test]
    fn stop_idles_the_clock() {
        let mut d = daemon("stop", false);
        d.handle(activate("donut"));
        d.handle(Request::Stop);
        assert!(d.registry().clock().is_idle());
        assert_eq!(d.registry().tick(Duration::from_millis(16)), 0);
        d.handle(Request::Start);
        assert!(!d.registry().clock().is_idle());
    }

    #[test]
    fn shutdown_saves_and_signals() {
        let mut d = daemon("shutdown", false);
        d.handle(activate("maze"));
        let reply = d.handle(Request::Shutdown);
        assert!(reply.shutdown);
        assert!(d.paths.widgets_file().exists());
    }

    #[test]
    fn autosave_round_trips_through_load() {
        let mut d = daemon("autosave", true);
        d.handle(activate("pipes"));
        let dup = created(d.handle(Request::Duplicate {
            kind: "fireworks".into(),
            config: SimConfig::with_speed(3.0),
        }));

        let config = DaemonConfig::default();
        let mut restored = Daemon::with_registry(WidgetRegistry::with_seed(9), &config, d.paths.clone());
        assert_eq!(restored.load().unwrap(), 2);
        assert!(restored.registry().contains("pipes"));
        assert!(restored.registry().contains(&dup));
        let info = restored
            .registry()
            .instances()
            .into_iter()
            .find(|i| i.id == dup)
            .unwrap();
        assert_eq!(info.config.speed, 3.0);
    }
}
