//! Instance manager.
//!
//! `WidgetRegistry` owns the frame clock and every running widget instance.
//! Each instance owns its simulation state, pacing and render cache behind an
//! `Rc<RefCell<_>>`; the clock only ever sees a `Weak` to it, and the
//! instance's `Subscription` is dropped before its state, so removing an
//! instance cannot leave a callback behind.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ambient_sims::{Prng, StepEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{FrameClock, FrameTick, Subscription};
use crate::error::RegistryError;
use crate::kind::{Dimensions, WidgetKind};
use crate::render::{render, DrawPrimitive, RenderCache};
use crate::resolver::{resolve, ConfigPatch, Pacer, Resolved, SimConfig};
use crate::state::SimulationState;

/// Everything an instance mutates on a tick.
#[derive(Debug)]
struct InstanceCore {
    state: SimulationState,
    dims: Dimensions,
    resolved: Resolved,
    pacer: Pacer,
    cache: RenderCache,
    steps: u64,
}

impl InstanceCore {
    fn on_tick(&mut self, id: &str) {
        let steps = self.pacer.tick(&self.resolved.pacing);
        if steps == 0 {
            return;
        }
        let event = self.state.advance(steps, &self.resolved.params);
        self.steps += u64::from(steps);
        match event {
            StepEvent::Steady => {}
            StepEvent::Reseeded => debug!("{}: {}", id, event.as_str()),
            StepEvent::Reset => warn!("{}: invariant broke, core re-initialised", id),
        }
    }
}

struct WidgetInstance {
    // Declared first so it is dropped before `core`.
    _subscription: Subscription,
    id: String,
    kind: WidgetKind,
    is_duplicate: bool,
    core: Rc<RefCell<InstanceCore>>,
}

impl WidgetInstance {
    fn title(&self) -> String {
        if self.is_duplicate {
            self.kind.duplicate_title(&self.id)
        } else {
            self.kind.title().to_string()
        }
    }
}

/// Public view of one instance, in registration order from [`WidgetRegistry::instances`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub id: String,
    pub kind: WidgetKind,
    pub is_duplicate: bool,
    pub title: String,
    pub config: SimConfig,
    pub dimensions: Dimensions,
    pub steps: u64,
}

/// Persisted shape of the registry: which instances exist and how they are configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveWidgets {
    pub widgets: Vec<PersistedWidget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWidget {
    pub id: String,
    /// Kept as text so settings written by a newer build still load.
    pub kind: String,
    /// When absent, an id containing `-` marks a duplicate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
    #[serde(default)]
    pub config: SimConfig,
}

/// Millisecond timestamps for duplicate ids, strictly increasing.
#[derive(Debug, Default)]
struct IdSource {
    last: u64,
}

impl IdSource {
    fn next(&mut self, now_ms: u64) -> u64 {
        self.last = now_ms.max(self.last + 1);
        self.last
    }

    fn observe(&mut self, stamp: u64) {
        self.last = self.last.max(stamp);
    }
}

fn now_millis() -> u64 {
    #[cfg(feature = "std")]
    {
        crate::time::unix_millis()
    }
    #[cfg(not(feature = "std"))]
    {
        0
    }
}

pub struct WidgetRegistry {
    clock: FrameClock,
    instances: Vec<WidgetInstance>,
    seeds: Prng,
    ids: IdSource,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetRegistry {
    /// Registry seeded from the wall clock.
    pub fn new() -> Self {
        Self::with_seed(now_millis() ^ 0xA076_1D64_78BD_642F)
    }

    /// Registry whose instances draw their seeds from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock: FrameClock::new(),
            instances: Vec::new(),
            seeds: Prng::new(seed),
            ids: IdSource::default(),
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn start(&self) {
        self.clock.start();
    }

    pub fn stop(&self) {
        self.clock.stop();
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn frame(&self) -> u64 {
        self.clock.frame()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn is_active(&self, kind: WidgetKind) -> bool {
        self.canonical(kind).is_some()
    }

    /// Drive one clock tick.
    pub fn tick(&self, elapsed: Duration) -> usize {
        self.clock.advance(elapsed)
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.instances.iter().position(|i| i.id == id)
    }

    fn canonical(&self, kind: WidgetKind) -> Option<usize> {
        self.instances
            .iter()
            .position(|i| i.kind == kind && !i.is_duplicate)
    }

    fn instance(&self, id: &str) -> Result<&WidgetInstance, RegistryError> {
        self.find(id)
            .map(|idx| &self.instances[idx])
            .ok_or_else(|| RegistryError::UnknownInstance(id.to_string()))
    }

    fn spawn(&mut self, id: String, kind: WidgetKind, is_duplicate: bool, config: &SimConfig) {
        let dims = Dimensions::default();
        let resolved = resolve(kind, config);
        if resolved.config != *config {
            debug!("{}: config {:?} clamped to {:?}", id, config, resolved.config);
        }
        let core = Rc::new(RefCell::new(InstanceCore {
            state: SimulationState::init(kind, &dims, self.seeds.fork()),
            dims,
            resolved,
            pacer: Pacer::new(),
            cache: RenderCache::new(),
            steps: 0,
        }));

        let weak = Rc::downgrade(&core);
        let label = id.clone();
        let subscription = self.clock.subscribe(id.clone(), move |_: &FrameTick| {
            let Some(core) = weak.upgrade() else {
                return;
            };
            if let Ok(mut core) = core.try_borrow_mut() {
                core.on_tick(&label);
            };
        });

        self.instances.push(WidgetInstance {
            _subscription: subscription,
            id,
            kind,
            is_duplicate,
            core,
        });
    }

    /// Start the canonical instance of `kind`. Returns its id; a no-op if it is already running.
    pub fn activate(&mut self, kind: WidgetKind, config: &SimConfig) -> String {
        if self.is_active(kind) {
            return kind.key().to_string();
        }
        let id = kind.key().to_string();
        self.spawn(id.clone(), kind, false, config);
        info!("Activated {} ({})", id, kind.title());
        id
    }

    /// Start an extra, independently seeded instance of `kind`.
    pub fn duplicate(&mut self, kind: WidgetKind, config: &SimConfig) -> String {
        let id = self.next_duplicate_id(kind);
        self.spawn(id.clone(), kind, true, config);
        info!("Duplicated {} as {}", kind, id);
        id
    }

    fn next_duplicate_id(&mut self, kind: WidgetKind) -> String {
        format!("{}-{}", kind.key(), self.ids.next(now_millis()))
    }

    /// Stop the canonical instance of `kind`. Returns whether one was running.
    pub fn deactivate(&mut self, kind: WidgetKind) -> bool {
        let Some(idx) = self.canonical(kind) else {
            return false;
        };
        let instance = self.instances.remove(idx);
        info!("Deactivated {}", instance.id);
        true
    }

    /// Activate `kind` if it is off, deactivate it otherwise. Returns the id when activated.
    pub fn toggle(&mut self, kind: WidgetKind, config: &SimConfig) -> Option<String> {
        if self.deactivate(kind) {
            None
        } else {
            Some(self.activate(kind, config))
        }
    }

    /// Remove a duplicate instance.
    pub fn remove(&mut self, id: &str) -> Result<(), RegistryError> {
        let idx = self
            .find(id)
            .ok_or_else(|| RegistryError::UnknownInstance(id.to_string()))?;
        if !self.instances[idx].is_duplicate {
            return Err(RegistryError::NotRemovable(id.to_string()));
        }
        self.instances.remove(idx);
        info!("Removed {}", id);
        Ok(())
    }

    pub fn resize(&mut self, id: &str, dims: Dimensions) -> Result<(), RegistryError> {
        let instance = self.instance(id)?;
        let mut core = instance
            .core
            .try_borrow_mut()
            .map_err(|_| RegistryError::Busy(id.to_string()))?;
        if dims.is_degenerate() {
            warn!(
                "{}: degenerate size {}x{}, clamping to a 1x1 grid",
                id, dims.width, dims.height
            );
        }
        if dims.exceeds_extent(instance.kind) {
            warn!(
                "{}: size {}x{} is beyond the largest extent, capping it",
                id, dims.width, dims.height
            );
        }
        if core.dims == dims {
            return Ok(());
        }
        core.state.resize(&dims);
        core.dims = dims;
        debug!("{}: resized to {}x{}", id, dims.width, dims.height);
        Ok(())
    }

    pub fn render(&self, id: &str) -> Result<Vec<DrawPrimitive>, RegistryError> {
        let instance = self.instance(id)?;
        let mut core = instance
            .core
            .try_borrow_mut()
            .map_err(|_| RegistryError::Busy(id.to_string()))?;
        let core = &mut *core;
        Ok(render(
            &core.state,
            &core.dims,
            &core.resolved.params,
            &mut core.cache,
        ))
    }

    /// Apply new options to one instance. Takes effect on the next tick; state is kept.
    pub fn configure(&mut self, id: &str, config: &SimConfig) -> Result<(), RegistryError> {
        let instance = self.instance(id)?;
        Self::apply_config(instance, config)
    }

    /// Apply new options to every instance of `kind`. Returns how many were updated.
    pub fn configure_kind(&mut self, kind: WidgetKind, config: &SimConfig) -> usize {
        self.instances
            .iter()
            .filter(|i| i.kind == kind)
            .filter(|i| Self::apply_config(i, config).is_ok())
            .count()
    }

    /// Change only the fields set in `patch` on one instance.
    pub fn update(&mut self, id: &str, patch: &ConfigPatch) -> Result<(), RegistryError> {
        let instance = self.instance(id)?;
        Self::apply_patch(instance, patch)
    }

    /// Change only the fields set in `patch` on every instance of `kind`.
    pub fn update_kind(&mut self, kind: WidgetKind, patch: &ConfigPatch) -> usize {
        self.instances
            .iter()
            .filter(|i| i.kind == kind)
            .filter(|i| Self::apply_patch(i, patch).is_ok())
            .count()
    }

    fn apply_patch(instance: &WidgetInstance, patch: &ConfigPatch) -> Result<(), RegistryError> {
        let current = instance
            .core
            .try_borrow()
            .map_err(|_| RegistryError::Busy(instance.id.clone()))?
            .resolved
            .config;
        Self::apply_config(instance, &patch.apply(&current))
    }

    fn apply_config(instance: &WidgetInstance, config: &SimConfig) -> Result<(), RegistryError> {
        let mut core = instance
            .core
            .try_borrow_mut()
            .map_err(|_| RegistryError::Busy(instance.id.clone()))?;
        let resolved = resolve(instance.kind, config);
        if resolved.config != *config {
            debug!(
                "{}: config {:?} clamped to {:?}",
                instance.id, config, resolved.config
            );
        }
        core.pacer.retune(&resolved.pacing);
        core.resolved = resolved;
        Ok(())
    }

    /// A copy of an instance's simulation state.
    pub fn state(&self, id: &str) -> Result<SimulationState, RegistryError> {
        let instance = self.instance(id)?;
        let core = instance
            .core
            .try_borrow()
            .map_err(|_| RegistryError::Busy(id.to_string()))?;
        Ok(core.state.clone())
    }

    pub fn instances(&self) -> Vec<InstanceInfo> {
        self.instances
            .iter()
            .filter_map(|i| {
                let core = i.core.try_borrow().ok()?;
                Some(InstanceInfo {
                    id: i.id.clone(),
                    kind: i.kind,
                    is_duplicate: i.is_duplicate,
                    title: i.title(),
                    config: core.resolved.config,
                    dimensions: core.dims,
                    steps: core.steps,
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> ActiveWidgets {
        ActiveWidgets {
            widgets: self
                .instances()
                .into_iter()
                .map(|i| PersistedWidget {
                    id: i.id,
                    kind: i.kind.key().to_string(),
                    is_duplicate: Some(i.is_duplicate),
                    config: i.config,
                })
                .collect(),
        }
    }

    /// Recreate the instances in `saved` with fresh simulation state. Returns how many were created.
    pub fn restore(&mut self, saved: &ActiveWidgets) -> usize {
        let mut created = 0;
        for w in &saved.widgets {
            let kind: WidgetKind = match w.kind.parse() {
                Ok(kind) => kind,
                Err(e) => {
                    warn!("Skipping saved widget {}: {}", w.id, e);
                    continue;
                }
            };
            let is_duplicate = w.is_duplicate.unwrap_or_else(|| w.id.contains('-'));
            if !is_duplicate {
                if !self.is_active(kind) {
                    self.activate(kind, &w.config);
                    created += 1;
                }
                continue;
            }
            let id = match kind.duplicate_stamp(&w.id) {
                Some(_) if self.contains(&w.id) => continue,
                Some(stamp) => {
                    self.ids.observe(stamp);
                    w.id.clone()
                }
                None => {
                    let id = self.next_duplicate_id(kind);
                    warn!(
                        "Saved widget id {:?} is not a {} duplicate id, restoring as {}",
                        w.id, kind, id
                    );
                    id
                }
            };
            self.spawn(id, kind, true, &w.config);
            created += 1;
        }
        info!("Restored {} widget instance(s)", created);
        created
    }
}
