//! The display core: ties fix tracking, planning, fetching and compositing
//! together behind a once-per-frame `update` and a narrow host interface.

use std::sync::Arc;

use bevy::log::{info, warn};
use bevy::prelude::*;

use crate::tile_system::compositor::{assemble, CompositeStatus, CompositeTexture};
use crate::tile_system::fetch::{FetchCoordinator, SessionProgress};
use crate::tile_system::planner::{plan_grid, Footprint};
use crate::tile_system::projection::zoom_for_resolution;
use crate::tile_system::tracker::AlignmentTracker;
use crate::tile_system::types::{AerialMapError, LatLon, MapTransform, NavSatFix, Offset};

/// Snapshot of the user-editable parameters, read once per update
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Meters per composite pixel
    pub resolution: f32,
    /// Ground extent in meters
    pub width: u32,
    pub height: u32,
    /// Passed through to the host's material
    pub alpha: f32,
    pub draw_under: bool,
    /// Explicit zoom; derived from `resolution` when `None`
    pub zoom: Option<u8>,
    pub tile_size: u32,
    /// Identity of the fix source
    pub topic: String,
    pub enabled: bool,
    pub fixed_frame: String,
}

impl DisplayConfig {
    fn footprint(&self) -> Footprint {
        Footprint {
            width: self.width as f64,
            height: self.height as f64,
            resolution: self.resolution as f64,
        }
    }

    fn zoom_for(&self, reference: LatLon) -> u8 {
        self.zoom.unwrap_or_else(|| {
            zoom_for_resolution(reference.latitude, self.resolution as f64, self.tile_size)
        })
    }

    fn same_imagery(&self, other: &DisplayConfig) -> bool {
        self.resolution == other.resolution
            && self.width == other.width
            && self.height == other.height
            && self.zoom == other.zoom
            && self.tile_size == other.tile_size
    }
}

/// The collaborator that owns the scene: it supplies parameters and receives
/// everything the core produces.
pub trait DisplayHost {
    fn current_config(&self) -> DisplayConfig;
    fn on_composite_ready(&mut self, composite: &CompositeTexture);
    fn on_transform_ready(&mut self, transform: MapTransform);
    fn on_material_changed(&mut self, alpha: f32, draw_under: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLevel {
    Ok,
    Warn,
    Error,
}

/// One-line health report for the user
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayStatus {
    pub level: StatusLevel,
    pub message: String,
}

impl DisplayStatus {
    fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Handed to the fix subscription; may be used from any thread
#[derive(Clone)]
pub struct FixSink(Arc<AlignmentTracker>);

impl FixSink {
    pub fn on_coordinate_received(&self, msg: NavSatFix) -> Result<(), AerialMapError> {
        self.0.on_fix_received(msg.into())
    }
}

pub struct AerialMapEngine {
    tracker: Arc<AlignmentTracker>,
    coordinator: FetchCoordinator,
    applied: Option<DisplayConfig>,
    /// Latest displacement from the reference fix
    offset: Offset,
    reload_requested: bool,
    transform_dirty: bool,
    status: DisplayStatus,
}

impl AerialMapEngine {
    pub fn new(coordinator: FetchCoordinator) -> Self {
        Self {
            tracker: Arc::new(AlignmentTracker::new()),
            coordinator,
            applied: None,
            offset: Offset::ZERO,
            reload_requested: false,
            transform_dirty: false,
            status: DisplayStatus::new(StatusLevel::Warn, "No fix received"),
        }
    }

    pub fn fix_sink(&self) -> FixSink {
        FixSink(self.tracker.clone())
    }

    pub fn status(&self) -> &DisplayStatus {
        &self.status
    }

    pub fn reference(&self) -> Option<LatLon> {
        self.tracker.reference()
    }

    pub fn progress(&self) -> Option<SessionProgress> {
        self.coordinator.progress()
    }

    /// Re-plan and re-fetch around the current reference on the next update
    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }

    /// Forget the reference and drop any session in flight
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.coordinator.cancel();
        self.offset = Offset::ZERO;
        self.reload_requested = false;
        self.transform_dirty = false;
        self.status = DisplayStatus::new(StatusLevel::Warn, "No fix received");
    }

    /// Where the composite quad goes in the local east/north/up frame, whose
    /// origin follows the latest fix. The footprint is centered on the
    /// reference, so the quad sits at minus the current offset.
    pub fn transform(&self) -> MapTransform {
        MapTransform {
            position: Vec3::new(-self.offset.east as f32, -self.offset.north as f32, 0.0),
            orientation: Quat::IDENTITY,
        }
    }

    /// The per-frame step. Never blocks.
    pub fn update(&mut self, host: &mut impl DisplayHost) {
        let config = host.current_config();
        self.apply_config(&config, host);
        if !config.enabled {
            return;
        }

        if let Some(staged) = self.tracker.drain_if_available() {
            self.offset = staged.offset;
            self.transform_dirty = true;
            if staged.new_reference {
                self.reload_requested = true;
            }
        }

        if self.reload_requested {
            if let Some(reference) = self.tracker.reference() {
                self.reload_requested = false;
                self.load_imagery(reference, &config);
            }
        }

        if self.transform_dirty && self.tracker.reference().is_some() {
            self.transform_dirty = false;
            host.on_transform_ready(self.transform());
        }

        if let Some(session) = self.coordinator.take_resolved() {
            let composite = assemble(session.grid());
            self.report_composite(&composite);
            host.on_composite_ready(&composite);
        }
    }

    fn apply_config(&mut self, config: &DisplayConfig, host: &mut impl DisplayHost) {
        match self.applied.take() {
            None => host.on_material_changed(config.alpha, config.draw_under),
            Some(previous) => {
                if previous.topic != config.topic || previous.enabled != config.enabled {
                    info!("Fix source or enable state changed, resetting aerial map");
                    self.reset();
                } else if !previous.same_imagery(config) {
                    self.reload_requested = true;
                }
                if previous.alpha != config.alpha || previous.draw_under != config.draw_under {
                    host.on_material_changed(config.alpha, config.draw_under);
                }
                if previous.fixed_frame != config.fixed_frame {
                    self.transform_dirty = true;
                }
            }
        }
        self.applied = Some(config.clone());
    }

    fn load_imagery(&mut self, reference: LatLon, config: &DisplayConfig) {
        let zoom = config.zoom_for(reference);
        match plan_grid(reference, config.footprint(), zoom, config.tile_size) {
            Ok(grid) => {
                let tiles = grid.slots.len();
                let session = self.coordinator.begin_session(grid);
                let issued = self.coordinator.issue_all();
                info!("Session {session}: requested {issued}/{tiles} tiles at zoom {zoom}");
                self.status = DisplayStatus::new(
                    StatusLevel::Ok,
                    format!("Loading {tiles} tiles at zoom {zoom}"),
                );
            }
            Err(err) => {
                warn!("Cannot plan aerial imagery: {err}");
                self.coordinator.cancel();
                self.status = DisplayStatus::new(StatusLevel::Error, err.to_string());
            }
        }
    }

    fn report_composite(&mut self, composite: &CompositeTexture) {
        let total = composite.loaded + composite.failed;
        self.status = match composite.status {
            CompositeStatus::Complete => {
                DisplayStatus::new(StatusLevel::Ok, format!("Loaded {total} tiles"))
            }
            CompositeStatus::Partial => DisplayStatus::new(
                StatusLevel::Warn,
                format!("Loaded {}/{total} tiles", composite.loaded),
            ),
            CompositeStatus::Empty => {
                warn!("None of the {total} aerial tiles could be loaded");
                DisplayStatus::new(StatusLevel::Warn, "No imagery could be loaded")
            }
        };
    }
}
