use bevy::log::{debug, warn};
use parking_lot::Mutex;

use crate::tile_system::projection::{local_offset, validate};
use crate::tile_system::types::{AerialMapError, LatLon, Offset};

/// Whether a reference fix has been adopted yet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerState {
    Unset,
    Tracking { reference: LatLon },
}

/// The newest fix not yet consumed by the update loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedFix {
    pub fix: LatLon,
    /// Displacement of `fix` from the reference fix
    pub offset: Offset,
    /// A reference was adopted since the last drain
    pub new_reference: bool,
}

#[derive(Default)]
struct Inner {
    reference: Option<LatLon>,
    pending: Option<StagedFix>,
}

/// Anchors the local frame on the first accepted fix and stages the offset
/// of the latest one for the update loop.
///
/// Writers (the fix subscription) and the reader (the update loop) may run on
/// different threads; both only ever hold the lock to copy a few values.
#[derive(Default)]
pub struct AlignmentTracker {
    inner: Mutex<Inner>,
}

impl AlignmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `fix`, replacing any fix the update loop has not drained yet.
    ///
    /// Fixes outside the projection are rejected and leave the tracker as it
    /// was.
    pub fn on_fix_received(&self, fix: LatLon) -> Result<(), AerialMapError> {
        if let Err(err) = validate(fix) {
            warn!("Rejecting GPS fix: {err}");
            return Err(err);
        }

        let mut inner = self.inner.lock();
        let reference = inner.reference;
        let staged = match reference {
            None => {
                debug!("Adopting reference fix ({}, {})", fix.latitude, fix.longitude);
                inner.reference = Some(fix);
                StagedFix {
                    fix,
                    offset: Offset::ZERO,
                    new_reference: true,
                }
            }
            Some(reference) => StagedFix {
                fix,
                offset: local_offset(reference, fix)?,
                new_reference: inner.pending.is_some_and(|p| p.new_reference),
            },
        };
        inner.pending = Some(staged);
        Ok(())
    }

    /// Take the staged fix, if one arrived since the last call
    pub fn drain_if_available(&self) -> Option<StagedFix> {
        self.inner.lock().pending.take()
    }

    /// Forget the reference and any staged fix
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.reference = None;
        inner.pending = None;
    }

    pub fn reference(&self) -> Option<LatLon> {
        self.inner.lock().reference
    }

    pub fn state(&self) -> TrackerState {
        match self.reference() {
            None => TrackerState::Unset,
            Some(reference) => TrackerState::Tracking { reference },
        }
    }
}
