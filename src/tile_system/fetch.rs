//! Correlates asynchronous tile fetches with the imagery session that
//! requested them.
//!
//! A session is replaced wholesale by the next one. Request ids are never
//! reused, so a completion belonging to a superseded session finds no entry
//! in the current id-to-slot map and is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bevy::log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::resources::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::tile_system::fetcher::{classify_error, TileFetcher};
use crate::tile_system::types::{TileError, TileGrid, TileId, TileSlot, TileState};

pub type RequestId = u64;

/// Identifies one imagery-load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a completion did to the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Request id unknown to the current session
    Stale,
    Pending { outstanding: usize },
    /// This completion was the last one
    Resolved,
}

/// Counters for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub session: SessionId,
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub outstanding: usize,
}

/// One planned grid and the requests issued for it
#[derive(Debug)]
pub struct FetchSession {
    id: SessionId,
    grid: TileGrid,
    outstanding: usize,
    id_to_slot: HashMap<RequestId, usize>,
}

impl FetchSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn slots(&self) -> &[TileSlot] {
        &self.grid.slots
    }

    pub fn into_grid(self) -> TileGrid {
        self.grid
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn is_resolved(&self) -> bool {
        self.outstanding == 0
    }

    pub fn progress(&self) -> SessionProgress {
        let loaded = self.slots().iter().filter(|s| s.state.is_loaded()).count();
        let failed = self.slots().iter().filter(|s| s.state.is_failed()).count();
        SessionProgress {
            session: self.id,
            total: self.slots().len(),
            loaded,
            failed,
            outstanding: self.outstanding,
        }
    }
}

#[derive(Default)]
struct CoordinatorState {
    session: Option<FetchSession>,
    next_session: u64,
    next_request: RequestId,
}

/// Owns the in-flight session; cheap to clone, all clones share it.
#[derive(Clone)]
pub struct FetchCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    fetcher: Arc<dyn TileFetcher>,
    runtime: Handle,
    request_timeout: Duration,
}

impl FetchCoordinator {
    pub fn new(fetcher: Arc<dyn TileFetcher>, runtime: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(CoordinatorState::default())),
            fetcher,
            runtime,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Completions slower than this are recorded as [`TileError::Timeout`]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Start a new session for `grid`, superseding any previous one
    pub fn begin_session(&self, grid: TileGrid) -> SessionId {
        let mut state = self.state.lock();
        state.next_session += 1;
        let id = SessionId(state.next_session);

        if let Some(previous) = state.session.take() {
            if !previous.is_resolved() {
                debug!(
                    "Session {} superseded with {} requests in flight",
                    previous.id, previous.outstanding
                );
            }
        }

        let outstanding = grid.slots.iter().filter(|s| s.state.is_pending()).count();
        state.session = Some(FetchSession {
            id,
            grid,
            outstanding,
            id_to_slot: HashMap::new(),
        });
        id
    }

    /// Drop the current session; its late completions become no-ops
    pub fn cancel(&self) {
        if let Some(session) = self.state.lock().session.take() {
            debug!("Session {} cancelled", session.id);
        }
    }

    /// Allocate a request id for a pending slot of the current session
    pub(crate) fn register(&self, slot_index: usize) -> Option<(RequestId, TileId)> {
        let mut state = self.state.lock();
        let state = &mut *state;
        let session = state.session.as_mut()?;
        let slot = session.grid.slots.get(slot_index)?;
        if !slot.state.is_pending() || session.id_to_slot.values().any(|&i| i == slot_index) {
            return None;
        }
        let tile = slot.tile;

        state.next_request += 1;
        let request_id = state.next_request;
        session.id_to_slot.insert(request_id, slot_index);
        Some((request_id, tile))
    }

    /// Fire off the fetch for one slot. Never blocks; returns `None` when the
    /// slot does not exist, is already resolved or is already in flight.
    pub fn issue(&self, slot_index: usize) -> Option<RequestId> {
        let (request_id, tile) = self.register(slot_index)?;

        let coordinator = self.clone();
        let fetcher = self.fetcher.clone();
        let timeout = self.request_timeout;
        self.runtime.spawn(async move {
            let result = match tokio::time::timeout(timeout, fetcher.fetch(tile)).await {
                Ok(Ok(bytes)) => Ok(bytes),
                Ok(Err(err)) => Err(classify_error(&err)),
                Err(_) => Err(TileError::Timeout),
            };
            coordinator.on_complete(request_id, result);
        });

        Some(request_id)
    }

    /// Issue every pending slot of the current session
    pub fn issue_all(&self) -> usize {
        let count = self
            .state
            .lock()
            .session
            .as_ref()
            .map_or(0, |s| s.grid.slots.len());
        (0..count).filter_map(|i| self.issue(i)).count()
    }

    /// Record the outcome of a request. Safe to call from any thread.
    pub fn on_complete(&self, request_id: RequestId, result: Result<Vec<u8>, TileError>) -> Completion {
        // Cheap sniff outside the lock; full decoding happens when compositing
        let result = result.and_then(|bytes| {
            if bytes.is_empty() {
                Err(TileError::EmptyPayload)
            } else if let Err(err) = image::guess_format(&bytes) {
                Err(TileError::Decode(err.to_string()))
            } else {
                Ok(bytes)
            }
        });

        let mut state = self.state.lock();
        let Some(session) = state.session.as_mut() else {
            debug!("Dropping completion {request_id}: no active session");
            return Completion::Stale;
        };
        let Some(slot_index) = session.id_to_slot.remove(&request_id) else {
            debug!("Dropping stale completion {request_id} (session {} is current)", session.id);
            return Completion::Stale;
        };

        let slot = &mut session.grid.slots[slot_index];
        match result {
            Ok(bytes) => {
                #[cfg(feature = "tile_debug")]
                info!("Tile {} loaded ({} bytes)", slot.tile, bytes.len());
                slot.state = TileState::Loaded(bytes);
            }
            Err(err) => {
                warn!("Failed to load tile {}: {}", slot.tile, err);
                slot.state = TileState::Failed(err);
            }
        }

        session.outstanding -= 1;
        if session.outstanding == 0 {
            let progress = session.progress();
            info!(
                "Session {} resolved: {}/{} tiles loaded",
                progress.session, progress.loaded, progress.total
            );
            Completion::Resolved
        } else {
            Completion::Pending {
                outstanding: session.outstanding,
            }
        }
    }

    /// Hand over the current session once every slot is resolved. Returns it
    /// at most once.
    pub fn take_resolved(&self) -> Option<FetchSession> {
        let mut state = self.state.lock();
        if state.session.as_ref().is_some_and(FetchSession::is_resolved) {
            state.session.take()
        } else {
            None
        }
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.state.lock().session.as_ref().map(FetchSession::id)
    }

    pub fn progress(&self) -> Option<SessionProgress> {
        self.state.lock().session.as_ref().map(FetchSession::progress)
    }

    /// Slot states of the current session, for inspection
    pub fn slot_states(&self) -> Vec<TileState> {
        self.state
            .lock()
            .session
            .as_ref()
            .map(|s| s.slots().iter().map(|slot| slot.state.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bevy::prelude::IVec2;
    use std::io::Cursor;

    fn png_tile(size: u32, rgba: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn grid(columns: u32) -> TileGrid {
        TileGrid {
            slots: (0..columns)
                .map(|x| TileSlot::pending(TileId::new(x, 0, 1), IVec2::new(x as i32 * 4, 0)))
                .collect(),
            width: columns * 4,
            height: 4,
            mosaic_width: columns * 4,
            mosaic_height: 4,
            ground_width: (columns * 4) as f64,
            ground_height: 4.0,
            zoom: 1,
            tile_size: 4,
        }
    }

    /// Answers from a fixed table; tiles missing from it fail
    struct TableFetcher(HashMap<TileId, Vec<u8>>);

    #[async_trait]
    impl TileFetcher for TableFetcher {
        async fn fetch(&self, tile: TileId) -> anyhow::Result<Vec<u8>> {
            self.0
                .get(&tile)
                .cloned()
                .ok_or_else(|| TileError::HttpStatus(404).into())
        }
    }

    /// Never answers
    struct SilentFetcher;

    #[async_trait]
    impl TileFetcher for SilentFetcher {
        async fn fetch(&self, _tile: TileId) -> anyhow::Result<Vec<u8>> {
            std::future::pending().await
        }
    }

    fn coordinator(runtime: &tokio::runtime::Runtime) -> FetchCoordinator {
        FetchCoordinator::new(Arc::new(TableFetcher(HashMap::new())), runtime.handle().clone())
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn resolves_after_last_completion_with_partial_failure() {
        let rt = runtime();
        let coordinator = coordinator(&rt);
        let session = coordinator.begin_session(grid(3));

        let ids: Vec<RequestId> = (0..3).map(|i| coordinator.register(i).unwrap().0).collect();

        assert_eq!(
            coordinator.on_complete(ids[2], Err(TileError::Timeout)),
            Completion::Pending { outstanding: 2 }
        );
        assert!(coordinator.take_resolved().is_none());
        assert_eq!(
            coordinator.on_complete(ids[0], Err(TileError::HttpStatus(500))),
            Completion::Pending { outstanding: 1 }
        );
        assert_eq!(
            coordinator.on_complete(ids[1], Ok(png_tile(4, [255, 0, 0, 255]))),
            Completion::Resolved
        );

        let resolved = coordinator.take_resolved().unwrap();
        assert_eq!(resolved.id(), session);
        let progress = resolved.progress();
        assert_eq!((progress.loaded, progress.failed, progress.outstanding), (1, 2, 0));
        assert!(coordinator.take_resolved().is_none());
    }

    #[test]
    fn stale_completion_leaves_new_session_untouched() {
        let rt = runtime();
        let coordinator = coordinator(&rt);

        coordinator.begin_session(grid(2));
        let (old_id, _) = coordinator.register(0).unwrap();

        let second = coordinator.begin_session(grid(2));
        let (new_id, _) = coordinator.register(0).unwrap();
        assert_ne!(old_id, new_id);

        let before = coordinator.slot_states();
        assert_eq!(coordinator.on_complete(old_id, Ok(png_tile(4, [0; 4]))), Completion::Stale);
        assert_eq!(coordinator.slot_states(), before);
        assert_eq!(coordinator.current_session(), Some(second));
        assert_eq!(coordinator.progress().unwrap().outstanding, 2);
    }

    #[test]
    fn duplicate_and_cancelled_completions_are_no_ops() {
        let rt = runtime();
        let coordinator = coordinator(&rt);
        coordinator.begin_session(grid(2));
        let (id, _) = coordinator.register(1).unwrap();
        assert!(coordinator.register(1).is_none(), "slot already in flight");

        assert_eq!(
            coordinator.on_complete(id, Err(TileError::Timeout)),
            Completion::Pending { outstanding: 1 }
        );
        assert_eq!(coordinator.on_complete(id, Err(TileError::Timeout)), Completion::Stale);

        coordinator.cancel();
        assert_eq!(coordinator.current_session(), None);
        assert_eq!(coordinator.on_complete(id + 1, Ok(vec![1])), Completion::Stale);
    }

    #[test]
    fn empty_or_garbage_payload_fails_the_slot() {
        let rt = runtime();
        let coordinator = coordinator(&rt);
        coordinator.begin_session(grid(2));
        let (a, _) = coordinator.register(0).unwrap();
        let (b, _) = coordinator.register(1).unwrap();

        coordinator.on_complete(a, Ok(Vec::new()));
        coordinator.on_complete(b, Ok(b"<html>rate limited</html>".to_vec()));

        let states = coordinator.take_resolved().unwrap().into_grid().slots;
        assert_eq!(states[0].state, TileState::Failed(TileError::EmptyPayload));
        assert!(matches!(states[1].state, TileState::Failed(TileError::Decode(_))));
    }

    #[test]
    fn issue_all_fetches_through_the_runtime() {
        let rt = runtime();
        let red = png_tile(4, [255, 0, 0, 255]);
        let table = HashMap::from([(TileId::new(0, 0, 1), red.clone()), (TileId::new(2, 0, 1), red)]);
        let coordinator = FetchCoordinator::new(Arc::new(TableFetcher(table)), rt.handle().clone());

        coordinator.begin_session(grid(3));
        assert_eq!(coordinator.issue_all(), 3);
        assert_eq!(coordinator.issue_all(), 0, "nothing left to issue");

        let resolved = rt.block_on(async {
            loop {
                if let Some(session) = coordinator.take_resolved() {
                    break session;
                }
                tokio::task::yield_now().await;
            }
        });

        let slots = resolved.slots();
        assert!(slots[0].state.is_loaded());
        assert_eq!(slots[1].state, TileState::Failed(TileError::HttpStatus(404)));
        assert!(slots[2].state.is_loaded());
    }

    #[test]
    fn hung_request_times_out_as_failed_slot() {
        let rt = runtime();
        let coordinator = FetchCoordinator::new(Arc::new(SilentFetcher), rt.handle().clone())
            .with_request_timeout(Duration::from_millis(20));

        coordinator.begin_session(grid(1));
        coordinator.issue(0).unwrap();

        let resolved = rt.block_on(async {
            loop {
                if let Some(session) = coordinator.take_resolved() {
                    break session;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        assert_eq!(resolved.slots()[0].state, TileState::Failed(TileError::Timeout));
    }
}
