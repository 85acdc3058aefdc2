pub mod compositor;
pub mod engine;
pub mod fetch;
pub mod fetcher;
pub mod planner;
pub mod projection;
pub mod rendering;
pub mod tracker;
pub mod types;

// Re-export main types
pub use compositor::{assemble, CompositeStatus, CompositeTexture};
pub use engine::{AerialMapEngine, DisplayConfig, DisplayHost, DisplayStatus, FixSink, StatusLevel};
pub use fetch::{Completion, FetchCoordinator, FetchSession, RequestId, SessionId, SessionProgress};
pub use fetcher::{HttpTileFetcher, TileFetcher};
pub use planner::{plan_grid, Footprint};
pub use tracker::{AlignmentTracker, StagedFix, TrackerState};
pub use types::*;
