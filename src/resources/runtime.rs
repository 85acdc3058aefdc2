use bevy::prelude::*;
use tokio::runtime::Runtime;

/// Tokio runtime the tile downloads run on, alongside bevy's own executor
#[derive(Resource)]
pub struct TokioRuntime(pub Runtime);
