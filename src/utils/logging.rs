use crate::tile_system::CompositeTexture;

/// Logs a formatted message only when debug mode is enabled
#[macro_export]
macro_rules! debug_log {
    ($debug_settings:expr, $($arg:tt)*) => {
        if $debug_settings.debug_mode {
            bevy::prelude::info!($($arg)*);
        }
    };
}

/// One-line summary of a finished composite for the debug log
pub fn format_composite(composite: &CompositeTexture) -> String {
    format!(
        "Composite {}x{} px over {:.0}x{:.0} m: {}/{} tiles loaded ({:?})",
        composite.width,
        composite.height,
        composite.ground_width,
        composite.ground_height,
        composite.loaded,
        composite.loaded + composite.failed,
        composite.status
    )
}
