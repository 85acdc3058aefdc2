pub mod constants;
pub mod display;
pub mod runtime;
pub mod settings;

pub use constants::*;
pub use display::*;
pub use runtime::*;
pub use settings::*;
