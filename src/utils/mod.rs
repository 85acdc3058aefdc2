pub mod coordinate_conversion;
pub mod logging;
