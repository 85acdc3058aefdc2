pub mod aerial_map;
pub mod controls;
pub mod fix_input;
pub mod setup;
pub mod ui;
