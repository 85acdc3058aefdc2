use bevy::prelude::*;

use crate::resources::{AerialMapDisplay, AerialMapSettings, DebugSettings};

const ALPHA_STEP: f32 = 0.1;

/// Keyboard shortcuts for the display parameters
pub fn handle_display_controls(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<AerialMapSettings>,
    mut display: ResMut<AerialMapDisplay>,
    mut debug_settings: ResMut<DebugSettings>,
) {
    // Reload imagery around the current reference with R
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        display.0.request_reload();
        info!("Reloading aerial imagery");
    }

    // Toggle the display with E
    if keyboard_input.just_pressed(KeyCode::KeyE) {
        settings.enabled = !settings.enabled;
        info!("Aerial map: {}", if settings.enabled { "ON" } else { "OFF" });
    }

    // Toggle draw-under with U
    if keyboard_input.just_pressed(KeyCode::KeyU) {
        settings.draw_under = !settings.draw_under;
        info!("Draw under: {}", if settings.draw_under { "ON" } else { "OFF" });
    }

    if keyboard_input.just_pressed(KeyCode::BracketLeft) {
        settings.alpha = (settings.alpha - ALPHA_STEP).max(0.0);
    }
    if keyboard_input.just_pressed(KeyCode::BracketRight) {
        settings.alpha = (settings.alpha + ALPHA_STEP).min(1.0);
    }

    if keyboard_input.just_pressed(KeyCode::F3) {
        debug_settings.debug_mode = !debug_settings.debug_mode;
        info!("Debug logging: {}", if debug_settings.debug_mode { "ON" } else { "OFF" });
    }
}
