use bevy::prelude::*;

use crate::components::StatusText;
use crate::resources::AerialMapDisplay;
use crate::tile_system::{DisplayStatus, LatLon, StatusLevel};

/// Sets up the UI elements
pub fn setup_ui(mut commands: Commands) {
    commands.spawn((
        Text::new("No fix received"),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            bottom: Val::Px(10.0),
            ..default()
        },
        // Add background color for readability
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.5)),
        StatusText,
    ));
}

/// Text shown in the status line
pub fn status_line(status: &DisplayStatus, reference: Option<LatLon>) -> String {
    let level = match status.level {
        StatusLevel::Ok => "OK",
        StatusLevel::Warn => "WARN",
        StatusLevel::Error => "ERROR",
    };
    match reference {
        Some(reference) => format!(
            "[{level}] {}\nReference: {:.6}, {:.6}",
            status.message, reference.latitude, reference.longitude
        ),
        None => format!("[{level}] {}", status.message),
    }
}

fn status_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Ok => Color::WHITE,
        StatusLevel::Warn => Color::srgb(1.0, 0.8, 0.2),
        StatusLevel::Error => Color::srgb(1.0, 0.3, 0.3),
    }
}

/// Mirrors the display status into the UI text
pub fn update_status_text(
    display: Res<AerialMapDisplay>,
    mut query: Query<(&mut Text, &mut TextColor), With<StatusText>>,
) {
    if let Ok((mut text, mut color)) = query.get_single_mut() {
        let status = display.0.status();
        let line = status_line(status, display.0.reference());
        if text.0 != line {
            text.0 = line;
            color.0 = status_color(status.level);
        }
    }
}
