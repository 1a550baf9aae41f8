use eframe::egui::{self, Color32};

use crate::models::EntryStatus;

// Button roles
pub const PRIMARY_BUTTON_BG: Color32 = Color32::from_rgb(46, 125, 50); // Download
pub const ACCENT_BUTTON_BG: Color32 = Color32::from_rgb(39, 174, 96); // Resume
pub const DANGER_BUTTON_BG: Color32 = Color32::from_rgb(220, 53, 69); // Stop
pub const SECONDARY_BUTTON_BG: Color32 = Color32::from_rgb(75, 90, 78); // Utility
pub const EXIT_BUTTON_BG: Color32 = Color32::from_rgb(95, 111, 97);

// Text Colors
pub const BUTTON_MAIN_TEXT: Color32 = Color32::from_rgb(255, 255, 255);
pub const SECONDARY_TEXT: Color32 = Color32::from_rgb(138, 138, 143);
pub const TEXT_ERROR: Color32 = Color32::from_rgb(179, 38, 30);
pub const TEXT_SUCCESS: Color32 = Color32::from_rgb(26, 127, 55);

// UI Elements
pub const BORDER_COLOR: Color32 = Color32::from_rgb(58, 63, 65);
pub const PANEL_BG: Color32 = Color32::from_rgb(248, 248, 248);

// Sizing & Spacing
pub const ROUNDING_FRAME: f32 = 4.0;
pub const ROUNDING_BUTTON: f32 = 8.0;
pub const MIN_SIZE_BUTTON: egui::Vec2 = egui::Vec2::new(96.0, 34.0);
pub const BUTTON_FONT_SIZE: f32 = 14.0;
pub const LIST_HEIGHT: f32 = 120.0;

pub fn entry_color(status: EntryStatus) -> Color32 {
    match status {
        EntryStatus::Active => Color32::DARK_GRAY,
        EntryStatus::Success => TEXT_SUCCESS,
        EntryStatus::Error => TEXT_ERROR,
    }
}
