mod app;
mod forms;
mod render;
mod terminal;

pub use app::{App, DeferredAction, Screen};
pub use render::render;
pub use terminal::{edit_file, restore_terminal, run_command};

use ratatui::style::Color;

#[derive(Clone, Copy)]
pub struct Theme {
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: color_from_hex("#5E81AC").unwrap_or(Color::Blue),
            accent: color_from_hex("#D08770").unwrap_or(Color::Yellow),
            highlight: color_from_hex("#76B3C5").unwrap_or(Color::Cyan),
            background: color_from_hex("#3B4252").unwrap_or(Color::Black),
            surface: color_from_hex("#434C5E").unwrap_or(Color::DarkGray),
            text: color_from_hex("#ECEFF4").unwrap_or(Color::White),
            muted: color_from_hex("#8F9BB3").unwrap_or(Color::Gray),
        }
    }
}

fn color_from_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
