//! UI colors: a built-in palette with optional overrides from the
//! `[theme]` table of the config file.

use ratatui::style::Color;

use crate::config::ThemeConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Focused borders, key hints
    pub success: Color,     // Healthy indicator, success messages
    pub warning: Color,     // Checking indicator, busy button
    pub danger: Color,      // Unhealthy indicator, errors
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Secondary text
    pub inactive: Color,    // Unfocused borders
    pub header: Color,      // Help section headers
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(250, 179, 135),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            danger: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
        }
    }
}

impl Theme {
    /// Defaults with any valid overrides applied; invalid values are logged
    /// and ignored.
    pub fn from_config(config: Option<&ThemeConfig>) -> Self {
        let mut theme = Self::default();
        let Some(config) = config else {
            return theme;
        };

        let slots: [(&Option<String>, &mut Color, &str); 6] = [
            (&config.accent, &mut theme.accent, "accent"),
            (&config.success, &mut theme.success, "success"),
            (&config.warning, &mut theme.warning, "warning"),
            (&config.danger, &mut theme.danger, "danger"),
            (&config.text, &mut theme.text, "text"),
            (&config.text_dim, &mut theme.text_dim, "text_dim"),
        ];

        for (value, slot, name) in slots {
            if let Some(raw) = value {
                match parse_hex_color(raw) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring invalid theme color {} = {:?}", name, raw),
                }
            }
        }

        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }

    match s.len() {
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
