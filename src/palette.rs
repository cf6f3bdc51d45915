//! Urgency presentation
//!
//! Colours, icons and text symbols for each urgency level. Icons and symbols
//! carry the same information as the colours so that listings stay readable
//! without colour.

use crate::dates::UrgencyLevel;
use serde::Serialize;

const COMPLETED_FOREGROUND: &str = "#888888";
const COMPLETED_BACKGROUND: &str = "#f5f5f5";

pub fn foreground(level: UrgencyLevel) -> &'static str {
    match level {
        UrgencyLevel::Overdue => "#ff4444",
        UrgencyLevel::Urgent => "#ff8800",
        UrgencyLevel::Warning => "#ffcc00",
        UrgencyLevel::Normal => "#000000",
    }
}

pub fn background(level: UrgencyLevel) -> &'static str {
    match level {
        UrgencyLevel::Overdue => "#ffe6e6",
        UrgencyLevel::Urgent => "#fff2e6",
        UrgencyLevel::Warning => "#fffbe6",
        UrgencyLevel::Normal => "#ffffff",
    }
}

pub fn icon(level: UrgencyLevel, completed: bool) -> &'static str {
    if completed {
        return "✅";
    }
    match level {
        UrgencyLevel::Overdue => "🔴",
        UrgencyLevel::Urgent => "🟠",
        UrgencyLevel::Warning => "🟡",
        UrgencyLevel::Normal => "⚪",
    }
}

pub fn symbol(level: UrgencyLevel, completed: bool) -> &'static str {
    if completed {
        return "✓";
    }
    match level {
        UrgencyLevel::Overdue => "!!!",
        UrgencyLevel::Urgent => "!!",
        UrgencyLevel::Warning => "!",
        UrgencyLevel::Normal => "",
    }
}

/// Text for screen readers
pub fn description(level: UrgencyLevel, completed: bool) -> &'static str {
    if completed {
        return "Completed";
    }
    match level {
        UrgencyLevel::Overdue => "Overdue - very urgent",
        UrgencyLevel::Urgent => "Due within 24 hours - urgent",
        UrgencyLevel::Warning => "Due within 3 days - needs attention",
        UrgencyLevel::Normal => "Normal priority",
    }
}

/// Everything needed to render one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Style {
    pub foreground: &'static str,
    pub background: &'static str,
    pub icon: &'static str,
    pub symbol: &'static str,
    pub description: &'static str,
    pub bold: bool,
    pub strikethrough: bool,
}

pub fn style_for(level: UrgencyLevel, completed: bool) -> Style {
    if completed {
        return Style {
            foreground: COMPLETED_FOREGROUND,
            background: COMPLETED_BACKGROUND,
            icon: icon(level, true),
            symbol: symbol(level, true),
            description: description(level, true),
            bold: false,
            strikethrough: true,
        };
    }

    Style {
        foreground: foreground(level),
        background: background(level),
        icon: icon(level, false),
        symbol: symbol(level, false),
        description: description(level, false),
        bold: matches!(level, UrgencyLevel::Overdue | UrgencyLevel::Urgent),
        strikethrough: false,
    }
}

/// Parse `#rrggbb`; anything else is `None`
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let digits = color.trim().strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Black or white, whichever reads better on `background`
///
/// Unparseable input is treated as black.
pub fn contrast_color(background: &str) -> &'static str {
    let (r, g, b) = parse_hex(background).unwrap_or((0, 0, 0));
    let brightness = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    if brightness > 128.0 { "#000000" } else { "#ffffff" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_colours() {
        assert_eq!(foreground(UrgencyLevel::Overdue), "#ff4444");
        assert_eq!(background(UrgencyLevel::Warning), "#fffbe6");
        assert_eq!(icon(UrgencyLevel::Urgent, false), "🟠");
        assert_eq!(symbol(UrgencyLevel::Normal, false), "");
    }

    #[test]
    fn test_style_for_completed_overrides_level() {
        let style = style_for(UrgencyLevel::Overdue, true);
        assert_eq!(style.foreground, "#888888");
        assert_eq!(style.background, "#f5f5f5");
        assert_eq!(style.icon, "✅");
        assert_eq!(style.symbol, "✓");
        assert!(style.strikethrough);
        assert!(!style.bold);
    }

    #[test]
    fn test_style_for_bold_levels() {
        assert!(style_for(UrgencyLevel::Overdue, false).bold);
        assert!(style_for(UrgencyLevel::Urgent, false).bold);
        assert!(!style_for(UrgencyLevel::Warning, false).bold);
        assert!(!style_for(UrgencyLevel::Normal, false).bold);
    }

    #[test]
    fn test_hex_conversion() {
        assert_eq!(parse_hex("#ff8800"), Some((255, 136, 0)));
        assert_eq!(parse_hex("ff8800"), None);
        assert_eq!(parse_hex("#ff88"), None);
        assert_eq!(parse_hex("#gg8800"), None);
        assert_eq!(to_hex(255, 136, 0), "#ff8800");
    }

    #[test]
    fn test_contrast_color() {
        assert_eq!(contrast_color("#ffffff"), "#000000");
        assert_eq!(contrast_color("#ffe6e6"), "#000000");
        assert_eq!(contrast_color("#000000"), "#ffffff");
        assert_eq!(contrast_color("#ff4444"), "#ffffff");
        assert_eq!(contrast_color("bogus"), "#ffffff");
    }
}
