//! Clinical color palette and styles.
//!
//! Risk colors come from `RiskCategory::color` so the palette and the
//! domain stay in step.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{RiskCategory, Severity};

/// Medical theme color palette.
pub struct MedicalTheme;

impl MedicalTheme {
    // === Primary Colors ===

    /// Deep teal - Primary color (trust, medical)
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136); // #0D9488

    /// Lighter teal for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF

    /// Darker teal for accents
    pub const PRIMARY_DARK: Color = Color::Rgb(15, 118, 110); // #0F766E

    /// Light slate for borders
    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    // === Semantic Colors ===

    /// Emerald - Success/healthy
    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981

    /// Amber - Warning/moderate risk
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24

    /// Rose - Error/high risk
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E

    /// Blue - Info
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    // === Text Colors ===

    /// Primary text (white)
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC

    /// Secondary text (gray)
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8

    /// Muted text
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    // === Preset Styles ===

    /// Style for titles
    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for subtitles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for normal text
    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    /// Style for secondary text
    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for muted text
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    /// Style for success messages
    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    /// Style for warning messages
    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    /// Style for danger/error messages
    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Style for info messages
    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Style for focused elements
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for borders
    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    /// Style for focused borders
    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Style for the header
    #[must_use]
    pub fn header() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY_DARK)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key hints
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key descriptions
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for a risk category
    #[must_use]
    pub fn risk_category(category: RiskCategory) -> Style {
        let (r, g, b) = category.color();
        Style::default().fg(Color::Rgb(r, g, b))
    }

    /// Style for a contributing-factor severity tag
    #[must_use]
    pub fn severity(severity: Severity) -> Style {
        match severity {
            Severity::Moderate => Self::warning(),
            Severity::High => Self::danger(),
            Severity::Critical => Self::danger().add_modifier(Modifier::BOLD),
        }
    }

    /// Gauge style for a model metric in [0, 1]
    #[must_use]
    pub fn gauge(value: f64) -> Style {
        if value >= 0.7 {
            Self::success()
        } else if value >= 0.5 {
            Self::warning()
        } else {
            Self::danger()
        }
    }

    /// Style for the input cursor
    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_thresholds() {
        assert_eq!(MedicalTheme::gauge(0.85), MedicalTheme::success());
        assert_eq!(MedicalTheme::gauge(0.7), MedicalTheme::success());
        assert_eq!(MedicalTheme::gauge(0.6), MedicalTheme::warning());
        assert_eq!(MedicalTheme::gauge(0.2), MedicalTheme::danger());
    }

    #[test]
    fn test_severity_styles_escalate() {
        assert_eq!(MedicalTheme::severity(Severity::Moderate), MedicalTheme::warning());
        assert_eq!(MedicalTheme::severity(Severity::High), MedicalTheme::danger());
        assert_ne!(MedicalTheme::severity(Severity::Critical), MedicalTheme::danger());
    }

    #[test]
    fn test_risk_category_uses_category_color() {
        let (r, g, b) = RiskCategory::High.color();
        assert_eq!(MedicalTheme::risk_category(RiskCategory::High).fg, Some(Color::Rgb(r, g, b)));
    }
}
