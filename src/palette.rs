//! Colour constants for terminal output, one set per resolved theme.

use crossterm::style::{Color, StyledContent, Stylize};

use crate::theme::{ResolvedTheme, RootMarker};

// Glass-card accents carried over to the terminal.

/// Accent for light mode
pub const CORAL: Color = Color::Rgb { r: 214, g: 82, b: 74 };
/// Accent for dark mode
pub const CYAN: Color = Color::Rgb { r: 94, g: 214, b: 230 };
/// Headings in light mode
pub const DEEP_PURPLE: Color = Color::Rgb { r: 92, g: 46, b: 145 };
/// Headings in dark mode
pub const LAVENDER: Color = Color::Rgb { r: 190, g: 160, b: 255 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub heading: Color,
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    /// Emit plain text when false.
    pub enabled: bool,
}

impl Palette {
    pub fn for_theme(theme: ResolvedTheme, enabled: bool) -> Self {
        match theme {
            ResolvedTheme::Light => Palette {
                heading: DEEP_PURPLE,
                accent: CORAL,
                text: Color::Black,
                muted: Color::DarkGrey,
                enabled,
            },
            ResolvedTheme::Dark => Palette {
                heading: LAVENDER,
                accent: CYAN,
                text: Color::White,
                muted: Color::Grey,
                enabled,
            },
        }
    }

    /// Palette for whatever theme the root marker currently carries.
    pub fn from_root(root: &RootMarker, enabled: bool) -> Self {
        Self::for_theme(root.theme(), enabled)
    }

    pub fn heading(&self, s: &str) -> String {
        self.paint(s.with(self.heading).bold())
    }

    pub fn accent(&self, s: &str) -> String {
        self.paint(s.with(self.accent))
    }

    pub fn text(&self, s: &str) -> String {
        self.paint(s.with(self.text))
    }

    /// Completed tasks are shown dimmed and struck through.
    pub fn done(&self, s: &str) -> String {
        self.paint(s.with(self.muted).crossed_out())
    }

    pub fn muted(&self, s: &str) -> String {
        self.paint(s.with(self.muted))
    }

    fn paint(&self, styled: StyledContent<&str>) -> String {
        if self.enabled {
            styled.to_string()
        } else {
            styled.content().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeRoot;

    #[test]
    fn test_follows_root_marker() {
        let root = RootMarker::new();
        assert_eq!(Palette::from_root(&root, true).accent, CORAL);
        root.apply(ResolvedTheme::Dark);
        assert_eq!(Palette::from_root(&root, true).accent, CYAN);
    }

    #[test]
    fn test_disabled_is_plain() {
        let palette = Palette::for_theme(ResolvedTheme::Dark, false);
        assert_eq!(palette.heading("Tasks"), "Tasks");
        assert_eq!(palette.done("milk"), "milk");
    }

    #[test]
    fn test_enabled_adds_escapes() {
        let palette = Palette::for_theme(ResolvedTheme::Light, true);
        let out = palette.heading("x");
        assert!(out.contains('\u{1b}'));
        assert!(out.contains('x'));
    }
}
