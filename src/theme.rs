//! Light/dark theme switching.
//!
//! The active theme lives on the controller; every change is written through
//! to the session so the next start picks it up.

use colored::Color;

use crate::session::{Session, Theme};

pub const MOON_ICON: &str = "☾";
pub const SUN_ICON: &str = "☀";

/// Terminal colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub good: Color,
    pub warn: Color,
    pub bad: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                accent: Color::Blue,
                text: Color::Black,
                muted: Color::BrightBlack,
                good: Color::Green,
                warn: Color::Yellow,
                bad: Color::Red,
            },
            Theme::Dark => Self {
                accent: Color::BrightCyan,
                text: Color::BrightWhite,
                muted: Color::White,
                good: Color::BrightGreen,
                warn: Color::BrightYellow,
                bad: Color::BrightRed,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeController {
    session: Session,
    current: Theme,
}

impl ThemeController {
    /// Load the stored preference, `Light` when none is stored.
    pub fn init(session: Session) -> Self {
        let current = session.theme();
        let controller = Self { session, current };
        controller.persist();
        controller
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// Invert the current theme and persist it.
    pub fn toggle(&mut self) -> Theme {
        self.set(self.current.toggled());
        self.current
    }

    pub fn set(&mut self, theme: Theme) {
        self.current = theme;
        self.persist();
    }

    /// Sun while dark, moon while light.
    pub fn icon(&self) -> &'static str {
        match self.current {
            Theme::Dark => SUN_ICON,
            Theme::Light => MOON_ICON,
        }
    }

    pub fn palette(&self) -> Palette {
        Palette::for_theme(self.current)
    }

    fn persist(&self) {
        // The theme is cosmetic; a read-only home directory must not break the UI.
        let _ = self.session.set_theme(self.current);
    }
}
