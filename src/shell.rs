//! ==============================================================================
//! shell.rs - page navigation and sidebar state machine
//! ==============================================================================
//!
//! purpose:
//!     pure view-state machine behind the dashboard chrome: which of the
//!     five pages is active, whether the sidebar is open, and how both react
//!     to viewport changes around the mobile breakpoint. no I/O here; the
//!     server feeds events in and renders from the resulting state.
//!
//! ==============================================================================

use serde::{Deserialize, Serialize};

/// viewport width below which the layout switches to mobile
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// the five mutually exclusive console pages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Dashboard,
    Batch,
    Alerts,
    Profile,
    Settings,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Dashboard,
        Page::Batch,
        Page::Alerts,
        Page::Profile,
        Page::Settings,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Batch => "batch",
            Page::Alerts => "alerts",
            Page::Profile => "profile",
            Page::Settings => "settings",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.slug() == slug)
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Batch => "Batch Planning",
            Page::Alerts => "Early Warnings",
            Page::Profile => "Farmer Profile",
            Page::Settings => "Settings",
        }
    }
}

/// navigation + sidebar view state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Shell {
    pub active: Page,
    pub sidebar_open: bool,
    pub viewport_px: u32,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            active: Page::Dashboard,
            sidebar_open: true,
            viewport_px: 1024,
        }
    }
}

impl Shell {
    pub fn is_mobile(&self) -> bool {
        self.viewport_px < MOBILE_BREAKPOINT_PX
    }

    /// switch pages; in mobile mode the sidebar closes after navigating
    pub fn navigate(&mut self, page: Page) {
        self.active = page;
        if self.is_mobile() {
            self.sidebar_open = false;
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// viewport resize: growing past the breakpoint reopens the sidebar,
    /// shrinking below it closes an open one
    pub fn viewport_resized(&mut self, width_px: u32) {
        self.viewport_px = width_px;
        if !self.is_mobile() {
            self.sidebar_open = true;
        } else {
            self.sidebar_open = false;
        }
    }

    /// click outside the sidebar; only dismisses it in mobile mode
    pub fn click_outside(&mut self) {
        if self.is_mobile() {
            self.sidebar_open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_slugs_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::from_slug(page.slug()), Some(page));
        }
        assert_eq!(Page::from_slug("nonsense"), None);
    }

    #[test]
    fn desktop_navigation_keeps_sidebar_open() {
        let mut shell = Shell::default();
        shell.navigate(Page::Alerts);
        assert_eq!(shell.active, Page::Alerts);
        assert!(shell.sidebar_open);
    }

    #[test]
    fn mobile_navigation_closes_sidebar() {
        let mut shell = Shell::default();
        shell.viewport_resized(500);
        shell.toggle_sidebar();
        assert!(shell.sidebar_open);

        shell.navigate(Page::Settings);
        assert_eq!(shell.active, Page::Settings);
        assert!(!shell.sidebar_open);
    }

    #[test]
    fn shrinking_below_breakpoint_closes_open_sidebar() {
        let mut shell = Shell::default();
        assert!(shell.sidebar_open);

        shell.viewport_resized(500);
        assert!(shell.is_mobile());
        assert!(!shell.sidebar_open);
    }

    #[test]
    fn growing_past_breakpoint_reopens_sidebar() {
        let mut shell = Shell::default();
        shell.viewport_resized(500);
        assert!(!shell.sidebar_open);

        shell.viewport_resized(1024);
        assert!(!shell.is_mobile());
        assert!(shell.sidebar_open);
    }

    #[test]
    fn click_outside_only_dismisses_in_mobile_mode() {
        let mut shell = Shell::default();
        shell.click_outside();
        assert!(shell.sidebar_open);

        shell.viewport_resized(500);
        shell.toggle_sidebar();
        assert!(shell.sidebar_open);
        shell.click_outside();
        assert!(!shell.sidebar_open);
    }

    #[test]
    fn breakpoint_boundary_is_exclusive() {
        let mut shell = Shell::default();
        shell.viewport_resized(768);
        assert!(!shell.is_mobile());
        shell.viewport_resized(767);
        assert!(shell.is_mobile());
    }
}
