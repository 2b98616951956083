use serde::{Deserialize, Serialize};
use std::fmt;

/// A named navigation destination.
///
/// The set is closed: every screen the application can push is listed here
/// and in [`Route::ALL`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Home,
    Gallery,
    PhotoDetail,
    Cleaner,
    Results,
    Statistics,
    Settings,
    Profile,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::Home,
        Route::Gallery,
        Route::PhotoDetail,
        Route::Cleaner,
        Route::Results,
        Route::Statistics,
        Route::Settings,
        Route::Profile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Gallery => "gallery",
            Route::PhotoDetail => "photo_detail",
            Route::Cleaner => "cleaner",
            Route::Results => "results",
            Route::Statistics => "statistics",
            Route::Settings => "settings",
            Route::Profile => "profile",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content that can occupy a modal slot (sheet or full-screen cover).
///
/// The presentation layer resolves each variant to a concrete view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    Onboarding,
    Paywall,
    PhotoPicker,
    CleaningProgress,
    Settings,
}

/// Navigation state: a stack of routes plus two single-occupancy modal slots.
///
/// No transition is ever rejected. Popping or dismissing when already empty is
/// a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Router {
    path: Vec<Route>,
    sheet: Option<Presentation>,
    cover: Option<Presentation>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `route` onto the tail of the path.
    pub fn navigate(&mut self, route: Route) {
        self.path.push(route);
    }

    /// Pop the tail of the path, returning it.
    pub fn go_back(&mut self) -> Option<Route> {
        self.path.pop()
    }

    /// Clear the path back to the root screen.
    pub fn reset_to_root(&mut self) {
        self.path.clear();
    }

    /// Show `content` as a sheet, returning whatever it replaced.
    pub fn present_sheet(&mut self, content: Presentation) -> Option<Presentation> {
        self.sheet.replace(content)
    }

    /// Show `content` as a full-screen cover, returning whatever it replaced.
    pub fn present_cover(&mut self, content: Presentation) -> Option<Presentation> {
        self.cover.replace(content)
    }

    pub fn dismiss_sheet(&mut self) -> Option<Presentation> {
        self.sheet.take()
    }

    pub fn dismiss_cover(&mut self) -> Option<Presentation> {
        self.cover.take()
    }

    pub fn path(&self) -> &[Route] {
        &self.path
    }

    /// The route currently on top, or `None` at the root.
    pub fn current(&self) -> Option<Route> {
        self.path.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn sheet(&self) -> Option<Presentation> {
        self.sheet
    }

    pub fn cover(&self) -> Option<Presentation> {
        self.cover
    }
}
