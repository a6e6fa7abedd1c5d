//! Path table for the application's pages.

use std::fmt;

use crate::timer::TimerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Timer(TimerKind),
    Settings,
    Stats,
    Achievements,
    About,
}

impl Route {
    pub fn all() -> Vec<Route> {
        let mut routes = vec![Route::Home];
        routes.extend(TimerKind::ALL.iter().copied().map(Route::Timer));
        routes.extend([
            Route::Settings,
            Route::Stats,
            Route::Achievements,
            Route::About,
        ]);
        routes
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Timer(kind) => match kind {
                TimerKind::Stopwatch => "/stopwatch",
                TimerKind::Countdown => "/countdown",
                TimerKind::Interval => "/interval",
                TimerKind::Pomodoro => "/pomodoro",
                TimerKind::Egg => "/egg-timer",
                TimerKind::Bomb => "/bomb-timer",
                TimerKind::Meditation => "/meditation",
                TimerKind::Basketball => "/basketball",
                TimerKind::Hockey => "/hockey",
                TimerKind::Presentation => "/presentation",
            },
            Route::Settings => "/settings",
            Route::Stats => "/stats",
            Route::Achievements => "/achievements",
            Route::About => "/about",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "Timers",
            Route::Timer(kind) => kind.label(),
            Route::Settings => "Settings",
            Route::Stats => "Statistics",
            Route::Achievements => "Achievements",
            Route::About => "About",
        }
    }

    /// Exact match on the path, ignoring a trailing slash and any query.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        Route::all().into_iter().find(|r| r.path() == path)
    }

    /// Like [`Route::parse`], but unknown paths land on the home page.
    pub fn resolve(path: &str) -> Route {
        Route::parse(path).unwrap_or(Route::Home)
    }

    pub fn timer_kind(&self) -> Option<TimerKind> {
        match self {
            Route::Timer(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_parses_back() {
        let routes = Route::all();
        assert_eq!(routes.len(), 15);
        for route in routes {
            assert_eq!(Route::parse(route.path()), Some(route));
        }
    }

    #[test]
    fn unknown_paths_redirect_home() {
        assert_eq!(Route::resolve("/nope"), Route::Home);
        assert_eq!(Route::resolve(""), Route::Home);
        assert_eq!(
            Route::resolve("/egg-timer/?preset=soft"),
            Route::Timer(TimerKind::Egg)
        );
        assert_eq!(Route::parse("/egg"), None);
    }
}
