#![forbid(unsafe_code)]

//! Input router: global keys first, then the active screen's bindings.
//!
//! Keyboard keys and hardware buttons arrive here as the same [`KeyEvent`]s;
//! the router matches on logical key symbols and cannot tell them apart.
//! The binding set is whatever the most recently activated screen installed.

use keyhole_core::event::{KeyEvent, KeyEventKind};

use crate::screens::ScreenAction;

/// Keys that end the program from any screen.
pub const QUIT_KEYS: [&str; 3] = ["esc", "q", "Q"];

/// Key that clears and repaints the terminal.
pub const REDRAW_KEY: &str = "ctrl l";

/// Where a key went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Quit,
    Redraw,
    /// Bound by the active screen.
    Screen(ScreenAction),
    /// Bound nowhere; carries the key symbol for the status line.
    Unhandled(String),
    /// Key releases are not input.
    Ignored,
}

impl Route {
    /// Whether the key was consumed by a handler.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Quit | Self::Redraw | Self::Screen(_))
    }
}

/// Dispatches keys by precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRouter {
    keys: Vec<(String, ScreenAction)>,
}

impl InputRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the screen binding set.
    pub fn set_keys(&mut self, keys: impl IntoIterator<Item = (KeyEvent, ScreenAction)>) {
        self.keys = keys
            .into_iter()
            .map(|(key, action)| (key.symbol(), action))
            .collect();
    }

    /// Symbols currently bound by the active screen.
    pub fn bound_symbols(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(symbol, _)| symbol.as_str())
    }

    #[must_use]
    pub fn route(&self, key: &KeyEvent) -> Route {
        if key.kind == KeyEventKind::Release {
            return Route::Ignored;
        }
        let symbol = key.symbol();
        if QUIT_KEYS.contains(&symbol.as_str()) {
            return Route::Quit;
        }
        if symbol == REDRAW_KEY {
            return Route::Redraw;
        }
        match self.keys.iter().find(|(bound, _)| *bound == symbol) {
            Some((_, action)) => Route::Screen(*action),
            None => Route::Unhandled(symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhole_core::event::{KeyCode, Modifiers};

    fn key(symbol: &str) -> KeyEvent {
        KeyEvent::from_symbol(symbol).unwrap()
    }

    #[test]
    fn global_keys_win() {
        let mut router = InputRouter::new();
        // A screen binding on a global key never sees it.
        router.set_keys([(key("q"), ScreenAction::ClearLines)]);
        assert_eq!(router.route(&key("q")), Route::Quit);
        assert_eq!(router.route(&key("Q")), Route::Quit);
        assert_eq!(router.route(&key("esc")), Route::Quit);
        assert_eq!(router.route(&key("ctrl l")), Route::Redraw);
    }

    #[test]
    fn shifted_q_quits() {
        let shifted = KeyEvent::new(KeyCode::Char('Q')).with_modifiers(Modifiers::SHIFT);
        assert_eq!(InputRouter::new().route(&shifted), Route::Quit);
    }

    #[test]
    fn screen_bindings_then_unhandled() {
        let mut router = InputRouter::new();
        router.set_keys([
            (key("f13"), ScreenAction::ToggleLine(0)),
            (key("t"), ScreenAction::NextTheme),
        ]);
        assert_eq!(
            router.route(&key("f13")),
            Route::Screen(ScreenAction::ToggleLine(0))
        );
        assert_eq!(router.route(&key("t")), Route::Screen(ScreenAction::NextTheme));
        assert_eq!(router.route(&key("x")), Route::Unhandled("x".into()));
        assert_eq!(router.route(&key("ctrl x")), Route::Unhandled("ctrl x".into()));
        assert!(!router.route(&key("x")).is_consumed());
    }

    #[test]
    fn set_keys_replaces_previous_set() {
        let mut router = InputRouter::new();
        router.set_keys([(key("enter"), ScreenAction::SkipSplash)]);
        router.set_keys([(key("c"), ScreenAction::ClearLines)]);
        assert_eq!(router.bound_symbols().collect::<Vec<_>>(), ["c"]);
        assert_eq!(router.route(&key("enter")), Route::Unhandled("enter".into()));
    }

    #[test]
    fn releases_are_ignored() {
        let release = key("q").with_kind(KeyEventKind::Release);
        assert_eq!(InputRouter::new().route(&release), Route::Ignored);
        let repeat = key("q").with_kind(KeyEventKind::Repeat);
        assert_eq!(InputRouter::new().route(&repeat), Route::Quit);
    }
}
