#![forbid(unsafe_code)]

//! Screens and the screen state machine.
//!
//! A screen is a named mode that owns the body while it is active. Screens
//! are built once at start-up and live for the whole run; activating one
//! re-initializes what it shows without reconstructing it. There is no exit
//! hook: activating another screen supersedes the current one.

pub mod main_screen;
pub mod splash;

use keyhole_core::event::KeyEvent;

use crate::display::FrameComposer;
use crate::input::InputRouter;

pub use main_screen::MainScreen;
pub use splash::SplashScreen;

/// Identity of each screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Splash,
    Main,
}

impl ScreenId {
    pub const ALL: &'static [ScreenId] = &[ScreenId::Splash, ScreenId::Main];

    /// Name shown in the header.
    #[must_use]
    pub fn title(self) -> &'static str {
        screen_meta(self).title
    }
}

/// Registry metadata describing a screen.
#[derive(Debug, Clone, Copy)]
pub struct ScreenMeta {
    pub id: ScreenId,
    pub title: &'static str,
}

/// Screen Registry: single source of truth for screen order and names.
pub const SCREEN_REGISTRY: &[ScreenMeta] = &[
    ScreenMeta {
        id: ScreenId::Splash,
        title: "Welcome",
    },
    ScreenMeta {
        id: ScreenId::Main,
        title: "Main",
    },
];

#[must_use]
pub fn screen_meta(id: ScreenId) -> &'static ScreenMeta {
    SCREEN_REGISTRY
        .iter()
        .find(|meta| meta.id == id)
        .unwrap_or(&SCREEN_REGISTRY[0])
}

/// Which screen owns the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenState {
    /// Before the frame is activated.
    #[default]
    Uninitialized,
    Active(ScreenId),
}

impl ScreenState {
    #[must_use]
    pub fn active(self) -> Option<ScreenId> {
        match self {
            Self::Uninitialized => None,
            Self::Active(id) => Some(id),
        }
    }
}

/// What a bound key asks the active screen to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    SkipSplash,
    ToggleLine(usize),
    NextTheme,
    ClearLines,
}

/// What the orchestrator must do after a screen handled an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEffect {
    None,
    Activate(ScreenId),
    NextTheme,
}

/// The lifecycle contract every screen implements.
pub trait Screen {
    fn id(&self) -> ScreenId;

    /// Enter this screen. The order of the four steps is fixed.
    fn activate(&mut self, frame: &mut FrameComposer, router: &mut InputRouter) {
        self.reset();
        self.set_screen_name(frame);
        self.set_contents(frame);
        self.set_status(frame);
        self.set_keys(router);
    }

    /// Re-initialize per-activation state.
    fn reset(&mut self) {}

    fn set_screen_name(&self, frame: &mut FrameComposer) {
        frame.set_screen_name(self.id().title());
    }

    fn set_contents(&self, frame: &mut FrameComposer);

    fn set_status(&self, frame: &mut FrameComposer);

    /// Install this screen's bindings, replacing the previous screen's.
    fn set_keys(&self, router: &mut InputRouter) {
        router.set_keys(self.keybindings());
    }

    fn keybindings(&self) -> Vec<(KeyEvent, ScreenAction)>;

    /// Apply a bound action.
    fn handle(&mut self, action: ScreenAction, frame: &mut FrameComposer) -> ScreenEffect;
}
