#![forbid(unsafe_code)]

//! The display orchestrator: the application model.
//!
//! # Start-up sequence
//!
//! 1. Activate the frame (exactly once).
//! 2. Activate the splash screen.
//! 3. Start the clock: a zero-delay timer runs the first tick, and every tick
//!    re-arms for the next whole second.
//! 4. Arm the one-shot splash timer that activates the main screen.
//!
//! Everything after that is driven by key events (keyboard or buttons, which
//! look the same), clock ticks, and the splash timeout.

use std::time::{Duration, SystemTime};

use keyhole_core::event::{Event, KeyEvent};
use keyhole_render::Buffer;
use keyhole_runtime::{Cmd, Deadline, Model, schedule_next};
use keyhole_style::{PaletteSet, build_palette};
use tracing::{debug, error, info, warn};

use crate::buttons::ButtonBindings;
use crate::clock::ClockTicker;
use crate::config::{AppConfig, ConfigError};
use crate::display::FrameComposer;
use crate::error::Result;
use crate::input::{InputRouter, Route};
use crate::screens::{
    MainScreen, Screen, ScreenAction, ScreenEffect, ScreenId, ScreenState, SplashScreen,
};

/// Messages handled by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Event(Event),
    /// The clock timer fired at this instant.
    ClockTick(SystemTime),
    SplashTimeout,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

/// Owns every piece of display state. Mutated only from the event loop.
pub struct DisplayOrchestrator {
    palettes: PaletteSet,
    theme: String,
    frame: FrameComposer,
    router: InputRouter,
    clock: ClockTicker,
    screens: Vec<Box<dyn Screen>>,
    state: ScreenState,
    splash_delay: Duration,
    ticks: u64,
}

impl DisplayOrchestrator {
    /// Build from validated configuration and the button bindings in use.
    ///
    /// # Errors
    ///
    /// Fails if the themes, buttons, or clock settings are invalid.
    pub fn new(config: &AppConfig, bindings: ButtonBindings) -> Result<Self> {
        let themes = config.theme_set()?;
        let palettes = build_palette(&themes, &bindings.palette_entries())?;
        if palettes.get(&config.theme).is_none() {
            return Err(ConfigError::UnknownTheme(config.theme.clone()).into());
        }
        let clock = config.clock_ticker()?;
        let screens: Vec<Box<dyn Screen>> = vec![
            Box::new(SplashScreen::new(
                &config.title,
                &config.subtitle,
                &config.app_version,
            )),
            Box::new(MainScreen::new(bindings)),
        ];
        Ok(Self {
            palettes,
            theme: config.theme.clone(),
            frame: FrameComposer::new(&config.title),
            router: InputRouter::new(),
            clock,
            screens,
            state: ScreenState::Uninitialized,
            splash_delay: Duration::from_secs(config.splash_secs),
            ticks: 0,
        })
    }

    #[must_use]
    pub fn frame(&self) -> &FrameComposer {
        &self.frame
    }

    #[must_use]
    pub fn state(&self) -> ScreenState {
        self.state
    }

    #[must_use]
    pub fn active_screen(&self) -> Option<ScreenId> {
        self.state.active()
    }

    /// Name of the theme currently rendered.
    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    #[must_use]
    pub fn palettes(&self) -> &PaletteSet {
        &self.palettes
    }

    /// Clock ticks handled so far.
    #[must_use]
    pub fn clock_ticks(&self) -> u64 {
        self.ticks
    }

    /// Route one key. Returns whether a handler consumed it, and the
    /// follow-up command.
    pub fn handle_key(&mut self, key: &KeyEvent) -> (bool, Cmd<Msg>) {
        let route = self.router.route(key);
        let consumed = route.is_consumed();
        let cmd = match route {
            Route::Quit => {
                info!(key = %key.symbol(), "quit requested");
                Cmd::quit()
            }
            Route::Redraw => Cmd::redraw(),
            Route::Screen(action) => {
                self.dispatch(action);
                Cmd::none()
            }
            Route::Unhandled(symbol) => {
                self.frame.set_status(&format!("Got key {symbol}"));
                warn!(key = %symbol, "unhandled input");
                Cmd::none()
            }
            Route::Ignored => Cmd::none(),
        };
        (consumed, cmd)
    }

    fn activate(&mut self, id: ScreenId) {
        let Some(screen) = self.screens.iter_mut().find(|s| s.id() == id) else {
            error!(screen = ?id, "screen is not registered");
            return;
        };
        screen.activate(&mut self.frame, &mut self.router);
        self.state = ScreenState::Active(id);
        info!(screen = ?id, "screen activated");
    }

    fn dispatch(&mut self, action: ScreenAction) {
        let Some(active) = self.state.active() else {
            return;
        };
        let Some(screen) = self.screens.iter_mut().find(|s| s.id() == active) else {
            return;
        };
        match screen.handle(action, &mut self.frame) {
            ScreenEffect::None => {}
            ScreenEffect::Activate(id) => self.activate(id),
            ScreenEffect::NextTheme => self.next_theme(),
        }
    }

    fn next_theme(&mut self) {
        let Some(next) = self.palettes.next_after(&self.theme) else {
            return;
        };
        self.theme = next.to_string();
        self.frame.set_status(&format!("Theme {next}"));
        info!(theme = %self.theme, "theme changed");
    }
}

impl Model for DisplayOrchestrator {
    type Message = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        if let Err(err) = self.frame.activate() {
            error!(error = %err, "display start failed");
            return Cmd::quit();
        }
        self.activate(ScreenId::Splash);
        debug!(delay_secs = self.splash_delay.as_secs(), "splash timer armed");
        Cmd::batch(vec![
            Cmd::timer(Deadline::After(Duration::ZERO), Msg::ClockTick),
            Cmd::timer(Deadline::After(self.splash_delay), |_| Msg::SplashTimeout),
        ])
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Event(Event::Key(key)) => {
                let (consumed, cmd) = self.handle_key(&key);
                debug!(key = %key.symbol(), consumed, "key routed");
                cmd
            }
            Msg::Event(Event::Resize { width, height }) => {
                debug!(width, height, "terminal resized");
                Cmd::none()
            }
            Msg::Event(Event::Focus(_)) => Cmd::none(),
            Msg::ClockTick(now) => {
                let (text, next) = schedule_next(&mut self.clock, now, Msg::ClockTick);
                self.frame.set_clock(&text);
                self.ticks += 1;
                next
            }
            Msg::SplashTimeout => {
                if self.state == ScreenState::Active(ScreenId::Splash) {
                    self.activate(ScreenId::Main);
                } else {
                    debug!(state = ?self.state, "splash timeout after splash was left");
                }
                Cmd::none()
            }
        }
    }

    fn view(&self, buffer: &mut Buffer) {
        let Some(palette) = self.palettes.get(&self.theme) else {
            return;
        };
        self.frame.render(buffer, palette);
    }
}

impl std::fmt::Debug for DisplayOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayOrchestrator")
            .field("theme", &self.theme)
            .field("state", &self.state)
            .field("ticks", &self.ticks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyhole_core::event::KeyCode;

    fn orchestrator() -> DisplayOrchestrator {
        DisplayOrchestrator::new(&AppConfig::default(), ButtonBindings::none()).unwrap()
    }

    fn key(c: char) -> Msg {
        Msg::Event(Event::Key(KeyEvent::new(KeyCode::Char(c))))
    }

    #[test]
    fn starts_uninitialized_then_splash() {
        let mut app = orchestrator();
        assert_eq!(app.state(), ScreenState::Uninitialized);
        let cmd = app.init();
        assert!(matches!(cmd, Cmd::Batch(ref cmds) if cmds.len() == 2));
        assert_eq!(app.active_screen(), Some(ScreenId::Splash));
        assert_eq!(app.frame().screen_name(), "Welcome");
    }

    #[test]
    fn second_init_quits() {
        let mut app = orchestrator();
        let _ = app.init();
        assert!(matches!(app.init(), Cmd::Quit));
    }

    #[test]
    fn splash_timeout_is_ignored_once_main() {
        let mut app = orchestrator();
        let _ = app.init();
        let _ = app.update(Msg::Event(Event::Key(KeyEvent::new(KeyCode::Enter))));
        assert_eq!(app.active_screen(), Some(ScreenId::Main));
        let _ = app.update(key('x'));
        let _ = app.update(Msg::SplashTimeout);
        assert_eq!(app.active_screen(), Some(ScreenId::Main));
        // Main was not re-activated, so the status still shows the key.
        assert_eq!(app.frame().status(), "Got key x");
    }

    #[test]
    fn theme_cycles_on_main() {
        let mut app = orchestrator();
        let _ = app.init();
        let _ = app.update(Msg::SplashTimeout);
        let _ = app.update(key('t'));
        assert_eq!(app.theme(), "space");
        assert_eq!(app.frame().status(), "Theme space");
        let _ = app.update(key('t'));
        assert_eq!(app.theme(), "main");
    }

    #[test]
    fn clock_tick_rearms_for_next_second() {
        let mut app = orchestrator();
        let _ = app.init();
        let now = SystemTime::UNIX_EPOCH + Duration::from_millis(1_614_834_367_400);
        match app.update(Msg::ClockTick(now)) {
            Cmd::Timer(Deadline::At(at), _) => {
                assert_eq!(at, SystemTime::UNIX_EPOCH + Duration::from_secs(1_614_834_368));
            }
            other => panic!("expected a timer, got {other:?}"),
        }
        assert_eq!(app.frame().clock(), "2021-03-04 05:06:07 UTC");
        assert_eq!(app.clock_ticks(), 1);
    }

    #[test]
    fn handle_key_reports_consumption() {
        let mut app = orchestrator();
        let _ = app.init();
        let (consumed, cmd) = app.handle_key(&KeyEvent::new(KeyCode::Char('x')));
        assert!(!consumed);
        assert!(matches!(cmd, Cmd::None));

        let (consumed, _) = app.handle_key(&KeyEvent::new(KeyCode::Char(' ')));
        assert!(consumed);
        assert_eq!(app.active_screen(), Some(ScreenId::Main));

        let (consumed, cmd) = app.handle_key(&KeyEvent::new(KeyCode::Char('q')));
        assert!(consumed);
        assert!(matches!(cmd, Cmd::Quit));
    }

    #[test]
    fn unknown_start_theme_is_rejected() {
        let config = AppConfig {
            theme: "sunset".into(),
            ..AppConfig::default()
        };
        assert!(DisplayOrchestrator::new(&config, ButtonBindings::none()).is_err());
    }
}
