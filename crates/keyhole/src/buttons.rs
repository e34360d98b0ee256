#![forbid(unsafe_code)]

//! Hardware buttons: pin bindings, debouncing, and the GPIO event source.
//!
//! Each configured pin is bound to a logical key, `f13` for the first pin,
//! `f14` for the second, and so on, together with its legend colors. The
//! binding order is the palette order: the palette region for a button is
//! its key symbol, so the two can never disagree.
//!
//! Button presses reach the display as ordinary key events sent through the
//! runtime's [`EventSender`]. Reader threads never touch display state.

use std::fmt;
use std::io;
use std::time::Duration;

use keyhole_core::event::{Event, KeyCode, KeyEvent};
use keyhole_runtime::EventSender;
use keyhole_style::ColorPair;
use tracing::warn;

use crate::config::ConfigError;

/// Function key assigned to the first button.
pub const FIRST_BUTTON_KEY: u8 = 13;

/// Buttons map onto `f13..=f24`.
pub const MAX_BUTTONS: usize = (KeyCode::MAX_FUNCTION_KEY - FIRST_BUTTON_KEY + 1) as usize;

/// Presses closer together than this are contact bounce.
pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// One pin, its logical key, and its legend colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonBinding {
    pub pin: u32,
    pub key: KeyEvent,
    pub colors: ColorPair,
}

impl ButtonBinding {
    /// The key symbol, which doubles as the palette region name.
    #[must_use]
    pub fn symbol(&self) -> String {
        self.key.symbol()
    }

    /// The event a press of this button produces.
    #[must_use]
    pub fn event(&self) -> Event {
        Event::Key(self.key)
    }
}

/// All configured buttons, in declaration order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonBindings {
    bindings: Vec<ButtonBinding>,
}

impl ButtonBindings {
    /// Keyboard-only mode.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Bind pins to `f13, f14, …` in order.
    ///
    /// # Errors
    ///
    /// Fails on a repeated pin or more pins than there are function keys.
    pub fn from_pins(pins: &[(u32, ColorPair)]) -> Result<Self, ConfigError> {
        if pins.len() > MAX_BUTTONS {
            return Err(ConfigError::TooManyPins {
                count: pins.len(),
                max: MAX_BUTTONS,
            });
        }
        let mut bindings: Vec<ButtonBinding> = Vec::with_capacity(pins.len());
        for (n, (pin, colors)) in (FIRST_BUTTON_KEY..).zip(pins) {
            if bindings.iter().any(|b| b.pin == *pin) {
                return Err(ConfigError::DuplicatePin(*pin));
            }
            bindings.push(ButtonBinding {
                pin: *pin,
                key: KeyEvent::new(KeyCode::F(n)),
                colors: *colors,
            });
        }
        Ok(Self { bindings })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ButtonBinding> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ButtonBinding> {
        self.bindings.get(index)
    }

    /// Palette entries to append to every theme: `(symbol, colors)`.
    #[must_use]
    pub fn palette_entries(&self) -> Vec<(String, ColorPair)> {
        self.bindings
            .iter()
            .map(|b| (b.symbol(), b.colors))
            .collect()
    }
}

/// Drops presses that arrive within the debounce window of the last
/// accepted one.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    window: Duration,
    last: Option<Duration>,
}

impl Debouncer {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Feed a press timestamp (monotonic); returns whether it counts.
    pub fn accept(&mut self, at: Duration) -> bool {
        if let Some(last) = self.last
            && at.saturating_sub(last) < self.window
        {
            return false;
        }
        self.last = Some(at);
        true
    }
}

/// Button source failure. Never fatal: the display falls back to the keyboard.
#[derive(Debug)]
pub enum ButtonError {
    /// Built without GPIO support, or not on Linux.
    Unsupported,
    Gpio(String),
    Io(io::Error),
}

impl fmt::Display for ButtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "GPIO buttons are not supported by this build"),
            Self::Gpio(message) => write!(f, "GPIO error: {message}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ButtonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ButtonError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Something that produces button presses.
pub trait ButtonSource {
    /// Start delivering presses into `sender`. Called once, at start-up.
    fn activate(self: Box<Self>, sender: EventSender) -> Result<(), ButtonError>;
}

/// Open the platform button source for `bindings`.
///
/// # Errors
///
/// Returns [`ButtonError::Unsupported`] when built without the `gpio`
/// feature or on a non-Linux target.
pub fn open_buttons(bindings: &ButtonBindings) -> Result<Box<dyn ButtonSource>, ButtonError> {
    #[cfg(all(feature = "gpio", target_os = "linux"))]
    {
        Ok(Box::new(gpio::GpioButtons::new(
            gpio::DEFAULT_CHIP,
            bindings.clone(),
        )))
    }
    #[cfg(not(all(feature = "gpio", target_os = "linux")))]
    {
        let _ = bindings;
        Err(ButtonError::Unsupported)
    }
}

/// Start `source` feeding `sender` and return the bindings to display.
///
/// If the source could not be opened or fails to start, the display falls
/// back to keyboard-only mode so the legend never shows dead buttons.
pub fn start_or_fallback(
    bindings: ButtonBindings,
    source: Result<Box<dyn ButtonSource>, ButtonError>,
    sender: &EventSender,
) -> ButtonBindings {
    match source.and_then(|source| source.activate(sender.clone())) {
        Ok(()) => bindings,
        Err(err) => {
            warn!(error = %err, "buttons unavailable, keyboard only");
            ButtonBindings::none()
        }
    }
}

#[cfg(all(feature = "gpio", target_os = "linux"))]
mod gpio {
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    use gpio_cdev::{Chip, EventRequestFlags, LineEventHandle, LineRequestFlags};
    use keyhole_core::event::Event;
    use keyhole_runtime::EventSender;
    use tracing::{info, warn};

    use super::{ButtonBindings, ButtonError, ButtonSource, DEBOUNCE, Debouncer};

    pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

    /// Buttons wired to GPIO lines, pulled up and pressed to ground.
    pub struct GpioButtons {
        chip: PathBuf,
        bindings: ButtonBindings,
    }

    impl GpioButtons {
        pub fn new(chip: impl Into<PathBuf>, bindings: ButtonBindings) -> Self {
            Self {
                chip: chip.into(),
                bindings,
            }
        }
    }

    fn gpio_error(err: gpio_cdev::Error) -> ButtonError {
        ButtonError::Gpio(err.to_string())
    }

    impl ButtonSource for GpioButtons {
        fn activate(self: Box<Self>, sender: EventSender) -> Result<(), ButtonError> {
            let mut chip = Chip::new(&self.chip).map_err(gpio_error)?;

            // Request every line before starting any reader.
            let mut handles = Vec::with_capacity(self.bindings.len());
            for binding in self.bindings.iter() {
                let line = chip.get_line(binding.pin).map_err(gpio_error)?;
                let events = line
                    .events(
                        LineRequestFlags::INPUT,
                        EventRequestFlags::FALLING_EDGE,
                        "keyhole",
                    )
                    .map_err(gpio_error)?;
                handles.push((binding.pin, binding.event(), events));
            }

            for (pin, event, events) in handles {
                let sender = sender.clone();
                thread::Builder::new()
                    .name(format!("keyhole-button-{pin}"))
                    .spawn(move || read_presses(pin, events, event, &sender))?;
            }
            info!(buttons = self.bindings.len(), chip = %self.chip.display(), "GPIO buttons active");
            Ok(())
        }
    }

    fn read_presses(pin: u32, events: LineEventHandle, event: Event, sender: &EventSender) {
        let mut debouncer = Debouncer::new(DEBOUNCE);
        for result in events {
            match result {
                Ok(edge) => {
                    if !debouncer.accept(Duration::from_nanos(edge.timestamp())) {
                        continue;
                    }
                    if sender.send(event.clone()).is_err() {
                        // The display loop is gone.
                        return;
                    }
                }
                Err(err) => {
                    warn!(pin, error = %err, "button line read failed; reader stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(n: u32) -> Vec<(u32, ColorPair)> {
        (0..n)
            .map(|i| (i + 2, ColorPair::parse("#000", "#0d0").unwrap()))
            .collect()
    }

    #[test]
    fn keys_follow_pin_order() {
        let bindings = ButtonBindings::from_pins(&[
            (27, ColorPair::parse("#000", "#f00").unwrap()),
            (17, ColorPair::parse("#000", "#0d0").unwrap()),
        ])
        .unwrap();
        let symbols: Vec<String> = bindings.iter().map(ButtonBinding::symbol).collect();
        assert_eq!(symbols, ["f13", "f14"]);
        assert_eq!(bindings.get(0).unwrap().pin, 27);
        assert_eq!(
            bindings.palette_entries()[1],
            ("f14".to_string(), ColorPair::parse("#000", "#0d0").unwrap())
        );
    }

    #[test]
    fn twelve_buttons_fit() {
        let bindings = ButtonBindings::from_pins(&pins(12)).unwrap();
        assert_eq!(bindings.get(11).unwrap().symbol(), "f24");
        assert!(matches!(
            ButtonBindings::from_pins(&pins(13)),
            Err(ConfigError::TooManyPins { count: 13, max: 12 })
        ));
    }

    #[test]
    fn duplicate_pin_rejected() {
        let mut pins = pins(3);
        pins[2].0 = pins[0].0;
        assert!(matches!(
            ButtonBindings::from_pins(&pins),
            Err(ConfigError::DuplicatePin(2))
        ));
    }

    struct FakeSource {
        fail: bool,
    }

    impl ButtonSource for FakeSource {
        fn activate(self: Box<Self>, sender: EventSender) -> Result<(), ButtonError> {
            if self.fail {
                return Err(ButtonError::Gpio("line busy".into()));
            }
            sender
                .send(Event::Key(KeyEvent::new(KeyCode::F(13))))
                .map_err(|_| ButtonError::Unsupported)
        }
    }

    #[test]
    fn failed_start_falls_back_to_keyboard() {
        let (sender, inbox) = keyhole_runtime::event_channel();
        let bindings = ButtonBindings::from_pins(&pins(4)).unwrap();

        let shown = start_or_fallback(
            bindings.clone(),
            Ok(Box::new(FakeSource { fail: true })),
            &sender,
        );
        assert!(shown.is_empty());

        let shown = start_or_fallback(bindings.clone(), Err(ButtonError::Unsupported), &sender);
        assert!(shown.is_empty());
        assert!(inbox.try_recv().is_err());

        let shown = start_or_fallback(
            bindings.clone(),
            Ok(Box::new(FakeSource { fail: false })),
            &sender,
        );
        assert_eq!(shown, bindings);
        assert!(inbox.try_recv().is_ok());
    }

    #[test]
    fn debouncer_drops_bounces() {
        let mut debouncer = Debouncer::new(DEBOUNCE);
        let ms = Duration::from_millis;
        assert!(debouncer.accept(ms(1000)));
        assert!(!debouncer.accept(ms(1010)));
        assert!(!debouncer.accept(ms(1049)));
        assert!(debouncer.accept(ms(1050)));
        assert!(debouncer.accept(ms(2000)));
    }

    #[cfg(not(all(feature = "gpio", target_os = "linux")))]
    #[test]
    fn unsupported_without_gpio() {
        let bindings = ButtonBindings::from_pins(&pins(1)).unwrap();
        assert!(matches!(open_buttons(&bindings), Err(ButtonError::Unsupported)));
    }
}
