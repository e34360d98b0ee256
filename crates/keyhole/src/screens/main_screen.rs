#![forbid(unsafe_code)]

//! Main screen: one indicator line per hardware button.
//!
//! Each line is painted with its button's palette region (`f13`, `f14`, …),
//! so it shows the legend color of the physical button next to it. Pressing
//! the button toggles reverse video on its line.

use keyhole_core::event::{KeyCode, KeyEvent};
use keyhole_render::{Align, Filler, Node, Padding, Pile, Styled, Text};
use keyhole_style::StyleFlags;

use super::{Screen, ScreenAction, ScreenEffect, ScreenId};
use crate::buttons::ButtonBindings;
use crate::display::FrameComposer;

pub const STATUS: &str = "Ready";

const KEYBOARD_NOTICE: &str = "Keyboard mode: no front-panel buttons detected";
const HELP: &str = "t: next theme   c: clear   q: quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainScreen {
    bindings: ButtonBindings,
    highlighted: Vec<bool>,
}

impl MainScreen {
    #[must_use]
    pub fn new(bindings: ButtonBindings) -> Self {
        let highlighted = vec![false; bindings.len()];
        Self {
            bindings,
            highlighted,
        }
    }

    #[must_use]
    pub fn is_highlighted(&self, line: usize) -> bool {
        self.highlighted.get(line).copied().unwrap_or(false)
    }

    fn body(&self) -> Node {
        let mut rows: Vec<Node> = Vec::with_capacity(self.bindings.len() + 2);
        if self.bindings.is_empty() {
            rows.push(Text::new(KEYBOARD_NOTICE).align(Align::Center).into());
        }
        for (binding, lit) in self.bindings.iter().zip(&self.highlighted) {
            let symbol = binding.symbol();
            let label = format!("{symbol:>4}  pin {:<3} {}", binding.pin, if *lit { "●" } else { "○" });
            let attrs = if *lit { StyleFlags::REVERSE } else { StyleFlags::empty() };
            rows.push(Padding::new(2, 2, Styled::new(symbol, Text::new(label)).attrs(attrs)).into());
        }
        rows.push(Node::from(""));
        rows.push(Text::new(HELP).align(Align::Center).into());
        Filler::new(Pile::new(rows)).into()
    }
}

impl Screen for MainScreen {
    fn id(&self) -> ScreenId {
        ScreenId::Main
    }

    fn reset(&mut self) {
        self.highlighted.iter_mut().for_each(|lit| *lit = false);
    }

    fn set_contents(&self, frame: &mut FrameComposer) {
        frame.set_body(self.body());
    }

    fn set_status(&self, frame: &mut FrameComposer) {
        frame.set_status(STATUS);
    }

    fn keybindings(&self) -> Vec<(KeyEvent, ScreenAction)> {
        let mut keys: Vec<(KeyEvent, ScreenAction)> = self
            .bindings
            .iter()
            .enumerate()
            .map(|(line, binding)| (binding.key, ScreenAction::ToggleLine(line)))
            .collect();
        keys.push((KeyEvent::new(KeyCode::Char('t')), ScreenAction::NextTheme));
        keys.push((KeyEvent::new(KeyCode::Char('c')), ScreenAction::ClearLines));
        keys
    }

    fn handle(&mut self, action: ScreenAction, frame: &mut FrameComposer) -> ScreenEffect {
        match action {
            ScreenAction::ToggleLine(line) => {
                let Some(lit) = self.highlighted.get_mut(line) else {
                    return ScreenEffect::None;
                };
                *lit = !*lit;
                let state = if *lit { "on" } else { "off" };
                if let Some(binding) = self.bindings.get(line) {
                    frame.set_status(&format!("{} {state}", binding.symbol()));
                }
                self.set_contents(frame);
            }
            ScreenAction::ClearLines => {
                self.reset();
                self.set_contents(frame);
                frame.set_status("Cleared");
            }
            ScreenAction::NextTheme => return ScreenEffect::NextTheme,
            ScreenAction::SkipSplash => {}
        }
        ScreenEffect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputRouter, Route};
    use keyhole_render::Buffer;
    use keyhole_style::{ColorPair, Theme, build_palette};

    fn bindings() -> ButtonBindings {
        let pins: Vec<(u32, ColorPair)> = [(17, "#0d0"), (22, "#33f"), (23, "#dd0"), (27, "#f00")]
            .into_iter()
            .map(|(pin, bg)| (pin, ColorPair::parse("#000", bg).unwrap()))
            .collect();
        ButtonBindings::from_pins(&pins).unwrap()
    }

    fn activated(screen: &mut MainScreen) -> (FrameComposer, InputRouter) {
        let mut frame = FrameComposer::new("KeyHole");
        let mut router = InputRouter::new();
        frame.activate().unwrap();
        screen.activate(&mut frame, &mut router);
        (frame, router)
    }

    #[test]
    fn buttons_toggle_their_lines() {
        let mut screen = MainScreen::new(bindings());
        let (mut frame, router) = activated(&mut screen);
        assert_eq!(frame.screen_name(), "Main");
        assert_eq!(frame.status(), STATUS);

        let Route::Screen(action) = router.route(&KeyEvent::new(KeyCode::F(14))) else {
            panic!("f14 should be bound");
        };
        assert_eq!(action, ScreenAction::ToggleLine(1));
        assert_eq!(screen.handle(action, &mut frame), ScreenEffect::None);
        assert!(screen.is_highlighted(1));
        assert_eq!(frame.status(), "f14 on");

        screen.handle(action, &mut frame);
        assert!(!screen.is_highlighted(1));
        assert_eq!(frame.status(), "f14 off");
    }

    #[test]
    fn highlighted_line_uses_reverse_video_in_button_colors() {
        let bindings = bindings();
        let palette = build_palette(&[Theme::new("main")], &bindings.palette_entries()).unwrap();
        let table = palette.get("main").unwrap();

        let mut screen = MainScreen::new(bindings);
        let (mut frame, _) = activated(&mut screen);
        screen.handle(ScreenAction::ToggleLine(0), &mut frame);

        let mut buffer = Buffer::new(40, 10);
        frame.render(&mut buffer, table);
        let row = (0..10)
            .find(|y| buffer.row_text(*y).contains("f13"))
            .unwrap();
        let style = buffer.get(2, row).unwrap().style;
        let f13 = table.lookup("f13").unwrap();
        assert_eq!(style.bg, f13.bg);
        assert!(style.attrs.contains(StyleFlags::REVERSE));

        let other = (0..10)
            .find(|y| buffer.row_text(*y).contains("f16"))
            .unwrap();
        let style = buffer.get(2, other).unwrap().style;
        assert_eq!(style, table.lookup("f16").unwrap());
    }

    #[test]
    fn clear_and_reactivation_reset_lines() {
        let mut screen = MainScreen::new(bindings());
        let (mut frame, mut router) = activated(&mut screen);
        screen.handle(ScreenAction::ToggleLine(0), &mut frame);
        screen.handle(ScreenAction::ToggleLine(3), &mut frame);
        screen.handle(ScreenAction::ClearLines, &mut frame);
        assert!((0..4).all(|line| !screen.is_highlighted(line)));
        assert_eq!(frame.status(), "Cleared");

        screen.handle(ScreenAction::ToggleLine(2), &mut frame);
        screen.activate(&mut frame, &mut router);
        assert!(!screen.is_highlighted(2));
    }

    #[test]
    fn out_of_range_line_is_ignored() {
        let mut screen = MainScreen::new(bindings());
        let (mut frame, _) = activated(&mut screen);
        let revision = frame.revision();
        assert_eq!(
            screen.handle(ScreenAction::ToggleLine(9), &mut frame),
            ScreenEffect::None
        );
        assert_eq!(frame.revision(), revision);
    }

    #[test]
    fn keyboard_mode_notice() {
        let mut screen = MainScreen::new(ButtonBindings::none());
        let (frame, router) = activated(&mut screen);
        let mut buffer = Buffer::new(60, 8);
        frame.render(&mut buffer, &Default::default());
        assert!(buffer.to_text().contains(KEYBOARD_NOTICE));
        assert_eq!(router.bound_symbols().collect::<Vec<_>>(), ["t", "c"]);
        assert_eq!(
            screen.handle(ScreenAction::NextTheme, &mut frame.clone()),
            ScreenEffect::NextTheme
        );
    }
}
