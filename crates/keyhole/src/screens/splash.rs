#![forbid(unsafe_code)]

//! Splash screen: logo, title, subtitle, and version.

use keyhole_core::event::{KeyCode, KeyEvent};
use keyhole_render::{Align, Filler, Node, Pile, Styled, Text};

use super::{Screen, ScreenAction, ScreenEffect, ScreenId};
use crate::display::FrameComposer;

const LOGO: &str = " ▄▀▀▀▄ \n █   █ \n ▀▄ ▄▀ \n  █ █  \n  ▀▀▀  ";

pub const STATUS: &str = "Starting…";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplashScreen {
    title: String,
    subtitle: String,
    version: String,
}

impl SplashScreen {
    #[must_use]
    pub fn new(title: &str, subtitle: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            version: version.to_string(),
        }
    }

    fn body(&self) -> Node {
        let centered = |text: &str| Node::from(Text::new(text).align(Align::Center));
        Filler::new(Pile::new(vec![
            Styled::new("logo", Text::new(LOGO).align(Align::Center)).into(),
            Node::from(""),
            centered(&self.title),
            centered(&self.subtitle),
            Node::from(""),
            centered(&format!("v{}", self.version)),
        ]))
        .into()
    }
}

impl Screen for SplashScreen {
    fn id(&self) -> ScreenId {
        ScreenId::Splash
    }

    fn set_contents(&self, frame: &mut FrameComposer) {
        frame.set_body(self.body());
    }

    fn set_status(&self, frame: &mut FrameComposer) {
        frame.set_status(STATUS);
    }

    fn keybindings(&self) -> Vec<(KeyEvent, ScreenAction)> {
        vec![
            (KeyEvent::new(KeyCode::Enter), ScreenAction::SkipSplash),
            (KeyEvent::new(KeyCode::Char(' ')), ScreenAction::SkipSplash),
        ]
    }

    fn handle(&mut self, action: ScreenAction, _frame: &mut FrameComposer) -> ScreenEffect {
        match action {
            ScreenAction::SkipSplash => ScreenEffect::Activate(ScreenId::Main),
            _ => ScreenEffect::None,
        }
    }
}
