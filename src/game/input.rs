use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::time::Duration;

use super::state::PaddleCommand;

/// Something read from the human at the start of a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Opponent(PaddleCommand),
}

/// Source of human input, read once per tick before the match steps
pub trait InputSource {
    fn poll(&mut self) -> std::io::Result<Vec<InputEvent>>;
}

/// Keyboard input from the terminal.
///
/// Arrow keys drive the opponent paddle; space (or releasing an arrow on
/// terminals that report key releases) stops it; `q`/Esc quits.
#[derive(Debug, Default)]
pub struct KeyboardInput;

impl InputSource for KeyboardInput {
    fn poll(&mut self) -> std::io::Result<Vec<InputEvent>> {
        poll_input(Duration::ZERO)
    }
}

/// Drain all pending key events and translate them
pub fn poll_input(timeout: Duration) -> std::io::Result<Vec<InputEvent>> {
    let mut events = Vec::new();

    let mut wait = timeout;
    while event::poll(wait)? {
        wait = Duration::ZERO;
        if let Event::Key(key) = event::read()? {
            if let Some(input) = translate_key(&key) {
                events.push(input);
            }
        }
    }

    Ok(events)
}

fn translate_key(key: &KeyEvent) -> Option<InputEvent> {
    match key.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputEvent::Quit),
            KeyCode::Up => Some(InputEvent::Opponent(PaddleCommand::Up)),
            KeyCode::Down => Some(InputEvent::Opponent(PaddleCommand::Down)),
            KeyCode::Char(' ') => Some(InputEvent::Opponent(PaddleCommand::Stop)),
            _ => None,
        },
        KeyEventKind::Release => match key.code {
            KeyCode::Up | KeyCode::Down => Some(InputEvent::Opponent(PaddleCommand::Stop)),
            _ => None,
        },
    }
}
