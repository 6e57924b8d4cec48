// event.rs
use std::{
    sync::mpsc::{self, Receiver, RecvError},
    thread,
    time::{Duration, Instant},
};

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use tracing::error;

use crate::app::{CurrentScreen, Message};

pub enum Event {
    Tick,
    Input(KeyEvent),
    Mouse(MouseEvent),
    Resize,
}

/// Polls the terminal on a background thread and forwards events over a
/// channel. The thread never touches application state.
pub struct EventHandler {
    receiver: Receiver<Event>,
    #[allow(dead_code)]
    event_thread: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> EventHandler {
        let (sender, receiver) = mpsc::channel();
        let event_thread = thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0));

                let polled = match event::poll(timeout) {
                    Ok(ready) => ready,
                    Err(e) => {
                        error!("unable to poll terminal events: {}", e);
                        return;
                    }
                };
                if polled {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(e)) => Some(Event::Input(e)),
                        Ok(CrosstermEvent::Mouse(e)) => Some(Event::Mouse(e)),
                        Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Resize),
                        Ok(_) => None,
                        Err(e) => {
                            error!("unable to read terminal event: {}", e);
                            return;
                        }
                    };
                    if let Some(ev) = forwarded {
                        if sender.send(ev).is_err() {
                            return; // Receiver gone, application is shutting down.
                        }
                    }
                }

                // If enough time has passed, send a `Tick` event.
                if last_tick.elapsed() >= tick_rate {
                    if sender.send(Event::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });
        EventHandler {
            receiver,
            event_thread,
        }
    }

    /// Blocks until the next event.
    pub fn next(&self) -> Result<Event, RecvError> {
        self.receiver.recv()
    }
}

/// Translates a terminal event into an application message.
pub fn to_message(event: Event, screen: CurrentScreen) -> Option<Message> {
    match event {
        Event::Tick | Event::Resize => Some(Message::Tick),
        Event::Input(key) => key_message(key, screen),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Message::ClickCell {
                column: mouse.column,
                row: mouse.row,
            }),
            MouseEventKind::Moved => Some(Message::HoverCell {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        },
    }
}

fn key_message(key: KeyEvent, screen: CurrentScreen) -> Option<Message> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Message::Quit);
    }
    if screen == CurrentScreen::Help {
        return match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            _ => Some(Message::ToggleHelp), // Any other key leaves the help screen
        };
    }
    // Letter bindings ignore case.
    let code = match key.code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    };
    match code {
        KeyCode::Char('q') => Some(Message::Quit),
        KeyCode::Right | KeyCode::Char('l') => Some(Message::NextMonth),
        KeyCode::Left | KeyCode::Char('h') => Some(Message::PrevMonth),
        KeyCode::Home => Some(Message::FirstMonth),
        KeyCode::End => Some(Message::LastMonth),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::NextRegion),
        KeyCode::Up | KeyCode::Char('k') => Some(Message::PrevRegion),
        KeyCode::Enter => Some(Message::OpenSelected),
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('c') => Some(Message::ClosePanel),
        KeyCode::Char('e') => Some(Message::Export),
        KeyCode::Char('?') => Some(Message::ToggleHelp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Event {
        Event::Input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn keys_map_to_messages() {
        let map = CurrentScreen::Map;
        assert_eq!(to_message(press(KeyCode::Right), map), Some(Message::NextMonth));
        assert_eq!(to_message(press(KeyCode::Char('h')), map), Some(Message::PrevMonth));
        assert_eq!(to_message(press(KeyCode::Esc), map), Some(Message::ClosePanel));
        assert_eq!(to_message(press(KeyCode::Enter), map), Some(Message::OpenSelected));
        assert_eq!(to_message(press(KeyCode::Char('z')), map), None);
    }

    #[test]
    fn letter_keys_ignore_case() {
        let map = CurrentScreen::Map;
        for (lower, upper, message) in [
            ('h', 'H', Message::PrevMonth),
            ('l', 'L', Message::NextMonth),
            ('j', 'J', Message::NextRegion),
            ('k', 'K', Message::PrevRegion),
            ('x', 'X', Message::ClosePanel),
            ('e', 'E', Message::Export),
        ] {
            assert_eq!(to_message(press(KeyCode::Char(lower)), map), Some(message.clone()));
            assert_eq!(to_message(press(KeyCode::Char(upper)), map), Some(message));
        }
    }

    #[test]
    fn help_screen_swallows_navigation() {
        let help = CurrentScreen::Help;
        assert_eq!(to_message(press(KeyCode::Right), help), Some(Message::ToggleHelp));
        assert_eq!(to_message(press(KeyCode::Char('q')), help), Some(Message::Quit));
    }

    #[test]
    fn left_click_and_motion_carry_the_cell() {
        let mouse = |kind| {
            Event::Mouse(MouseEvent {
                kind,
                column: 4,
                row: 7,
                modifiers: KeyModifiers::NONE,
            })
        };
        assert_eq!(
            to_message(mouse(MouseEventKind::Down(MouseButton::Left)), CurrentScreen::Map),
            Some(Message::ClickCell { column: 4, row: 7 })
        );
        assert_eq!(
            to_message(mouse(MouseEventKind::Moved), CurrentScreen::Map),
            Some(Message::HoverCell { column: 4, row: 7 })
        );
        assert_eq!(
            to_message(mouse(MouseEventKind::ScrollUp), CurrentScreen::Map),
            None
        );
    }
}
