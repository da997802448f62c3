use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, WINDOWS};
use crate::state::Command;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event, returning the commands it triggers.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Vec<Command> {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return Vec::new();
    }

    if app.sensor_input_active {
        return handle_sensor_input(app, key);
    }

    match key.code {
        KeyCode::Char('q') => {
            app.quit();
            Vec::new()
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.quit();
            Vec::new()
        }

        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('a') => app.toggle_auto_refresh(),

        // Time windows
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.set_window(WINDOWS[index])
        }

        KeyCode::Char('/') => {
            app.start_sensor_input();
            Vec::new()
        }

        KeyCode::Enter => app.enter_drilldown(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        KeyCode::Char('?') => {
            app.toggle_help();
            Vec::new()
        }

        _ => {
            handle_navigation(app, key.code);
            Vec::new()
        }
    }
}

fn handle_navigation(app: &mut App, code: KeyCode) {
    if app.in_drilldown() {
        return;
    }
    match code {
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        _ => {}
    }
}

/// Handle key input while the sensor box is open
fn handle_sensor_input(app: &mut App, key: KeyEvent) -> Vec<Command> {
    match key.code {
        KeyCode::Enter => app.apply_sensor_input(),
        KeyCode::Esc => {
            app.cancel_sensor_input();
            Vec::new()
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.sensor_input.clear();
            Vec::new()
        }
        KeyCode::Backspace => {
            app.sensor_pop();
            Vec::new()
        }
        KeyCode::Char(c) => {
            app.sensor_push(c);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> Vec<Command> {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            handle_navigation(app, KeyCode::Up);
            Vec::new()
        }
        MouseEventKind::ScrollDown => {
            handle_navigation(app, KeyCode::Down);
            Vec::new()
        }
        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => app.go_back(),
        _ => Vec::new(),
    }
}
