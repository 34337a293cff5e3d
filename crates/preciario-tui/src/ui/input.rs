//! Keyboard input handling for the TUI.
//!
//! The search box always has focus, so printable keys go straight into the
//! query. Barcode scanners type the code and send Enter like a keyboard.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && matches!(key.code, KeyCode::Char('q')) {
        app.state = AppState::Quitting;
        return true;
    }

    // Nothing to look up: only retry or quit
    if app.is_blocked() {
        match key.code {
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::F(5) | KeyCode::Enter => {
                app.refresh_background();
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                app.state = AppState::Quitting;
                return true;
            }
            _ => {}
        }
        return false;
    }

    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            false
        }
        AppState::ConfirmingClearHistory => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_clear_history();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            false
        }
        AppState::Quitting => true,
        AppState::Normal => {
            handle_normal_input(app, key, ctrl);
            false
        }
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent, ctrl: bool) {
    if ctrl {
        match key.code {
            KeyCode::Char('r') => app.refresh_background(),
            KeyCode::Char('l') => app.request_clear_history(),
            KeyCode::Char('u') => app.search_input.clear(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::F(1) => app.state = AppState::ShowingHelp,
        KeyCode::F(5) => app.refresh_background(),
        KeyCode::Enter => app.submit_search(),
        KeyCode::Esc => app.clear_input(),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Down => app.select_history_next(),
        KeyCode::Up => app.select_history_prev(),
        KeyCode::Char(c) => app.push_char(c),
        _ => {}
    }
}
