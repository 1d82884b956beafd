//! Keyboard and paste input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::store::SettingsStore;

use super::app::{App, DISCOUNT_STEP, DISCOUNT_STEP_LARGE, Focus, Popup};

pub fn handle_input<S: SettingsStore>(app: &mut App<S>, key: KeyEvent) {
    // Global quit
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.popup {
        Popup::Pin => handle_pin_input(app, key),
        Popup::None => handle_main_input(app, key),
    }
}

fn handle_pin_input<S: SettingsStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => app.push_pin_digit(c),
        KeyCode::Backspace => {
            app.pin_input.pop();
        }
        KeyCode::Enter => app.submit_pin(),
        KeyCode::Esc => app.should_quit = true,
        _ => {}
    }
}

fn handle_main_input<S: SettingsStore>(app: &mut App<S>, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('s') {
            app.save();
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Tab | KeyCode::BackTab => app.focus = app.focus.next(),
        KeyCode::Enter => app.save(),
        _ => match app.focus {
            Focus::Spot => handle_spot_input(app, key),
            Focus::Discount => handle_discount_input(app, key),
        },
    }
}

fn handle_spot_input<S: SettingsStore>(app: &mut App<S>, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if !c.is_control() => app.edit_spot(|text| text.push(c)),
        KeyCode::Backspace => app.edit_spot(|text| {
            text.pop();
        }),
        _ => {}
    }
}

fn handle_discount_input<S: SettingsStore>(app: &mut App<S>, key: KeyEvent) {
    let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
        DISCOUNT_STEP_LARGE
    } else {
        DISCOUNT_STEP
    };
    match key.code {
        KeyCode::Left | KeyCode::Down | KeyCode::Char('-') => app.nudge_discount(-step),
        KeyCode::Right | KeyCode::Up | KeyCode::Char('+' | '=') => app.nudge_discount(step),
        KeyCode::Home => app.nudge_discount(-100.0),
        KeyCode::End => app.nudge_discount(100.0),
        _ => {}
    }
}

/// Pasted text goes to whichever field is active; line breaks are dropped.
pub fn handle_paste<S: SettingsStore>(app: &mut App<S>, text: &str) {
    let cleaned: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    match app.popup {
        Popup::Pin => cleaned.trim().chars().for_each(|c| app.push_pin_digit(c)),
        Popup::None if app.focus == Focus::Spot => app.edit_spot(|t| t.push_str(cleaned.trim())),
        Popup::None => {}
    }
}
