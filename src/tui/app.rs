//! Application state model.

use crate::Error;
use crate::pin::{PIN_LENGTH, PinGate, PinOutcome, PinState};
use crate::store::SettingsStore;
use crate::view::{PricingViewModel, ViewSnapshot};

/// Slider step for a plain arrow key.
pub const DISCOUNT_STEP: f64 = 1.0;
/// Slider step with Shift held.
pub const DISCOUNT_STEP_LARGE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Pin,
}

/// Which main-screen control receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Spot,
    Discount,
}

impl Focus {
    pub const fn next(self) -> Self {
        match self {
            Self::Spot => Self::Discount,
            Self::Discount => Self::Spot,
        }
    }
}

pub struct App<S> {
    pub view: PricingViewModel<S>,
    /// Last output pushed by the view model.
    pub screen: ViewSnapshot,
    pub pin: PinGate,
    pub pin_input: String,
    pub pin_message: Option<&'static str>,
    pub popup: Popup,
    pub focus: Focus,
    pub should_quit: bool,
}

impl<S: SettingsStore> App<S> {
    /// Loads saved inputs and arms the PIN gate.
    pub fn new(store: S) -> Self {
        let mut view = PricingViewModel::new(store);
        let mut screen = ViewSnapshot::default();
        view.load(&mut screen);
        let pin = PinGate::arm(view.store());
        let popup = if pin.is_unlocked() { Popup::None } else { Popup::Pin };

        Self {
            view,
            screen,
            pin,
            pin_input: String::new(),
            pin_message: None,
            popup,
            focus: Focus::Spot,
            should_quit: false,
        }
    }

    /// Title for the PIN popup.
    pub const fn pin_prompt(&self) -> &'static str {
        match self.pin.state() {
            PinState::Uninitialized => "Create a 4-digit PIN",
            PinState::Locked | PinState::Unlocked => "Enter PIN",
        }
    }

    /// Appends a digit to the PIN entry.
    pub fn push_pin_digit(&mut self, c: char) {
        if c.is_ascii_digit() && self.pin_input.chars().count() < PIN_LENGTH {
            self.pin_input.push(c);
        }
    }

    pub fn submit_pin(&mut self) {
        match self.pin.submit(&self.pin_input, self.view.store_mut()) {
            Ok(outcome) => {
                self.pin_message = Some(outcome.message());
                if matches!(outcome, PinOutcome::Mismatch | PinOutcome::WrongLength) {
                    self.pin_input.clear();
                }
            }
            Err(e) => {
                log::error!("Could not store PIN: {e}");
                self.pin_message = Some("Could not store PIN.");
            }
        }
        if self.pin.is_unlocked() {
            self.pin_input.clear();
            self.popup = Popup::None;
        }
    }

    /// Replaces the spot text and redraws.
    pub fn edit_spot(&mut self, edit: impl FnOnce(&mut String)) {
        let mut text = self.view.spot_text().to_string();
        edit(&mut text);
        self.view.set_spot_text(text, &mut self.screen);
    }

    /// Moves the discount slider by `delta`, clamped to `[0, 100]`.
    pub fn nudge_discount(&mut self, delta: f64) {
        let pct = (self.view.discount() + delta).clamp(0.0, 100.0);
        self.view.set_discount(pct, &mut self.screen);
    }

    /// Validates and persists the inputs; the status line reports the result.
    pub fn save(&mut self) {
        match self.view.save(&mut self.screen) {
            Ok(()) | Err(Error::InvalidSpot(_)) => {}
            Err(e) => {
                log::error!("Save failed: {e}");
                self.screen.status = format!("Could not save: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{STATUS_INVALID, STATUS_PROMPT, STATUS_READY, STATUS_SAVED};
    use crate::store::{APP_PIN, DISCOUNT_PCT, GOLD_SPOT, MemoryStore};

    #[test]
    fn starts_locked_behind_pin() {
        let app = App::new(MemoryStore::new());
        assert_eq!(app.popup, Popup::Pin);
        assert_eq!(app.pin_prompt(), "Create a 4-digit PIN");
        assert_eq!(app.screen.status, STATUS_PROMPT);

        let app = App::new(MemoryStore::new().with(APP_PIN, "1234"));
        assert_eq!(app.popup, Popup::Pin);
        assert_eq!(app.pin_prompt(), "Enter PIN");
    }

    #[test]
    fn first_pin_is_stored() {
        let mut app = App::new(MemoryStore::new());
        for c in "9876".chars() {
            app.push_pin_digit(c);
        }
        app.submit_pin();
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.pin_message, Some("PIN set. Unlocked."));
        assert_eq!(app.view.store().get(APP_PIN).as_deref(), Some("9876"));
    }

    #[test]
    fn wrong_pin_clears_entry() {
        let mut app = App::new(MemoryStore::new().with(APP_PIN, "1234"));
        app.pin_input = "4321".to_string();
        app.submit_pin();
        assert_eq!(app.popup, Popup::Pin);
        assert_eq!(app.pin_message, Some("Wrong PIN. Try again."));
        assert!(app.pin_input.is_empty());

        app.pin_input = "1234".to_string();
        app.submit_pin();
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn pin_entry_is_digits_only_and_bounded() {
        let mut app = App::new(MemoryStore::new());
        for c in "12a3456".chars() {
            app.push_pin_digit(c);
        }
        assert_eq!(app.pin_input, "1234");
    }

    #[test]
    fn short_pin_rejected() {
        let mut app = App::new(MemoryStore::new());
        app.pin_input = "12".to_string();
        app.submit_pin();
        assert_eq!(app.pin_message, Some("PIN must be exactly 4 digits."));
        assert_eq!(app.popup, Popup::Pin);
        assert_eq!(app.view.store().get(APP_PIN), None);
    }

    #[test]
    fn editing_spot_rerenders() {
        let mut app = App::new(MemoryStore::new());
        for c in "2000".chars() {
            app.edit_spot(|t| t.push(c));
        }
        assert_eq!(app.screen.status, STATUS_READY);
        let quarter = app.screen.rows[1].as_coin().unwrap();
        assert!((quarter.melt_value - 241.88).abs() < 1e-9);

        app.edit_spot(|t| {
            t.clear();
        });
        assert_eq!(app.screen.status, STATUS_PROMPT);
    }

    #[test]
    fn discount_is_clamped() {
        let mut app = App::new(MemoryStore::new());
        app.nudge_discount(-DISCOUNT_STEP);
        assert!(app.view.discount().abs() < f64::EPSILON);
        for _ in 0..25 {
            app.nudge_discount(DISCOUNT_STEP_LARGE);
        }
        assert!((app.view.discount() - 100.0).abs() < f64::EPSILON);
        assert_eq!(app.screen.header, "Melt @ \u{2212}100%");
    }

    #[test]
    fn save_reports_status() {
        let mut app = App::new(MemoryStore::new());
        app.save();
        assert_eq!(app.screen.status, STATUS_INVALID);
        assert_eq!(app.view.store().get(GOLD_SPOT), None);

        app.edit_spot(|t| t.push_str("2500"));
        app.nudge_discount(DISCOUNT_STEP_LARGE);
        app.save();
        assert_eq!(app.screen.status, STATUS_SAVED);
        assert_eq!(app.view.store().get(GOLD_SPOT).as_deref(), Some("2500.00"));
        assert_eq!(app.view.store().get(DISCOUNT_PCT).as_deref(), Some("5"));
    }
}
