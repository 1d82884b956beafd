//! Local PIN gate in front of the calculator.
//!
//! This is a convenience lock, not a credential system. The PIN is stored in
//! clear text next to the other settings and the first entry on a device
//! always succeeds and becomes the PIN. Anyone who can read or clear the
//! settings file can read or reset it.

use crate::Result;
use crate::store::{APP_PIN, SettingsStore};

/// Required PIN length in characters.
pub const PIN_LENGTH: usize = 4;

/// Gate state. Re-armed on every launch; unlocks are never remembered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// No PIN has ever been stored.
    Uninitialized,
    /// A PIN exists and has not been entered this session.
    Locked,
    /// Entry accepted for this session.
    Unlocked,
}

/// Result of submitting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// First entry stored as the PIN.
    Created,
    /// Entry matched the stored PIN.
    Accepted,
    /// Entry had the right length but did not match.
    Mismatch,
    /// Entry was not exactly four characters.
    WrongLength,
    /// Gate was already open; nothing checked.
    AlreadyUnlocked,
}

impl PinOutcome {
    /// Message shown next to the entry field.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Created => "PIN set. Unlocked.",
            Self::Accepted | Self::AlreadyUnlocked => "Unlocked.",
            Self::Mismatch => "Wrong PIN. Try again.",
            Self::WrongLength => "PIN must be exactly 4 digits.",
        }
    }
}

/// PIN gate state machine.
#[derive(Debug, Clone)]
pub struct PinGate {
    state: PinState,
}

impl PinGate {
    /// Arms the gate: `Locked` when a PIN is stored, `Uninitialized` otherwise.
    #[must_use]
    pub fn arm(store: &impl SettingsStore) -> Self {
        let state = if store.get(APP_PIN).is_some() {
            PinState::Locked
        } else {
            PinState::Uninitialized
        };
        Self { state }
    }

    #[must_use]
    pub const fn state(&self) -> PinState {
        self.state
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.state == PinState::Unlocked
    }

    /// Checks an entry against the stored PIN, or stores it if none exists.
    ///
    /// There is no attempt counter and no lockout.
    ///
    /// # Errors
    ///
    /// Returns an error only if storing a first-time PIN fails; the gate
    /// then stays `Uninitialized`.
    pub fn submit(&mut self, entry: &str, store: &mut impl SettingsStore) -> Result<PinOutcome> {
        if self.state == PinState::Unlocked {
            return Ok(PinOutcome::AlreadyUnlocked);
        }
        if entry.chars().count() != PIN_LENGTH {
            return Ok(PinOutcome::WrongLength);
        }

        match self.state {
            PinState::Uninitialized => {
                store.set(APP_PIN, entry)?;
                log::info!("PIN created");
                self.state = PinState::Unlocked;
                Ok(PinOutcome::Created)
            }
            PinState::Locked => {
                if store.get(APP_PIN).as_deref() == Some(entry) {
                    self.state = PinState::Unlocked;
                    Ok(PinOutcome::Accepted)
                } else {
                    Ok(PinOutcome::Mismatch)
                }
            }
            PinState::Unlocked => Ok(PinOutcome::AlreadyUnlocked),
        }
    }
}
