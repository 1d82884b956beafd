//! Pricing view model: owns the inputs, persists them, and pushes derived
//! output to a render target.

use crate::pricing::{
    PricingState, STATUS_INVALID, STATUS_SAVED, TableRow, parse_discount, parse_spot, status_for,
};
use crate::format::{format_fixed2, format_percent};
use crate::store::{DISCOUNT_PCT, GOLD_SPOT, LegacyFlags, SettingsStore};
use crate::{Error, Result};

/// Presentation surface for the coin table.
///
/// Implementations return [`Error::MissingElement`] when they cannot show a
/// given piece of output; the view model degrades instead of failing.
pub trait RenderTarget {
    /// Replaces every table row.
    fn set_rows(&mut self, rows: &[TableRow]) -> Result<()>;

    /// Sets the melt column header.
    fn set_header(&mut self, label: &str) -> Result<()>;

    /// Sets the status line.
    fn set_status(&mut self, text: &str) -> Result<()>;
}

/// Render target that simply keeps the last output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    pub header: String,
    pub rows: Vec<TableRow>,
    pub status: String,
}

impl RenderTarget for ViewSnapshot {
    fn set_rows(&mut self, rows: &[TableRow]) -> Result<()> {
        self.rows = rows.to_vec();
        Ok(())
    }

    fn set_header(&mut self, label: &str) -> Result<()> {
        self.header = label.to_string();
        Ok(())
    }

    fn set_status(&mut self, text: &str) -> Result<()> {
        self.status = text.to_string();
        Ok(())
    }
}

/// Holds the spot field text and discount slider, and redraws on every edit.
#[derive(Debug)]
pub struct PricingViewModel<S> {
    store: S,
    spot_text: String,
    discount: Option<f64>,
    status: String,
}

impl<S: SettingsStore> PricingViewModel<S> {
    /// Creates a view model with empty inputs. Call [`Self::load`] to seed it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            spot_text: String::new(),
            discount: Some(0.0),
            status: String::new(),
        }
    }

    /// Creates a view model without a discount control; discount reads as 0.
    pub fn without_discount(store: S) -> Self {
        Self {
            discount: None,
            ..Self::new(store)
        }
    }

    /// Seeds inputs from persisted settings and renders.
    pub fn load(&mut self, target: &mut impl RenderTarget) -> PricingState {
        if let Some(saved) = self.store.get(GOLD_SPOT) {
            self.spot_text = saved;
        }
        if self.discount.is_some() {
            let saved = self.store.get(DISCOUNT_PCT);
            self.discount = Some(parse_discount(saved.as_deref()).clamp(0.0, 100.0));
        }

        let flags = LegacyFlags::read(&self.store);
        log::debug!("Legacy display flags: {flags:?}");

        let state = self.state();
        self.status = status_for(state.spot_price_per_ounce).to_string();
        log::info!(
            "Loaded spot {} with {}% discount",
            format_fixed2(state.spot_price_per_ounce),
            format_percent(state.discount_percent)
        );
        self.paint(&state, target);
        state
    }

    /// Current inputs as a sanitized pricing state.
    #[must_use]
    pub fn state(&self) -> PricingState {
        PricingState::new(parse_spot(&self.spot_text), self.discount())
    }

    /// Raw text of the spot field.
    #[must_use]
    pub fn spot_text(&self) -> &str {
        &self.spot_text
    }

    /// Current discount percentage, 0 when there is no slider.
    #[must_use]
    pub fn discount(&self) -> f64 {
        self.discount.unwrap_or(0.0)
    }

    /// Current status line.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Replaces the spot field text and redraws.
    pub fn set_spot_text(&mut self, text: impl Into<String>, target: &mut impl RenderTarget) {
        self.spot_text = text.into();
        self.refresh(target);
    }

    /// Moves the discount slider and redraws. Ignored without a slider.
    pub fn set_discount(&mut self, pct: f64, target: &mut impl RenderTarget) {
        if self.discount.is_none() {
            return;
        }
        let pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
        self.discount = Some(pct);
        self.refresh(target);
    }

    /// Validates and persists the current inputs.
    ///
    /// The spot is stored with two decimals and the discount as its
    /// [`format_percent`] text, so both are rounded to the cent and to the
    /// hundredth of a percent on the next load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpot`] without writing anything when the spot
    /// price is not a positive number; the table is redrawn at a spot of 0.
    /// Returns a storage error if the settings cannot be written.
    pub fn save(&mut self, target: &mut impl RenderTarget) -> Result<()> {
        let spot = parse_spot(&self.spot_text);
        if !spot.is_finite() || spot <= 0.0 {
            self.status = STATUS_INVALID.to_string();
            self.paint(&PricingState::new(0.0, self.discount()), target);
            return Err(Error::InvalidSpot(spot));
        }

        let discount = self.discount();
        self.store.set(GOLD_SPOT, &format_fixed2(spot))?;
        self.store.set(DISCOUNT_PCT, &format_percent(discount))?;
        log::info!("Saved spot {} with {}% discount", format_fixed2(spot), format_percent(discount));

        self.status = STATUS_SAVED.to_string();
        self.paint(&self.state(), target);
        Ok(())
    }

    /// Redraws from the current inputs without changing the status line.
    pub fn render(&self, target: &mut impl RenderTarget) {
        self.paint(&self.state(), target);
    }

    /// Read access to the settings store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Write access to the settings store, for the PIN gate.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn refresh(&mut self, target: &mut impl RenderTarget) {
        let state = self.state();
        self.status = status_for(state.spot_price_per_ounce).to_string();
        self.paint(&state, target);
    }

    fn paint(&self, state: &PricingState, target: &mut impl RenderTarget) {
        let rows = state.rows();
        log::debug!(
            "Recomputed {} rows at spot {}",
            rows.len(),
            format_fixed2(state.spot_price_per_ounce)
        );

        let drawn = target
            .set_header(&state.header())
            .and_then(|()| target.set_rows(&rows));
        let status = match drawn {
            Ok(()) => self.status.clone(),
            Err(e) => {
                log::warn!("Table not drawn: {e}");
                format!("Unable to draw table: {e}")
            }
        };
        if let Err(e) = target.set_status(&status) {
            log::warn!("Status not drawn: {e}");
        }
    }
}
