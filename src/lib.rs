//! gold-melt - melt values for US gold coins.
//!
//! Computes the melt value of pre-1933 US gold coins and American Gold
//! Eagles from a spot price and an optional dealer discount, keeps the last
//! inputs in a small settings store, and can serve its web assets through a
//! cache-first offline proxy.
//!
//! # Example
//!
//! ```
//! use gold_melt::{MemoryStore, PricingViewModel, ViewSnapshot};
//!
//! let mut view = PricingViewModel::new(MemoryStore::new());
//! let mut screen = ViewSnapshot::default();
//! view.load(&mut screen);
//! view.set_spot_text("$2,000", &mut screen);
//! view.set_discount(5.0, &mut screen);
//!
//! assert_eq!(screen.header, "Melt @ \u{2212}5%");
//! assert_eq!(screen.rows.len(), 10);
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod pin;
pub mod pricing;
pub mod proxy;
pub mod store;
pub mod view;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use cache::{
    AssetRequest, AssetResponse, CacheManifest, CacheStorage, DiskCacheStorage, Fetcher,
    HttpFetcher, InstallProgress, MemoryCacheStorage, NoProgress,
};
pub use catalog::{CoinDefinition, GOLD_EAGLE, PRE_1933, Section};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use pin::{PinGate, PinOutcome, PinState};
pub use pricing::{CoinRow, PricingState, TableRow, compute_rows};
pub use proxy::{ActiveProxy, Gateway, InstalledProxy, OfflineProxy};
pub use store::{FileStore, LegacyFlags, MemoryStore, SettingsStore};
pub use view::{PricingViewModel, RenderTarget, ViewSnapshot};
