//! One-shot CLI: price the table once from flags or saved settings.

mod progress;

use serde::Serialize;

use crate::pricing::{TableRow, parse_discount};
use crate::store::{FileStore, SettingsStore};
use crate::view::{PricingViewModel, ViewSnapshot};
use crate::{AppConfig, Result};

pub use progress::{InstallBar, print_table, render_table};

/// Flags understood by the one-shot mode.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    /// Spot price text; saved settings are used when absent.
    pub spot: Option<String>,
    /// Discount percentage text.
    pub discount: Option<String>,
    /// Persist the inputs after validation.
    pub save: bool,
    /// Print JSON instead of a table.
    pub json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    spot: f64,
    discount: f64,
    header: &'a str,
    status: &'a str,
    rows: &'a [TableRow],
}

/// Loads saved inputs, applies `options`, and saves if asked.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidSpot`] when `--save` is given with a spot
/// that is not positive, or a storage error if saving fails.
pub fn evaluate<S: SettingsStore>(
    store: S,
    options: &CliOptions,
) -> Result<(PricingViewModel<S>, ViewSnapshot)> {
    let mut view = PricingViewModel::new(store);
    let mut screen = ViewSnapshot::default();
    view.load(&mut screen);

    if let Some(spot) = &options.spot {
        view.set_spot_text(spot.as_str(), &mut screen);
    }
    if let Some(discount) = &options.discount {
        view.set_discount(parse_discount(Some(discount.as_str())), &mut screen);
    }
    if options.save {
        view.save(&mut screen)?;
    }
    Ok((view, screen))
}

/// Serializes the current table as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json_report<S: SettingsStore>(
    view: &PricingViewModel<S>,
    screen: &ViewSnapshot,
) -> Result<String> {
    let state = view.state();
    let report = JsonReport {
        spot: state.spot_price_per_ounce,
        discount: state.discount_percent,
        header: &screen.header,
        status: &screen.status,
        rows: &screen.rows,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the one-shot mode against the configured settings file.
///
/// # Errors
///
/// Returns an error if the settings cannot be read, saving is rejected, or
/// output cannot be produced.
pub fn run_once(config: &AppConfig, options: &CliOptions) -> Result<()> {
    let store = FileStore::open(&config.settings.path)?;
    let (view, screen) = evaluate(store, options)?;
    if options.json {
        println!("{}", json_report(&view, &screen)?);
    } else {
        print_table(&screen);
    }
    Ok(())
}

/// Installs the asset cache, then serves the offline proxy until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the origin is invalid or the server cannot bind.
#[cfg(feature = "proxy")]
pub async fn run_proxy(config: &AppConfig) -> Result<()> {
    use std::sync::Arc;

    use console::style;
    use tokio_util::sync::CancellationToken;

    use crate::cache::{CacheManifest, DiskCacheStorage, HttpFetcher};
    use crate::proxy::{Gateway, server};

    let storage = DiskCacheStorage::new(&config.proxy.cache_dir);
    let fetcher = HttpFetcher::new(&config.proxy.origin)?;
    log::info!(
        "Proxying {} with caches in {}",
        fetcher.origin(),
        storage.root().display()
    );

    let gateway =
        Gateway::start(CacheManifest::default(), storage, fetcher, &InstallBar::new()).await;
    println!(
        "{} http://{}:{} ({})",
        style("Serving").green().bold(),
        config.proxy.host,
        config.proxy.port,
        gateway.mode()
    );

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received, shutting down");
            shutdown.cancel();
        }
    });

    server::serve(Arc::new(gateway), &config.proxy.host, config.proxy.port, token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::pricing::{STATUS_PROMPT, STATUS_READY, STATUS_SAVED};
    use crate::store::{DISCOUNT_PCT, GOLD_SPOT, MemoryStore};
    use tempfile::TempDir;

    fn options(spot: Option<&str>, discount: Option<&str>, save: bool) -> CliOptions {
        CliOptions {
            spot: spot.map(str::to_string),
            discount: discount.map(str::to_string),
            save,
            json: false,
        }
    }

    #[test]
    fn prices_from_flags_without_saving() {
        let (view, screen) =
            evaluate(MemoryStore::new(), &options(Some("$2,000"), Some("10"), false)).unwrap();
        assert_eq!(screen.header, "Melt @ \u{2212}10%");
        assert_eq!(screen.status, STATUS_READY);
        assert_eq!(view.store().get(GOLD_SPOT), None);

        let double_eagle = screen.rows[4].as_coin().unwrap();
        assert_eq!(double_eagle.coin.label, "$20 (Double Eagle)");
        assert!((double_eagle.melt_value - 1741.5).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_saved_settings() {
        let store = MemoryStore::new()
            .with(GOLD_SPOT, "2500.00")
            .with(DISCOUNT_PCT, "5");
        let (view, screen) = evaluate(store, &CliOptions::default()).unwrap();
        assert_eq!(view.spot_text(), "2500.00");
        assert_eq!(screen.header, "Melt @ \u{2212}5%");
    }

    #[test]
    fn empty_store_prompts() {
        let (_, screen) = evaluate(MemoryStore::new(), &CliOptions::default()).unwrap();
        assert_eq!(screen.status, STATUS_PROMPT);
        assert_eq!(screen.header, "Melt @ spot");
    }

    #[test]
    fn save_flag_persists() {
        let (view, screen) =
            evaluate(MemoryStore::new(), &options(Some("2012.346"), Some("2.5"), true)).unwrap();
        assert_eq!(screen.status, STATUS_SAVED);
        assert_eq!(view.store().get(GOLD_SPOT).as_deref(), Some("2012.35"));
        assert_eq!(view.store().get(DISCOUNT_PCT).as_deref(), Some("2.5"));
    }

    #[test]
    fn save_flag_rejects_bad_spot() {
        let mut store = MemoryStore::new();
        let err = evaluate(&mut store, &options(Some("-5"), None, true)).unwrap_err();
        assert!(matches!(err, Error::InvalidSpot(v) if v == -5.0));
        assert_eq!(store.get(GOLD_SPOT), None);
    }

    #[test]
    fn table_lists_every_coin() {
        let (_, screen) = evaluate(MemoryStore::new(), &options(Some("2000"), None, false)).unwrap();
        let text = console::strip_ansi_codes(&render_table(&screen)).to_string();
        assert!(text.contains("Pre-1933 US Gold"));
        assert!(text.contains("American Gold Eagle (AGE)"));
        assert!(text.contains("$10 (Eagle)"));
        assert!(text.contains("0.96750"));
        assert!(text.contains("$1935.00"));
        assert!(text.contains("$200.00"));
    }

    #[test]
    fn json_report_shape() {
        let (view, screen) =
            evaluate(MemoryStore::new(), &options(Some("2000"), Some("10"), false)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&json_report(&view, &screen).unwrap()).unwrap();
        assert_eq!(json["spot"], 2000.0);
        assert_eq!(json["discount"], 10.0);
        assert_eq!(json["rows"].as_array().unwrap().len(), 10);
        assert_eq!(json["rows"][0]["kind"], "header");
        assert_eq!(json["rows"][1]["kind"], "coin");
        assert_eq!(json["rows"][1]["coin"]["label"], "$2.5 (Quarter Eagle)");
    }

    #[test]
    fn run_once_reads_and_writes_settings_file() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::new().with_settings_path(dir.path().join("settings.toml"));

        run_once(&config, &options(Some("1999.5"), None, true)).unwrap();
        let store = FileStore::open(&config.settings.path).unwrap();
        assert_eq!(store.get(GOLD_SPOT).as_deref(), Some("1999.50"));
        assert_eq!(store.get(DISCOUNT_PCT).as_deref(), Some("0"));
    }
}
