//! Progress bar and table printing for the one-shot CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cache::InstallProgress;
use crate::format::{format_currency, format_weight};
use crate::pricing::TableRow;
use crate::view::ViewSnapshot;

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Install progress shown as a single bar counting cached assets.
#[derive(Debug, Clone)]
pub struct InstallBar {
    bar: ProgressBar,
}

impl Default for InstallBar {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallBar {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("progress template is valid")
                .progress_chars("━━╌"),
        );
        Self { bar }
    }
}

impl InstallProgress for InstallBar {
    fn on_start(&self, cache: &str, assets: usize) {
        self.bar.set_length(assets as u64);
        self.bar.set_message(format!("caching {cache}"));
    }

    fn on_asset(&self, path: &str, _bytes: usize) {
        self.bar.inc(1);
        self.bar.set_message(path.to_string());
    }

    fn on_complete(&self, cache: &str) {
        self.bar.finish_with_message(format!("{cache} ready"));
    }

    fn on_error(&self, error: &str) {
        self.bar.abandon_with_message(format!("install failed: {error}"));
    }
}

/// Renders the coin table as styled text.
#[must_use]
pub fn render_table(screen: &ViewSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:>9} {:>14}\n",
        style("Coin").bold(),
        style("AGW oz").bold(),
        style(&screen.header).bold()
    ));
    out.push_str(SEPARATOR);
    out.push('\n');

    for row in &screen.rows {
        match row {
            TableRow::Header { section } => {
                out.push_str(&format!("{}\n", style(section.title()).yellow().bold()));
            }
            TableRow::Coin(coin) => {
                out.push_str(&format!(
                    "  {:<22} {:>9} {:>14}\n",
                    coin.coin.label,
                    format_weight(coin.coin.agw_ounces),
                    style(format_currency(coin.melt_value)).green()
                ));
            }
        }
    }

    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str(&format!("{}\n", style(&screen.status).dim()));
    out
}

/// Prints the coin table to stdout.
pub fn print_table(screen: &ViewSnapshot) {
    print!("{}", render_table(screen));
}
