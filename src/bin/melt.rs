use std::env;
use std::path::PathBuf;

use gold_melt::AppConfig;

fn print_usage() {
    eprintln!("Usage: melt [MODE] [OPTIONS]");
    eprintln!();
    eprintln!("Modes:");
    eprintln!("  (default)              Interactive calculator (TUI)");
    eprintln!("  --proxy                Serve the web app through the offline cache");
    eprintln!("  --spot/--json/--save   Print the melt table once");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --spot <PRICE>         Spot price per troy ounce (e.g. \"$2,000\")");
    eprintln!("  --discount <PCT>       Discount below spot, 0-100 (default: saved or 0)");
    eprintln!("  --save                 Save spot and discount after validating");
    eprintln!("  --json                 Print the table as JSON");
    eprintln!("  --config <PATH>        Config file (default: $MELT_CONFIG or user config dir)");
    eprintln!("  -h, --help             Show this help");
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    if let Some(value) = args.get(*i) {
        value.clone()
    } else {
        eprintln!("Error: {flag} requires a value");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> gold_melt::Result<()> {
    let mut proxy = false;
    let mut once = false;
    let mut config_path: Option<PathBuf> = None;
    #[cfg(feature = "cli")]
    let mut options = gold_melt::cli::CliOptions::default();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--proxy" => proxy = true,
            "--tui" => {}
            "--config" => config_path = Some(PathBuf::from(take_value(&args, &mut i, "--config"))),
            "--spot" => {
                let value = take_value(&args, &mut i, "--spot");
                #[cfg(feature = "cli")]
                {
                    options.spot = Some(value);
                }
                #[cfg(not(feature = "cli"))]
                let _ = value;
                once = true;
            }
            "--discount" => {
                let value = take_value(&args, &mut i, "--discount");
                #[cfg(feature = "cli")]
                {
                    options.discount = Some(value);
                }
                #[cfg(not(feature = "cli"))]
                let _ = value;
                once = true;
            }
            "--save" => {
                #[cfg(feature = "cli")]
                {
                    options.save = true;
                }
                once = true;
            }
            "--json" => {
                #[cfg(feature = "cli")]
                {
                    options.json = true;
                }
                once = true;
            }
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Error: unknown argument {other:?}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    // The TUI owns the terminal, so stay quiet there unless RUST_LOG asks
    let tui = !proxy && !once;
    let default_filter = if tui { "off" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match config_path {
        Some(path) => AppConfig::load_or_create(&path)?
            .apply_overrides(|key| env::var(key).ok())?,
        None => AppConfig::load()?,
    };
    log::debug!("Config: {config:?}");

    if proxy {
        #[cfg(all(feature = "cli", feature = "proxy"))]
        {
            gold_melt::cli::run_proxy(&config).await
        }
        #[cfg(not(all(feature = "cli", feature = "proxy")))]
        {
            let _ = config;
            eprintln!("Proxy support not compiled in");
            std::process::exit(1);
        }
    } else if once {
        #[cfg(feature = "cli")]
        {
            if let Err(e) = gold_melt::cli::run_once(&config, &options) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        #[cfg(not(feature = "cli"))]
        {
            let _ = config;
            eprintln!("CLI support not compiled in");
            std::process::exit(1);
        }
    } else {
        #[cfg(feature = "tui")]
        {
            gold_melt::tui::run(&config)
        }
        #[cfg(not(feature = "tui"))]
        {
            let _ = config;
            eprintln!("TUI support not compiled in");
            std::process::exit(1);
        }
    }
}
