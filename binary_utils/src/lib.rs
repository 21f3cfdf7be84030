use std::io::Write as _;

use anyhow::Result;
use chrono::{Local, SecondsFormat};
use env_logger::{Builder, Env, WriteStyle};
use log::LevelFilter;

const LOG_ENV_VARIABLE: &str = "BEACON_TIMELINE_LOG";

const WORKSPACE_CRATES: &[&str] = &[
    "beacon_api",
    "binary_utils",
    "chain_tracker",
    "clock",
    "helper_functions",
    "types",
];

/// Logs `info` and above from workspace crates and `module_path`.
///
/// Filters in `BEACON_TIMELINE_LOG` take precedence. They use the same syntax as `RUST_LOG`.
pub fn initialize_logger(module_path: &str, always_write_style: bool) -> Result<()> {
    let mut builder = Builder::new();

    builder.filter_level(LevelFilter::Off);

    for module in WORKSPACE_CRATES.iter().copied().chain([module_path]) {
        builder.filter_module(module, LevelFilter::Info);
    }

    builder
        .parse_env(Env::new().filter(LOG_ENV_VARIABLE))
        .format(|formatter, record| {
            let level_style = formatter.default_level_style(record.level());

            writeln!(
                formatter,
                "[{} {level_style}{:<5}{level_style:#} {}] {}",
                Local::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                record.level(),
                record.target(),
                record.args(),
            )
        });

    if always_write_style {
        builder.write_style(WriteStyle::Always);
    }

    builder.try_init()?;

    Ok(())
}
