//! `xbatch-check`: runs the kernel conformance suite on this machine.
//!
//! Usage: `xbatch-check [config.json]`. Without an argument the config comes
//! from `XBATCH_CHECK_CONFIG` or the defaults.

use anyhow::{bail, Context};
use log::{error, info};

use xbatch::config::{self, CheckConfig, ReportFormat};
use xbatch::{conformance, platform};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => CheckConfig::load(&path)?,
        None => config::CONFIG.clone(),
    };
    info!(
        "Checking kernels: {} samples per op, seed {:#x}, edge cases {}",
        config.samples,
        config.seed,
        if config.include_edge_cases { "on" } else { "off" }
    );

    let registry = platform::registry_report();
    info!(
        "{} build, {} accelerated pairs",
        registry.arch,
        registry.accelerated().count()
    );

    let report = conformance::check_all(&config);

    match config.report.format {
        ReportFormat::Text => println!("{}", report),
        ReportFormat::Json => {
            let json = serde_json::json!({ "platform": registry, "conformance": report });
            let text = serde_json::to_string_pretty(&json).context("Failed to serialize report")?;
            println!("{}", text);
        }
    }

    if !report.passed() {
        for pair in report.failed_pairs() {
            error!(
                "{}x{} on {}: {} mismatches",
                pair.value_type,
                pair.lanes,
                pair.kernel,
                pair.mismatches()
            );
        }
        bail!("{} kernel results differ from the fallback", report.mismatches());
    }
    info!("All kernels match the fallback.");
    Ok(())
}
