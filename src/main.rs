//! # Nightscout Command Line Entry Point
//!
//! Fetches recent glucose readings from the configured Nightscout site and
//! prints them as an ASCII chart, optionally followed by treatment, device
//! status and profile summaries.
//!
//! ```text
//! nightscout [--config PATH] [--hours N] [--treatments] [--status] [--profiles]
//! ```

use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use nightscout_client::config::{Config, CONFIG_FILE};
use nightscout_client::renderer::{draw_ascii, summarize_treatments};
use nightscout_client::NightscoutClient;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_HOURS: i64 = 24;

/// Parsed command line options.
#[derive(Debug, PartialEq)]
struct Options {
    config_path: String,
    hours: i64,
    treatments: bool,
    status: bool,
    profiles: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> anyhow::Result<Options> {
    let mut options = Options {
        config_path: CONFIG_FILE.to_string(),
        hours: DEFAULT_HOURS,
        treatments: false,
        status: false,
        profiles: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                options.config_path = args.next().context("--config needs a path")?;
            }
            "--hours" => {
                let value = args.next().context("--hours needs a number")?;
                options.hours = value
                    .parse()
                    .with_context(|| format!("invalid --hours value: {value}"))?;
                if options.hours <= 0 {
                    bail!("--hours must be positive");
                }
            }
            "--treatments" => options.treatments = true,
            "--status" => options.status = true,
            "--profiles" => options.profiles = true,
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(options)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the chart on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nightscout_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_args(env::args().skip(1))?;
    let config = Config::load_from_path(&options.config_path);
    let client = NightscoutClient::from_config(&config).context("failed to create client")?;

    let end = Utc::now();
    let start = end - Duration::hours(options.hours);
    info!(hours = options.hours, url = %client.base_url(), "fetching glucose readings");

    let readings = client
        .fetch_glucose_readings(start, Some(end))
        .await
        .context("failed to fetch glucose readings")?;
    draw_ascii(&readings);

    if options.treatments {
        let treatments = client
            .fetch_treatments(start, Some(end))
            .await
            .context("failed to fetch treatments")?;
        println!();
        print!("{}", summarize_treatments(&treatments));
    }

    if options.status {
        let statuses = client
            .fetch_device_statuses(start, Some(end))
            .await
            .context("failed to fetch device statuses")?;
        println!();
        match statuses.first() {
            Some(latest) => {
                let pump = latest.pump.as_ref();
                println!("Latest device status ({} total): {}", statuses.len(), latest.created_at);
                if let Some(reservoir) = pump.and_then(|p| p.reservoir) {
                    println!("  Reservoir: {reservoir:.1} U");
                }
                if let Some(iob) = latest.loop_status.as_ref().and_then(|l| l.iob.as_ref()) {
                    println!("  IOB: {:.2} U", iob.iob);
                }
                if let Some(cob) = latest.loop_status.as_ref().and_then(|l| l.cob.as_ref()) {
                    println!("  COB: {:.0} g", cob.cob);
                }
            }
            None => println!("No device status in range"),
        }
    }

    if options.profiles {
        let profiles = client
            .fetch_profiles()
            .await
            .context("failed to fetch profiles")?;
        println!();
        println!("Profiles: {}", profiles.len());
        if let Some(settings) = profiles.first().and_then(|p| p.loop_settings.as_ref()) {
            for preset in &settings.override_presets {
                println!(
                    "  {} {} ({} min)",
                    preset.symbol,
                    preset.name,
                    preset.duration_minutes()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_default_options() {
        let options = parse_args(args(&[])).unwrap();
        assert_eq!(options.config_path, CONFIG_FILE);
        assert_eq!(options.hours, 24);
        assert!(!options.treatments && !options.status && !options.profiles);
    }

    #[test]
    fn test_all_flags() {
        let options = parse_args(args(&[
            "--config",
            "/etc/ns.toml",
            "--hours",
            "6",
            "--treatments",
            "--status",
            "--profiles",
        ]))
        .unwrap();
        assert_eq!(options.config_path, "/etc/ns.toml");
        assert_eq!(options.hours, 6);
        assert!(options.treatments && options.status && options.profiles);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(parse_args(args(&["--hours", "abc"])).is_err());
        assert!(parse_args(args(&["--hours", "0"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--stdout"])).is_err());
    }
}
