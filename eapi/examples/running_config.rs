//! Running config example
//!
//! Loads a profile, applies a small configuration change and prints the
//! matching section of the refreshed running config.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example running_config -- spine1 "^interface Ethernet1" "description uplink"
//! ```
//!
//! The optional config file is searched the usual way (`EAPI_CONF`,
//! `~/.eapi.conf`, `/mnt/flash/eapi.conf`).

use std::env;

use eapi::ConfigSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let profile = args.first().map(String::as_str).unwrap_or("localhost");
    let section = args.get(1).map(String::as_str).unwrap_or("^interface Ethernet1");
    let change = args.get(2);

    println!("Available profiles: {}", eapi::connections()?.join(", "));
    let mut node = eapi::connect_to(profile)?;

    let running = node.running_config().await?;
    println!("Running config: {} lines", running.lines().count());

    println!("\n--- Section '{}' ---\n", section);
    println!("{}", node.get_section(section, ConfigSource::Running).await?);

    if let Some(change) = change {
        // The section pattern doubles as the config-mode context.
        let context = section.trim_start_matches('^');
        println!("\nApplying: {} / {}", context, change);
        node.config(&[context, change.as_str()]).await?;

        println!("\n--- Section '{}' after change ---\n", section);
        println!("{}", node.get_section(section, ConfigSource::Running).await?);
    }

    Ok(())
}
