//! Show version example
//!
//! Connects to an EOS device and runs a batched request that decodes
//! `show version` into a typed struct, plus a plain text command.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example show_version -- --host switch1 --user admin --password secret
//! ```
//!
//! Using a profile from `eapi.conf`:
//! ```bash
//! cargo run --example show_version -- --profile spine1
//! ```

use std::env;

use eapi::{EapiResponse, Encoding, JsonResult, Node, TextResult};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, EapiResponse)]
#[eapi(command = "show version")]
#[serde(rename_all = "camelCase")]
struct ShowVersion {
    model_name: String,
    version: String,
    serial_number: String,
    #[serde(default)]
    uptime: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("=== eapi show version example ===\n");

    let mut node = match &args.profile {
        Some(profile) => {
            println!("Using profile '{}'", profile);
            eapi::connect_to(profile)?
        }
        None => {
            println!("Connecting to {} over {}...", args.host, args.transport);
            Node::builder(&args.host)
                .username(&args.user)
                .password(&args.password)
                .transport(&args.transport)
                .build()?
        }
    };

    // --- Batched JSON request ---
    println!("--- Batched request ---\n");

    let mut version = ShowVersion::default();
    let mut hostname = JsonResult::new("show hostname");

    let mut handle = node.handle(Encoding::Json);
    handle.add_command(&mut version)?;
    handle.add_command(&mut hostname)?;
    handle.call().await?;
    handle.close();

    println!("Model:    {}", version.model_name);
    println!("Version:  {}", version.version);
    println!("Serial:   {}", version.serial_number);
    println!("Uptime:   {:.0}s", version.uptime);
    if let Some(name) = hostname.get("hostname") {
        println!("Hostname: {}", name);
    }
    println!();

    // --- Text output ---
    println!("--- Text output ---\n");

    let mut clock = TextResult::new("show clock");
    let mut handle = node.get_handle("text")?;
    handle.enable(&mut clock).await?;
    handle.close();
    println!("{}", clock);

    let responses = node.enable(&["show uptime"]).await?;
    for response in responses {
        println!("> {}", response.command);
        println!("{}", "-".repeat(40));
        println!("{}", response);
    }

    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    user: String,
    password: String,
    transport: String,
    profile: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut user = "admin".to_string();
        let mut password = String::new();
        let mut transport = "https".to_string();
        let mut profile = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = args[i].clone();
                    }
                }
                "--transport" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        transport = args[i].clone();
                    }
                }
                "--profile" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        profile = Some(args[i].clone());
                    }
                }
                "--help" => {
                    println!(
                        "USAGE:\n    cargo run --example show_version -- [--host HOST] [--user USER] \
                         [--password PASS] [--transport socket|http_local|http|https] [--profile NAME]"
                    );
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            host,
            user,
            password,
            transport,
            profile,
        }
    }
}
