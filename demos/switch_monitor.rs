// SPDX-License-Identifier: MPL-2.0

//! Switch monitor example.
//!
//! Connects to a relay switch, prints its state after every poll and the
//! active time counters on exit. With `toggle`, the relay is switched on for
//! a few seconds and then off again, which records active time.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example switch_monitor -- <device_ip> [store_dir] [toggle]
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Watch a switch until Ctrl+C, keeping active time in memory
//! cargo run --example switch_monitor -- 192.168.1.40
//!
//! # Persist active time and run one on/off cycle
//! RUST_LOG=debug cargo run --example switch_monitor -- 192.168.1.40 /tmp/switch toggle
//! ```

use std::env;
use std::time::Duration;

use shelly_switch::Switch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let address = &args[1];
    let mut builder = Switch::http(address.as_str()).with_poll_interval(Duration::from_secs(2));
    if let Some(directory) = args.get(2) {
        builder = builder.with_store_directory(directory);
    }
    let toggle = args.get(3).is_some_and(|arg| arg == "toggle");

    println!("Connecting to {address}...");
    let switch = builder.build().await?;
    println!("Firmware: {}", switch.generation());

    let watched = switch.clone();
    switch.set_listener(move || {
        println!(
            "  on: {:<5} power: {:>5} W  activated: {}  deactivated: {}",
            watched.is_on(),
            watched.power(),
            watched.last_activation_time().format("%H:%M:%S"),
            watched.last_deactivation_time().format("%H:%M:%S"),
        );
    });
    switch.start();

    if toggle {
        println!("\nSwitching on for 5 seconds...");
        switch.set_on(true).await?;
        tokio::time::sleep(Duration::from_secs(5)).await;
        println!("\nSwitching off...");
        switch.set_on(false).await?;
    }

    println!("\nPress Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;

    switch.clear_listener();
    switch.close().await;

    println!();
    println!("Hours today:        {:.4}", switch.hours_today());
    println!("Hours this year:    {:.4}", switch.hours_current_year());
    println!("Estimated per year: {:.1}", switch.estimated_year_hours());

    Ok(())
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {program} <device_ip> [store_dir] [toggle]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program} 192.168.1.40");
    eprintln!("  {program} 192.168.1.40 /tmp/switch toggle");
}
