//! Health monitoring service daemon.
//!
//! Loads `.env` and the TOML config, starts the simulation, and prints a
//! live feed of the latest readings and usage counters.
//!
//! With `HEALTHMON_RUN_SECS` set, runs for that many seconds, stops the
//! monitor and prints the final registry snapshot as JSON. Without it the
//! daemon runs until the process is killed; signals are not handled, so no
//! final snapshot is printed in that mode.

use std::thread;
use std::time::Duration;

use healthmon_service::alert::TerminalBell;
use healthmon_service::config::MonitorConfig;
use healthmon_service::logging::{self, Component};
use healthmon_service::monitor::Monitor;
use healthmon_service::registry::{RegistrySnapshot, TickReport};

const RUN_SECS_ENV: &str = "HEALTHMON_RUN_SECS";

fn print_feed(report: &TickReport, snapshot: &RegistrySnapshot) {
    println!("── tick {} ──────────────────────────────────────────", report.tick);
    for body in &snapshot.water_bodies {
        if let Some(r) = body.latest() {
            println!(
                "  💧 {:<24} {}  pH {:>4.2}  turb {:>5.2} NTU  temp {:>4.1}°C  bact {:>3}%  {}",
                body.name,
                r.display_time(),
                r.ph(),
                r.turbidity(),
                r.temperature(),
                r.bacteria_probability(),
                r.status()
            );
        }
    }
    for toilet in &snapshot.toilets {
        println!("  🚻 {:<24} usage {:>3}", toilet.name, toilet.usage);
    }
}

fn main() {
    dotenv::dotenv().ok();

    let (config, source) = match MonitorConfig::from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );
    logging::info(Component::Config, None, &source.to_string());

    let monitor = Monitor::from_config(&config, Box::new(TerminalBell::stdout()));
    // A console session has no gesture gate: running the daemon is consent.
    monitor.arm_alerts();

    let handle = match monitor.start_with(print_feed) {
        Ok(handle) => handle,
        Err(e) => {
            logging::error(Component::System, None, &e.to_string());
            std::process::exit(1);
        }
    };

    match std::env::var(RUN_SECS_ENV).ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(secs) => thread::sleep(Duration::from_secs(secs)),
        // Until killed; the snapshot below is only printed in timed runs.
        None => loop {
            thread::park();
        },
    }

    handle.stop();

    match monitor.snapshot().to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => logging::error(Component::System, None, &format!("Snapshot export failed: {}", e)),
    }
}
