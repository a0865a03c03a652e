use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use floodsim_service::config::AppConfig;
use floodsim_service::logging::{self, Component};
use floodsim_service::{
    Dashboard, DashboardSnapshot, Intensity, JsonStateFile, Scenario, SystemClock,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Campus flood sensor simulation and alerting")]
struct Cli {
    /// TOML config file (defaults to ./floodsim.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long to run before exiting, in seconds
    #[arg(long, default_value_t = 30)]
    run_secs: u64,

    /// Start a hazard scenario: heavy-rain, flash-flood, blockage, recovery
    #[arg(long)]
    hazard: Option<Scenario>,

    /// Hazard intensity: low, medium, high
    #[arg(long, default_value = "medium")]
    intensity: Intensity,

    /// Hazard duration in seconds
    #[arg(long, default_value_t = 30.0)]
    duration_secs: f64,

    /// Drift seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Ignore any saved state and start from the seed registry
    #[arg(long)]
    fresh: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.simulation.seed = Some(seed);
    }

    logging::init_logger(
        config.log_level()?,
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    let state_path = PathBuf::from(&config.persistence.state_path);
    let saved = if cli.fresh {
        None
    } else {
        DashboardSnapshot::load(&state_path)?
    };

    let mut dashboard = match saved {
        Some(snapshot) => Dashboard::restore(&config, Box::new(SystemClock), snapshot),
        None => Dashboard::new(&config, Box::new(SystemClock)),
    };
    dashboard.add_listener(Box::new(JsonStateFile::new(&state_path)));
    dashboard.login(&config.auth.username, &config.auth.password)?;

    logging::info(
        Component::System,
        None,
        &format!(
            "monitoring {} nodes, state file {}",
            dashboard.nodes().len(),
            state_path.display()
        ),
    );

    dashboard.start_drift();
    if let Some(scenario) = cli.hazard {
        dashboard.start_hazard(scenario, cli.duration_secs, cli.intensity)?;
    }

    let deadline = Instant::now() + Duration::from_secs(cli.run_secs);
    let mut last_seen = dashboard.notifications().latest().map(|e| e.id).unwrap_or(0);
    let mut last_status = String::new();

    while Instant::now() < deadline {
        if dashboard.pump() > 0 {
            let mut fresh: Vec<_> = dashboard
                .notifications()
                .iter()
                .take_while(|e| e.id > last_seen)
                .collect();
            fresh.reverse();
            for entry in fresh {
                println!("[{}] {}", entry.timestamp, entry.message);
                last_seen = entry.id;
            }

            let status = dashboard.hazard_status().summary();
            if status != last_status {
                println!("{}", status);
                last_status = status;
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    dashboard.stop_drift();
    println!(
        "Stopped. {} nodes, {} critical, {} notifications",
        dashboard.nodes().len(),
        dashboard.critical_nodes().len(),
        dashboard.notifications().len()
    );
    Ok(())
}
