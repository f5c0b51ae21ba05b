use anyhow::Result;
use clap::Parser;
use particle_life_lib::{App, AppOptions, ShutdownManager};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial world as a JSON seed; overrides the random world options
    #[arg(short, long)]
    seed_file: Option<PathBuf>,

    /// Number of groups in the random world
    #[arg(short, long, default_value_t = 4)]
    groups: usize,

    /// Particles per group in the random world
    #[arg(long, default_value_t = 500)]
    group_size: usize,

    /// Interaction radius of every group in the random world
    #[arg(long, default_value_t = 80.0)]
    radius: f32,

    /// Stop after this many seconds; runs until Ctrl+C otherwise
    #[arg(short, long)]
    duration: Option<f64>,

    /// Worker threads (0 or -1 for auto)
    #[arg(short, long, allow_negative_numbers = true)]
    threads: Option<i32>,

    /// Fixed RNG seed for a reproducible world
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let duration = match args.duration {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => anyhow::bail!("--duration must be a non-negative number, got {secs}"),
        None => None,
    };

    let mut app = App::new(AppOptions {
        config_path: args.config,
        seed_path: args.seed_file,
        groups: args.groups,
        group_size: args.group_size,
        radius: args.radius,
        duration,
        threads: args.threads,
        rng_seed: args.rng_seed,
    })?;

    let shutdown = ShutdownManager::new();
    let res = app.run(&shutdown).await;
    shutdown.cleanup(&mut app)?;

    if let Err(e) = res {
        eprintln!("Application error: {e}");
        std::process::exit(1);
    }
    println!("Exited clean.");
    std::process::exit(shutdown.exit_code());
}
