use brightness_scheduler::configuration::{Configuration, DEFAULT_CONFIG_PATH};
use brightness_scheduler::display::{BrightnessControl, SysfsBacklight, DEFAULT_BACKLIGHT_DIR};
use brightness_scheduler::geocode::Geocoder;
use brightness_scheduler::mode::ModeCell;
use brightness_scheduler::programs::auto_adjust::AutoAdjustProgram;
use brightness_scheduler::programs::manual_override::ManualOverrideProgram;
use brightness_scheduler::{logging, menu};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};

/// Adjusts display brightness by time of day, sun position, or a day curve.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Configuration file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(short, long, global = true, default_value = "info")]
    log_level: LevelFilter,
    /// Directory holding the backlight devices.
    #[arg(short, long, global = true, default_value = DEFAULT_BACKLIGHT_DIR)]
    backlight_dir: PathBuf,
    /// Run a single adjustment cycle and exit.
    #[arg(long)]
    once: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set every display to 100% and exit.
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Arguments::parse();
    logging::init(args.log_level)?;
    info!("Parsed CLI arguments.");

    let display: Arc<dyn BrightnessControl> = Arc::new(SysfsBacklight::new(&args.backlight_dir));
    if let Some(Commands::Reset) = args.command {
        display.reset()?;
        return Ok(());
    }

    let client = Geocoder::build_client()?;
    let mode = ModeCell::default();
    let mut auto_prog =
        AutoAdjustProgram::new(args.config.clone(), display.clone(), mode.clone(), client);

    if args.once {
        match auto_prog.run_once(Local::now()).await {
            Ok(report) => info!("Cycle finished: {:?}", report),
            Err(e) => error!("An error occurred: {}", e),
        }
        return Ok(());
    }

    let transition = match Configuration::load(&args.config) {
        Ok(config) => config.transition,
        Err(e) => {
            warn!("{} - using default transition settings.", e);
            Default::default()
        }
    };

    let wake = Arc::new(Notify::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll = tokio::spawn(auto_prog.run(wake.clone(), shutdown_rx));

    let (commands_tx, mut commands_rx) = mpsc::channel(8);
    menu::spawn(commands_tx);
    let manual_prog = ManualOverrideProgram::new(display, mode, wake, transition);

    loop {
        tokio::select! {
            Some(command) = commands_rx.recv() => {
                if !manual_prog.handle(command) {
                    info!("Exit requested.");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted.");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    poll.await?;
    Ok(())
}
