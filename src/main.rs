use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use engine_hours::{
    app::EngineHoursApp,
    config::{Config, GuiConfig},
    connection::SerialConnector,
    device::SerialPort,
    logging::setup_logging,
};

type App = EngineHoursApp<SerialConnector<SerialPort>>;

/// Show the engine run time read from an OBD-II adapter
#[derive(Parser, Debug)]
#[command(name = "engine-hours")]
#[command(version)]
#[command(about = "Show the engine run time read from an OBD-II adapter")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the adapter, skipping the port scan
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate of the adapter, skipping baud rate detection
    #[arg(short, long)]
    baud: Option<u32>,

    /// Read the engine hours once, print them, and exit
    #[arg(long)]
    headless: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    if args.port.is_some() {
        config.connection.port = args.port;
    }
    if args.baud.is_some() {
        config.connection.baud_rate = args.baud;
    }
    if args.debug {
        config.logging.level = "debug".to_owned();
    }

    let logs = setup_logging(&config.logging)?;
    info!("App starting...");
    info!("Configuration from {:?}", config_path);

    let connector = SerialConnector::new(
        config.connection.port.clone(),
        config.connection.elm327_options(),
    );
    let mut app = EngineHoursApp::new(connector);
    app.on_permissions_result(&[logs.file_enabled]);

    if args.headless {
        app.get_engine_hours();
        println!("{}", app.label());
        return Ok(());
    }

    run_window(app, &config.gui)
}

#[cfg(feature = "gui")]
fn run_window(app: App, config: &GuiConfig) -> Result<()> {
    engine_hours::gui::run_gui(app, config).map_err(|e| anyhow::anyhow!("GUI failed: {:?}", e))
}

#[cfg(not(feature = "gui"))]
fn run_window(_app: App, _config: &GuiConfig) -> Result<()> {
    anyhow::bail!("GUI feature not enabled. Build with --features gui or use --headless")
}
