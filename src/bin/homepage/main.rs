use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use spdlog::{info, warn};

use homepage::logger::configure_logger;
use homepage::server::server_run;

use crate::config::{check_required_vars, open_config};

mod config;

const CFG_FILE_NAME: &str = "homepage.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,
}

#[ntex::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Local development only, production sets real variables
    if dotenv::dotenv().is_ok() {
        println!("Loaded variables from .env");
    }

    if let Err(err) = check_required_vars() {
        eprintln!("{}", err);
        std::process::exit(1);
    }

    let config = match open_config(args.config_path.map(PathBuf::from)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            eprintln!("Please run homepage --help");
            std::process::exit(1);
        }
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    info!("Starting homepage =-=-=-=-=-=-=-=-=-=-=-=-=-=-=-");

    let telegram_key = env::var("TELEGRAM_KEY")?;
    server_run(config, telegram_key).await
}
