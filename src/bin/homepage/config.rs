use std::env;
use std::path::PathBuf;

use homepage::config::{read_config, Config};

use crate::CFG_FILE_NAME;

const REQUIRED_VARS: &[&str] = &["TELEGRAM_KEY"];

fn get_config_path() -> Option<PathBuf> {
    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    let cur_dir = env::current_dir().ok();

    [exe_dir, cur_dir, dirs::config_dir()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}

pub(crate) fn check_required_vars() -> Result<(), String> {
    for var in REQUIRED_VARS {
        if env::var(var).is_err() {
            return Err(format!("Missing required environment variable {}", var));
        }
    }
    Ok(())
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config, String> {
    let config_path = match cfg_path.or_else(get_config_path) {
        None => return Err("Could not find homepage configuration".to_string()),
        Some(x) => x,
    };

    println!("Reading config from {}", config_path.display());
    let mut config = match read_config(&config_path) {
        Ok(config) => config,
        Err(e) => return Err(e.to_string()),
    };

    if let Ok(data_dir) = env::var("DATA_DIR") {
        config.paths.data_dir = PathBuf::from(data_dir);
    }

    if let Ok(port) = env::var("PORT") {
        config.server.port = match port.parse() {
            Ok(port) => port,
            Err(e) => return Err(format!("Invalid PORT {}: {}", port, e)),
        };
    }

    if let Some(ref mut log) = config.log {
        if log.location.is_none() && !log.log_to_console {
            let location = dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join("homepage").join("log").join("server.log");
            println!("Log files will be written in {}", location.display());
            log.location = Some(location);
        }
    }

    Ok(config)
}
