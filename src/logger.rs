use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger, LoggerBuilder};

use crate::config::{Config, LogLevel};

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Critical => Level::Critical,
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

fn add_console_sinks(builder: &mut LoggerBuilder) -> spdlog::Result<()> {
    let stdout = Arc::new(StdStreamSink::builder()
        .std_stream(StdStream::Stdout)
        .level_filter(LevelFilter::MoreVerbose(Level::Warn))
        .build()?);

    let stderr = Arc::new(StdStreamSink::builder()
        .std_stream(StdStream::Stderr)
        .level_filter(LevelFilter::MoreSevereEqual(Level::Warn))
        .build()?);

    builder.sink(stdout).sink(stderr);

    Ok(())
}

fn add_file_sink(builder: &mut LoggerBuilder, location: &Path) -> spdlog::Result<()> {
    let daily_sink = Arc::new(RotatingFileSink::builder()
        .base_path(location)
        .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
        .max_files(60)
        .rotate_on_open(false)
        .build()?);

    builder.sink(daily_sink);

    Ok(())
}

/// Without a `[log]` section everything goes to the console at info level.
/// With one, the level is configurable and a daily rotating file is added
/// when `location` is set.
pub fn configure_logger(config: &Config) -> spdlog::Result<()> {
    let mut builder = Logger::builder();

    let level = match config.log {
        Some(ref log) => {
            if let Some(ref location) = log.location {
                add_file_sink(&mut builder, location)?;
            }
            if log.log_to_console || log.location.is_none() {
                add_console_sinks(&mut builder)?;
            }
            log.level.into()
        }
        None => {
            add_console_sinks(&mut builder)?;
            Level::Info
        }
    };

    let logger = Arc::new(builder.build()?);
    logger.set_flush_level_filter(LevelFilter::MoreSevereEqual(Level::Info));
    logger.set_flush_period(Some(Duration::from_secs(2)));
    logger.set_level_filter(LevelFilter::MoreSevereEqual(level));

    spdlog::set_default_logger(logger);

    Ok(())
}
