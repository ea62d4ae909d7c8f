use fern::Dispatch;
use log::LevelFilter;
use std::{fs, path::PathBuf};
use tracker_common::{anyhow::Result, logging, once_cell::sync::OnceCell};
use tracker_session::LoggingConfig;

pub const SESSION_LOG_FNAME: &str = "vive_tracker.log";
pub const CRASH_LOG_FNAME: &str = "vive_tracker_crash.log";

fn session_log_path(config: &LoggingConfig) -> PathBuf {
    config
        .log_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(SESSION_LOG_FNAME))
}

fn crash_log_path(config: &LoggingConfig) -> PathBuf {
    session_log_path(config).with_file_name(CRASH_LOG_FNAME)
}

pub fn build_dispatch(config: &LoggingConfig) -> Result<Dispatch> {
    let mut log_dispatch = Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{} [{}] {}",
            chrono::Local::now().format("%H:%M:%S.%f"),
            record.level(),
            message
        ))
    });

    if cfg!(debug_assertions) {
        log_dispatch = log_dispatch.level(LevelFilter::Debug);
    } else {
        log_dispatch = log_dispatch.level(config.level.into_level_filter());
    }

    log_dispatch = log_dispatch.chain(std::io::stdout());

    if config.log_to_disk {
        let session_log_path = session_log_path(config);
        if let Some(parent) = session_log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        log_dispatch = log_dispatch
            .chain(
                fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(session_log_path)?,
            )
            .chain(
                Dispatch::new()
                    .level(LevelFilter::Error)
                    .chain(fern::log_file(crash_log_path(config))?),
            );
    }

    Ok(log_dispatch)
}

// Only the first call installs a logger, later calls return immediately
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    static LOGGING: OnceCell<()> = OnceCell::new();

    LOGGING.get_or_try_init(|| -> Result<()> {
        build_dispatch(config)?.apply()?;
        logging::set_panic_hook();

        Ok(())
    })?;

    Ok(())
}
