//! Logging setup shared by the LMT front ends.
//!
//! Logging always goes to the console (`stderr`) so it does not mix with command output.
//! A log file can be added in which case the named loggers write only to the file.
use crate::{Error, Result};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{runtime::ConfigErrors, Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
    Handle,
};
use std::path::PathBuf;

impl From<ConfigErrors> for Error {
    fn from(error: ConfigErrors) -> Self {
        Error::Log(format!("{error}"))
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(error: log::SetLoggerError) -> Self {
        Error::Log(format!("{error}"))
    }
}

/// The console appender pattern.
const CONSOLE_PATTERN: &str = "{l:<5} {M} {m}{n}";

/// The log file appender pattern.
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {M} {l:<5} {m}{n}";

/// The logging configuration.
#[derive(Debug)]
pub struct LogProperties {
    /// The log level that will be used.
    pub level: log::LevelFilter,
    /// The log file pathname, if `None` logging to a file will not occur.
    pub logfile_path: Option<PathBuf>,
    /// Append to the log file when `true`, otherwise it is truncated.
    pub logfile_append: bool,
    /// The loggers that write to the log file.
    pub file_loggers: Vec<String>,
}

/// Get the log level for a verbosity count (`0`=WARN, `1`=INFO, `2`=DEBUG, more=TRACE).
///
/// # Arguments
///
/// * `verbosity` is how many times verbose was requested.
pub fn level_filter(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Initializes `log4rs` and returns the handle that can be used to change logging at runtime.
///
/// # Arguments
///
/// * `log_properties` is the logging configuration.
pub fn initialize(log_properties: LogProperties) -> Result<Handle> {
    let config = log_config(log_properties)?;
    let handle = log4rs::init_config(config)?;
    Ok(handle)
}

/// Build the `log4rs` configuration.
///
/// # Arguments
///
/// * `log_properties` is the logging configuration.
fn log_config(log_properties: LogProperties) -> Result<Config> {
    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    let mut config_builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console_appender)));
    let mut root_builder = Root::builder().appender("console");
    if let Some(logfile_path) = log_properties.logfile_path {
        let file_appender = match FileAppender::builder()
            .append(log_properties.logfile_append)
            .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
            .build(&logfile_path)
        {
            Ok(appender) => appender,
            Err(err) => return Err(Error::Log(format!("{} ({}).", logfile_path.display(), err))),
        };
        config_builder = config_builder.appender(Appender::builder().build("file", Box::new(file_appender)));
        root_builder = root_builder.appender("file");
        let loggers = log_properties.file_loggers.iter().map(|logger| {
            Logger::builder().appender("file").additive(false).build(logger, log_properties.level)
        });
        config_builder = config_builder.loggers(loggers);
    }
    let config = config_builder.build(root_builder.build(log_properties.level))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testlib::TestFixture;

    #[test]
    fn levels() {
        assert_eq!(level_filter(0), log::LevelFilter::Warn);
        assert_eq!(level_filter(1), log::LevelFilter::Info);
        assert_eq!(level_filter(2), log::LevelFilter::Debug);
        assert_eq!(level_filter(3), log::LevelFilter::Trace);
        assert_eq!(level_filter(u8::MAX), log::LevelFilter::Trace);
    }

    #[test]
    fn config() {
        let config = log_config(LogProperties {
            level: log::LevelFilter::Info,
            logfile_path: None,
            logfile_append: false,
            file_loggers: vec![],
        })
        .unwrap();
        assert_eq!(config.appenders().len(), 1);
        assert_eq!(config.root().level(), log::LevelFilter::Info);
        let fixture = TestFixture::create();
        let logfile = fixture.path("lmtinit.log");
        let config = log_config(LogProperties {
            level: log::LevelFilter::Debug,
            logfile_path: Some(logfile.clone()),
            logfile_append: true,
            file_loggers: vec!["lmt_lib".to_string(), "lmtinit".to_string()],
        })
        .unwrap();
        assert_eq!(config.appenders().len(), 2);
        assert_eq!(config.loggers().len(), 2);
        assert_eq!(config.root().appenders().len(), 2);
        assert!(logfile.exists());
        // a directory cannot be a log file
        let result = log_config(LogProperties {
            level: log::LevelFilter::Warn,
            logfile_path: Some(fixture.root().to_path_buf()),
            logfile_append: false,
            file_loggers: vec![],
        });
        assert!(matches!(result, Err(Error::Log(_))));
    }
}
