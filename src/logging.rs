use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("Invalid logging configuration: {0}")]
    Config(String),
    #[error("{0}")]
    SetLogger(#[from] log::SetLoggerError),
}

pub fn config(level: LevelFilter) -> Result<Config, LoggingError> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .logger(Logger::builder().build("reqwest", LevelFilter::Warn))
        .logger(Logger::builder().build("hyper", LevelFilter::Warn))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| LoggingError::Config(e.to_string()))
}

pub fn init(level: LevelFilter) -> Result<Handle, LoggingError> {
    Ok(log4rs::init_config(config(level)?)?)
}
