use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Configuration format error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid instrument key: {0:?}")]
    InvalidInstrument(String),

    // Empty history before the first instrument selection.
    #[error("Market data not ready: no instrument selected")]
    MarketNotReady,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}
