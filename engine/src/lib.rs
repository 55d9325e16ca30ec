// Engine library root: synthetic market, indicators and the signal desk.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod services;

pub use error::EngineError;
