mod baud;
mod bridge;
mod cdc;
mod config;
mod consts;
mod context;
mod frame;
mod reset;
mod rx;
mod tx;
mod util;

pub use bridge::{Bridge, BusEdge, Stats};
pub use config::{Config, ConfigError, Parity};
pub use frame::{StreamBeat, UartFrame};
pub use reset::ResetState;

use schemars::{schema::RootSchema, schema_for};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("beat is {actual} bytes wide, bus is {expected}")]
    BeatWidth { expected: usize, actual: usize },
    #[error("deserialize failed: {0}")]
    DeserializeFailed(#[from] bincode::Error),
    #[error("snapshot was taken with a different configuration")]
    ConfigMismatch,
}

/// JSON schema of [`Config`].
pub fn config_schema() -> RootSchema {
    schema_for!(Config)
}
