//! kline-specific configuration primitives, connector keys, and the shared error type.
#![warn(missing_docs)]

mod config;
mod connector;
mod error;

pub use config::{
    DEFAULT_MAX_RECORDS, DataSource, ExtendedHours, ReportConfig, Step, Verbosity,
};
pub use connector::ConnectorKey;
pub use error::KlineError;
