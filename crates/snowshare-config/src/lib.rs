//! Configuration model and loader for snowshare
//!
//! Parses the YAML configuration, normalizes the legacy single-object data
//! form into a uniform `objects` list, and validates every identifier that
//! is later interpolated into an administrative statement.

pub mod load;
pub mod model;

pub use load::{load_config, parse_config_str};
pub use model::{
    DataConfig, DataObjectSpec, ProviderConfig, ProvisioningConfig, ReaderConfig,
    ReaderUserConfig, ShareConfig, SmtpConfig,
};
