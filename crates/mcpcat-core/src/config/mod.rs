//! Catalog configuration: a TOML file under the user config directory.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_config, parse_config_str, to_toml};
pub use paths::{default_config_path, default_store_path};
pub use schema::CatalogConfig;
pub use store::ConfigStore;
