pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub mod app;

pub use config::{cli::LocalStorage, toml_config::TomlConfig, AppConfig};
#[cfg(feature = "cli")]
pub use config::{CliArgs, Command};

pub use core::editor::CatalogEditor;
pub use core::sheets::HttpCsvSource;
pub use core::store::StateStore;
pub use domain::model::{Category, ConfigState, ImportPrefs, PrimaryMapping, Service};
pub use utils::error::{CatalogError, Result};
