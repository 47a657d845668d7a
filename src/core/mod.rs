pub mod csv_codec;
pub mod editor;
pub mod export;
pub mod fields;
pub mod import;
pub mod normalizer;
pub mod sheets;
pub mod store;

pub use crate::domain::model::{Category, ConfigState, ImportPrefs, PrimaryMapping, Record, Service};
pub use crate::domain::ports::{ConfigProvider, CsvSource, Storage};
pub use crate::utils::error::Result;
