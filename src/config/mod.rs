pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use crate::core::fields::slugify;
#[cfg(feature = "cli")]
use crate::domain::model::{PrimaryMapping, Service};
#[cfg(feature = "cli")]
use crate::utils::error::CatalogError;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::collections::BTreeMap;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "pestes-config")]
#[command(about = "Service catalog editor: categories, services, CSV/JSON export and Sheets import")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = "pestes-config.toml")]
    pub config: String,

    /// Directory holding the saved state (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print categories and services
    Show,
    /// Add a primary category (tab)
    AddPrimary {
        id: String,
        label: String,
        #[arg(long, default_value_t = 1)]
        order: i64,
    },
    /// Delete a primary category, its secondaries and its service mappings
    DeletePrimary { id: String },
    /// Add a secondary category under a primary
    AddSecondary {
        primary: String,
        id: String,
        label: String,
        #[arg(long, default_value_t = 1)]
        order: i64,
    },
    /// Delete a secondary category and strip it from service tags
    DeleteSecondary { primary: String, id: String },
    /// Create or update a service
    SaveService(ServiceArgs),
    /// Delete a service
    DeleteService { id: String },
    /// Write Services.csv and Categories.csv
    ExportCsv {
        #[arg(long, default_value = ".")]
        out_dir: String,
    },
    /// Write a pretty-printed JSON backup
    ExportJson {
        #[arg(long, default_value = "pestes-config.json")]
        output: String,
    },
    /// Replace the state with a JSON backup
    ImportJson { file: String },
    /// Replace the state with the published Google Sheets CSVs
    ImportSheets {
        #[arg(long)]
        services_url: Option<String>,
        #[arg(long)]
        categories_url: Option<String>,
    },
    /// Report what loading a JSON backup or CSV files would repair or drop
    Check {
        #[arg(long)]
        json: Option<String>,
        #[arg(long)]
        csv: Vec<String>,
    },
    /// Reset everything to the built-in defaults
    Reset {
        #[arg(long, help = "Confirm the reset")]
        yes: bool,
    },
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub price: String,
    #[arg(long, default_value = "")]
    pub image_url: String,
    #[arg(long, default_value = "")]
    pub cta_text: String,
    #[arg(long, default_value = "")]
    pub cta_url: String,
    /// Primary ids the service is shown under, e.g. `--primary yritys`
    #[arg(long = "primary", value_delimiter = ',')]
    pub primaries: Vec<String>,
    /// Tags as `primary:secondary`, e.g. `--tag yritys:toimisto`
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,
    /// Id of the service being edited when saving under a new id
    #[arg(long)]
    pub replaces: Option<String>,
}

#[cfg(feature = "cli")]
impl ServiceArgs {
    /// The service to save plus the id it replaces, if any.
    pub fn into_service(self) -> Result<(Service, Option<String>)> {
        let mut mapping: BTreeMap<String, PrimaryMapping> = BTreeMap::new();
        for primary in self.primaries.iter().map(|p| slugify(p)).filter(|p| !p.is_empty()) {
            mapping.entry(primary).or_default().enabled = true;
        }
        for tag in &self.tags {
            let Some((primary, secondary)) = tag.split_once(':') else {
                return Err(CatalogError::ValidationError {
                    message: format!("tag '{}' must look like primary:secondary", tag),
                });
            };
            let secondary = slugify(secondary);
            if !secondary.is_empty() {
                mapping.entry(slugify(primary)).or_default().tags.push(secondary);
            }
        }

        let service = Service {
            service_id: self.id,
            service_name: self.name,
            description: self.description.trim().to_string(),
            price: self.price.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
            cta_text: self.cta_text.trim().to_string(),
            cta_url: self.cta_url.trim().to_string(),
            mapping,
        };
        Ok((service, self.replaces))
    }
}

/// Effective settings: CLI flag > config file > built-in default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: String,
    pub services_url: Option<String>,
    pub categories_url: Option<String>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_toml(file: &TomlConfig) -> Self {
        Self {
            data_dir: file.data_dir().to_string(),
            services_url: file.services_url().map(str::to_string),
            categories_url: file.categories_url().map(str::to_string),
            verbose: file.verbose(),
            json_logs: file.log_format() == Some("json"),
        }
    }

    #[cfg(feature = "cli")]
    pub fn resolve(args: &CliArgs, file: &TomlConfig) -> Self {
        let mut config = Self::from_toml(file);
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        config.verbose |= args.verbose;
        if let Some(format) = args.log_format {
            config.json_logs = format == LogFormat::Json;
        }
        config
    }
}

impl ConfigProvider for AppConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn services_url(&self) -> Option<&str> {
        self.services_url.as_deref()
    }

    fn categories_url(&self) -> Option<&str> {
        self.categories_url.as_deref()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_path("data_dir", &self.data_dir)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_file() {
        let file = TomlConfig::from_toml_str(
            "[storage]\ndata_dir = \"./from-file\"\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();
        let args = CliArgs::parse_from([
            "pestes-config",
            "--data-dir",
            "./from-flag",
            "--log-format",
            "compact",
            "show",
        ]);

        let config = AppConfig::resolve(&args, &file);
        assert_eq!(config.data_dir(), "./from-flag");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_file_values_used_without_flags() {
        let file = TomlConfig::from_toml_str(
            "[storage]\ndata_dir = \"./from-file\"\n[import]\nservices_url = \"https://x.fi/s.csv\"\n",
        )
        .unwrap();
        let args = CliArgs::parse_from(["pestes-config", "show"]);

        let config = AppConfig::resolve(&args, &file);
        assert_eq!(config.data_dir(), "./from-file");
        assert_eq!(config.services_url(), Some("https://x.fi/s.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_save_service_args() {
        let args = CliArgs::parse_from([
            "pestes-config",
            "save-service",
            "--id",
            "7",
            "--name",
            "Tarkastus",
            "--primary",
            "yritys,yksityinen",
            "--tag",
            "yritys:toimisto",
        ]);
        match args.command {
            Command::SaveService(service) => {
                assert_eq!(service.primaries, vec!["yritys", "yksityinen"]);
                assert_eq!(service.tags, vec!["yritys:toimisto"]);
                assert_eq!(service.replaces, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_service_args_into_service() {
        let args = CliArgs::parse_from([
            "pestes-config",
            "save-service",
            "--id",
            "7",
            "--name",
            "Tarkastus",
            "--price",
            " 120 € ",
            "--primary",
            "Yritys",
            "--tag",
            "yritys:Toimisto,taloyhtio:rivitalo",
            "--replaces",
            "6",
        ]);
        let Command::SaveService(service_args) = args.command else {
            panic!("expected save-service");
        };

        let (service, replaces) = service_args.into_service().unwrap();
        assert_eq!(replaces.as_deref(), Some("6"));
        assert_eq!(service.price, "120 €");
        assert!(service.mapping["yritys"].enabled);
        assert_eq!(service.mapping["yritys"].tags, vec!["toimisto"]);
        assert!(!service.mapping["taloyhtio"].enabled);
        assert_eq!(service.mapping["taloyhtio"].tags, vec!["rivitalo"]);
    }

    #[test]
    fn test_malformed_tag_is_rejected() {
        let args = CliArgs::parse_from([
            "pestes-config", "save-service", "--id", "1", "--name", "X", "--tag", "toimisto",
        ]);
        let Command::SaveService(service_args) = args.command else {
            panic!("expected save-service");
        };
        assert!(service_args.into_service().is_err());
    }
}
