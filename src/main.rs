use anyhow::Context;
use clap::Parser;
use pestes_config::app::commands::run_command;
use pestes_config::utils::error::ErrorSeverity;
use pestes_config::utils::{logger, validation::Validate};
use pestes_config::{AppConfig, CliArgs, HttpCsvSource, LocalStorage, StateStore, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 載入配置檔 (不存在時使用預設值)
    let file_config = TomlConfig::from_file_or_default(&args.config)
        .with_context(|| format!("Failed to load config file '{}' (is it valid TOML?)", args.config))?;
    let config = AppConfig::resolve(&args, &file_config);

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = file_config.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let store = StateStore::new(LocalStorage::new(&config.data_dir));
    let source = HttpCsvSource::new();

    match run_command(args.command, &config, &store, &source).await {
        Ok(message) => println!("{}", message),
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
