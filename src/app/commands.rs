use crate::config::{AppConfig, Command};
use crate::core::csv_codec::check_rectangular;
use crate::core::editor::CatalogEditor;
use crate::core::export::{build_categories_csv, build_services_csv, export_json};
use crate::core::fields::{sorted_categories, sorted_services};
use crate::core::import::import_json;
use crate::core::normalizer::diagnose;
use crate::core::sheets::import_from_sheets;
use crate::core::store::StateStore;
use crate::core::{ConfigProvider, ConfigState, CsvSource, ImportPrefs, Storage};
use crate::utils::error::{CatalogError, Result};
use std::fmt::Write as _;
use std::path::Path;

pub const SERVICES_CSV_FILE: &str = "Services.csv";
pub const CATEGORIES_CSV_FILE: &str = "Categories.csv";

/// Runs one operator action against the persisted state and returns the
/// message to show. Mutations are saved only when the action succeeds.
pub async fn run_command<S: Storage>(
    command: Command,
    config: &AppConfig,
    store: &StateStore<S>,
    source: &dyn CsvSource,
) -> Result<String> {
    let mut editor = CatalogEditor::new(store.load_state().await?);

    let message = match command {
        Command::Show => return Ok(render_state(&editor)),
        Command::AddPrimary { id, label, order } => {
            let added = editor.add_primary(&id, &label, order)?;
            format!("Added primary '{}'", added.id)
        }
        Command::DeletePrimary { id } => {
            editor.delete_primary(&id)?;
            format!("Deleted primary '{}'", id)
        }
        Command::AddSecondary {
            primary,
            id,
            label,
            order,
        } => {
            let added = editor.add_secondary(&primary, &id, &label, order)?;
            format!("Added secondary '{}' under '{}'", added.id, primary)
        }
        Command::DeleteSecondary { primary, id } => {
            editor.delete_secondary(&primary, &id)?;
            format!("Deleted secondary '{}' under '{}'", id, primary)
        }
        Command::SaveService(args) => {
            let (service, replaces) = args.into_service()?;
            let id = service.service_id.trim().to_string();
            editor.save_service(service, replaces.as_deref())?;
            format!("Saved service '{}'", id)
        }
        Command::DeleteService { id } => {
            editor.delete_service(&id)?;
            format!("Deleted service '{}'", id)
        }
        Command::ExportCsv { out_dir } => return export_csv(editor.state(), &out_dir).await,
        Command::ExportJson { output } => {
            tokio::fs::write(&output, export_json(editor.state())?).await?;
            return Ok(format!("Wrote {}", output));
        }
        Command::ImportJson { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            editor.replace(import_json(&text)?);
            format!("Imported {}", file)
        }
        Command::ImportSheets {
            services_url,
            categories_url,
        } => {
            let prefs = store.load_prefs().await?;
            let services_url = services_url
                .or_else(|| config.services_url().map(str::to_string))
                .unwrap_or(prefs.services);
            let categories_url = categories_url
                .or_else(|| config.categories_url().map(str::to_string))
                .unwrap_or(prefs.categories);

            let imported = import_from_sheets(source, &services_url, &categories_url).await?;
            store
                .save_prefs(&ImportPrefs {
                    services: services_url.trim().to_string(),
                    categories: categories_url.trim().to_string(),
                })
                .await?;
            editor.replace(imported);
            format!(
                "Imported {} primaries and {} services",
                editor.state().primaries.len(),
                editor.state().services.len()
            )
        }
        Command::Check { json, csv } => return check_files(json.as_deref(), &csv).await,
        Command::Reset { yes } => {
            if !yes {
                return Err(CatalogError::ValidationError {
                    message: "reset discards everything; pass --yes to confirm".to_string(),
                });
            }
            editor.reset();
            "Reset to defaults".to_string()
        }
    };

    store.save_state(editor.state()).await?;
    Ok(message)
}

async fn export_csv(state: &ConfigState, out_dir: &str) -> Result<String> {
    let dir = Path::new(out_dir);
    tokio::fs::create_dir_all(dir).await?;

    let services_path = dir.join(SERVICES_CSV_FILE);
    let categories_path = dir.join(CATEGORIES_CSV_FILE);
    tokio::fs::write(&services_path, build_services_csv(state)).await?;
    tokio::fs::write(&categories_path, build_categories_csv(state)).await?;

    Ok(format!(
        "Wrote {} and {}",
        services_path.display(),
        categories_path.display()
    ))
}

async fn check_files(json: Option<&str>, csv_files: &[String]) -> Result<String> {
    if json.is_none() && csv_files.is_empty() {
        return Err(CatalogError::MissingConfigError {
            field: "--json or --csv".to_string(),
        });
    }

    let mut report = String::new();
    if let Some(path) = json {
        let raw: serde_json::Value = serde_json::from_str(&tokio::fs::read_to_string(path).await?)?;
        let diagnostics = diagnose(&raw);
        let _ = writeln!(report, "{}: {} issue(s)", path, diagnostics.len());
        for d in diagnostics {
            let _ = writeln!(report, "  {}", d);
        }
    }

    for path in csv_files {
        let text = tokio::fs::read_to_string(path).await?;
        match check_rectangular(&text) {
            Ok(count) => {
                let _ = writeln!(report, "{}: {} rows, consistent", path, count);
            }
            Err(e) => {
                let _ = writeln!(report, "{}: {}", path, e);
            }
        }
    }

    Ok(report.trim_end().to_string())
}

pub fn render_state(editor: &CatalogEditor) -> String {
    let state = editor.state();
    let mut out = String::new();

    let _ = writeln!(out, "Primary categories:");
    for p in sorted_categories(&state.primaries) {
        let _ = writeln!(out, "  {:>3}  {:<20} {}", p.order, p.id, p.label);
        let bucket = state.secondaries_by_primary.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
        for c in sorted_categories(bucket) {
            let _ = writeln!(out, "       {:>3}  {:<20} {}", c.order, c.id, c.label);
        }
    }

    let _ = writeln!(out, "Services ({}):", state.services.len());
    for s in sorted_services(&state.services) {
        let primaries = editor.primary_categories_of(s);
        let primaries = if primaries.is_empty() { "-".to_string() } else { primaries };
        let _ = writeln!(out, "  {:<6} {:<30} {}", s.service_id, s.service_name, primaries);
    }

    out.trim_end().to_string()
}
