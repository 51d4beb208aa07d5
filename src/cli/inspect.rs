use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use classnav::{Config, IndexSummary, ParseStatus, ResourceContainer};

use super::{class_name_for, OutputFormat};

/// Index every `.java` file under `sources` against `archive` and print a
/// summary per class
pub async fn inspect_sources(
    archive: PathBuf,
    sources: PathBuf,
    decompiler: Option<String>,
    format: OutputFormat,
    config: Config,
) -> Result<()> {
    let mut inputs = Vec::new();
    for entry in WalkDir::new(&sources).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("java") {
            continue;
        }

        let relative = path.strip_prefix(&sources).unwrap_or(path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        inputs.push((class_name_for(relative, decompiler.as_deref()), content));
    }
    info!("Found {} sources under {}", inputs.len(), sources.display());

    let container = Arc::new(ResourceContainer::open(&archive, config));
    let results = Arc::clone(&container).open_classes(inputs).await?;

    let mut total = IndexSummary::default();
    let mut failed = 0usize;
    let mut rows = Vec::new();
    for (class_name, result) in results {
        match result {
            Ok(ParseStatus::Indexed(summary)) => {
                total.fields += summary.fields;
                total.parameters += summary.parameters;
                total.local_variables += summary.local_variables;
                total.methods += summary.methods;
                total.class_references += summary.class_references;
                total.unresolved += summary.unresolved;
                rows.push((class_name, Ok(summary)));
            }
            Ok(ParseStatus::Failed(e)) => {
                failed += 1;
                rows.push((class_name, Err(e.to_string())));
            }
            Err(e) => {
                failed += 1;
                rows.push((class_name, Err(e.to_string())));
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let classes: Vec<serde_json::Value> = rows
                .iter()
                .map(|(class_name, row)| match row {
                    Ok(summary) => serde_json::json!({ "class": class_name, "summary": summary }),
                    Err(error) => serde_json::json!({ "class": class_name, "error": error }),
                })
                .collect();
            let report = serde_json::json!({
                "archive": archive.display().to_string(),
                "classes": classes,
                "total": total,
                "failed": failed,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Archive: {}", archive.display());
            for (class_name, row) in &rows {
                match row {
                    Ok(summary) => println!("  {}: {}", class_name, summary),
                    Err(error) => println!("  {}: FAILED ({})", class_name, error),
                }
            }
            println!("\n{} classes, {} failed", rows.len(), failed);
            println!("Total: {}", total);
        }
    }

    container.close();
    Ok(())
}
