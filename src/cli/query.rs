use std::path::PathBuf;

use anyhow::Result;

use classnav::{Config, LocationKind};

use super::{index_single, OutputFormat};

/// Print the locations recorded for one key
pub fn query_locations(
    archive: PathBuf,
    source: PathBuf,
    class: Option<String>,
    kind: LocationKind,
    key: String,
    format: OutputFormat,
    config: Config,
) -> Result<()> {
    let index = index_single(&archive, &source, class, config)?;
    let locations = index.locations_for(kind, &key);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(locations)?),
        OutputFormat::Text => {
            if locations.is_empty() {
                println!("No {} named '{}' in {}", kind, key, index.class_name());
            } else {
                println!("Found {} {} locations for '{}':", locations.len(), kind, key);
                for location in locations {
                    let span = location.span();
                    println!("  {}:{}:{}  {}", source.display(), span.line, span.column, location);
                }
            }
        }
    }

    Ok(())
}

/// Print the type declaring a referenced member
pub fn find_owner(
    archive: PathBuf,
    source: PathBuf,
    class: Option<String>,
    member: String,
    config: Config,
) -> Result<()> {
    let index = index_single(&archive, &source, class, config)?;

    match index.declaring_type_of_reference(&member) {
        Some(owner) => println!("{}", owner.replace('/', ".")),
        None => println!("No reference to '{}' in {}", member, index.class_name()),
    }

    Ok(())
}
