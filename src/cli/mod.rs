// CLI command implementations

pub mod inspect;
pub mod query;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;

use classnav::{ClassFileContainer, Config, ParseStatus, ResourceContainer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Class name for a decompiled source path: `com/acme/Foo.java` becomes
/// `com/acme/Foo.class-CFR`
pub fn class_name_for(relative: &Path, decompiler: Option<&str>) -> String {
    let path = relative.with_extension("class");
    let name = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    match decompiler {
        Some(tag) if !tag.is_empty() => format!("{}-{}", name, tag),
        _ => name,
    }
}

/// Index one source file against an archive
pub fn index_single(
    archive: &Path,
    source: &Path,
    class: Option<String>,
    config: Config,
) -> Result<Arc<ClassFileContainer>> {
    let content = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let class_name = class.unwrap_or_else(|| {
        let file_name = source.file_name().map(Path::new).unwrap_or(source);
        class_name_for(file_name, None)
    });

    let container = ResourceContainer::open(archive, config);
    match container.open_class(class_name.clone(), content)? {
        ParseStatus::Indexed(_) => {}
        ParseStatus::Failed(e) => return Err(anyhow!("{} is not valid Java: {}", source.display(), e)),
    }

    container
        .class_file(&class_name)
        .ok_or_else(|| anyhow!("Class {} was not stored", class_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_for() {
        assert_eq!(
            class_name_for(Path::new("com/acme/Foo.java"), Some("CFR")),
            "com/acme/Foo.class-CFR"
        );
        assert_eq!(class_name_for(Path::new("Foo.java"), None), "Foo.class");
        assert_eq!(class_name_for(Path::new("Foo.java"), Some("")), "Foo.class");
    }
}
