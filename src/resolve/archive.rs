// Symbol source backed by the classes of a binary archive

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::ZipArchive;

use super::classfile::parse_class;
use super::{TypeDeclaration, TypeSolver};
use crate::config::ResolutionConfig;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error while reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Archive error while reading {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Every class found in one archive, keyed by internal path
#[derive(Debug, Clone)]
pub struct ArchiveTypeSolver {
    name: String,
    types: HashMap<String, TypeDeclaration>,
}

impl ArchiveTypeSolver {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
        }
    }

    /// Read all class files under `path`.
    ///
    /// `path` may be a zip-format archive, an exploded class directory or a
    /// single `.class` file. Files are closed before this returns.
    pub fn open(path: &Path, config: &ResolutionConfig) -> Result<Self, ArchiveError> {
        let metadata = fs::metadata(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut solver = Self::empty(format!("archive:{}", path.display()));
        if metadata.is_dir() {
            solver.scan_directory(path, config)?;
        } else if config.is_archive(path) {
            solver.scan_archive(path, config, "")?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("class") {
            let bytes = read_file(path)?;
            solver.add_class(&bytes, &path.display().to_string());
        } else {
            warn!("{} is not a recognised archive, no classes loaded", path.display());
        }

        info!("Loaded {} classes from {}", solver.len(), path.display());
        Ok(solver)
    }

    /// Read the class entries of a zip-format archive. Only entries under
    /// `prefix` are read, and the prefix is stripped from their names.
    pub(crate) fn scan_archive(
        &mut self,
        path: &Path,
        config: &ResolutionConfig,
        prefix: &str,
    ) -> Result<(), ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::Zip {
                path: path.to_path_buf(),
                source,
            })?;

        let mut buffer = Vec::new();
        for idx in 0..archive.len() {
            let mut entry = archive.by_index(idx).map_err(|source| ArchiveError::Zip {
                path: path.to_path_buf(),
                source,
            })?;

            let Some(name) = entry.name().strip_prefix(prefix).map(str::to_string) else {
                continue;
            };
            if !entry.is_file() || !config.should_scan_entry(&name) {
                continue;
            }

            buffer.clear();
            entry
                .read_to_end(&mut buffer)
                .map_err(|source| ArchiveError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

            self.add_class(&buffer, &format!("{}!/{}{}", path.display(), prefix, name));
        }

        Ok(())
    }

    fn scan_directory(&mut self, root: &Path, config: &ResolutionConfig) -> Result<(), ArchiveError> {
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| ArchiveError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if !config.should_scan_entry(&relative) {
                continue;
            }

            let bytes = read_file(entry.path())?;
            self.add_class(&bytes, &entry.path().display().to_string());
        }

        Ok(())
    }

    pub(crate) fn add_class(&mut self, bytes: &[u8], origin: &str) {
        match parse_class(bytes) {
            Ok(declaration) => {
                debug!("Indexed {} from {}", declaration.path, origin);
                self.types.insert(declaration.path.clone(), declaration);
            }
            Err(e) => warn!("Skipping malformed class file {}: {}", origin, e),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Internal paths of every loaded class, sorted
    pub fn type_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.types.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl TypeSolver for ArchiveTypeSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn solve_type(&self, path: &str) -> Option<&TypeDeclaration> {
        self.types.get(path)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArchiveError> {
    let mut file = File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)
        .map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(buffer)
}

#[cfg(test)]
pub(crate) mod fixture {
    use std::io::Write;
    use std::path::Path;

    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Write a jar holding the given `(entry name, bytes)` pairs
    pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, bytes) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::write_jar;
    use super::*;
    use crate::resolve::classfile::fixture::ClassFileBuilder;
    use crate::resolve::{JavaType, MemberKind};

    fn other_class() -> Vec<u8> {
        ClassFileBuilder::new("pkg/Other")
            .field("field", "I")
            .method("compute", "(Ljava/lang/String;)Lpkg/Other;")
            .build()
    }

    #[test]
    fn test_open_jar() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        write_jar(
            &jar,
            &[
                ("pkg/Other.class", other_class()),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
                ("META-INF/versions/9/pkg/Other.class", b"junk".to_vec()),
                ("pkg/Broken.class", b"\xCA\xFE".to_vec()),
            ],
        );

        let solver = ArchiveTypeSolver::open(&jar, &ResolutionConfig::default()).unwrap();
        assert_eq!(solver.type_paths(), vec!["pkg/Other"]);

        let other = solver.solve_type("pkg/Other").unwrap();
        assert_eq!(
            other.member("field", MemberKind::Field).unwrap().ty,
            JavaType::Primitive("int".to_string())
        );
        assert_eq!(
            other.member("compute", MemberKind::Method).unwrap().ty,
            JavaType::Class("pkg/Other".to_string())
        );
    }

    #[test]
    fn test_open_directory_and_single_class() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        std::fs::create_dir_all(classes.join("pkg")).unwrap();
        std::fs::write(classes.join("pkg/Other.class"), other_class()).unwrap();
        std::fs::write(classes.join("pkg/readme.txt"), "not a class").unwrap();

        let config = ResolutionConfig::default();
        let from_dir = ArchiveTypeSolver::open(&classes, &config).unwrap();
        assert!(from_dir.has_type("pkg/Other"));
        assert_eq!(from_dir.len(), 1);

        let single = ArchiveTypeSolver::open(&classes.join("pkg/Other.class"), &config).unwrap();
        assert!(single.has_type("pkg/Other"));
    }

    #[test]
    fn test_open_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResolutionConfig::default();

        let missing = ArchiveTypeSolver::open(&dir.path().join("missing.jar"), &config);
        assert!(matches!(missing, Err(ArchiveError::Io { .. })));

        let corrupt = dir.path().join("corrupt.jar");
        std::fs::write(&corrupt, b"definitely not a zip file").unwrap();
        assert!(matches!(
            ArchiveTypeSolver::open(&corrupt, &config),
            Err(ArchiveError::Zip { .. })
        ));

        let unknown = dir.path().join("notes.txt");
        std::fs::write(&unknown, "hello").unwrap();
        assert!(ArchiveTypeSolver::open(&unknown, &config).unwrap().is_empty());
    }
}
