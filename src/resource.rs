// Archive-level container owning the indexes of its decompiled classes

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::Config;
use crate::index::{ClassFileContainer, IndexError, ParseStatus};
use crate::resolve::CombinedTypeSolver;

/// A jar, zip or class directory whose classes have been decompiled.
///
/// The type solver for the archive is built on first use and shared by every
/// class opened afterwards.
pub struct ResourceContainer {
    name: String,
    file: PathBuf,
    config: Config,
    solver: OnceCell<Arc<CombinedTypeSolver>>,
    classes: DashMap<String, Arc<ClassFileContainer>>,
}

impl ResourceContainer {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            config,
            solver: OnceCell::new(),
            classes: DashMap::new(),
        }
    }

    /// Container named after the archive's file name
    pub fn open(file: impl Into<PathBuf>, config: Config) -> Self {
        let file = file.into();
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        Self::new(name, file, config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared solver, reading the archive on first call
    pub fn solver(&self) -> Result<Arc<CombinedTypeSolver>, IndexError> {
        let solver = self.solver.get_or_try_init(|| {
            info!("Loading types from {}", self.file.display());
            CombinedTypeSolver::for_archive(&self.file, &self.config.resolution).map(Arc::new)
        })?;
        Ok(Arc::clone(solver))
    }

    /// Index one class and keep it. A class name can be opened once.
    pub fn open_class(
        &self,
        class_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<ParseStatus, IndexError> {
        let class_name = class_name.into();
        if self.classes.contains_key(&class_name) {
            return Err(IndexError::AlreadyParsed(class_name));
        }

        let solver = self.solver()?;
        let mut container = ClassFileContainer::new(class_name.clone(), content, self);
        let status = container.parse_with(&solver)?;

        match self.classes.entry(class_name) {
            Entry::Occupied(entry) => Err(IndexError::AlreadyParsed(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(container));
                Ok(status)
            }
        }
    }

    /// Index many classes on the blocking pool, at most `indexing.workers`
    /// at a time. Results come back in input order.
    pub async fn open_classes(
        self: Arc<Self>,
        sources: Vec<(String, String)>,
    ) -> Result<Vec<(String, Result<ParseStatus, IndexError>)>, IndexError> {
        // Fail once for an unreadable archive instead of once per class
        let this = Arc::clone(&self);
        tokio::task::spawn_blocking(move || this.solver()).await??;

        let workers = self.config.indexing.workers.max(1);
        debug!("Indexing {} classes with {} workers", sources.len(), workers);
        let semaphore = Arc::new(Semaphore::new(workers));

        let tasks = sources.into_iter().map(|(class_name, content)| {
            let this = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let name = class_name.clone();
                let result = tokio::task::spawn_blocking(move || this.open_class(class_name, content))
                    .await
                    .unwrap_or_else(|e| Err(IndexError::Worker(e)));
                (name, result)
            }
        });

        Ok(futures::future::join_all(tasks).await)
    }

    pub fn class_file(&self, class_name: &str) -> Option<Arc<ClassFileContainer>> {
        self.classes.get(class_name).map(|entry| Arc::clone(entry.value()))
    }

    /// Names of the open classes, sorted
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn remove_class(&self, class_name: &str) -> Option<Arc<ClassFileContainer>> {
        self.classes.remove(class_name).map(|(_, container)| container)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Drop every class index
    pub fn close(&self) {
        let count = self.classes.len();
        self.classes.clear();
        info!("Closed {} ({} classes)", self.name, count);
    }
}

impl std::fmt::Debug for ResourceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceContainer")
            .field("name", &self.name)
            .field("file", &self.file)
            .field("classes", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LocationKind;
    use crate::resolve::archive::fixture::write_jar;
    use crate::resolve::classfile::fixture::ClassFileBuilder;
    use crate::resolve::ArchiveError;
    use tempfile::TempDir;

    fn library(dir: &TempDir) -> PathBuf {
        let jar = dir.path().join("lib.jar");
        let other = ClassFileBuilder::new("pkg/Other")
            .field("field", "I")
            .method("run", "()V")
            .build();
        write_jar(&jar, &[("pkg/Other.class", other)]);
        jar
    }

    const USES_OTHER: &str = r#"
package app;

import pkg.Other;

class A {
    void m(Other other) { other.run(); }
}
"#;

    #[test]
    fn test_open_class_shares_solver() {
        let dir = TempDir::new().unwrap();
        let container = ResourceContainer::open(library(&dir), Config::default());
        assert_eq!(container.name(), "lib.jar");

        let status = container.open_class("app/A.class-CFR", USES_OTHER).unwrap();
        assert!(status.is_indexed());
        let first = container.solver().unwrap();
        container.open_class("app/B.class-CFR", "class B { }").unwrap();
        assert!(Arc::ptr_eq(&first, &container.solver().unwrap()));

        let class = container.class_file("app/A.class-CFR").unwrap();
        assert_eq!(class.parent_container(), "lib.jar");
        assert_eq!(class.declaring_type_of_reference("run"), Some("pkg/Other"));
        assert_eq!(container.class_names(), vec!["app/A.class-CFR", "app/B.class-CFR"]);
    }

    #[test]
    fn test_class_name_is_unique() {
        let dir = TempDir::new().unwrap();
        let container = ResourceContainer::open(library(&dir), Config::default());
        container.open_class("app/A.class-CFR", USES_OTHER).unwrap();

        assert!(matches!(
            container.open_class("app/A.class-CFR", "class A { }"),
            Err(IndexError::AlreadyParsed(_))
        ));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_remove_and_close() {
        let dir = TempDir::new().unwrap();
        let container = ResourceContainer::open(library(&dir), Config::default());
        container.open_class("A.class-CFR", "class A { }").unwrap();
        container.open_class("B.class-CFR", "class B { }").unwrap();

        let removed = container.remove_class("A.class-CFR").unwrap();
        assert_eq!(removed.simple_name(), "A");
        assert!(container.class_file("A.class-CFR").is_none());

        container.close();
        assert!(container.is_empty());
    }

    #[test]
    fn test_unreadable_archive() {
        let container = ResourceContainer::new("gone.jar", "/nonexistent/gone.jar", Config::default());
        assert!(matches!(
            container.open_class("A.class", "class A { }"),
            Err(IndexError::Archive(ArchiveError::Io { .. }))
        ));
        assert!(container.is_empty());
    }

    #[tokio::test]
    async fn test_open_classes_concurrently() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.indexing.workers = 2;
        let container = Arc::new(ResourceContainer::open(library(&dir), config));

        let sources = vec![
            ("app/A.class-CFR".to_string(), USES_OTHER.to_string()),
            ("app/B.class-CFR".to_string(), "class B { int b; }".to_string()),
            ("app/C.class-CFR".to_string(), "class C { void m( }".to_string()),
        ];
        let results = Arc::clone(&container).open_classes(sources).await.unwrap();

        let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["app/A.class-CFR", "app/B.class-CFR", "app/C.class-CFR"]);
        assert!(results[0].1.as_ref().unwrap().is_indexed());
        assert!(results[1].1.as_ref().unwrap().is_indexed());
        assert!(matches!(results[2].1, Ok(ParseStatus::Failed(_))));

        let b = container.class_file("app/B.class-CFR").unwrap();
        assert_eq!(b.locations_for(LocationKind::Field, "b").len(), 1);
        let c = container.class_file("app/C.class-CFR").unwrap();
        assert!(!c.has_been_parsed());
    }

    #[tokio::test]
    async fn test_open_classes_fails_once_for_missing_archive() {
        let container = Arc::new(ResourceContainer::new("gone.jar", "/nonexistent/gone.jar", Config::default()));
        let result = container
            .open_classes(vec![("A.class".to_string(), "class A { }".to_string())])
            .await;
        assert!(matches!(result, Err(IndexError::Archive(_))));
    }
}
