// Symbol source backed by an installed JDK.
//
// Modular JDKs ship `jmods/*.jmod`, zip files with a short header whose class
// entries live under `classes/`. Older JDKs ship a single `rt.jar`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use super::archive::{ArchiveError, ArchiveTypeSolver};
use super::{TypeDeclaration, TypeSolver};
use crate::config::ResolutionConfig;

const JMOD_CLASSES: &str = "classes/";
const RT_JAR_LOCATIONS: [&str; 2] = ["lib/rt.jar", "jre/lib/rt.jar"];

/// Solvers already loaded, keyed by JDK home
static LOADED: Lazy<DashMap<PathBuf, Arc<JdkTypeSolver>>> = Lazy::new(DashMap::new);

/// Every class of one JDK installation
#[derive(Debug)]
pub struct JdkTypeSolver {
    java_home: PathBuf,
    classes: ArchiveTypeSolver,
}

impl JdkTypeSolver {
    /// Read the runtime classes of the JDK at `java_home`.
    ///
    /// Returns `Ok(None)` when the directory holds neither `jmods/` nor an
    /// `rt.jar`, as in a JRE-only image.
    pub fn open(java_home: &Path, config: &ResolutionConfig) -> Result<Option<Self>, ArchiveError> {
        let mut classes = ArchiveTypeSolver::empty(format!("jdk:{}", java_home.display()));

        let modules = jmod_files(java_home)?;
        if !modules.is_empty() {
            for module in &modules {
                classes.scan_archive(module, config, JMOD_CLASSES)?;
            }
        } else if let Some(rt_jar) = RT_JAR_LOCATIONS
            .iter()
            .map(|location| java_home.join(location))
            .find(|candidate| candidate.is_file())
        {
            classes.scan_archive(&rt_jar, config, "")?;
        } else {
            debug!("No jmods or rt.jar under {}", java_home.display());
            return Ok(None);
        }

        info!(
            "Loaded {} runtime classes from {}",
            classes.len(),
            java_home.display()
        );
        Ok(Some(Self {
            java_home: java_home.to_path_buf(),
            classes,
        }))
    }

    /// The JDK named by the configuration, or the one found on this machine.
    /// Each installation is read once per process and shared afterwards.
    pub fn shared(config: &ResolutionConfig) -> Option<Arc<Self>> {
        let java_home = match &config.java_home {
            Some(home) => home.clone(),
            None if config.detect_jdk => detect_java_home()?,
            None => return None,
        };

        if let Some(loaded) = LOADED.get(&java_home) {
            return Some(Arc::clone(loaded.value()));
        }

        match Self::open(&java_home, config) {
            Ok(Some(solver)) => {
                let solver = Arc::new(solver);
                LOADED.insert(java_home, Arc::clone(&solver));
                Some(solver)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring JDK at {}: {}", java_home.display(), e);
                None
            }
        }
    }

    pub fn java_home(&self) -> &Path {
        &self.java_home
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl TypeSolver for JdkTypeSolver {
    fn name(&self) -> &str {
        "jdk"
    }

    fn solve_type(&self, path: &str) -> Option<&TypeDeclaration> {
        self.classes.solve_type(path)
    }
}

/// `JAVA_HOME` when it names a directory, else the installation owning the
/// `java` launcher on `PATH`
pub fn detect_java_home() -> Option<PathBuf> {
    if let Some(home) = env::var_os("JAVA_HOME").map(PathBuf::from) {
        if home.is_dir() {
            return Some(home);
        }
    }

    let launcher = which::which("java").ok()?;
    let launcher = fs::canonicalize(&launcher).unwrap_or(launcher);
    launcher
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
}

fn jmod_files(java_home: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let dir = java_home.join("jmods");
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&dir).map_err(|source| ArchiveError::Io {
        path: dir.clone(),
        source,
    })?;
    let mut modules = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ArchiveError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("jmod") {
            modules.push(path);
        }
    }
    modules.sort();
    Ok(modules)
}
