//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::RecordKind;

/// Name of the per-project directory holding config and the local store
pub const PROJECT_DIR: &str = ".mouth";

/// Represents a mouth project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .mouth/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_structure(root)
    }

    /// Force initialization even if .mouth/ exists, rewriting the config
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root)
    }

    fn write_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let mouth_dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&mouth_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::create_dir_all(root.join("templates"))
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(mouth_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# mouth project configuration

# SQLite store, relative to the project root (default: .mouth/mouth.db)
# database: .mouth/mouth.db

# User that changes are attributed to (default: $USER)
# actor: ""

# Log filter, e.g. "mouth=debug" (overridden by MOUTH_LOG)
# log: warn

# Default output format (auto, yaml, json, id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .mouth configuration directory
    pub fn mouth_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Get the project config file path
    pub fn config_path(&self) -> PathBuf {
        self.mouth_dir().join("config.yaml")
    }

    /// Default location of the local store
    pub fn default_database(&self) -> PathBuf {
        self.mouth_dir().join("mouth.db")
    }

    /// Iterate record files under the project, optionally of one kind
    pub fn iter_record_files(&self, kind: Option<RecordKind>) -> impl Iterator<Item = PathBuf> {
        let mouth_dir = self.mouth_dir();
        walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(move |e| e.path() != mouth_dir)
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(move |e| match RecordKind::from_filename(&e.file_name().to_string_lossy()) {
                Some(found) => kind.map_or(true, |k| k == found),
                None => false,
            })
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(
        "not a mouth project (searched from {searched_from:?}). \
         Run 'mouth init' to create one."
    )]
    NotFound { searched_from: PathBuf },

    #[error("mouth project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.mouth_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.root().join("templates").is_dir());
        assert_eq!(project.default_database(), project.mouth_dir().join("mouth.db"));
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_project_discover_finds_mouth_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_mouth_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_iter_record_files() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let templates = project.root().join("templates");
        std::fs::write(templates.join("welcome.email.yaml"), "").unwrap();
        std::fs::write(templates.join("welcome.sms.yaml"), "").unwrap();
        std::fs::write(templates.join("notes.txt"), "").unwrap();

        assert_eq!(project.iter_record_files(None).count(), 2);
        let sms: Vec<_> = project
            .iter_record_files(Some(RecordKind::TemplateSms))
            .collect();
        assert_eq!(sms.len(), 1);
        assert!(sms[0].ends_with("welcome.sms.yaml"));
    }
}
