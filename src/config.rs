//! Loads project configuration from a `taxon.yaml` file. The file is looked
//! up from a starting directory through each of its ancestors, and the
//! directory that contains it is treated as the project root. Every field is
//! optional.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The name of the project file.
pub const PROJECT_FILE: &str = "taxon.yaml";

const DEFAULT_DESCRIPTION: &str = "Write a short summary of the post here...";

#[derive(Deserialize, Default)]
struct Project {
    #[serde(default)]
    content_directory: Option<PathBuf>,

    #[serde(default)]
    author: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    default_tags: Option<Vec<String>>,
}

/// Resolved project configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory whose first-level subdirectories are content
    /// collections. Relative paths in the project file are resolved against
    /// the project root.
    pub content_directory: PathBuf,

    /// The author written into scaffolded posts, if any.
    pub author: Option<String>,

    /// The placeholder description written into scaffolded posts.
    pub description: String,

    /// The tags written into scaffolded posts.
    pub default_tags: Vec<String>,
}

impl Config {
    /// The configuration used when there is no project file: content lives in
    /// `{root}/src/content`.
    pub fn with_root(root: &Path) -> Config {
        Config::from_project(root, Project::default())
    }

    /// Searches `dir` and its ancestors for [`PROJECT_FILE`] and loads the
    /// first one found. Falls back to [`Config::with_root`] for `dir` when
    /// there isn't one.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path);
            }
        }
        debug!(directory = %dir.display(), "no `{}` found; using defaults", PROJECT_FILE);
        Ok(Config::with_root(dir))
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = match serde_yaml::from_reader(file) {
            Ok(project) => project,
            Err(err) => {
                return Err(Error::DeserializeYaml {
                    path: path.to_owned(),
                    err,
                })
            }
        };
        debug!(path = %path.display(), "loaded project file");
        Ok(Config::from_project(project_root, project))
    }

    fn from_project(project_root: &Path, project: Project) -> Config {
        Config {
            content_directory: project_root.join(
                project
                    .content_directory
                    .unwrap_or_else(|| Path::new("src").join("content")),
            ),
            author: project.author,
            description: project
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned()),
            default_tags: project
                .default_tags
                .unwrap_or_else(|| vec!["draft".to_owned()]),
        }
    }
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or has fields of the
    /// wrong type.
    DeserializeYaml { path: PathBuf, err: serde_yaml::Error },

    /// Returned when the project file path has no parent directory.
    NoParentDirectory(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening project file `{}`: {}", path.display(), err)
            }
            Error::DeserializeYaml { path, err } => {
                write!(f, "Loading project file `{}`: {}", path.display(), err)
            }
            Error::NoParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file `{}`",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml { path: _, err } => Some(err),
            Error::NoParentDirectory(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::with_root(Path::new("/site"));
        assert_eq!(config.content_directory, PathBuf::from("/site/src/content"));
        assert_eq!(config.author, None);
        assert_eq!(config.default_tags, vec!["draft".to_owned()]);
    }

    #[test]
    fn test_from_ancestor_directory() -> Result<()> {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(PROJECT_FILE),
            "content_directory: posts\nauthor: Ada\ndefault_tags: [wip, notes]\n",
        )
        .unwrap();
        let nested = root.path().join("posts").join("blog");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested)?;
        assert_eq!(config.content_directory, root.path().join("posts"));
        assert_eq!(config.author.as_deref(), Some("Ada"));
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
        assert_eq!(config.default_tags, vec!["wip".to_owned(), "notes".to_owned()]);
        Ok(())
    }

    #[test]
    fn test_no_project_file() -> Result<()> {
        let root = tempfile::tempdir().unwrap();
        // Ancestors of a temp dir could in principle hold a project file, so
        // only check that loading succeeds.
        let config = Config::from_directory(root.path())?;
        assert!(!config.default_tags.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_project_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join(PROJECT_FILE);
        fs::write(&path, "default_tags: {not: a list}\n").unwrap();
        let err = Config::from_project_file(&path).unwrap_err();
        assert!(matches!(err, Error::DeserializeYaml { .. }));
        assert!(err.to_string().contains(PROJECT_FILE));
    }
}
