//! Local file system locations.

use crate::error::{LocioError, Result};
use crate::location::Location;
use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// A path on the local file system.
#[derive(Debug, Clone)]
pub struct FileLocation {
    path: PathBuf,
    uri: Option<Url>,
}

impl FileLocation {
    /// Create a location for `path`
    ///
    /// The URI is derived from the absolute form of the path; relative paths
    /// are resolved against the current directory. If no `file://` URI can be
    /// formed the location simply has none.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let absolute = if path.is_absolute() {
            Some(path.clone())
        } else {
            std::env::current_dir().ok().map(|cwd| cwd.join(&path))
        };
        let uri = absolute.and_then(|abs| Url::from_file_path(abs).ok());
        Self { path, uri }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Location for FileLocation {
    fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// Final path component, or the full path when there is none (e.g. `/`)
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn is_browsable(&self) -> bool {
        true
    }

    fn parent(&self) -> Result<Option<Arc<dyn Location>>> {
        Ok(self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(|parent| Arc::new(FileLocation::new(parent)) as Arc<dyn Location>))
    }

    fn children(&self) -> Result<Vec<Arc<dyn Location>>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.path).map_err(|e| {
            LocioError::transport(
                format!("Failed to list directory: {}", self.path.display()),
                e,
            )
        })?;

        let mut children: Vec<Arc<dyn Location>> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                LocioError::transport(
                    format!("Failed to read entry of: {}", self.path.display()),
                    e,
                )
            })?;
            children.push(Arc::new(FileLocation::new(entry.path())));
        }
        Ok(children)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_and_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let location = FileLocation::new(&path);

        assert_eq!(location.name(), "data.bin");
        let uri = location.uri().expect("absolute path has a file URI");
        assert_eq!(uri.scheme(), "file");
        assert!(uri.path().ends_with("/data.bin"));
        assert!(location.is_browsable());
    }

    #[test]
    fn test_parent_is_directory() {
        let dir = tempfile::tempdir().unwrap();
        let location = FileLocation::new(dir.path().join("a.txt"));

        let parent = location.parent().unwrap().expect("file has a parent");
        let parent = parent
            .as_any()
            .downcast_ref::<FileLocation>()
            .expect("parent is a file location");
        assert_eq!(parent.path(), dir.path());
    }

    #[test]
    fn test_children_lists_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one"), b"1").unwrap();
        std::fs::write(dir.path().join("two"), b"2").unwrap();

        let location = FileLocation::new(dir.path());
        let names: HashSet<String> = location
            .children()
            .unwrap()
            .iter()
            .map(|child| child.name())
            .collect();

        assert_eq!(names, HashSet::from(["one".to_string(), "two".to_string()]));
    }

    #[test]
    fn test_children_of_plain_file_is_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let location = FileLocation::new(file.path());
        assert!(location.children().unwrap().is_empty());
    }
}
