//! Common types used throughout VaultFS.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a vault: the absolute location of its root in host storage.
///
/// Used as the registry key for live vault instances. Two locators that
/// decode to the same host path compare equal and map to the same instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultRoot(PathBuf);

impl VaultRoot {
    /// Create a new VaultRoot from an absolute host path.
    ///
    /// # Preconditions
    /// - `path` must be absolute
    /// - `path` must be valid UTF-8, so locator encoding is exact
    ///
    /// # Errors
    /// - Returns error if the path is relative or not UTF-8
    pub fn new(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        if !path.is_absolute() {
            return Err(crate::Error::InvalidInput(format!(
                "Vault root must be an absolute path: {}",
                path.display()
            )));
        }
        if path.to_str().is_none() {
            return Err(crate::Error::InvalidInput(format!(
                "Vault root must be valid UTF-8: {}",
                path.display()
            )));
        }
        Ok(Self(path))
    }

    /// Get the host path of the vault root.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for VaultRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A path within a vault, independent of underlying storage.
///
/// This type represents logical paths within the encrypted vault structure,
/// not physical filesystem paths. The empty path is the vault root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultPath {
    components: Vec<String>,
}

impl VaultPath {
    /// Create a root path.
    pub fn root() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Create a path from string components.
    ///
    /// # Preconditions
    /// - Components must not contain path separators
    /// - Components must not be empty strings
    ///
    /// # Errors
    /// - Returns error if any component is invalid
    pub fn from_components(components: Vec<String>) -> crate::Result<Self> {
        for comp in &components {
            if comp.is_empty() {
                return Err(crate::Error::InvalidInput(
                    "Path component cannot be empty".to_string(),
                ));
            }
            if comp.contains('/') || comp.contains('\\') {
                return Err(crate::Error::InvalidInput(
                    "Path component cannot contain separators".to_string(),
                ));
            }
        }
        Ok(Self { components })
    }

    /// Parse a path string into VaultPath.
    ///
    /// Uses '/' as separator. Empty input and "/" are the vault root.
    pub fn parse(path: &str) -> crate::Result<Self> {
        if path.is_empty() || path == "/" {
            return Ok(Self::root());
        }

        let path = path.trim_start_matches('/').trim_end_matches('/');
        if path.is_empty() {
            return Ok(Self::root());
        }

        let components: Vec<String> = path.split('/').map(String::from).collect();
        Self::from_components(components)
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Get the parent path, if any.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            let mut components = self.components.clone();
            components.pop();
            Some(Self { components })
        }
    }

    /// Get the file/directory name (last component).
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(|s| s.as_str())
    }

    /// Join this path with a child component.
    pub fn join(&self, child: &str) -> crate::Result<Self> {
        if child.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Child component cannot be empty".to_string(),
            ));
        }
        if child.contains('/') || child.contains('\\') {
            return Err(crate::Error::InvalidInput(
                "Child component cannot contain separators".to_string(),
            ));
        }
        let mut components = self.components.clone();
        components.push(child.to_string());
        Ok(Self { components })
    }

    /// Get the path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Convert to a string representation.
    pub fn to_string_path(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            format!("/{}", self.components.join("/"))
        }
    }
}

impl fmt::Display for VaultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_path())
    }
}

/// Access mode requested against a virtual path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Read access.
    Read,
    /// Write access.
    Write,
    /// Execute access.
    Execute,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => write!(f, "read"),
            AccessMode::Write => write!(f, "write"),
            AccessMode::Execute => write!(f, "execute"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_root_absolute() {
        let root = VaultRoot::new("/vaults/v1").unwrap();
        assert_eq!(root.as_path(), Path::new("/vaults/v1"));
    }

    #[test]
    fn test_vault_root_relative_fails() {
        assert!(VaultRoot::new("vaults/v1").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_vault_root_non_utf8_fails() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let path = PathBuf::from(OsString::from_vec(b"/vaults/\xFFv1".to_vec()));
        assert!(VaultRoot::new(path).is_err());
    }

    #[test]
    fn test_vault_root_equality_is_path_equality() {
        let a = VaultRoot::new("/vaults/v1").unwrap();
        let b = VaultRoot::new("/vaults/v1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_vault_path_root() {
        let path = VaultPath::root();
        assert!(path.is_root());
        assert_eq!(path.to_string_path(), "/");
    }

    #[test]
    fn test_vault_path_parse() {
        let path = VaultPath::parse("/foo/bar/baz").unwrap();
        assert_eq!(path.components(), &["foo", "bar", "baz"]);
        assert_eq!(path.to_string_path(), "/foo/bar/baz");
    }

    #[test]
    fn test_vault_path_parse_empty_is_root() {
        assert!(VaultPath::parse("").unwrap().is_root());
        assert!(VaultPath::parse("/").unwrap().is_root());
    }

    #[test]
    fn test_vault_path_join() {
        let path = VaultPath::root().join("foo").unwrap().join("bar").unwrap();
        assert_eq!(path.to_string_path(), "/foo/bar");
    }

    #[test]
    fn test_vault_path_parent() {
        let path = VaultPath::parse("/foo/bar").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string_path(), "/foo");
    }

    #[test]
    fn test_vault_path_name() {
        let path = VaultPath::parse("/foo/bar").unwrap();
        assert_eq!(path.name(), Some("bar"));
    }
}
