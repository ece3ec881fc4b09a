//! Vault filesystem collaborator traits.
//!
//! The dispatcher in this crate routes operations; the actual cipher layer
//! (content encryption, directory-entry format, ciphertext name mapping)
//! lives behind [`VaultFilesystem`]. Operations a collaborator does not
//! override surface [`Error::Unimplemented`], making capability gaps
//! explicit rather than silently ignored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vaultfs_common::{Error, Result, VaultPath};

use crate::channel::SyncChannel;

/// Metadata for a single directory entry.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Cleartext name of the entry.
    pub name: String,
    /// Size in bytes (None for directories).
    pub size: Option<u64>,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Generic attribute set for a virtual path.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    /// Size in bytes (None for directories).
    pub size: Option<u64>,
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Last modification time, if known.
    pub modified: Option<DateTime<Utc>>,
    /// Collaborator-specific attributes.
    pub extra: HashMap<String, serde_json::Value>,
}

/// Options for opening a content channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
    pub append: bool,
}

impl OpenOptions {
    /// Read-only options.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Read-write options.
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
            ..Self::default()
        }
    }
}

/// DOS-style attributes as reported by a host attribute view.
#[derive(Debug, Clone, Copy, Default)]
pub struct DosAttributes {
    pub hidden: bool,
    pub read_only: bool,
    pub system: bool,
    pub archive: bool,
}

/// POSIX permission bits as reported by a host attribute view.
#[derive(Debug, Clone, Copy)]
pub struct PosixPermissions {
    mode: u32,
}

impl PosixPermissions {
    /// Wrap a raw `st_mode`-style bit set.
    pub fn from_mode(mode: u32) -> Self {
        Self { mode }
    }

    /// Owner-read bit.
    pub fn owner_read(&self) -> bool {
        self.mode & 0o400 != 0
    }

    /// Owner-write bit.
    pub fn owner_write(&self) -> bool {
        self.mode & 0o200 != 0
    }

    /// Owner-execute bit.
    pub fn owner_execute(&self) -> bool {
        self.mode & 0o100 != 0
    }
}

/// Capability queries against the host storage's attribute facilities.
///
/// The host backing a vault may expose a DOS-style view, a POSIX-style view,
/// both, or neither. Callers must check support before reading; the
/// translator in [`crate::attrs`] turns unsupported views into defined
/// defaults instead of errors.
pub trait FileStore: Send + Sync {
    /// Whether the host exposes a DOS-style attribute view.
    fn supports_dos_view(&self) -> bool;

    /// Read DOS attributes for a host location.
    ///
    /// # Errors
    /// - View not supported by this store
    /// - Host I/O failure
    fn read_dos(&self, path: &Path) -> Result<DosAttributes>;

    /// Whether the host exposes a POSIX-style permission view.
    fn supports_posix_view(&self) -> bool;

    /// Read POSIX permissions for a host location.
    ///
    /// # Errors
    /// - View not supported by this store
    /// - Host I/O failure
    fn read_posix(&self, path: &Path) -> Result<PosixPermissions>;
}

/// Host-backed file store using the local filesystem's attribute model.
///
/// Unix hosts expose the POSIX view and no DOS view; Windows hosts expose
/// the DOS view and no POSIX view.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl FileStore for LocalFileStore {
    fn supports_dos_view(&self) -> bool {
        false
    }

    fn read_dos(&self, path: &Path) -> Result<DosAttributes> {
        Err(Error::Unsupported(format!(
            "DOS attribute view not available for {}",
            path.display()
        )))
    }

    fn supports_posix_view(&self) -> bool {
        true
    }

    fn read_posix(&self, path: &Path) -> Result<PosixPermissions> {
        use std::os::unix::fs::PermissionsExt;
        let meta = std::fs::metadata(path)?;
        Ok(PosixPermissions::from_mode(meta.permissions().mode()))
    }
}

#[cfg(windows)]
impl FileStore for LocalFileStore {
    fn supports_dos_view(&self) -> bool {
        true
    }

    fn read_dos(&self, path: &Path) -> Result<DosAttributes> {
        use std::os::windows::fs::MetadataExt;
        const FILE_ATTRIBUTE_READONLY: u32 = 0x0001;
        const FILE_ATTRIBUTE_HIDDEN: u32 = 0x0002;
        const FILE_ATTRIBUTE_SYSTEM: u32 = 0x0004;
        const FILE_ATTRIBUTE_ARCHIVE: u32 = 0x0020;

        let attrs = std::fs::metadata(path)?.file_attributes();
        Ok(DosAttributes {
            hidden: attrs & FILE_ATTRIBUTE_HIDDEN != 0,
            read_only: attrs & FILE_ATTRIBUTE_READONLY != 0,
            system: attrs & FILE_ATTRIBUTE_SYSTEM != 0,
            archive: attrs & FILE_ATTRIBUTE_ARCHIVE != 0,
        })
    }

    fn supports_posix_view(&self) -> bool {
        false
    }

    fn read_posix(&self, path: &Path) -> Result<PosixPermissions> {
        Err(Error::Unsupported(format!(
            "POSIX attribute view not available for {}",
            path.display()
        )))
    }
}

/// Per-instance vault filesystem collaborator.
///
/// Owns everything this dispatcher does not: the content cipher, the
/// on-disk chunk format, directory-entry encoding and name mapping. The
/// registry creates one collaborator per vault root and routes all
/// path-scoped operations through it.
///
/// Only [`local_path`](Self::local_path) and
/// [`file_store`](Self::file_store) are required; the delegated handlers
/// default to [`Error::Unimplemented`] so a partial collaborator reports
/// its gaps instead of misbehaving.
#[async_trait]
pub trait VaultFilesystem: Send + Sync {
    /// Host-side file store for attribute and permission queries.
    fn file_store(&self) -> Arc<dyn FileStore>;

    /// Fully-qualified host location backing an in-vault path.
    ///
    /// Used by the attribute translator to query host views; the returned
    /// path addresses the ciphertext representation, not the cleartext.
    async fn local_path(&self, path: &VaultPath) -> Result<PathBuf>;

    /// Stream the entries of a vault directory.
    async fn read_dir(&self, path: &VaultPath) -> Result<Vec<DirEntry>> {
        Err(Error::Unimplemented(format!(
            "read_dir not supported for {path}"
        )))
    }

    /// Create a vault directory.
    async fn create_dir(&self, path: &VaultPath) -> Result<()> {
        Err(Error::Unimplemented(format!(
            "create_dir not supported for {path}"
        )))
    }

    /// Delete a vault file or empty directory.
    async fn delete(&self, path: &VaultPath) -> Result<()> {
        Err(Error::Unimplemented(format!(
            "delete not supported for {path}"
        )))
    }

    /// Copy within the vault.
    async fn copy(&self, from: &VaultPath, to: &VaultPath) -> Result<()> {
        Err(Error::Unimplemented(format!(
            "copy not supported for {from} -> {to}"
        )))
    }

    /// Move/rename within the vault.
    async fn rename(&self, from: &VaultPath, to: &VaultPath) -> Result<()> {
        Err(Error::Unimplemented(format!(
            "rename not supported for {from} -> {to}"
        )))
    }

    /// Read the generic attribute set for a path.
    async fn read_attributes(&self, path: &VaultPath) -> Result<Attributes> {
        Err(Error::Unimplemented(format!(
            "read_attributes not supported for {path}"
        )))
    }

    /// Write a single named attribute.
    async fn write_attribute(
        &self,
        path: &VaultPath,
        name: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        let _ = value;
        Err(Error::Unimplemented(format!(
            "write_attribute '{name}' not supported for {path}"
        )))
    }

    /// Open a synchronous content channel for a path.
    ///
    /// Content I/O is entirely the collaborator's concern; the dispatcher
    /// only wraps the returned channel for asynchronous use.
    fn open_channel(
        &self,
        path: &VaultPath,
        options: &OpenOptions,
    ) -> Result<Box<dyn SyncChannel>> {
        let _ = options;
        Err(Error::Unimplemented(format!(
            "open_channel not supported for {path}"
        )))
    }

    /// Release collaborator resources when the instance is closed.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
