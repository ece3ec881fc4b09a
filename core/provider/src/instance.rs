//! Live vault instances and instance-scoped virtual paths.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use uuid::Uuid;

use vaultfs_common::{AccessMode, Error, Result, VaultPath, VaultRoot};

use crate::attrs;
use crate::channel::AsyncChannel;
use crate::filesystem::{Attributes, DirEntry, OpenOptions, VaultFilesystem};

/// A path value meaningful only within the vault instance that produced it.
///
/// Carries the identity of the producing instance; every instance-scoped
/// operation verifies ownership before acting, so a path can never be
/// applied against a foreign vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    instance: Uuid,
    root: VaultRoot,
    fragment: VaultPath,
}

impl VirtualPath {
    /// Root of the vault this path belongs to.
    pub fn root(&self) -> &VaultRoot {
        &self.root
    }

    /// Path relative to the vault's virtual root.
    pub fn fragment(&self) -> &VaultPath {
        &self.fragment
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.root, self.fragment)
    }
}

/// The live virtual filesystem bound to exactly one vault root.
///
/// Created and owned by the registry; at most one instance exists per root
/// at any time. All path-scoped operations resolve through the instance's
/// [`VaultFilesystem`] collaborator.
pub struct VaultInstance {
    id: Uuid,
    root: VaultRoot,
    fs: Arc<dyn VaultFilesystem>,
}

impl VaultInstance {
    pub(crate) fn new(root: VaultRoot, fs: Arc<dyn VaultFilesystem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            root,
            fs,
        }
    }

    /// Unique identity of this instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Root of the vault this instance serves.
    pub fn root(&self) -> &VaultRoot {
        &self.root
    }

    /// The vault filesystem collaborator.
    pub fn filesystem(&self) -> &Arc<dyn VaultFilesystem> {
        &self.fs
    }

    /// Resolve an in-vault fragment into a virtual path scoped to this
    /// instance.
    pub fn resolve(&self, fragment: &VaultPath) -> VirtualPath {
        VirtualPath {
            instance: self.id,
            root: self.root.clone(),
            fragment: fragment.clone(),
        }
    }

    /// Verify a virtual path was produced by this instance.
    fn owned(&self, path: &VirtualPath) -> Result<()> {
        if path.instance != self.id {
            return Err(Error::InvalidInput(format!(
                "virtual path {path} belongs to a different vault instance"
            )));
        }
        Ok(())
    }

    /// Fully-qualified host location backing a virtual path.
    pub async fn local_path(&self, path: &VirtualPath) -> Result<PathBuf> {
        self.owned(path)?;
        self.fs.local_path(&path.fragment).await
    }

    /// Whether the host storage reports the path as hidden.
    ///
    /// Answers `false` when the host exposes no DOS-style attribute view.
    pub async fn is_hidden(&self, path: &VirtualPath) -> Result<bool> {
        self.owned(path)?;
        let local = self.fs.local_path(&path.fragment).await?;
        attrs::is_hidden(self.fs.file_store().as_ref(), &local)
    }

    /// Check the requested access modes against the host's POSIX view.
    ///
    /// Computed from the host view at invocation time, never cached; access
    /// is unrestricted when the host exposes no POSIX view. Does not verify
    /// that the path exists.
    pub async fn check_access(&self, path: &VirtualPath, modes: &[AccessMode]) -> Result<()> {
        self.owned(path)?;
        let local = self.fs.local_path(&path.fragment).await?;
        attrs::check_access(self.fs.file_store().as_ref(), &local, modes)
    }

    /// Stream the entries of a vault directory.
    pub async fn read_dir(&self, path: &VirtualPath) -> Result<Vec<DirEntry>> {
        self.owned(path)?;
        self.fs.read_dir(&path.fragment).await
    }

    /// Create a vault directory.
    pub async fn create_dir(&self, path: &VirtualPath) -> Result<()> {
        self.owned(path)?;
        self.fs.create_dir(&path.fragment).await
    }

    /// Delete a vault file or empty directory.
    pub async fn delete(&self, path: &VirtualPath) -> Result<()> {
        self.owned(path)?;
        self.fs.delete(&path.fragment).await
    }

    /// Copy within this vault.
    pub async fn copy(&self, from: &VirtualPath, to: &VirtualPath) -> Result<()> {
        self.owned(from)?;
        self.owned(to)?;
        self.fs.copy(&from.fragment, &to.fragment).await
    }

    /// Move/rename within this vault.
    pub async fn rename(&self, from: &VirtualPath, to: &VirtualPath) -> Result<()> {
        self.owned(from)?;
        self.owned(to)?;
        self.fs.rename(&from.fragment, &to.fragment).await
    }

    /// Read the generic attribute set for a path.
    pub async fn read_attributes(&self, path: &VirtualPath) -> Result<Attributes> {
        self.owned(path)?;
        self.fs.read_attributes(&path.fragment).await
    }

    /// Write a single named attribute.
    pub async fn write_attribute(
        &self,
        path: &VirtualPath,
        name: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.owned(path)?;
        self.fs.write_attribute(&path.fragment, name, value).await
    }

    /// Open an asynchronous content channel for a path.
    ///
    /// The collaborator yields the synchronous channel; this layer only
    /// adapts it onto the caller-supplied execution context.
    pub fn open_channel(
        &self,
        path: &VirtualPath,
        options: &OpenOptions,
        executor: Handle,
    ) -> Result<AsyncChannel> {
        self.owned(path)?;
        let channel = self.fs.open_channel(&path.fragment, options)?;
        Ok(AsyncChannel::new(channel, executor))
    }

    /// Release the collaborator's resources.
    pub(crate) async fn close(&self) -> Result<()> {
        self.fs.close().await
    }
}

impl fmt::Debug for VaultInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultInstance")
            .field("id", &self.id)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
