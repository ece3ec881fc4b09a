//! Vault registry: at-most-one live instance per vault root.
//!
//! The registry is the dispatcher's orchestrator. It owns the mapping from
//! vault root to live [`VaultInstance`], enforces exclusive creation under
//! concurrent callers, and routes path-scoped operations to the instance
//! owning the path.
//!
//! Creation and lookup are linearizable per root: the map's sharded entry
//! locking makes insert-if-absent atomic for a given key without a global
//! lock across unrelated vaults.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tracing::debug;

use vaultfs_common::{AccessMode, Error, Result, VaultRoot};

use crate::channel::AsyncChannel;
use crate::filesystem::{Attributes, DirEntry, OpenOptions, VaultFilesystem};
use crate::instance::{VaultInstance, VirtualPath};
use crate::locator::VaultLocator;

/// Factory building the vault filesystem collaborator for a root.
///
/// Invoked at most once per live instance; the registry holds the key's
/// entry lock for the duration, so racing creators never both call it.
pub type VaultFactory = Box<dyn Fn(&VaultRoot) -> Result<Arc<dyn VaultFilesystem>> + Send + Sync>;

/// Registry of live vault instances, keyed by vault root.
pub struct VaultRegistry {
    vaults: DashMap<VaultRoot, Arc<VaultInstance>>,
    factory: VaultFactory,
}

impl VaultRegistry {
    /// Create a registry that builds collaborators with `factory`.
    pub fn new(factory: VaultFactory) -> Self {
        Self {
            vaults: DashMap::new(),
            factory,
        }
    }

    /// Register a new instance for `root`.
    ///
    /// # Postconditions
    /// - Exactly one racing caller observes success for a given root
    ///
    /// # Errors
    /// - `AlreadyExists` if a live instance for `root` is registered
    /// - Whatever fault the collaborator factory raises
    pub fn create_at(&self, root: &VaultRoot) -> Result<Arc<VaultInstance>> {
        match self.vaults.entry(root.clone()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists(format!(
                "vault instance already registered for {root}"
            ))),
            Entry::Vacant(entry) => {
                let instance = Arc::new(VaultInstance::new(root.clone(), (self.factory)(root)?));
                entry.insert(Arc::clone(&instance));
                debug!(%root, id = %instance.id(), "vault instance created");
                Ok(instance)
            }
        }
    }

    /// Look up the live instance for `root` without creating one.
    ///
    /// # Errors
    /// - `NotFound` if no live instance is registered
    pub fn get_existing(&self, root: &VaultRoot) -> Result<Arc<VaultInstance>> {
        self.vaults
            .get(root)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::NotFound(format!("no vault instance registered for {root}")))
    }

    /// Return the live instance for `root`, creating it first if absent.
    ///
    /// Concurrent callers for the same absent root converge on a single
    /// instance; the factory runs at most once.
    pub fn resolve_or_create(&self, root: &VaultRoot) -> Result<Arc<VaultInstance>> {
        match self.vaults.entry(root.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let instance = Arc::new(VaultInstance::new(root.clone(), (self.factory)(root)?));
                entry.insert(Arc::clone(&instance));
                debug!(%root, id = %instance.id(), "vault instance created");
                Ok(instance)
            }
        }
    }

    /// Resolve a locator into a virtual path, creating the instance for its
    /// root if needed.
    pub fn resolve_path(&self, locator: &VaultLocator) -> Result<VirtualPath> {
        let instance = self.resolve_or_create(locator.root())?;
        Ok(instance.resolve(locator.fragment()))
    }

    /// Parse an addressing string and resolve it into a virtual path.
    pub fn resolve_uri(&self, uri: &str) -> Result<VirtualPath> {
        self.resolve_path(&VaultLocator::parse(uri)?)
    }

    /// Close and unregister the instance for `root`.
    ///
    /// The mapping is removed before the collaborator is released, so no
    /// caller can resolve the instance once close has begun.
    ///
    /// # Errors
    /// - `NotFound` if no live instance is registered
    pub async fn close(&self, root: &VaultRoot) -> Result<()> {
        let (_, instance) = self
            .vaults
            .remove(root)
            .ok_or_else(|| Error::NotFound(format!("no vault instance registered for {root}")))?;
        debug!(%root, id = %instance.id(), "vault instance closed");
        instance.close().await
    }

    /// Whether two virtual paths address the same file.
    ///
    /// Paths from different instances are never the same file.
    pub fn is_same_file(&self, a: &VirtualPath, b: &VirtualPath) -> bool {
        a == b
    }

    /// Whether the host storage reports the path as hidden.
    pub async fn is_hidden(&self, path: &VirtualPath) -> Result<bool> {
        self.owning(path)?.is_hidden(path).await
    }

    /// Check the requested access modes for a path.
    pub async fn check_access(&self, path: &VirtualPath, modes: &[AccessMode]) -> Result<()> {
        self.owning(path)?.check_access(path, modes).await
    }

    /// Stream the entries of a vault directory.
    pub async fn read_dir(&self, path: &VirtualPath) -> Result<Vec<DirEntry>> {
        self.owning(path)?.read_dir(path).await
    }

    /// Create a vault directory.
    pub async fn create_dir(&self, path: &VirtualPath) -> Result<()> {
        self.owning(path)?.create_dir(path).await
    }

    /// Delete a vault file or empty directory.
    pub async fn delete(&self, path: &VirtualPath) -> Result<()> {
        self.owning(path)?.delete(path).await
    }

    /// Copy a file within one vault.
    ///
    /// # Errors
    /// - `Unsupported` when source and target live in different vaults
    pub async fn copy(&self, from: &VirtualPath, to: &VirtualPath) -> Result<()> {
        if from.root() != to.root() {
            return Err(Error::Unsupported(
                "copy across vault instances".to_string(),
            ));
        }
        self.owning(from)?.copy(from, to).await
    }

    /// Move/rename a file within one vault.
    ///
    /// # Errors
    /// - `Unsupported` when source and target live in different vaults
    pub async fn rename(&self, from: &VirtualPath, to: &VirtualPath) -> Result<()> {
        if from.root() != to.root() {
            return Err(Error::Unsupported(
                "rename across vault instances".to_string(),
            ));
        }
        self.owning(from)?.rename(from, to).await
    }

    /// Read the generic attribute set for a path.
    pub async fn read_attributes(&self, path: &VirtualPath) -> Result<Attributes> {
        self.owning(path)?.read_attributes(path).await
    }

    /// Write a single named attribute.
    pub async fn write_attribute(
        &self,
        path: &VirtualPath,
        name: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.owning(path)?.write_attribute(path, name, value).await
    }

    /// Open an asynchronous content channel for a path.
    ///
    /// Content I/O is delegated: the owning instance's collaborator yields
    /// the synchronous channel and this layer adapts it onto `executor`.
    pub fn open_channel(
        &self,
        path: &VirtualPath,
        options: &OpenOptions,
        executor: Handle,
    ) -> Result<AsyncChannel> {
        self.owning(path)?.open_channel(path, options, executor)
    }

    fn owning(&self, path: &VirtualPath) -> Result<Arc<VaultInstance>> {
        self.get_existing(path.root())
    }
}
