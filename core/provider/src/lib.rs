//! Vault registry and path-virtualization dispatcher for VaultFS.
//!
//! This crate maps addressing strings of the form
//! `vaultfs://<encoded-vault-root>#<path-inside-vault>` to live vault
//! filesystem instances, enforcing at-most-one instance per vault root,
//! and routes filesystem-level operations to the instance owning the path.
//!
//! # Design Principles
//! - Instance isolation: a virtual path is only meaningful within the
//!   instance that produced it
//! - Graceful degradation: host attribute views that don't exist answer
//!   with a defined default instead of failing the operation
//! - Delegation: content encryption, directory format and name mapping
//!   belong to the [`VaultFilesystem`] collaborator, never to this layer

pub mod attrs;
pub mod channel;
pub mod filesystem;
pub mod instance;
pub mod locator;
pub mod registry;

pub use attrs::{check_access, is_hidden};
pub use channel::{AsyncChannel, SyncChannel};
pub use filesystem::{
    Attributes, DirEntry, DosAttributes, FileStore, LocalFileStore, OpenOptions,
    PosixPermissions, VaultFilesystem,
};
pub use instance::{VaultInstance, VirtualPath};
pub use locator::{VaultLocator, URI_SCHEME};
pub use registry::{VaultFactory, VaultRegistry};
