//! Attribute translation over host capability views.
//!
//! The host backing a vault may not expose the attribute model being
//! virtualized. Every query here degrades to a defined default when the
//! underlying view is absent: no DOS view means nothing is hidden, no
//! POSIX view means this layer restricts nothing and leaves enforcement
//! to the host itself.

use std::path::Path;

use vaultfs_common::{AccessMode, Error, Result};

use crate::filesystem::FileStore;

/// Whether the host reports the location as hidden.
///
/// True iff the store exposes a DOS-style view and the hidden bit is set.
/// An absent view is not an error.
pub fn is_hidden(store: &dyn FileStore, path: &Path) -> Result<bool> {
    if store.supports_dos_view() {
        Ok(store.read_dos(path)?.hidden)
    } else {
        Ok(false)
    }
}

/// Check the requested access modes against the host's POSIX view.
///
/// Each mode requires the corresponding owner bit. Without a POSIX view
/// access is unrestricted at this layer. Existence of the location is a
/// separate condition and is not verified here.
///
/// # Errors
/// - `AccessDenied` naming the path when a required owner bit is missing
/// - Host I/O failure while reading the view
pub fn check_access(store: &dyn FileStore, path: &Path, modes: &[AccessMode]) -> Result<()> {
    if !store.supports_posix_view() {
        return Ok(());
    }

    let perms = store.read_posix(path)?;
    for mode in modes {
        let granted = match mode {
            AccessMode::Read => perms.owner_read(),
            AccessMode::Write => perms.owner_write(),
            AccessMode::Execute => perms.owner_execute(),
        };
        if !granted {
            return Err(Error::AccessDenied(format!(
                "{mode} access to {}",
                path.display()
            )));
        }
    }
    Ok(())
}
