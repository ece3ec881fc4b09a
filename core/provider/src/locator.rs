//! Addressing scheme codec.
//!
//! A locator encodes both "which vault" and "which path inside the vault"
//! in a single URI-like string:
//!
//! ```text
//! vaultfs://<percent-encoded-host-path-to-vault-root>#<path-inside-vault>
//! ```
//!
//! The fragment may be empty, meaning the vault root. Parsing is pure; a
//! locator is constructed per call and never persisted.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;
use std::path::PathBuf;

use vaultfs_common::{Error, Result, VaultPath, VaultRoot};

/// Fixed scheme literal identifying this provider.
pub const URI_SCHEME: &str = "vaultfs";

/// Characters escaped when encoding the vault-root segment.
const ROOT_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'%').add(b'#').add(b'/').add(b'?');

/// Parsed (vault-root, in-vault fragment) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLocator {
    root: VaultRoot,
    fragment: VaultPath,
}

impl VaultLocator {
    /// Build a locator from parts.
    pub fn new(root: VaultRoot, fragment: VaultPath) -> Self {
        Self { root, fragment }
    }

    /// Parse an addressing string.
    ///
    /// The vault-root segment is percent-decoded and interpreted as an
    /// absolute host path; the fragment is everything after the first `#`,
    /// taken literally (no normalization beyond in-vault path parsing).
    ///
    /// # Errors
    /// - `MalformedLocator` if the scheme is wrong, the root segment is
    ///   missing or empty, decodes to invalid UTF-8, or is not absolute
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix(URI_SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| {
                Error::MalformedLocator(format!("expected '{URI_SCHEME}://' prefix: {uri}"))
            })?;

        let (root_segment, fragment_segment) = match rest.split_once('#') {
            Some((root, fragment)) => (root, fragment),
            None => (rest, ""),
        };

        if root_segment.is_empty() {
            return Err(Error::MalformedLocator(format!(
                "missing vault root: {uri}"
            )));
        }

        let decoded = percent_decode_str(root_segment)
            .decode_utf8()
            .map_err(|e| Error::MalformedLocator(format!("vault root is not UTF-8: {e}")))?;

        let root = VaultRoot::new(PathBuf::from(decoded.into_owned()))
            .map_err(|e| Error::MalformedLocator(e.to_string()))?;
        let fragment = VaultPath::parse(fragment_segment)
            .map_err(|e| Error::MalformedLocator(format!("bad fragment: {e}")))?;

        Ok(Self { root, fragment })
    }

    /// The vault root addressed by this locator.
    pub fn root(&self) -> &VaultRoot {
        &self.root
    }

    /// The in-vault fragment (root path if empty in the source string).
    pub fn fragment(&self) -> &VaultPath {
        &self.fragment
    }

    /// Encode back into an addressing string.
    ///
    /// Exact inverse of [`parse`](Self::parse): `VaultRoot` is UTF-8 by
    /// construction, so the conversion below never loses bytes.
    pub fn to_uri(&self) -> String {
        let root = self.root.as_path().to_string_lossy();
        format!(
            "{URI_SCHEME}://{}#{}",
            utf8_percent_encode(&root, ROOT_SEGMENT),
            self.fragment.to_string_path()
        )
    }
}

impl fmt::Display for VaultLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::Path;

    #[test]
    fn test_parse_encoded_root_and_fragment() {
        let locator = VaultLocator::parse("vaultfs://%2Fvaults%2Fv1#/docs/readme.txt").unwrap();
        assert_eq!(locator.root().as_path(), Path::new("/vaults/v1"));
        assert_eq!(locator.fragment().to_string_path(), "/docs/readme.txt");
    }

    #[test]
    fn test_parse_plain_root() {
        let locator = VaultLocator::parse("vaultfs:///vaults/v1#/a/b").unwrap();
        assert_eq!(locator.root().as_path(), Path::new("/vaults/v1"));
        assert_eq!(locator.fragment().to_string_path(), "/a/b");
    }

    #[test]
    fn test_spellings_decode_to_same_root() {
        let a = VaultLocator::parse("vaultfs://%2Fvaults%2Fv1#/x").unwrap();
        let b = VaultLocator::parse("vaultfs:///vaults/v1#/x").unwrap();
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_missing_fragment_is_vault_root() {
        let locator = VaultLocator::parse("vaultfs://%2Fvaults%2Fv1").unwrap();
        assert!(locator.fragment().is_root());

        let locator = VaultLocator::parse("vaultfs://%2Fvaults%2Fv1#").unwrap();
        assert!(locator.fragment().is_root());
    }

    #[test]
    fn test_wrong_scheme_fails() {
        let err = VaultLocator::parse("file:///vaults/v1").unwrap_err();
        assert!(matches!(err, Error::MalformedLocator(_)));
    }

    #[test]
    fn test_empty_root_fails() {
        let err = VaultLocator::parse("vaultfs://#/docs").unwrap_err();
        assert!(matches!(err, Error::MalformedLocator(_)));
    }

    #[test]
    fn test_non_utf8_root_fails() {
        let err = VaultLocator::parse("vaultfs://%2Fvaults%2F%FFv1#/docs").unwrap_err();
        assert!(matches!(err, Error::MalformedLocator(_)));
    }

    #[test]
    fn test_relative_root_fails() {
        let err = VaultLocator::parse("vaultfs://vaults%2Fv1#/docs").unwrap_err();
        assert!(matches!(err, Error::MalformedLocator(_)));
    }

    #[test]
    fn test_round_trip() {
        let root = VaultRoot::new("/vaults/my vault").unwrap();
        let fragment = VaultPath::parse("/docs/readme.txt").unwrap();
        let locator = VaultLocator::new(root.clone(), fragment.clone());

        let parsed = VaultLocator::parse(&locator.to_uri()).unwrap();
        assert_eq!(parsed.root(), &root);
        assert_eq!(parsed.fragment(), &fragment);
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            root_parts in prop::collection::vec("[a-zA-Z0-9 ._#%-]{1,12}", 1..5),
            fragment_parts in prop::collection::vec("[a-zA-Z0-9 ._-]{1,12}", 0..5),
        ) {
            let root = VaultRoot::new(format!("/{}", root_parts.join("/"))).unwrap();
            let fragment = VaultPath::from_components(fragment_parts).unwrap();
            let locator = VaultLocator::new(root, fragment);

            let parsed = VaultLocator::parse(&locator.to_uri()).unwrap();
            prop_assert_eq!(parsed, locator);
        }
    }
}
