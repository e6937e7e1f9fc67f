//! Dependency-name classification for delay-load interception.
//!
//! Every notification the loader delivers carries the textual name of the
//! dependency it is trying to resolve. This module decides, from that text
//! alone, how the notification should be answered: the name either denotes
//! the embedding host itself, denotes a native extension module, or is none
//! of this library's business.
//!
//! # Key Components
//!
//! - [`HostIdentity`] - The reserved names of the embedding host and the extension-module suffix
//! - [`Classification`] - The three-way outcome of classifying a dependency name
//! - [`eq_ignore_case`] / [`ends_with_ignore_case`] - The pure string predicates the classifier is built on
//!
//! # Naming Convention
//!
//! Dependency names recognized as the host identity are two fixed
//! case-insensitive literals: the host's canonical executable filename and its
//! canonical library filename. Extension modules are recognized by one fixed
//! case-insensitive filename suffix. Module names in the supported deployment
//! model are ASCII, and comparisons are ASCII case-insensitive.
//!
//! # Examples
//!
//! ```rust
//! use hostlink::{Classification, HostIdentity};
//!
//! let identity = HostIdentity::new("acorn.exe", "acorn.dll", ".acorn")?;
//!
//! assert_eq!(identity.classify("ACORN.EXE"), Classification::HostImage);
//! assert_eq!(identity.classify("tree-sitter.acorn"), Classification::ExtensionModule);
//! assert_eq!(identity.classify("kernel32.dll"), Classification::Unrecognized);
//! # Ok::<(), hostlink::Error>(())
//! ```

use crate::{Error, Result};

/// Outcome of classifying a dependency name.
///
/// Derived purely from the name's text; classification has no side effects
/// and consults no process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The name denotes the embedding host itself, by either of its two
    /// reserved filenames.
    HostImage,
    /// The name carries the reserved extension-module suffix.
    ExtensionModule,
    /// Any other name; the loader's default resolution applies.
    Unrecognized,
}

/// The reserved names identifying an embedding host runtime.
///
/// Extension modules declare an import dependency on the host by one of two
/// canonical filenames: the host's executable name (when the running process
/// *is* the host binary) or its library name (when some other process loaded
/// the host runtime dynamically). Either name must resolve to the same thing,
/// the image that actually carries the host's exports in this process.
///
/// The three literals are fixed for the lifetime of a build; there is no
/// runtime configuration surface beyond constructing this value.
///
/// # Examples
///
/// ```rust
/// use hostlink::HostIdentity;
///
/// let identity = HostIdentity::new("acorn.exe", "acorn.dll", ".acorn")?;
/// assert_eq!(identity.exe_name(), "acorn.exe");
/// # Ok::<(), hostlink::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    exe_name: &'static str,
    lib_name: &'static str,
    module_suffix: &'static str,
}

impl HostIdentity {
    /// Creates a host identity from the three reserved literals.
    ///
    /// # Arguments
    ///
    /// * `exe_name` - Canonical filename of the host executable (e.g. `"acorn.exe"`)
    /// * `lib_name` - Canonical filename of the host library (e.g. `"acorn.dll"`)
    /// * `module_suffix` - Filename suffix marking native extension modules (e.g. `".acorn"`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentity`] if any literal is empty. An empty
    /// suffix in particular would match every dependency name and turn the
    /// hook into an answer-for-everything trap.
    pub fn new(
        exe_name: &'static str,
        lib_name: &'static str,
        module_suffix: &'static str,
    ) -> Result<Self> {
        if exe_name.is_empty() || lib_name.is_empty() {
            return Err(Error::InvalidIdentity(
                "host identity names must be non-empty".to_string(),
            ));
        }

        if module_suffix.is_empty() {
            return Err(Error::InvalidIdentity(
                "extension-module suffix must be non-empty".to_string(),
            ));
        }

        Ok(HostIdentity {
            exe_name,
            lib_name,
            module_suffix,
        })
    }

    /// Classifies a dependency name against this identity.
    ///
    /// Equality against either reserved host filename wins over the suffix
    /// check, so a host library name that happens to end with the extension
    /// suffix still classifies as [`Classification::HostImage`].
    #[must_use]
    pub fn classify(&self, name: &str) -> Classification {
        if eq_ignore_case(name, self.exe_name) || eq_ignore_case(name, self.lib_name) {
            return Classification::HostImage;
        }

        if ends_with_ignore_case(name, self.module_suffix) {
            return Classification::ExtensionModule;
        }

        Classification::Unrecognized
    }

    /// Canonical filename of the host executable.
    #[must_use]
    pub fn exe_name(&self) -> &'static str {
        self.exe_name
    }

    /// Canonical filename of the host library.
    #[must_use]
    pub fn lib_name(&self) -> &'static str {
        self.lib_name
    }

    /// Filename suffix marking native extension modules.
    #[must_use]
    pub fn module_suffix(&self) -> &'static str {
        self.module_suffix
    }
}

/// ASCII case-insensitive string equality.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// ASCII case-insensitive suffix match.
///
/// Returns `false` whenever `suffix` is longer than `a`; otherwise compares
/// the trailing `suffix.len()` bytes of `a` against `suffix`. This is an
/// exact trailing match, not a contains check.
#[must_use]
pub fn ends_with_ignore_case(a: &str, suffix: &str) -> bool {
    let a = a.as_bytes();
    let suffix = suffix.as_bytes();

    if suffix.len() > a.len() {
        return false;
    }

    a[a.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> HostIdentity {
        HostIdentity::new("acorn.exe", "acorn.dll", ".acorn").unwrap()
    }

    #[test]
    fn test_eq_ignore_case_reflexive_and_case_insensitive() {
        for s in ["", "acorn.exe", "Acorn.Exe", "with space.dll"] {
            assert!(eq_ignore_case(s, s));
            assert!(eq_ignore_case(s, &s.to_ascii_uppercase()));
            assert!(eq_ignore_case(&s.to_ascii_uppercase(), s));
        }
    }

    #[test]
    fn test_eq_ignore_case_rejects_different_names() {
        assert!(!eq_ignore_case("acorn.exe", "acorn.dll"));
        assert!(!eq_ignore_case("acorn.exe", "acorn.exe2"));
    }

    #[test]
    fn test_ends_with_ignore_case_longer_suffix_is_false() {
        assert!(!ends_with_ignore_case("", ".acorn"));
        assert!(!ends_with_ignore_case("a", ".acorn"));
        assert!(!ends_with_ignore_case("corn", ".acorn"));
    }

    #[test]
    fn test_ends_with_ignore_case_exact_trailing_match() {
        assert!(ends_with_ignore_case("plugin.acorn", ".acorn"));
        assert!(ends_with_ignore_case("PLUGIN.ACORN", ".acorn"));
        assert!(ends_with_ignore_case(".acorn", ".acorn"));

        // suffix must be trailing, not merely contained
        assert!(!ends_with_ignore_case("plugin.acorn.dll", ".acorn"));
        assert!(!ends_with_ignore_case("plugin.acorns", ".acorn"));
    }

    #[test]
    fn test_classify_host_image_any_case() {
        let identity = identity();

        assert_eq!(identity.classify("acorn.exe"), Classification::HostImage);
        assert_eq!(identity.classify("ACORN.EXE"), Classification::HostImage);
        assert_eq!(identity.classify("Acorn.Dll"), Classification::HostImage);
    }

    #[test]
    fn test_classify_extension_module_suffix() {
        let identity = identity();

        assert_eq!(
            identity.classify("plugin.acorn"),
            Classification::ExtensionModule
        );
        assert_eq!(
            identity.classify("nested/path.ACORN"),
            Classification::ExtensionModule
        );
        assert_eq!(
            identity.classify("plugin.acorns"),
            Classification::Unrecognized
        );
    }

    #[test]
    fn test_classify_unrecognized() {
        let identity = identity();

        assert_eq!(
            identity.classify("unrelated.dll"),
            Classification::Unrecognized
        );
        assert_eq!(identity.classify(""), Classification::Unrecognized);
    }

    #[test]
    fn test_empty_literals_are_rejected() {
        assert!(HostIdentity::new("", "acorn.dll", ".acorn").is_err());
        assert!(HostIdentity::new("acorn.exe", "", ".acorn").is_err());
        assert!(HostIdentity::new("acorn.exe", "acorn.dll", "").is_err());
    }
}
