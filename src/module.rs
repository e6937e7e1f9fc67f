//! Module handles and the host-supplied lookup capability.
//!
//! This module defines the small vocabulary the notification policy speaks:
//! an opaque handle to an in-memory mapped binary image, the descriptor the
//! host's module registry hands back for a loaded extension, and the two
//! injected capabilities the process-scoped context resolves against.
//!
//! The library never loads or unloads anything itself. Handles pass through
//! it untouched: the loader owns their lifetime, the host registry owns any
//! caching of extension-module descriptors.
//!
//! # Key Components
//!
//! - [`ModuleHandle`] - Opaque reference to an in-memory mapped binary image
//! - [`ModuleDescriptor`] - What the host registry reports for a loaded library
//! - [`ModuleRegistry`] - The host-exported "find module by name" capability
//! - [`HostEnvironment`] - The process environment the context resolves against

use std::ffi::c_void;

/// Opaque reference to an in-memory mapped binary image.
///
/// The value is defined entirely by the loading environment; this library
/// only stores and returns it. A handle is never null: boundaries that can
/// observe a null native value express it as `Option<ModuleHandle>` instead.
///
/// Handles refer to process-wide state, not thread-affine state, so they can
/// be freely copied across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle(*mut c_void);

// Module handles are opaque process-wide identifiers; nothing about them is
// tied to the thread that produced them.
unsafe impl Send for ModuleHandle {}
unsafe impl Sync for ModuleHandle {}

impl ModuleHandle {
    /// Wraps a native handle value, rejecting null.
    #[must_use]
    pub fn from_raw(raw: *mut c_void) -> Option<Self> {
        if raw.is_null() {
            None
        } else {
            Some(ModuleHandle(raw))
        }
    }

    /// The underlying native handle value.
    #[must_use]
    pub fn as_raw(self) -> *mut c_void {
        self.0
    }
}

/// Descriptor for a loaded library, as reported by the host's module registry.
///
/// The registry may report arbitrarily rich state for a module; the
/// notification policy only ever extracts the underlying native handle.
pub trait ModuleDescriptor {
    /// Native handle of the mapped image this descriptor refers to.
    fn handle(&self) -> ModuleHandle;
}

/// The host-exported "find module by name" lookup capability.
///
/// The embedding host maintains its own registry of loaded native extension
/// modules and exports a single lookup entry point over it. This trait is the
/// in-process face of that export; the symbol-resolution step that produces an
/// implementation lives in the platform adapter, outside the portable core.
///
/// Implementations must be cheap and non-blocking: the hook calls `find` on
/// whichever thread the loader happens to be resolving imports on.
pub trait ModuleRegistry: Send + Sync {
    /// Looks up a loaded module by dependency name.
    ///
    /// Returns `None` when the registry knows no module under `name`; the
    /// caller then defers to the loader's default behavior.
    fn find(&self, name: &str) -> Option<Box<dyn ModuleDescriptor>>;
}

/// The process environment a [`HostContext`](crate::HostContext) resolves against.
///
/// Both operations are read-only views of stable process state, and both are
/// idempotent: calling either twice observes the same value. The context
/// relies on that to memoize each result exactly once for the process
/// lifetime.
///
/// The live implementation is the platform adapter; tests inject counting
/// fakes through this trait.
pub trait HostEnvironment: Send + Sync {
    /// Handle of the process's primary executable image.
    ///
    /// The operating environment defines this lookup to succeed for every
    /// live process, so the operation has no failure path. An environment
    /// that cannot produce a primary image is out of contract (see
    /// [`Error::HostImageUnresolvable`](crate::Error::HostImageUnresolvable)).
    fn primary_image(&self) -> ModuleHandle;

    /// Locates the host-exported lookup capability inside the host image.
    ///
    /// Returns `None` when the host image does not export the capability,
    /// which is a normal outcome: the host may simply not support dynamic
    /// extension-module registration. The result is memoized by the caller,
    /// so an absent capability is never probed for twice.
    fn module_registry(&self, host: ModuleHandle) -> Option<Box<dyn ModuleRegistry>>;
}
