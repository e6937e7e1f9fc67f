//! Win32 delay-load helper ABI and the live process adapter.
//!
//! Everything in this module sits at the system boundary: the raw structures
//! the MSVC delay-load helper passes to its notification hooks, the
//! [`Win32Environment`] that resolves the portable core's two environment
//! lookups against the live process, and the [`delay_load_hooks!`](crate::delay_load_hooks)
//! macro that exports the hook entry points the helper discovers by name.
//!
//! The portable policy never touches any of this; it sees only
//! [`NotifyEvent`](crate::NotifyEvent) values and `&str` dependency names.
//! Conversion from the raw ABI happens in [`dispatch`], and every conversion
//! failure (unknown event word, null info pointer, non-UTF8 name) is folded
//! into the same answer the policy gives for anything it has no opinion on: a
//! null result, letting the loader proceed.
//!
//! # Key Components
//!
//! - [`DelayLoadInfo`] / [`ImageDelayDescriptor`] / [`DelayLoadProc`] - Raw helper ABI structures
//! - [`Win32Environment`] - [`HostEnvironment`] backed by `GetModuleHandleW` / `GetProcAddress`
//! - [`CAPABILITY_SYMBOL`] - Export name of the host's module-lookup capability
//! - [`dispatch`] - Raw notification to portable policy conversion
//!
//! # The Capability Export
//!
//! A host runtime that supports dynamically registered extension modules
//! exports one C function under [`CAPABILITY_SYMBOL`]:
//!
//! ```c
//! hostlink_lib_t *hostlink_module_find(const char *name);
//! ```
//!
//! where the returned record's leading field is the module's native handle,
//! or NULL when no module is registered under `name`. The adapter resolves
//! this export at most once per process; a host that does not export it is
//! simply a host without dynamic registration, and every extension-module
//! notification is declined.

use std::ffi::{c_char, c_void, CString};
use std::mem;
use std::ptr;

use bitflags::bitflags;
use windows_sys::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};

use crate::{
    module::{HostEnvironment, ModuleDescriptor, ModuleHandle, ModuleRegistry},
    Error, HostContext, NotifyEvent, Result,
};

/// Export name of the host's module-lookup capability.
///
/// Fixed and well-known: the build machinery for extension modules and the
/// host runtime agree on this name out of band.
pub const CAPABILITY_SYMBOL: &str = "hostlink_module_find";

/// Nul-terminated form of [`CAPABILITY_SYMBOL`] for the `GetProcAddress` call.
const CAPABILITY_SYMBOL_NUL: &[u8] = b"hostlink_module_find\0";

/// Signature of the exported capability.
///
/// The returned pointer is owned by the host registry; the hook only reads
/// the leading handle field out of it.
pub type RawModuleFindFn = unsafe extern "C" fn(name: *const c_char) -> *mut RawLibraryDescriptor;

/// Signature of the delay-load helper's notification hooks.
///
/// The helper treats the return value as a `FARPROC`; for the pre-load
/// notification it is reinterpreted as the substitute `HMODULE`, and a null
/// return means "no opinion".
pub type RawNotifyHook =
    unsafe extern "system" fn(event: u32, info: *const DelayLoadInfo) -> *mut c_void;

bitflags! {
    /// Attribute word of a delay-load descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DelayDescriptorAttrs: u32 {
        /// Descriptor fields hold RVAs rather than virtual addresses.
        ///
        /// Set by all modern linkers; the legacy virtual-address form only
        /// appears in images produced by pre-VC7 toolchains.
        const RVA_FIELDS = 0x0000_0001;
    }
}

/// Delay-load descriptor emitted by the linker for one delayed DLL.
///
/// All fields after the attribute word are RVAs relative to the image base
/// when [`DelayDescriptorAttrs::RVA_FIELDS`] is set.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ImageDelayDescriptor {
    /// Raw attribute word; see [`ImageDelayDescriptor::attrs`].
    pub attributes: u32,
    /// RVA of the name of the delayed DLL.
    pub rva_dll_name: u32,
    /// RVA of the module handle slot the helper fills on first load.
    pub rva_module_handle: u32,
    /// RVA of the delay-load import address table.
    pub rva_iat: u32,
    /// RVA of the delay-load import name table.
    pub rva_int: u32,
    /// RVA of the optional bound IAT.
    pub rva_bound_iat: u32,
    /// RVA of the optional unload copy of the IAT.
    pub rva_unload_iat: u32,
    /// Timestamp of the bound DLL, zero when unbound.
    pub timestamp: u32,
}

impl ImageDelayDescriptor {
    /// The attribute word as typed flags.
    #[must_use]
    pub fn attrs(&self) -> DelayDescriptorAttrs {
        DelayDescriptorAttrs::from_bits_retain(self.attributes)
    }
}

/// Name-or-ordinal payload of [`DelayLoadProc`].
#[repr(C)]
pub union DelayLoadProcName {
    /// Symbol name, valid when the import is by name.
    pub name: *const c_char,
    /// Symbol ordinal, valid when the import is by ordinal.
    pub ordinal: u32,
}

/// The symbol being resolved, for symbol-level notifications.
///
/// Only populated for the `PreGetProcAddress` and `FailGetProcAddress`
/// notifications; the pre-load policy never reads it.
#[repr(C)]
pub struct DelayLoadProc {
    /// Non-zero when the import is by name rather than by ordinal.
    pub import_by_name: i32,
    /// The name or ordinal, discriminated by `import_by_name`.
    pub name_or_ordinal: DelayLoadProcName,
}

/// Notification payload the delay-load helper passes to its hooks.
#[repr(C)]
pub struct DelayLoadInfo {
    /// Size of this structure, in bytes.
    pub size: u32,
    /// The delay-load descriptor of the import being processed.
    pub descriptor: *const ImageDelayDescriptor,
    /// Address of the IAT slot being resolved.
    pub address_slot: *mut *mut c_void,
    /// Name of the dependency being resolved, as a nul-terminated ANSI string.
    pub dll_name: *const c_char,
    /// The symbol being resolved, for symbol-level notifications.
    pub symbol: DelayLoadProc,
    /// Module handle of the dependency, once the helper has one.
    pub loaded_module: *mut c_void,
    /// Resolved symbol address, once the helper has one.
    pub resolved_address: *mut c_void,
    /// Last error value, populated for failure notifications.
    pub last_error: u32,
}

/// [`HostEnvironment`] backed by the live Win32 process.
///
/// The primary image is resolved once at construction, which is also where
/// the one environment fault this library recognizes surfaces as an error
/// instead of deep inside a loader callback.
#[derive(Debug, Clone, Copy)]
pub struct Win32Environment {
    host: ModuleHandle,
}

impl Win32Environment {
    /// Resolves the environment of the current process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostImageUnresolvable`] if the process reports no
    /// primary executable image. A live process always has one, so this
    /// only fires in an environment that has broken its own contract; there
    /// is no fallback handle to synthesize.
    pub fn current_process() -> Result<Self> {
        // SAFETY: a null module name queries the calling process's own image;
        // no pointers are read.
        let raw = unsafe { GetModuleHandleW(ptr::null()) };

        let host = ModuleHandle::from_raw(raw).ok_or(Error::HostImageUnresolvable)?;
        Ok(Win32Environment { host })
    }
}

impl HostEnvironment for Win32Environment {
    fn primary_image(&self) -> ModuleHandle {
        self.host
    }

    fn module_registry(&self, host: ModuleHandle) -> Option<Box<dyn ModuleRegistry>> {
        // SAFETY: `host` is a live module handle and the symbol name is
        // nul-terminated.
        let address = unsafe { GetProcAddress(host.as_raw(), CAPABILITY_SYMBOL_NUL.as_ptr()) }?;

        // SAFETY: the export contract fixes the capability's signature; the
        // generic FARPROC type is only a transport.
        let find = unsafe {
            mem::transmute::<unsafe extern "system" fn() -> isize, RawModuleFindFn>(address)
        };

        Some(Box::new(ExportedRegistry { find }))
    }
}

/// Leading layout of the record returned by the capability export.
///
/// The host's record may carry further fields after the handle; the hook
/// never looks past the first one.
#[repr(C)]
pub struct RawLibraryDescriptor {
    /// Native handle of the mapped library.
    pub handle: *mut c_void,
}

/// [`ModuleRegistry`] over the capability function resolved from the host image.
struct ExportedRegistry {
    find: RawModuleFindFn,
}

impl ModuleRegistry for ExportedRegistry {
    fn find(&self, name: &str) -> Option<Box<dyn ModuleDescriptor>> {
        // A dependency name with an interior nul cannot name a module; the
        // loader could never have produced it, so decline.
        let name = CString::new(name).ok()?;

        // SAFETY: `name` stays alive across the call and the capability
        // signature is fixed by the export contract.
        let record = unsafe { (self.find)(name.as_ptr()) };
        if record.is_null() {
            return None;
        }

        // SAFETY: a non-null record points at a live library record owned by
        // the host registry.
        let handle = ModuleHandle::from_raw(unsafe { (*record).handle })?;
        Some(Box::new(ExportedDescriptor { handle }))
    }
}

struct ExportedDescriptor {
    handle: ModuleHandle,
}

impl ModuleDescriptor for ExportedDescriptor {
    fn handle(&self) -> ModuleHandle {
        self.handle
    }
}

/// Converts a raw helper notification into the portable policy call.
///
/// Returns the value the hook hands back to the helper: a substitute module
/// handle for an answered pre-load notification, or null for "no opinion".
/// Unknown event words, a null `info`, a null dependency-name pointer, and
/// non-UTF8 names all decline rather than error; the loader owns the
/// user-visible failure channel.
///
/// # Safety
///
/// `info`, when non-null, must point to a `DelayLoadInfo` that is live for
/// the duration of the call, with `dll_name` either null or nul-terminated.
/// Both hold for every notification the delay-load helper delivers.
pub unsafe fn dispatch(context: &HostContext, event: u32, info: *const DelayLoadInfo) -> *mut c_void {
    let Some(event) = NotifyEvent::from_raw(event) else {
        return ptr::null_mut();
    };

    if info.is_null() {
        return ptr::null_mut();
    }

    let name = (*info).dll_name;
    if name.is_null() {
        return ptr::null_mut();
    }

    let Ok(name) = std::ffi::CStr::from_ptr(name).to_str() else {
        return ptr::null_mut();
    };

    match context.notify(event, name) {
        Some(handle) => handle.as_raw(),
        None => ptr::null_mut(),
    }
}

/// Exports the delay-load hook entry points for the current binary.
///
/// Expands to the two hook statics the delay-load helper discovers by name
/// (`__pfnDliNotifyHook2` and `__pfnDliFailureHook2`), both bound to one
/// entry point that lazily builds a process-wide [`HostContext`] over
/// [`Win32Environment`](crate::win32::Win32Environment) and the given
/// identity literals, then routes every notification through it.
///
/// Invoke it exactly once, at the crate root of the binary (or extension
/// module) being linked with delay-loaded imports:
///
/// ```rust,ignore
/// hostlink::delay_load_hooks!("acorn.exe", "acorn.dll", ".acorn");
/// ```
///
/// The identity literals are build constants; if they are degenerate (empty),
/// or the process has no resolvable primary image, the first notification
/// aborts the process. Inside the loader there is no error channel, and
/// neither condition can occur in a correctly built, in-contract deployment.
#[macro_export]
macro_rules! delay_load_hooks {
    ($exe_name:expr, $lib_name:expr, $module_suffix:expr $(,)?) => {
        mod __hostlink_delay_load {
            static CONTEXT: ::std::sync::OnceLock<$crate::HostContext> =
                ::std::sync::OnceLock::new();

            unsafe extern "system" fn hook(
                event: u32,
                info: *const $crate::win32::DelayLoadInfo,
            ) -> *mut ::core::ffi::c_void {
                let context = CONTEXT.get_or_init(|| {
                    let identity =
                        match $crate::HostIdentity::new($exe_name, $lib_name, $module_suffix) {
                            ::core::result::Result::Ok(identity) => identity,
                            ::core::result::Result::Err(_) => ::std::process::abort(),
                        };

                    let environment = match $crate::win32::Win32Environment::current_process() {
                        ::core::result::Result::Ok(environment) => environment,
                        ::core::result::Result::Err(_) => ::std::process::abort(),
                    };

                    $crate::HostContext::new(identity, environment)
                });

                $crate::win32::dispatch(context, event, info)
            }

            #[allow(non_upper_case_globals)]
            #[no_mangle]
            pub static __pfnDliNotifyHook2: $crate::win32::RawNotifyHook = hook;

            #[allow(non_upper_case_globals)]
            #[no_mangle]
            pub static __pfnDliFailureHook2: $crate::win32::RawNotifyHook = hook;
        }
    };
}
