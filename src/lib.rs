// Copyright 2026 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'win32/mod.rs' talks to the loader ABI: raw notification structures, a
//   transmute from the generic export address to the capability signature,
//   and the hook statics the delay-load helper discovers by name
// - 'module.rs' marks ModuleHandle Send + Sync (handles are process-wide)

//! # hostlink
//!
//! [![Crates.io](https://img.shields.io/crates/v/hostlink.svg)](https://crates.io/crates/hostlink)
//! [![Documentation](https://docs.rs/hostlink/badge.svg)](https://docs.rs/hostlink)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/hostlink/blob/main/LICENSE-APACHE)
//!
//! Delay-load interception for native extension modules that bind against an
//! embedding host runtime instead of a conventional DLL.
//!
//! A native extension module declares a link-time import on the *host
//! process* (the runtime that embeds it), not on a library that exists as a
//! file on disk. The dynamic loader, left to its own devices, would go
//! looking for that file and fail. `hostlink` supplies the delay-load
//! notification hook that intercepts resolution first and answers from
//! process state instead:
//!
//! - a dependency on the **host itself** (by its canonical executable or
//!   library filename, in any letter case) resolves to the process's primary
//!   executable image, whichever binary that actually is, so extension
//!   modules load correctly both inside the canonical host binary and inside
//!   any process that pulled the host runtime in as a library;
//! - a dependency carrying the reserved **extension-module suffix** resolves
//!   through a lookup capability the host exports over its own registry of
//!   loaded modules;
//! - anything else is declined, leaving the loader's default search and
//!   error reporting untouched.
//!
//! ## Features
//!
//! - **🪝 Notification-hook policy** - One entry point for the loader's pre-load and failure notifications
//! - **📌 Process-wide memoization** - The host image handle and the lookup capability each resolve at most once
//! - **🧪 Injectable environment** - The process lookups sit behind a trait, so the whole policy tests without a loader
//! - **🛡️ Never raises into the loader** - Every outcome is a substitute handle or an explicit decline
//! - **🔧 Portable core** - Only the thin adapter under [`win32`] is platform-gated
//!
//! ## Quick Start
//!
//! In a binary (or extension module) whose delayed imports should resolve
//! against an embedding host runtime:
//!
//! ```rust,ignore
//! hostlink::delay_load_hooks!("acorn.exe", "acorn.dll", ".acorn");
//! ```
//!
//! That is the entire integration surface: the macro exports the hook
//! statics the delay-load helper discovers by name, and the first
//! notification lazily builds the process-wide [`HostContext`].
//!
//! ## Using the Core Directly
//!
//! The policy itself is plain Rust over an injected environment and runs on
//! any platform, which is how the test suite exercises it:
//!
//! ```rust
//! use hostlink::{
//!     HostContext, HostEnvironment, HostIdentity, ModuleHandle, ModuleRegistry, NotifyEvent,
//! };
//!
//! struct FixedEnvironment(ModuleHandle);
//!
//! impl HostEnvironment for FixedEnvironment {
//!     fn primary_image(&self) -> ModuleHandle {
//!         self.0
//!     }
//!
//!     fn module_registry(&self, _host: ModuleHandle) -> Option<Box<dyn ModuleRegistry>> {
//!         None
//!     }
//! }
//!
//! let image = ModuleHandle::from_raw(0x1000 as *mut _).unwrap();
//! let identity = HostIdentity::new("acorn.exe", "acorn.dll", ".acorn")?;
//! let context = HostContext::new(identity, FixedEnvironment(image));
//!
//! assert_eq!(context.notify(NotifyEvent::PreLoadLibrary, "Acorn.Exe"), Some(image));
//! assert_eq!(context.notify(NotifyEvent::FailLoadLibrary, "Acorn.Exe"), None);
//! # Ok::<(), hostlink::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `hostlink` is one component with a handful of pure helpers around it:
//!
//! - [`classify`] - Dependency-name classification against the reserved host identity
//! - [`event`] - The delay-load notification event kinds
//! - [`module`] - Module handles and the injected environment/registry capabilities
//! - [`context`] - The process-scoped [`HostContext`]: notification policy plus the two caches
//! - [`win32`] - The loader ABI adapter and hook export macro (Windows only)
//! - [`prelude`] - Convenient re-exports of the commonly used types
//!
//! Data flows one direction: loader → hook → (host image cache | lookup
//! capability) → classified outcome → back to the loader. There is no
//! reverse channel, and no state beyond the two memoized values.
//!
//! ## Error Handling
//!
//! The notification path never returns an error; the loader has no use for
//! one. [`Error`] exists for the edges: validating the reserved identity
//! literals and probing the live environment at adapter construction.
//!
//! ## Thread Safety
//!
//! Import resolution can happen on any thread that triggers a load, so
//! [`HostContext::notify`] is callable from all of them. The two cached
//! values are each guarded by an exactly-once initializer; concurrent first
//! uses race benignly and observe a single stored result. Cached values are
//! never invalidated: the host image is assumed fixed for the process
//! lifetime, and an environment that reloads it mid-process is out of
//! contract.

pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use hostlink::prelude::*;
///
/// let identity = HostIdentity::new("acorn.exe", "acorn.dll", ".acorn")?;
/// assert_eq!(identity.classify("plugin.acorn"), Classification::ExtensionModule);
/// # Ok::<(), hostlink::Error>(())
/// ```
pub mod prelude;

/// Dependency-name classification against the reserved host identity.
///
/// Pure string policy: [`HostIdentity`] holds the reserved literals,
/// [`Classification`] is the three-way outcome, and the case-insensitive
/// predicates underneath are exposed for reuse.
pub mod classify;

/// The process-scoped [`HostContext`]: the notification policy and its two caches.
pub mod context;

/// Delay-load notification event kinds, numbered per the loader ABI.
pub mod event;

/// Module handles and the injected environment/registry capabilities.
pub mod module;

/// The Win32 delay-load helper ABI, the live process adapter, and the hook
/// export macro.
///
/// Only this module touches the operating system; everything above it is
/// portable and tests against fakes.
#[cfg(windows)]
pub mod win32;

/// `hostlink` Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// `hostlink` Error type.
///
/// Only the edges of the system can fail: identity validation and live
/// environment probing. See [`Error`] for the variants.
pub use error::Error;

/// The process-scoped state behind the notification hook.
///
/// See [`context::HostContext`] for the policy and cache discipline.
pub use context::HostContext;

/// The reserved host identity and the classification it induces.
pub use classify::{Classification, HostIdentity};

/// The delay-load notification event kinds.
pub use event::NotifyEvent;

/// Module handles and the injected capabilities.
pub use module::{HostEnvironment, ModuleDescriptor, ModuleHandle, ModuleRegistry};
