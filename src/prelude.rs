//! # hostlink Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits from the hostlink library. Import this module to get quick
//! access to everything needed to wire a notification hook or test against a
//! fake environment.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all hostlink operations
pub use crate::Error;

/// The result type used throughout hostlink
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The process-scoped context behind the notification hook
pub use crate::context::HostContext;

/// The reserved host identity literals and name classification
pub use crate::classify::{Classification, HostIdentity};

// ================================================================================================
// Notification Vocabulary
// ================================================================================================

/// Delay-load notification event kinds
pub use crate::event::NotifyEvent;

/// Module handles and the injected environment/registry capabilities
pub use crate::module::{HostEnvironment, ModuleDescriptor, ModuleHandle, ModuleRegistry};

// ================================================================================================
// Platform Adapter (Windows)
// ================================================================================================

/// The live process environment and the raw hook vocabulary
#[cfg(windows)]
pub use crate::win32::{RawNotifyHook, Win32Environment, CAPABILITY_SYMBOL};
