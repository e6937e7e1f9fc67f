use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors can only arise at the edges of the system: validating the reserved host
/// identity literals, and probing the live process environment. The notification
/// path itself is infallible by contract: it answers the loader with either a
/// substitute module handle or an explicit decline, never an error.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::InvalidIdentity`] - A reserved host identity literal is degenerate
///
/// ## Environment Errors
/// - [`Error::HostImageUnresolvable`] - The process's primary executable image could not be resolved
///
/// # Examples
///
/// ```rust
/// use hostlink::{Error, HostIdentity};
///
/// match HostIdentity::new("acorn.exe", "acorn.dll", "") {
///     Ok(identity) => println!("identity: {:?}", identity),
///     Err(Error::InvalidIdentity(message)) => eprintln!("bad identity: {}", message),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A reserved host identity literal is degenerate.
    ///
    /// The host identity names and the extension-module suffix are fixed
    /// per-build literals. An empty literal would misclassify dependency
    /// names (an empty suffix matches every name), so construction rejects
    /// it up front rather than letting the hook silently answer for
    /// dependencies it has no business answering for.
    #[error("Invalid host identity - {0}")]
    InvalidIdentity(String),

    /// The process's primary executable image could not be resolved.
    ///
    /// The operating environment defines the primary-image lookup to succeed
    /// for every live process, so this error indicates an environment that
    /// has broken its own contract. There is no recovery path: the library
    /// never synthesizes a fallback handle for the host image.
    #[error("The primary executable image of the process could not be resolved")]
    HostImageUnresolvable,
}
