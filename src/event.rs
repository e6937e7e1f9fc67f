//! Delay-load notification event kinds.
//!
//! The loader's delay-load helper reports its progress through a small set of
//! numbered notifications, delivered to the same hook entry point. The hook
//! acts on exactly one of them, the pre-load attempt, where it may supply a
//! substitute module handle; every other kind is declined unconditionally.

use strum::{EnumCount, EnumIter, FromRepr};

/// Notification kinds delivered by the delay-load helper.
///
/// The numeric discriminants follow the loader ABI, so raw event words
/// arriving at the hook boundary convert directly via
/// [`NotifyEvent::from_raw`]. Failure kinds are part of the set because the
/// loader delivers them to the same hook; the policy answer for them is
/// always "no opinion".
///
/// # Examples
///
/// ```rust
/// use hostlink::NotifyEvent;
///
/// assert_eq!(NotifyEvent::from_raw(1), Some(NotifyEvent::PreLoadLibrary));
/// assert_eq!(NotifyEvent::from_raw(99), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr)]
#[repr(u32)]
pub enum NotifyEvent {
    /// The helper has started processing a delayed import.
    StartProcessing = 0,
    /// The helper is about to load the named library.
    ///
    /// The only kind the notification policy answers: returning a handle here
    /// substitutes it for the loader's own load attempt.
    PreLoadLibrary = 1,
    /// The helper is about to resolve a symbol inside the loaded library.
    PreGetProcAddress = 2,
    /// The helper failed to load the named library.
    FailLoadLibrary = 3,
    /// The helper failed to resolve a symbol inside the loaded library.
    FailGetProcAddress = 4,
    /// The helper has finished processing the delayed import.
    EndProcessing = 5,
}

impl NotifyEvent {
    /// Converts a raw event word from the hook boundary.
    ///
    /// Returns `None` for values outside the known notification set; callers
    /// treat that identically to any non-actionable event kind.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::from_repr(raw)
    }

    /// Whether this event kind may be answered with a substitute handle.
    #[must_use]
    pub fn is_actionable(self) -> bool {
        self == NotifyEvent::PreLoadLibrary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{EnumCount as _, IntoEnumIterator};

    #[test]
    fn test_from_raw_round_trips_known_events() {
        for event in NotifyEvent::iter() {
            assert_eq!(NotifyEvent::from_raw(event as u32), Some(event));
        }
    }

    #[test]
    fn test_from_raw_rejects_unknown_words() {
        assert_eq!(NotifyEvent::from_raw(NotifyEvent::COUNT as u32), None);
        assert_eq!(NotifyEvent::from_raw(u32::MAX), None);
    }

    #[test]
    fn test_only_pre_load_is_actionable() {
        let actionable: Vec<NotifyEvent> =
            NotifyEvent::iter().filter(|event| event.is_actionable()).collect();
        assert_eq!(actionable, vec![NotifyEvent::PreLoadLibrary]);
    }
}
