//! Process-scoped host context: the notification policy and its two caches.
//!
//! The [`HostContext`] is the one stateful object in this library. It owns the
//! reserved host identity, the injected [`HostEnvironment`], and two lazily
//! resolved, permanently memoized values: the handle of the process's primary
//! executable image, and the host-exported module-lookup capability (or the
//! fact that it is absent).
//!
//! # Lifecycle Invariant
//!
//! Both cached values are resolved at most once per context and never
//! invalidated or refreshed. This is deliberate: the host image is fixed for
//! the lifetime of the process in the supported deployment model, so the
//! cached values can never go stale. An environment in which the host image
//! changes identity mid-process is out of contract.
//!
//! # Thread Safety
//!
//! The loader may resolve imports on any thread in the process, so
//! [`HostContext::notify`] must be callable from all of them. Each cache slot
//! is an [`OnceLock`]: concurrent first calls race benignly (the underlying
//! lookups are idempotent reads of stable process state) and both callers
//! observe the single stored value before proceeding.

use std::sync::OnceLock;

use crate::{
    classify::{Classification, HostIdentity},
    event::NotifyEvent,
    module::{HostEnvironment, ModuleHandle, ModuleRegistry},
};

/// Process-scoped state behind the delay-load notification hook.
///
/// Create one context per process, bind it at process start (or lazily on the
/// first notification), and route every hook invocation through
/// [`HostContext::notify`].
///
/// # Examples
///
/// ```rust
/// use hostlink::{
///     HostContext, HostEnvironment, HostIdentity, ModuleHandle, ModuleRegistry, NotifyEvent,
/// };
///
/// struct FixedEnvironment(ModuleHandle);
///
/// impl HostEnvironment for FixedEnvironment {
///     fn primary_image(&self) -> ModuleHandle {
///         self.0
///     }
///
///     fn module_registry(&self, _host: ModuleHandle) -> Option<Box<dyn ModuleRegistry>> {
///         None
///     }
/// }
///
/// let image = ModuleHandle::from_raw(0x1000 as *mut _).unwrap();
/// let identity = HostIdentity::new("acorn.exe", "acorn.dll", ".acorn")?;
/// let context = HostContext::new(identity, FixedEnvironment(image));
///
/// // The host's own name resolves to the primary image, any case.
/// assert_eq!(context.notify(NotifyEvent::PreLoadLibrary, "ACORN.DLL"), Some(image));
///
/// // Unrecognized names are declined.
/// assert_eq!(context.notify(NotifyEvent::PreLoadLibrary, "kernel32.dll"), None);
/// # Ok::<(), hostlink::Error>(())
/// ```
pub struct HostContext {
    identity: HostIdentity,
    environment: Box<dyn HostEnvironment>,
    host_image: OnceLock<ModuleHandle>,
    registry: OnceLock<Option<Box<dyn ModuleRegistry>>>,
}

impl HostContext {
    /// Creates a context over the given identity and environment.
    ///
    /// Nothing is resolved here: both caches fill lazily, on the first
    /// notification that needs them.
    pub fn new(identity: HostIdentity, environment: impl HostEnvironment + 'static) -> Self {
        HostContext {
            identity,
            environment: Box::new(environment),
            host_image: OnceLock::new(),
            registry: OnceLock::new(),
        }
    }

    /// The reserved host identity this context classifies against.
    #[must_use]
    pub fn identity(&self) -> &HostIdentity {
        &self.identity
    }

    /// Handle of the process's primary executable image.
    ///
    /// The first call performs the environment lookup and stores the result;
    /// every later call, from any thread, returns the stored handle without
    /// repeating the lookup.
    pub fn host_image(&self) -> ModuleHandle {
        *self
            .host_image
            .get_or_init(|| self.environment.primary_image())
    }

    /// The memoized host lookup capability, probed at most once.
    ///
    /// An absent capability is memoized just like a present one: once the
    /// probe has reported `None`, no further probe is ever attempted. The
    /// host image is fixed for the process lifetime, so a capability that is
    /// absent now cannot appear later.
    fn registry(&self) -> Option<&dyn ModuleRegistry> {
        self.registry
            .get_or_init(|| self.environment.module_registry(self.host_image()))
            .as_deref()
    }

    /// The delay-load notification policy.
    ///
    /// Evaluates the policy for one loader notification and returns either a
    /// substitute module handle or `None` for "no opinion", in which case the
    /// loader proceeds with its default resolution (and its own error
    /// reporting, if that fails).
    ///
    /// Only [`NotifyEvent::PreLoadLibrary`] is acted upon:
    ///
    /// 1. A name matching the host identity yields the primary image handle.
    /// 2. A name carrying the extension-module suffix is looked up through
    ///    the host registry; an absent capability or a miss declines.
    /// 3. Anything else declines without touching either cache.
    ///
    /// This method never blocks, performs no I/O, and never panics; every
    /// outcome is a handle or an explicit decline.
    pub fn notify(&self, event: NotifyEvent, dependency: &str) -> Option<ModuleHandle> {
        if !event.is_actionable() {
            return None;
        }

        match self.identity.classify(dependency) {
            Classification::HostImage => Some(self.host_image()),
            Classification::ExtensionModule => {
                let descriptor = self.registry()?.find(dependency)?;
                Some(descriptor.handle())
            }
            Classification::Unrecognized => None,
        }
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("identity", &self.identity)
            .field("host_image", &self.host_image.get())
            .field("registry_probed", &self.registry.get().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleDescriptor;
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use strum::IntoEnumIterator;

    fn handle(raw: usize) -> ModuleHandle {
        ModuleHandle::from_raw(raw as *mut c_void).unwrap()
    }

    fn identity() -> HostIdentity {
        HostIdentity::new("acorn.exe", "acorn.dll", ".acorn").unwrap()
    }

    struct FixedDescriptor(ModuleHandle);

    impl ModuleDescriptor for FixedDescriptor {
        fn handle(&self) -> ModuleHandle {
            self.0
        }
    }

    struct SingleModuleRegistry {
        name: &'static str,
        module: ModuleHandle,
        finds: Arc<AtomicUsize>,
    }

    impl ModuleRegistry for SingleModuleRegistry {
        fn find(&self, name: &str) -> Option<Box<dyn ModuleDescriptor>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            if name == self.name {
                Some(Box::new(FixedDescriptor(self.module)))
            } else {
                None
            }
        }
    }

    /// Fake environment that counts every underlying lookup, so the tests can
    /// observe the at-most-once cache discipline.
    struct CountingEnvironment {
        image: ModuleHandle,
        registered: Option<(&'static str, ModuleHandle)>,
        image_lookups: Arc<AtomicUsize>,
        registry_probes: Arc<AtomicUsize>,
        finds: Arc<AtomicUsize>,
    }

    impl CountingEnvironment {
        fn new(registered: Option<(&'static str, ModuleHandle)>) -> Self {
            CountingEnvironment {
                image: handle(0x4000_0000),
                registered,
                image_lookups: Arc::new(AtomicUsize::new(0)),
                registry_probes: Arc::new(AtomicUsize::new(0)),
                finds: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            (
                Arc::clone(&self.image_lookups),
                Arc::clone(&self.registry_probes),
                Arc::clone(&self.finds),
            )
        }
    }

    impl HostEnvironment for CountingEnvironment {
        fn primary_image(&self) -> ModuleHandle {
            self.image_lookups.fetch_add(1, Ordering::SeqCst);
            self.image
        }

        fn module_registry(&self, _host: ModuleHandle) -> Option<Box<dyn ModuleRegistry>> {
            self.registry_probes.fetch_add(1, Ordering::SeqCst);
            self.registered.map(|(name, module)| {
                Box::new(SingleModuleRegistry {
                    name,
                    module,
                    finds: Arc::clone(&self.finds),
                }) as Box<dyn ModuleRegistry>
            })
        }
    }

    #[test]
    fn test_host_image_resolved_exactly_once() {
        let environment = CountingEnvironment::new(None);
        let (image_lookups, _, _) = environment.counters();
        let context = HostContext::new(identity(), environment);

        let first = context.host_image();
        let second = context.host_image();

        assert_eq!(first, second);
        assert_eq!(image_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_host_name_notifications_share_the_cached_image() {
        let environment = CountingEnvironment::new(None);
        let (image_lookups, _, _) = environment.counters();
        let context = HostContext::new(identity(), environment);

        let via_exe = context.notify(NotifyEvent::PreLoadLibrary, "ACORN.EXE");
        let via_dll = context.notify(NotifyEvent::PreLoadLibrary, "acorn.dll");

        assert_eq!(via_exe, via_dll);
        assert!(via_exe.is_some());
        assert_eq!(image_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_absent_registry_is_probed_exactly_once() {
        let environment = CountingEnvironment::new(None);
        let (_, registry_probes, _) = environment.counters();
        let context = HostContext::new(identity(), environment);

        for _ in 0..3 {
            assert_eq!(context.notify(NotifyEvent::PreLoadLibrary, "plugin.acorn"), None);
        }

        assert_eq!(registry_probes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_extension_module_resolves_through_registry() {
        let module = handle(0x5000_0000);
        let environment = CountingEnvironment::new(Some(("plugin.acorn", module)));
        let (_, registry_probes, finds) = environment.counters();
        let context = HostContext::new(identity(), environment);

        assert_eq!(
            context.notify(NotifyEvent::PreLoadLibrary, "plugin.acorn"),
            Some(module)
        );
        assert_eq!(context.notify(NotifyEvent::PreLoadLibrary, "other.acorn"), None);

        // One probe for the capability, one find per notification.
        assert_eq!(registry_probes.load(Ordering::SeqCst), 1);
        assert_eq!(finds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unrecognized_name_touches_neither_cache() {
        let environment = CountingEnvironment::new(None);
        let (image_lookups, registry_probes, _) = environment.counters();
        let context = HostContext::new(identity(), environment);

        assert_eq!(context.notify(NotifyEvent::PreLoadLibrary, "unrelated.dll"), None);

        assert_eq!(image_lookups.load(Ordering::SeqCst), 0);
        assert_eq!(registry_probes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_non_pre_load_events_decline_unconditionally() {
        let environment = CountingEnvironment::new(None);
        let (image_lookups, registry_probes, _) = environment.counters();
        let context = HostContext::new(identity(), environment);

        for event in NotifyEvent::iter().filter(|event| !event.is_actionable()) {
            assert_eq!(context.notify(event, "acorn.exe"), None);
            assert_eq!(context.notify(event, "plugin.acorn"), None);
        }

        assert_eq!(image_lookups.load(Ordering::SeqCst), 0);
        assert_eq!(registry_probes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_first_use_observes_one_resolution() {
        let environment = CountingEnvironment::new(None);
        let (image_lookups, _, _) = environment.counters();
        let context = Arc::new(HostContext::new(identity(), environment));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let context = Arc::clone(&context);
                std::thread::spawn(move || context.host_image())
            })
            .collect();

        let resolved: Vec<ModuleHandle> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(resolved.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(image_lookups.load(Ordering::SeqCst), 1);
    }
}
