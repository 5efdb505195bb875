//! Ordered, concurrently mutable plugin collection.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Plugin;

/// Opaque handle returned by [`PluginRegistry::add`], used to remove the
/// plugin again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PluginHandle(u64);

/// Plugins in insertion order.
///
/// Registries may be mutated from any thread while events are being
/// dispatched. Dispatch iterates over a snapshot taken under the lock and
/// invokes callbacks with the lock released, so a callback may itself add or
/// remove plugins. The consequence is that a plugin removed while a dispatch
/// is iterating may still receive that one dispatch.
#[derive(Default)]
pub struct PluginRegistry {
    next_id: AtomicU64,
    plugins: Mutex<Vec<(PluginHandle, Arc<dyn Plugin>)>>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin; it sees every event dispatched after this returns.
    pub fn add(&self, plugin: Arc<dyn Plugin>) -> PluginHandle {
        let handle = PluginHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.plugins.lock().push((handle, plugin));
        handle
    }

    /// Remove a plugin. Returns false if the handle was not registered.
    pub fn remove(&self, handle: PluginHandle) -> bool {
        let mut plugins = self.plugins.lock();
        match plugins.iter().position(|(h, _)| *h == handle) {
            Some(index) => {
                plugins.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invoke `f` on every plugin, in insertion order.
    pub fn for_each(&self, mut f: impl FnMut(&dyn Plugin)) {
        for plugin in self.snapshot() {
            f(plugin.as_ref());
        }
    }

    /// Clone out the current plugin list.
    pub fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins
            .lock()
            .iter()
            .map(|(_, plugin)| Arc::clone(plugin))
            .collect()
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.lock().len()
    }

    /// True when no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.lock().is_empty()
    }
}
