// [libs/core/cache/src/listener.rs]
/*!
 * APARATO: CACHE LISTENER REGISTRY
 * RESPONSABILIDAD: DIFUSION DE EVENTOS SIMBOLICOS A OBSERVADORES
 *
 * Listeners are boxed closures, invoked in registration order.
 * A listener is not expected to panic, but if one does, it is caught
 * and logged — a misbehaving observer must never stop the others
 * from hearing a `notify`.
 */

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::RwLock;
use tracing::error;
use wbe_domain_models::cache_event::CacheEvent;

pub type Listener = Box<dyn Fn(CacheEvent) + Send + Sync>;

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Listener) {
        self.listeners.write().expect("lock poisoned").push(listener);
    }

    pub fn notify(&self, event: CacheEvent) {
        let listeners = self.listeners.read().expect("lock poisoned");
        for listener in listeners.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if outcome.is_err() {
                error!("🔥 [CACHE_LISTENER]: listener panicked handling {:?}, isolated.", event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().expect("lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn delivers_events_in_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        let order_a = order.clone();
        registry.register(Box::new(move |_| order_a.lock().unwrap().push("a")));
        let order_b = order.clone();
        registry.register(Box::new(move |_| order_b.lock().unwrap().push("b")));

        registry.notify(CacheEvent::FullClear);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn a_panicking_listener_does_not_block_the_rest() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        registry.register(Box::new(|_| panic!("boom")));
        let calls_clone = calls.clone();
        registry.register(Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));

        registry.notify(CacheEvent::BalanceWritten);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
