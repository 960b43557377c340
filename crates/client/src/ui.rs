//! Dioxus bridge: mirrors engine snapshots into a global signal so
//! components re-render when notifications change.

use dioxus::prelude::*;

use crate::sync::{SyncHandle, SyncSnapshot};

/// Latest snapshot from the engine mounted by [`NotificationsProvider`].
pub static NOTIFICATIONS: GlobalSignal<Option<SyncSnapshot>> = Signal::global(|| None);

/// Context provided to the app
#[derive(Clone, Debug, PartialEq)]
pub struct SyncContext {
    pub handle: SyncHandle,
}

/// Provider component that exposes `handle` to its children and keeps
/// [`NOTIFICATIONS`] current.
#[component]
pub fn NotificationsProvider(handle: SyncHandle, children: Element) -> Element {
    let context = use_context_provider(|| SyncContext {
        handle: handle.clone(),
    });

    use_hook(|| {
        let mut rx = context.handle.subscribe();
        spawn(async move {
            let initial = rx.borrow_and_update().clone();
            *NOTIFICATIONS.write() = Some(initial);
            while rx.changed().await.is_ok() {
                let snapshot = rx.borrow_and_update().clone();
                *NOTIFICATIONS.write() = Some(snapshot);
            }
            tracing::debug!("sync engine stopped; snapshot stream ended");
        });
    });

    rsx! {
        {children}
    }
}

/// Current snapshot, or `None` before the provider has mounted.
pub fn use_notifications() -> Option<SyncSnapshot> {
    NOTIFICATIONS.read().clone()
}

/// Handle to the engine for dispatching user intents from event handlers.
pub fn use_sync_handle() -> SyncHandle {
    use_context::<SyncContext>().handle
}
