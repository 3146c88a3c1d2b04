// Widget bootstrap: mounts the conversation exactly once per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use damsole_core::config::WidgetConfig;
use damsole_core::protocol::UiUpdate;
use damsole_transport::ChatTransport;

use crate::conversation::{Conversation, ConversationEvent};

static MOUNTED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MountError {
    #[error("chat widget is already mounted")]
    AlreadyMounted,
}

/// Marks the widget as mounted until dropped.
#[derive(Debug)]
pub struct MountGuard {
    _private: (),
}

impl MountGuard {
    fn acquire() -> Result<Self, MountError> {
        MOUNTED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| MountGuard { _private: () })
            .map_err(|_| MountError::AlreadyMounted)
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        MOUNTED.store(false, Ordering::Release);
    }
}

/// A mounted widget: the controller, the receiver its request tasks report
/// to, and the guard that keeps a second mount out.
pub struct MountedWidget {
    pub conversation: Conversation,
    pub events: mpsc::UnboundedReceiver<ConversationEvent>,
    pub(crate) _guard: MountGuard,
}

/// Mount the widget and render its greeting.
///
/// Fails with `AlreadyMounted` while another `MountedWidget` is alive.
pub async fn mount(
    config: WidgetConfig,
    transport: Arc<dyn ChatTransport>,
    ui_tx: mpsc::Sender<UiUpdate>,
) -> Result<MountedWidget, MountError> {
    let guard = MountGuard::acquire()?;

    let (mut conversation, events) = Conversation::new(config, transport, ui_tx);
    conversation.greet().await;
    info!(endpoint = %conversation.config().endpoint, "chat widget mounted");

    Ok(MountedWidget {
        conversation,
        events,
        _guard: guard,
    })
}
