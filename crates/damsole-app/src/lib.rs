// Conversation orchestration: the controller, the one-time mount, and the
// event loop that connects them to the front end.

pub mod bootstrap;
pub mod conversation;

use tokio::sync::mpsc;
use tracing::{debug, info};

use damsole_core::protocol::UserCommand;

use bootstrap::MountedWidget;
use conversation::{Conversation, SendOutcome};

/// Run the conversation event loop.
///
/// Consumes `UserCommand`s from the front end and events from in-flight
/// requests until `Quit` arrives or the command channel closes. The mount
/// guard is released when the loop returns.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    widget: MountedWidget,
) -> anyhow::Result<()> {
    let MountedWidget {
        mut conversation,
        mut events,
        _guard,
    } = widget;

    info!("Conversation loop started");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut conversation, cmd).await,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            Some(event) = events.recv() => {
                conversation.handle_event(event).await;
            }
        }
    }

    info!("Conversation loop exiting");
    Ok(())
}

/// Handle a user command from the front end.
async fn handle_user_command(conversation: &mut Conversation, cmd: UserCommand) {
    match cmd {
        UserCommand::TogglePanel => conversation.toggle().await,
        UserCommand::OpenPanel => conversation.open().await,
        UserCommand::ClosePanel => conversation.close().await,
        UserCommand::Send(text) => {
            let outcome = conversation.send(&text).await;
            if outcome != SendOutcome::Dispatched {
                debug!(?outcome, "send not dispatched");
            }
        }
        UserCommand::PickSuggestion(text) => {
            let outcome = conversation.pick_suggestion(&text).await;
            if outcome != SendOutcome::Dispatched {
                debug!(?outcome, "suggestion not dispatched");
            }
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use damsole_core::config::WidgetConfig;
    use damsole_core::protocol::{Sender, UiUpdate};
    use damsole_transport::ChatTransport;
    use serde_json::json;

    use crate::bootstrap::{mount, tests::lock_mounts};
    use crate::conversation::tests::ScriptedTransport;

    /// Receive updates until one matches `pred`.
    async fn wait_for(
        ui_rx: &mut mpsc::Receiver<UiUpdate>,
        pred: impl Fn(&UiUpdate) -> bool,
    ) -> UiUpdate {
        loop {
            let update = ui_rx.recv().await.expect("ui channel open");
            if pred(&update) {
                return update;
            }
        }
    }

    #[tokio::test]
    async fn event_loop_handles_quit_command() {
        let _lock = lock_mounts();
        let transport: Arc<dyn ChatTransport> = Arc::new(ScriptedTransport::default());
        let (ui_tx, _ui_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let widget = mount(WidgetConfig::default(), transport, ui_tx).await.unwrap();
        let handle = tokio::spawn(run(cmd_rx, widget));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn event_loop_exits_when_command_channel_closes() {
        let _lock = lock_mounts();
        let transport: Arc<dyn ChatTransport> = Arc::new(ScriptedTransport::default());
        let (ui_tx, _ui_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let widget = mount(WidgetConfig::default(), transport, ui_tx).await.unwrap();
        let handle = tokio::spawn(run(cmd_rx, widget));

        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn open_then_send_round_trip() {
        let _lock = lock_mounts();
        let transport = Arc::new(ScriptedTransport::with_bodies(vec![
            json!({ "reply": "" }),
            json!({ "reply": "We build websites, apps and brands." }),
        ]));
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let widget = mount(
            WidgetConfig::default(),
            transport.clone() as Arc<dyn ChatTransport>,
            ui_tx,
        )
        .await
        .unwrap();
        let handle = tokio::spawn(run(cmd_rx, widget));

        cmd_tx.send(UserCommand::OpenPanel).await.unwrap();
        wait_for(&mut ui_rx, |u| *u == UiUpdate::PanelOpen(true)).await;
        wait_for(&mut ui_rx, |u| *u == UiUpdate::Busy(false)).await;

        cmd_tx
            .send(UserCommand::Send("What do you do?".into()))
            .await
            .unwrap();
        let reply = wait_for(&mut ui_rx, |u| {
            matches!(u, UiUpdate::MessageAppended { message, .. } if message.sender == Sender::Bot)
        })
        .await;
        match reply {
            UiUpdate::MessageAppended { index, message, .. } => {
                // greeting, user message, bot reply
                assert_eq!(index, 2);
                assert_eq!(message.text, "We build websites, apps and brands.");
            }
            other => panic!("unexpected update {other:?}"),
        }

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(
            transport.calls(),
            vec!["__damsole_auto_start__", "What do you do?"]
        );
    }

    #[tokio::test]
    async fn blank_send_command_produces_no_updates() {
        let _lock = lock_mounts();
        let transport = Arc::new(ScriptedTransport::default());
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let widget = mount(
            WidgetConfig::default(),
            transport.clone() as Arc<dyn ChatTransport>,
            ui_tx,
        )
        .await
        .unwrap();
        // Greeting
        assert!(matches!(ui_rx.recv().await, Some(UiUpdate::MessageAppended { .. })));

        let handle = tokio::spawn(run(cmd_rx, widget));
        cmd_tx.send(UserCommand::Send("   ".into())).await.unwrap();
        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();

        // The loop dropped its sender on exit, so the channel drains to None.
        assert!(ui_rx.recv().await.is_none());
        assert!(transport.calls().is_empty());
    }
}
