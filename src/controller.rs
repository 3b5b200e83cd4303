use crate::audio::{ChannelTable, route};
use crate::net_link::{NetCommand, NetEvent};
use crate::protocol::ServerMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Streaming,
    NetworkError,
}

/// Maps session events onto the channel table.
///
/// Voice bursts go straight into ingest; signaling messages drive the
/// claim/release side. This is the only place that calls the table's control
/// operations, so slot bindings always change from one task.
pub struct Controller {
    state: SessionState,
    current_session_id: Option<String>,
    table: Arc<ChannelTable>,
    net_tx: mpsc::Sender<NetCommand>,
}

impl Controller {
    pub fn new(table: Arc<ChannelTable>, net_tx: mpsc::Sender<NetCommand>) -> Self {
        Self {
            state: SessionState::Idle,
            current_session_id: None,
            table,
            net_tx,
        }
    }

    pub async fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Text(text) => self.process_server_text(text).await,
            NetEvent::Voice(frame) => {
                if self.state != SessionState::Streaming {
                    self.state = SessionState::Streaming;
                    log::info!("Voice stream started");
                }
                route::ingest(&self.table, frame.user, &frame.pcm);
            }
            NetEvent::Connected => {
                log::info!("Session link connected");
                self.state = SessionState::Idle;
            }
            NetEvent::Disconnected => {
                log::info!("Session link disconnected, releasing all channels");
                self.state = SessionState::NetworkError;
                // Session teardown: stale speaker bindings must not survive
                // into the next session.
                self.table.release_all();
            }
        }
    }

    async fn process_server_text(&mut self, text: String) {
        let msg: ServerMessage = match serde_json::from_str(&text) {
            Ok(msg) => msg,
            Err(_) => {
                // 可能不是JSON，忽略
                log::debug!("Ignoring non-JSON text frame: {}", text);
                return;
            }
        };

        if let Some(sid) = &msg.session_id {
            if self.current_session_id.as_deref() != Some(sid) {
                log::info!("New Session ID: {}", sid);
                self.current_session_id = Some(sid.clone());
            }
        }

        match msg.msg_type.as_str() {
            "hello" => {
                log::info!("Server Hello received. Subscribing to voice streams...");
                let session_id = self.current_session_id.as_deref().unwrap_or("");
                let subscribe_cmd = format!(
                    r#"{{"session_id":"{}","type":"subscribe","streams":"all"}}"#,
                    session_id
                );
                if let Err(e) = self.net_tx.send(NetCommand::SendText(subscribe_cmd)).await {
                    log::error!("Failed to send subscribe command: {}", e);
                }
            }
            "speaker" => {
                // Speakers claim their channel on first audio; only the
                // departure side is handled here.
                match (msg.state.as_deref(), msg.user) {
                    (Some("leave") | Some("stop"), Some(user)) => {
                        self.table.release_user(user);
                    }
                    (Some("start"), Some(user)) => {
                        log::debug!("Speaker {} active", user);
                    }
                    _ => {
                        log::debug!("Ignoring speaker message without user: {}", text);
                    }
                }
            }
            "assign" => {
                // Operator override: pin a user to a specific channel.
                match (msg.user, msg.channel) {
                    (Some(user), Some(channel)) => {
                        if self.table.claim_specific(user, channel).is_none() {
                            log::warn!(
                                "Assign rejected: channel {} out of range (0..{})",
                                channel,
                                self.table.len()
                            );
                        }
                    }
                    _ => {
                        log::warn!("Ignoring malformed assign message: {}", text);
                    }
                }
            }
            "release" => match (msg.user, msg.channel) {
                (Some(user), _) => self.table.release_user(user),
                (None, Some(channel)) => self.table.release_index(channel),
                _ => self.table.release_all(),
            },
            "session" => {
                if msg.state.as_deref() == Some("stop") {
                    log::info!("Session stopped, releasing all channels");
                    self.table.release_all();
                    self.state = SessionState::Idle;
                }
            }
            other => {
                log::debug!("Unhandled message type: {}", other);
            }
        }

        if let Some(t) = msg.text {
            log::info!("Server: {}", t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::VoiceFrame;

    fn controller_with(channels: usize) -> (Controller, mpsc::Receiver<NetCommand>) {
        let table = Arc::new(ChannelTable::new(channels, 64));
        let (tx, rx) = mpsc::channel(8);
        (Controller::new(table, tx), rx)
    }

    #[tokio::test]
    async fn voice_burst_claims_and_buffers() {
        let (mut ctrl, _rx) = controller_with(4);
        let frame = VoiceFrame {
            user: 42,
            pcm: vec![10, 10, 20, 20],
        };
        ctrl.handle_net_event(NetEvent::Voice(frame)).await;

        assert_eq!(ctrl.table.find_claimed_slot(42), Some(0));
    }

    #[tokio::test]
    async fn speaker_leave_releases_channel() {
        let (mut ctrl, _rx) = controller_with(4);
        ctrl.table.claim_first_free(42);

        let text = r#"{"type":"speaker","state":"leave","user":42}"#.to_string();
        ctrl.handle_net_event(NetEvent::Text(text)).await;

        assert_eq!(ctrl.table.find_claimed_slot(42), None);
    }

    #[tokio::test]
    async fn assign_pins_user_to_channel() {
        let (mut ctrl, _rx) = controller_with(4);
        let text = r#"{"type":"assign","user":42,"channel":2}"#.to_string();
        ctrl.handle_net_event(NetEvent::Text(text)).await;

        assert_eq!(ctrl.table.find_claimed_slot(42), Some(2));
    }

    #[tokio::test]
    async fn session_stop_releases_everything() {
        let (mut ctrl, _rx) = controller_with(4);
        ctrl.table.claim_first_free(1);
        ctrl.table.claim_first_free(2);

        let text = r#"{"type":"session","state":"stop"}"#.to_string();
        ctrl.handle_net_event(NetEvent::Text(text)).await;

        assert_eq!(ctrl.table.find_claimed_slot(1), None);
        assert_eq!(ctrl.table.find_claimed_slot(2), None);
    }

    #[tokio::test]
    async fn disconnect_releases_everything() {
        let (mut ctrl, _rx) = controller_with(4);
        ctrl.table.claim_first_free(1);

        ctrl.handle_net_event(NetEvent::Disconnected).await;
        assert_eq!(ctrl.table.find_claimed_slot(1), None);
    }

    #[tokio::test]
    async fn server_hello_triggers_subscribe() {
        let (mut ctrl, mut rx) = controller_with(4);
        let text = r#"{"type":"hello","session_id":"abc"}"#.to_string();
        ctrl.handle_net_event(NetEvent::Text(text)).await;

        match rx.recv().await {
            Some(NetCommand::SendText(cmd)) => {
                assert!(cmd.contains(r#""type":"subscribe""#));
                assert!(cmd.contains("abc"));
            }
            other => panic!("expected subscribe command, got {:?}", other),
        }
    }
}
