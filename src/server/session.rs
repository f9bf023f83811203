use super::types::{ClientMessage, FramePayload, ServerMessage};
use crate::{
    Error, Result,
    gaze::{GazeProcessor, GazeResult},
};
use axum::extract::ws::{Message, WebSocket};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Accepted,
    PeerClosed,
    Failed,
}

/// One WebSocket connection. Holds no gaze state between frames.
pub struct Session {
    id: Uuid,
    state: SessionState,
    processor: GazeProcessor,
    frames_processed: u64,
}

impl Session {
    pub fn new(processor: GazeProcessor) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Connecting,
            processor,
            frames_processed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn transition(&mut self, event: SessionEvent) -> Result<()> {
        let new_state = match (self.state, event) {
            (SessionState::Connecting, SessionEvent::Accepted) => SessionState::Open,
            (SessionState::Open, SessionEvent::PeerClosed) => SessionState::Closed,
            (SessionState::Connecting | SessionState::Open, SessionEvent::Failed) => {
                SessionState::Closed
            }
            _ => {
                warn!(
                    connection_id = %self.id,
                    "Invalid session transition from {:?} with event {:?}",
                    self.state,
                    event
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", self.state),
                    requested: format!("{:?}", event),
                });
            }
        };

        debug!(
            connection_id = %self.id,
            "Session state transition: {:?} -> {:?} (event: {:?})",
            self.state,
            new_state,
            event
        );
        self.state = new_state;
        Ok(())
    }

    /// Handles one text message and returns the reply, if any.
    ///
    /// Frame and estimation failures are answered with a failed gaze result.
    /// Only a message that cannot be parsed at all is returned as an error,
    /// which ends the session.
    pub async fn handle_text(&mut self, text: &str) -> Result<Option<ServerMessage>> {
        match ClientMessage::parse(text)? {
            ClientMessage::Frame(FramePayload::Image(payload)) => {
                let data = self.processor.process(payload).await;
                if data.frame_processed() {
                    self.frames_processed += 1;
                }
                Ok(Some(ServerMessage::GazeData { data }))
            }
            ClientMessage::Frame(FramePayload::Missing) => {
                // No data, nothing to analyse; the client gets no reply
                debug!(connection_id = %self.id, "Ignoring frame message without data");
                Ok(None)
            }
            ClientMessage::Frame(FramePayload::Invalid(kind)) => {
                warn!(connection_id = %self.id, "Frame data is a JSON {}", kind);
                Ok(Some(ServerMessage::GazeData {
                    data: GazeResult::failed(format!(
                        "frame data must be a base64 string, got {}",
                        kind
                    )),
                }))
            }
            ClientMessage::Ping => Ok(Some(ServerMessage::Pong)),
            ClientMessage::Unknown(kind) => {
                // Unrecognized types are dropped without telling the client
                debug!(connection_id = %self.id, "Ignoring message of type {:?}", kind);
                Ok(None)
            }
        }
    }
}

/// Drives a WebSocket connection from accept to close.
pub async fn run(mut socket: WebSocket, processor: GazeProcessor) {
    let mut session = Session::new(processor);
    if let Err(e) = session.transition(SessionEvent::Accepted) {
        error!("Failed to open session: {}", e);
        return;
    }
    info!(connection_id = %session.id(), "WebSocket connection established");

    let event = loop {
        let message = match socket.recv().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                warn!(connection_id = %session.id(), "WebSocket receive error: {}", e);
                break SessionEvent::Failed;
            }
            None => break SessionEvent::PeerClosed,
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break SessionEvent::PeerClosed,
            // Answered by the transport
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Binary(_) => {
                error!(
                    connection_id = %session.id(),
                    "WebSocket error: binary messages are not supported"
                );
                close(&mut socket).await;
                break SessionEvent::Failed;
            }
        };

        let reply = match session.handle_text(&text).await {
            Ok(Some(reply)) => reply,
            Ok(None) => continue,
            Err(e) => {
                error!(connection_id = %session.id(), "WebSocket error: {}", e);
                close(&mut socket).await;
                break SessionEvent::Failed;
            }
        };

        let sent = match reply.to_text() {
            Ok(json) => socket.send(Message::Text(json)).await.map_err(Error::from),
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            warn!(connection_id = %session.id(), "Failed to send reply: {}", e);
            break SessionEvent::Failed;
        }
    };

    if let Err(e) = session.transition(event) {
        error!("Failed to close session: {}", e);
        return;
    }
    info!(
        connection_id = %session.id(),
        frames_processed = session.frames_processed(),
        "WebSocket connection closed"
    );
}

async fn close(socket: &mut WebSocket) {
    if let Err(e) = socket.send(Message::Close(None)).await {
        debug!("Close frame not delivered: {}", e);
    }
}
