use super::websocket::ServerUpdate;

/// Emitted by the session model for the communications engine to act on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A join reserved this name; expect a WebSocket upgrade for it.
    VoterJoined(String),
    /// The voter left or was dropped by another voter; close their socket.
    VoterLeft(String),
    /// Broadcast to every connected voter.
    Update(ServerUpdate),
}
