//! Voter connection registries and broadcast fan-out.
//!
//! The hub owns the session model together with the pending and connected
//! registries, so that every mutation happens on the engine task.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver};

use log::{debug, error, info, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::api;
use crate::connection;
use crate::model::Model;
use crate::models::{ClientRequest, Event, ServerResponse, ServerUpdate};
use crate::websocket::Frame;

pub struct Hub<W> {
    model: Model,
    events: Receiver<Event>,
    /// Joined, WebSocket not yet established.
    pending: HashSet<String>,
    connections: HashMap<String, W>,
}

impl<W> Hub<W>
where
    W: AsyncWrite + Unpin,
{
    pub(crate) fn new() -> Self {
        let (sender, events) = channel();
        Hub {
            model: Model::new(sender),
            events,
            pending: HashSet::new(),
            connections: HashMap::new(),
        }
    }

    #[cfg(test)]
    fn model(&self) -> &Model {
        &self.model
    }

    #[cfg(test)]
    fn is_pending(&self, name: &str) -> bool {
        self.pending.contains(name)
    }

    #[cfg(test)]
    fn is_connected(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Run a client request against the model and deliver what it produced.
    pub async fn handle_request(&mut self, request: &ClientRequest) -> ServerResponse {
        let response = api::dispatch(&mut self.model, request);
        self.flush().await;
        response
    }

    /// Consume the pending reservation for `name`, if there is one.
    pub fn take_pending(&mut self, name: &str) -> bool {
        self.pending.remove(name)
    }

    /// Register an upgraded connection and announce the voter.
    pub async fn admit(&mut self, name: &str, socket: W) {
        self.connections.insert(name.to_owned(), socket);

        let response = self.model.connected(name);
        if response.is_error() {
            warn!("Connected voter is not in the session: {}", response.message);
            self.disconnect(name).await;
        } else {
            info!("Voter connected: {name}");
        }

        self.flush().await;
    }

    /// Act on every event the model has queued, in order.
    ///
    /// Voters whose sockets fail during a broadcast are dropped once that
    /// broadcast has reached everyone else; the resulting update is then
    /// delivered by this same loop.
    pub async fn flush(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                Event::VoterJoined(name) => {
                    self.pending.insert(name);
                }
                Event::VoterLeft(name) => {
                    self.pending.remove(&name);
                    self.disconnect(&name).await;
                }
                Event::Update(update) => {
                    for name in self.broadcast(&update).await {
                        self.drop_voter(&name).await;
                    }
                }
            }
        }
    }

    /// Send one update to every connection; return the names that failed.
    async fn broadcast(&mut self, update: &ServerUpdate) -> Vec<String> {
        let frame = match serde_json::to_string(update)
            .map_err(|e| e.to_string())
            .and_then(|json| Frame::text(&json).map_err(|e| e.to_string()))
        {
            Ok(frame) => frame,
            Err(e) => {
                error!("Unable to encode server update: {e}");
                return Vec::new();
            }
        };

        debug!(
            "Broadcasting \"{}\" to {} voter(s)",
            update.message,
            self.connections.len()
        );

        let mut failed = Vec::new();
        for (name, socket) in self.connections.iter_mut() {
            if connection::write_all(socket, frame.as_bytes()).await.is_err() {
                failed.push(name.clone());
            }
        }
        failed
    }

    /// Tear down a voter's connection after a communication failure.
    async fn drop_voter(&mut self, name: &str) {
        warn!("Dropping voter after communication failure: {name}");
        self.disconnect(name).await;
        self.model.remove_voter(name);
    }

    /// Close and forget a voter's connection, if any.
    async fn disconnect(&mut self, name: &str) {
        let Some(mut socket) = self.connections.remove(name) else {
            return;
        };

        // Expected to fail when the socket is the reason for the drop.
        let _ = connection::write_all(&mut socket, Frame::close().as_bytes()).await;
        if let Err(e) = socket.shutdown().await {
            debug!("Error shutting down connection for {name}: {e}");
        }
    }
}
