//! The communications engine.
//!
//! A single task owns the listener, the hub and every registry. Reader tasks
//! only wait for a request's bytes and hand the socket back through a
//! channel, so requests are handled one at a time in arrival order and a
//! request's broadcast has gone out before the next request starts.

use std::net::SocketAddr;

use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::assets::{self, Assets};
use crate::connection;
use crate::error::{Error, Result};
use crate::http::{response, Header, Method, Request, Status};
use crate::hub::Hub;
use crate::models::ClientRequest;
use crate::websocket::{self, SEC_WEBSOCKET_ACCEPT, SEC_WEBSOCKET_KEY};

/// First path step of a WebSocket upgrade; the second is the voter name.
pub const WEBSOCKET_PATH: &str = "webSocket";

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

/// A socket whose next request has arrived.
struct Inbound {
    stream: TcpStream,
    peer: SocketAddr,
    bytes: Vec<u8>,
}

pub struct Server {
    listener: TcpListener,
    hub: Hub<TcpStream>,
    assets: Assets,
    inbound_tx: UnboundedSender<Inbound>,
    inbound_rx: UnboundedReceiver<Inbound>,
}

impl Server {
    pub async fn bind(addr: SocketAddr, assets: Assets) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (inbound_tx, inbound_rx) = unbounded_channel();

        Ok(Server {
            listener,
            hub: Hub::new(),
            assets,
            inbound_tx,
            inbound_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process is terminated.
    pub async fn run(mut self) {
        match self.listener.local_addr() {
            Ok(addr) => info!("Listening on {addr}, serving {}", self.assets.root().display()),
            Err(e) => warn!("Listening on an unknown address: {e}"),
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.accept(stream, peer),
                    Err(e) => error!("Error accepting socket: {e}"),
                },
                Some(inbound) = self.inbound_rx.recv() => self.handle(inbound).await,
            }
        }
    }

    fn accept(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Unable to set TCP_NODELAY for {peer}: {e}");
        }
        debug!("Accepted connection from {peer}");
        self.watch(stream, peer);
    }

    /// Wait in the background for the socket's next request.
    fn watch(&self, stream: TcpStream, peer: SocketAddr) {
        let inbound = self.inbound_tx.clone();

        tokio::spawn(async move {
            match connection::read_request(&stream).await {
                Ok(Some(bytes)) => {
                    if inbound.send(Inbound { stream, peer, bytes }).is_err() {
                        debug!("Engine stopped, dropping request from {peer}");
                    }
                }
                Ok(None) => debug!("Connection from {peer} closed"),
                Err(e) => warn!("Error reading socket from {peer}: {e}"),
            }
        });
    }

    async fn handle(&mut self, inbound: Inbound) {
        let Inbound {
            mut stream,
            peer,
            bytes,
        } = inbound;

        let request = match Request::parse(&bytes) {
            Ok(request) => request,
            Err(e) => {
                warn!("Malformed request from {peer}: {e}");
                let reply = format!("400 Bad Request: {e}");
                let _ = write_text(&mut stream, Status::BadRequest, &reply).await;
                return;
            }
        };
        debug!("{} {} from {peer}", request.method(), request.path());

        let handled = match request.method() {
            Method::Get if request.header("Upgrade").is_some() => {
                if let Err(e) = self.upgrade(&request, stream).await {
                    report(&format!("WebSocket upgrade from {peer} failed"), &e);
                }
                return;
            }
            Method::Get => serve_asset(&self.assets, &request, &mut stream).await,
            Method::Post => self.handle_post(request.body(), &mut stream).await,
            other => {
                warn!("Unknown request method from {peer}: {other}");
                return;
            }
        };

        match handled {
            Ok(()) => self.watch(stream, peer),
            Err(e) => report(&format!("Abandoning connection from {peer}"), &e),
        }
    }

    /// Upgrade to a WebSocket for a voter that has already joined.
    ///
    /// The socket is never read again after the liveness check; from then on
    /// it only carries broadcasts.
    async fn upgrade(&mut self, request: &Request, mut stream: TcpStream) -> Result<()> {
        let voter = match request.path_steps() {
            [marker, name] if marker == WEBSOCKET_PATH => name.clone(),
            _ => {
                return Err(Error::Upgrade(format!(
                    "invalid WebSocket request path: {}",
                    request.path()
                )))
            }
        };

        if !self.hub.take_pending(&voter) {
            return Err(Error::Upgrade(format!(
                "WebSocket voter name has no prior join request: {voter}"
            )));
        }

        let key = request
            .header(SEC_WEBSOCKET_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Upgrade(format!("{SEC_WEBSOCKET_KEY} is missing")))?;

        let headers = [
            Header::new("Upgrade", "websocket"),
            Header::new("Connection", "Upgrade"),
            Header::new(SEC_WEBSOCKET_ACCEPT, websocket::accept_key(key)),
        ];
        response::write_head(&mut stream, Status::SwitchingProtocols, &headers).await?;

        websocket::check_liveness(&mut stream).await?;

        self.hub.admit(&voter, stream).await;
        Ok(())
    }

    /// Answer a client request. Shape problems are a 400; everything the
    /// model decides, errors included, is a 200.
    async fn handle_post(&mut self, body: Option<&str>, stream: &mut TcpStream) -> Result<()> {
        let body = body.unwrap_or_default();
        if body.trim().is_empty() {
            return bad_request(stream, "Body content is missing.").await;
        }

        let request: ClientRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => {
                debug!("Unrecognized request body: {e}");
                return bad_request(stream, &format!("Body content not recognized: {body}")).await;
            }
        };

        if let Err(problems) = request.validate() {
            return bad_request(stream, &problems).await;
        }

        let reply = self.hub.handle_request(&request).await;

        let json = match serde_json::to_string(&reply) {
            Ok(json) => json,
            Err(e) => {
                error!("Unable to encode server response: {e}");
                return write_text(stream, Status::InternalError, "500 Internal error").await;
            }
        };

        let headers = [Header::new("Content-Type", JSON_CONTENT_TYPE)];
        response::write_body(stream, Status::Ok, &headers, json.as_bytes()).await
    }
}

async fn serve_asset(assets: &Assets, request: &Request, stream: &mut TcpStream) -> Result<()> {
    let path = request.path();

    let file = match assets.open(request.path_steps()).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            warn!("Unknown resource requested: {path}");
            return write_text(stream, Status::NotFound, &format!("404 Not Found: {path}")).await;
        }
        Err(e) => {
            warn!("Unable to open resource {path}: {e}");
            let reply = format!("500 Internal error processing: {path}");
            return write_text(stream, Status::InternalError, &reply).await;
        }
    };

    let content_type = if request.path_steps().is_empty() {
        assets::content_type("index.html")
    } else {
        assets::content_type(path)
    };
    let headers = [Header::new("Content-Type", content_type)];

    response::write_stream(stream, Status::Ok, &headers, file).await
}

async fn bad_request(stream: &mut TcpStream, detail: &str) -> Result<()> {
    write_text(stream, Status::BadRequest, &format!("400 Bad Request: {detail}")).await
}

async fn write_text(stream: &mut TcpStream, status: Status, text: &str) -> Result<()> {
    let headers = [Header::new("Content-Type", TEXT_CONTENT_TYPE)];
    response::write_body(stream, status, &headers, text.as_bytes()).await
}

/// Log a connection failure unless it was logged where it happened.
fn report(context: &str, e: &Error) {
    match e {
        Error::Comm => debug!("{context}: {e}"),
        _ => warn!("{context}: {e}"),
    }
}
