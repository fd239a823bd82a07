use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::connection::HttpConnection;
use crate::handler::Handler;
use crate::server::ServerConfig;

pub struct ServerBuilder {
    address: Option<io::Result<Vec<SocketAddr>>>,
    config: ServerConfig,
    handler: Option<Arc<dyn Handler>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: None, config: ServerConfig::default(), handler: None }
    }

    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::from)?;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }
        let handler = self.handler.ok_or(ServerBuildError::MissingHandler)?;
        Ok(Server { address, config: Arc::new(self.config), handler })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,
    #[error("handler must be set")]
    MissingHandler,
    #[error("can't resolve address: {source}")]
    InvalidAddress {
        #[from]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("can't bind {address:?}: {source}")]
    Bind { address: Vec<SocketAddr>, source: io::Error },
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// A pipelining HTTP/1.1 server: one tokio task per accepted connection.
pub struct Server {
    address: Vec<SocketAddr>,
    config: Arc<ServerConfig>,
    handler: Arc<dyn Handler>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the listener and starts accepting connections in the background.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(address = ?self.address, cause = %e, "bind server error");
                return Err(ServerError::Bind { address: self.address, source: e });
            }
        };
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "start listening");

        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();
        let accept = tokio::spawn(accept_loop(
            listener,
            self.handler,
            self.config,
            shutdown.clone(),
            tracker.clone(),
        ));

        Ok(ServerHandle { local_addr, shutdown, tracker, accept })
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server").field("address", &self.address).field("config", &self.config).finish_non_exhaustive()
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<dyn Handler>,
    config: Arc<ServerConfig>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        let (tcp_stream, peer) = select! {
            biased;

            () = shutdown.cancelled() => {
                info!("stop accepting new connections");
                break;
            }

            accepted = listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
        };

        debug!(%peer, "accepted connection");
        let connection_task = serve(tcp_stream, Arc::clone(&handler), Arc::clone(&config), shutdown.clone());
        tracker.spawn(connection_task.instrument(info_span!("connection", %peer)));
    }
}

async fn serve(tcp_stream: TcpStream, handler: Arc<dyn Handler>, config: Arc<ServerConfig>, shutdown: CancellationToken) {
    if let Err(e) = tcp_stream.set_nodelay(true) {
        debug!(cause = %e, "can't set TCP_NODELAY");
    }

    let (reader, writer) = tcp_stream.into_split();
    let connection = HttpConnection::with_config(reader, writer, &config);
    match connection.process(handler, shutdown).await {
        Ok(()) => debug!("finished process, connection shutdown"),
        Err(e) => warn!(cause = %e, "service has error, connection shutdown"),
    }
}

/// Control over a started [`Server`].
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    accept: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener is bound to, with the real port when bound to
    /// port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A token that stops the server when cancelled, for stopping it from
    /// elsewhere while [`wait`](Self::wait) is pending.
    pub fn stop_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops accepting, lets every connection answer the requests it already
    /// decoded, and returns once all of them closed or hit the drain timeout.
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.wait().await;
    }

    /// Serves until the stop token is cancelled, then waits for the drain.
    pub async fn wait(self) {
        if let Err(e) = self.accept.await {
            error!(cause = %e, "accept loop failed");
        }

        self.tracker.close();
        info!(connections = self.tracker.len(), "draining connections");
        self.tracker.wait().await;
        info!("server stopped");
    }
}
