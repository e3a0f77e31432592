//! `CodewordServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket transport, JSON codec, and a
//! [`RoomManager`] backed by the in-memory store and broadcast fanout.

use std::net::SocketAddr;
use std::sync::Arc;

use codeword_protocol::{Codec, JsonCodec};
use codeword_room::{
    BoardGenerator, BroadcastFanout, FanoutConfig, GameConfig, MemoryStore, RandomBoardGenerator,
    RoomManager,
};
use codeword_transport::{Transport, WebSocketTransport};
use tracing::{debug, error, info};

use crate::CodewordError;
use crate::handler::handle_connection;

/// The room manager the server runs on.
pub type Rooms = RoomManager<MemoryStore, BroadcastFanout>;

/// Shared by every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Arc<Rooms>,
    pub(crate) codec: C,
}

impl<C: Codec> ServerState<C> {
    pub(crate) fn fanout(&self) -> &BroadcastFanout {
        self.rooms.publisher()
    }
}

/// Builder for configuring and starting a Codeword server.
///
/// # Example
///
/// ```rust,ignore
/// use codeword::prelude::*;
///
/// let server = CodewordServer::builder()
///     .bind("0.0.0.0:8080")
///     .game_config(GameConfig::default())
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct CodewordServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    fanout_config: FanoutConfig,
    generator: Option<Arc<dyn BoardGenerator>>,
}

impl CodewordServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            fanout_config: FanoutConfig::default(),
            generator: None,
        }
    }

    /// Sets the address to bind to. Port 0 lets the OS pick.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Per-room notification buffer. A connection that falls further
    /// behind than this gets a snapshot instead of the missed events.
    pub fn fanout_config(mut self, config: FanoutConfig) -> Self {
        self.fanout_config = config;
        self
    }

    /// Replaces the random board generator, e.g. with a fixed board for
    /// tests or a themed word list.
    pub fn board_generator(mut self, generator: Arc<dyn BoardGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Binds the socket and starts the room machinery.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn build(self) -> Result<CodewordServer<JsonCodec>, CodewordError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let generator: Arc<dyn BoardGenerator> = match self.generator {
            Some(generator) => generator,
            None => Arc::new(RandomBoardGenerator::default()),
        };
        let rooms = RoomManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(BroadcastFanout::new(self.fanout_config)),
            generator,
            self.game_config,
        );

        let state = Arc::new(ServerState {
            rooms,
            codec: JsonCodec,
        });
        Ok(CodewordServer { transport, state })
    }
}

impl Default for CodewordServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Codeword server. Call [`run`](Self::run) to start accepting
/// connections.
pub struct CodewordServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl CodewordServer<JsonCodec> {
    pub fn builder() -> CodewordServerBuilder {
        CodewordServerBuilder::new()
    }
}

impl<C: Codec> CodewordServer<C> {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The room manager, for inspecting or seeding rooms from outside
    /// the socket layer.
    pub fn rooms(&self) -> &Arc<Rooms> {
        &self.state.rooms
    }

    /// Accepts connections until the process ends, one task per
    /// connection. A failed accept is logged and skipped.
    pub async fn run(mut self) -> Result<(), CodewordError> {
        info!(
            board_size = self.state.rooms.config().board_size,
            turn_secs = self.state.rooms.config().turn_duration.as_secs(),
            "Codeword server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}
