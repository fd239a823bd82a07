use std::time::Duration;

use serde::Deserialize;

use crate::codec::DecoderLimits;

pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;
pub const DEFAULT_MAX_PIPELINED_REQUESTS: usize = 128;
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-connection settings shared by every connection of a server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub limits: DecoderLimits,
    /// Initial capacity of the read accumulator.
    pub read_buffer_size: usize,
    /// Requests decoded but not yet answered before reading pauses.
    pub max_pipelined_requests: usize,
    /// Answer fatal decode errors with a 4xx before closing.
    pub send_error_responses: bool,
    /// How long a stopping server waits for connections to finish the
    /// requests they already decoded. `None` waits forever.
    pub drain_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            limits: DecoderLimits::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_pipelined_requests: DEFAULT_MAX_PIPELINED_REQUESTS,
            send_error_responses: true,
            drain_timeout: Some(DEFAULT_DRAIN_TIMEOUT),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn limits(mut self, limits: DecoderLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    #[must_use]
    pub fn max_pipelined_requests(mut self, max_pipelined_requests: usize) -> Self {
        self.max_pipelined_requests = max_pipelined_requests;
        self
    }

    #[must_use]
    pub fn send_error_responses(mut self, send_error_responses: bool) -> Self {
        self.send_error_responses = send_error_responses;
        self
    }

    #[must_use]
    pub fn drain_timeout(mut self, drain_timeout: Option<Duration>) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }
}
