//! Concurrent fan-out of a single request.

use crate::client::{ApiRequest, ApiResponse, ApiTransport, TransportError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// One response of a fan-out, tagged with its launch index.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResponse {
    pub index: usize,
    pub response: ApiResponse,
    pub elapsed_ms: u64,
}

/// Sends N copies of a request at once and waits for all of them.
pub struct ConcurrencyProbe {
    transport: Arc<dyn ApiTransport>,
}

impl ConcurrencyProbe {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Launches `count` identical requests before awaiting any of them.
    ///
    /// Responses are returned in launch order. Any transport failure fails
    /// the whole probe, since the remaining responses cannot be judged as a
    /// set.
    pub async fn fan_out(
        &self,
        request: &ApiRequest,
        count: usize,
    ) -> Result<Vec<ProbeResponse>, TransportError> {
        debug!("Fanning out {} x {}", count, request);

        let futures = (0..count).map(|index| {
            let transport = Arc::clone(&self.transport);
            async move {
                let start = Instant::now();
                let result = transport.send(request).await;
                (index, result, start.elapsed().as_millis() as u64)
            }
        });

        let mut responses = Vec::with_capacity(count);
        for (index, result, elapsed_ms) in join_all(futures).await {
            responses.push(ProbeResponse {
                index,
                response: result?,
                elapsed_ms,
            });
        }
        Ok(responses)
    }
}
