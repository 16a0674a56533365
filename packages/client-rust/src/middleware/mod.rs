//! Endpoint middleware.
//!
//! Decorators that wrap any [`RemoteEndpoint`] and implement it again:
//!
//! - [`TimeoutEndpoint`]: bounds each call, reporting expiry as a transport error
//! - [`TracedEndpoint`]: records call duration and outcome in `tracing` spans

pub mod timeout;
pub mod traced;

use std::time::Duration;

use remotefields_core::RemoteEndpoint;

pub use timeout::TimeoutEndpoint;
pub use traced::TracedEndpoint;

/// Builder-style wrapping for endpoints.
pub trait EndpointExt: RemoteEndpoint + Sized {
    /// Bounds every call to `timeout`.
    fn with_timeout(self, timeout: Duration) -> TimeoutEndpoint<Self> {
        TimeoutEndpoint::new(self, timeout)
    }

    /// Instruments every call under the label `name`.
    fn traced(self, name: impl Into<String>) -> TracedEndpoint<Self> {
        TracedEndpoint::new(self, name)
    }
}

impl<E: RemoteEndpoint + Sized> EndpointExt for E {}
