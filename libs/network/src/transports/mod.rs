//! Transport Layer
//!
//! One request frame out, one response frame back, per connection. The
//! [`Transport`] trait is the seam the redirect and fallback drivers are
//! written against; [`TcpTransport`] is the production implementation.

use crate::address::CollectorAddress;
use crate::Result;
use async_trait::async_trait;
use zbx_codec::{Packet, Response};

pub mod tcp;

pub use tcp::{read_response_frame, TcpTransport, TcpTransportConfig};

/// Single-attempt request/response exchange with one collector
///
/// Implementations return exactly one response or one error and release
/// any connection they opened before returning.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `packet` to `address` and wait for the reply
    async fn exchange(&self, address: &CollectorAddress, packet: &Packet) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn exchange(&self, address: &CollectorAddress, packet: &Packet) -> Result<Response> {
        (**self).exchange(address, packet).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn exchange(&self, address: &CollectorAddress, packet: &Packet) -> Result<Response> {
        (**self).exchange(address, packet).await
    }
}
