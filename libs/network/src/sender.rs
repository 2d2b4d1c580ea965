//! Sender orchestrator
//!
//! Owns the candidate collector list and the cached primary address. Every
//! send tries the cached primary first, then the configured list in order,
//! running the full redirect drive from each starting address.

use std::time::Duration;
use tracing::{debug, info, warn};
use zbx_codec::{DeliveryMode, Metric, Packet, Response};
use zbx_config::{defaults, SenderSettings};

use crate::address::CollectorAddress;
use crate::error::{HostFailure, SenderError};
use crate::redirect::follow_redirects;
use crate::transports::{TcpTransport, TcpTransportConfig, Transport};
use crate::Result;

/// Outcome of a mixed batch: one independent result per delivery mode
///
/// `None` means that sub-batch was empty and nothing was sent for it.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub active: Option<Result<Response>>,
    pub trapper: Option<Result<Response>>,
}

impl BatchOutcome {
    /// True when every packet that was sent succeeded
    pub fn is_success(&self) -> bool {
        self.results().all(|(_, result)| result.is_ok())
    }

    /// Sent sub-batches with their results, trapper first
    pub fn results(&self) -> impl Iterator<Item = (DeliveryMode, &Result<Response>)> {
        [
            (DeliveryMode::Trapper, self.trapper.as_ref()),
            (DeliveryMode::Active, self.active.as_ref()),
        ]
        .into_iter()
        .filter_map(|(mode, result)| result.map(|r| (mode, r)))
    }

    pub fn errors(&self) -> impl Iterator<Item = (DeliveryMode, &SenderError)> {
        self.results()
            .filter_map(|(mode, result)| result.as_ref().err().map(|e| (mode, e)))
    }
}

/// Sends packets to a set of collectors with failover and redirect handling
#[derive(Debug)]
pub struct Sender<T: Transport = TcpTransport> {
    hosts: Vec<CollectorAddress>,
    primary: Option<CollectorAddress>,
    max_redirects: usize,
    update_hosts: bool,
    transport: T,
}

impl Sender<TcpTransport> {
    /// Sender for a single collector with default timeouts
    pub fn new(address: &str) -> Result<Self> {
        Self::with_hosts([address])
    }

    /// Sender for an ordered list of collectors with default timeouts
    pub fn with_hosts<I, S>(addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_transport(addresses, TcpTransport::default())
    }

    /// Sender for an ordered list of collectors with explicit connect/read/write timeouts
    pub fn with_timeouts<I, S>(
        addresses: I,
        connect: Duration,
        read: Duration,
        write: Duration,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_transport(addresses, TcpTransport::with_timeouts(connect, read, write))
    }

    pub fn from_settings(settings: &SenderSettings) -> Result<Self> {
        let transport = TcpTransport::new(TcpTransportConfig::from(settings));
        Ok(Self::with_transport(&settings.hosts, transport)?
            .max_redirects(settings.max_redirects)
            .update_hosts(settings.update_hosts))
    }
}

impl<T: Transport> Sender<T> {
    /// Sender over any transport; addresses are normalized up front
    pub fn with_transport<I, S>(addresses: I, transport: T) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = addresses
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                CollectorAddress::parse(raw).map_err(|e| {
                    SenderError::configuration(
                        format!("invalid collector address '{}': {}", raw, e),
                        Some("hosts"),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if hosts.is_empty() {
            return Err(SenderError::configuration(
                "at least one collector address is required",
                Some("hosts"),
            ));
        }

        Ok(Self {
            hosts,
            primary: None,
            max_redirects: defaults::MAX_REDIRECTS,
            update_hosts: defaults::UPDATE_HOSTS,
            transport,
        })
    }

    /// Redirect hops followed per starting address
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Replace a list entry with the redirect target that accepted its packet
    pub fn update_hosts(mut self, enabled: bool) -> Self {
        self.update_hosts = enabled;
        self
    }

    pub fn hosts(&self) -> &[CollectorAddress] {
        &self.hosts
    }

    /// Most recent successful starting address
    pub fn primary(&self) -> Option<&CollectorAddress> {
        self.primary.as_ref()
    }

    pub fn clear_primary(&mut self) {
        self.primary = None;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one packet: cached primary first, then every configured address in order
    pub async fn send(&mut self, packet: &Packet) -> Result<Response> {
        let mut failures = Vec::new();

        if let Some(primary) = self.primary.take() {
            match follow_redirects(&self.transport, &primary, packet, self.max_redirects).await {
                Ok(delivery) => {
                    self.primary = Some(primary);
                    return Ok(delivery.response);
                }
                Err(error) => {
                    warn!(
                        peer = %primary,
                        category = error.category(),
                        "Cached primary collector failed, clearing: {}",
                        error
                    );
                    failures.push(HostFailure {
                        address: primary,
                        error,
                    });
                }
            }
        }

        for index in 0..self.hosts.len() {
            let start = self.hosts[index].clone();
            match follow_redirects(&self.transport, &start, packet, self.max_redirects).await {
                Ok(delivery) => {
                    if self.update_hosts && delivery.final_address != start {
                        info!(
                            from = %start,
                            to = %delivery.final_address,
                            "Replacing collector address with redirect target"
                        );
                        self.hosts[index] = delivery.final_address;
                    }
                    info!(primary = %start, "Cached primary collector");
                    self.primary = Some(start);
                    return Ok(delivery.response);
                }
                Err(error) => {
                    warn!(
                        peer = %start,
                        category = error.category(),
                        "Collector failed: {}",
                        error
                    );
                    failures.push(HostFailure {
                        address: start,
                        error,
                    });
                }
            }
        }

        Err(SenderError::AllHostsFailed {
            attempted: failures.len(),
            failures,
        })
    }

    /// Split a mixed batch by delivery mode and send each part independently
    ///
    /// The trapper packet goes out first. A failure of one part never stops
    /// the other.
    pub async fn send_metrics(&mut self, metrics: &[Metric]) -> BatchOutcome {
        let (active, trapper): (Vec<Metric>, Vec<Metric>) =
            metrics.iter().cloned().partition(Metric::is_active);

        let trapper = self.send_batch(DeliveryMode::Trapper, trapper).await;
        let active = self.send_batch(DeliveryMode::Active, active).await;

        BatchOutcome { active, trapper }
    }

    async fn send_batch(
        &mut self,
        mode: DeliveryMode,
        metrics: Vec<Metric>,
    ) -> Option<Result<Response>> {
        if metrics.is_empty() {
            return None;
        }

        debug!(mode = mode.as_str(), metrics = metrics.len(), "Sending batch");
        let result = match Packet::data(mode, metrics) {
            Ok(packet) => self.send(&packet).await,
            Err(e) => Err(e.into()),
        };
        Some(result)
    }

    /// Register `host` for active checks
    ///
    /// Collectors confirm an autoregistration only on the second request, so
    /// any unsuccessful first round is followed by exactly one more. The
    /// registration fails as `RegistrationFailed` when some collector rejected
    /// the second round; otherwise the second round's error is returned.
    pub async fn register_host(&mut self, host: &str, host_metadata: &str) -> Result<()> {
        let packet = Packet::registration(host, host_metadata);

        match self.send(&packet).await {
            Ok(_) => return Ok(()),
            Err(e) => {
                debug!(
                    host,
                    category = e.category(),
                    "Registration not confirmed yet, sending second round: {}",
                    e
                );
            }
        }

        match self.send(&packet).await {
            Ok(_) => {
                info!(host, "Host registered");
                Ok(())
            }
            Err(e) => match e.first_rejection().map(str::to_string) {
                Some(info) => Err(SenderError::RegistrationFailed {
                    host: host.to_string(),
                    info,
                }),
                None => Err(e),
            },
        }
    }
}
