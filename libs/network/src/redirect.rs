//! Redirect-following driver
//!
//! Collectors in a proxy group answer `failed` with a redirect descriptor
//! when the host belongs to another proxy. The driver re-sends the same
//! packet to the named address immediately, up to a configured number of
//! hops. Transport errors end the drive at once; they are not retried here.

use tracing::{debug, info};
use zbx_codec::{Packet, Response};

use crate::address::CollectorAddress;
use crate::error::SenderError;
use crate::transports::Transport;
use crate::Result;

/// Successful outcome of one drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub response: Response,
    /// Address that finally accepted the packet
    pub final_address: CollectorAddress,
    /// Redirect hops followed to get there
    pub redirects: usize,
}

/// Send `packet` starting at `start`, following redirects up to `max_redirects` hops
pub async fn follow_redirects<T>(
    transport: &T,
    start: &CollectorAddress,
    packet: &Packet,
    max_redirects: usize,
) -> Result<Delivery>
where
    T: Transport + ?Sized,
{
    let mut current = start.clone();
    let mut redirects = 0;

    loop {
        debug!(peer = %current, hop = redirects, request = %packet.request, "Attempting delivery");
        let response = transport.exchange(&current, packet).await?;

        if response.is_success() {
            return Ok(Delivery {
                response,
                final_address: current,
                redirects,
            });
        }

        let Some(redirect) = response.usable_redirect().cloned() else {
            return Err(SenderError::Rejected {
                address: current,
                info: response.info,
            });
        };

        let target = CollectorAddress::parse(&redirect.address).map_err(|source| {
            SenderError::InvalidRedirect {
                from: current.clone(),
                target: redirect.address,
                source,
            }
        })?;

        if redirects == max_redirects {
            return Err(SenderError::RedirectLimitExceeded {
                start: start.clone(),
                max: max_redirects,
            });
        }

        info!(
            from = %current,
            to = %target,
            revision = redirect.revision,
            "Following collector redirect"
        );
        redirects += 1;
        current = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use zbx_codec::{DeliveryMode, Metric};

    fn packet() -> Packet {
        Packet::data(DeliveryMode::Trapper, vec![Metric::trapper("h", "k", "v")]).unwrap()
    }

    fn addr(host: &str) -> CollectorAddress {
        CollectorAddress::new(host, 10051)
    }

    const OK: &str = "processed: 1; failed: 0; total: 1; seconds spent: 0.000030";

    #[tokio::test]
    async fn test_direct_success() {
        let transport = ScriptedTransport::new().reply("a", Response::success(OK));

        let delivery = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap();

        assert_eq!(delivery.final_address, addr("a"));
        assert_eq!(delivery.redirects, 0);
        assert_eq!(transport.calls(), vec!["a:10051"]);
    }

    #[tokio::test]
    async fn test_failed_without_redirect_is_rejected() {
        let transport = ScriptedTransport::new().reply("a", Response::failed("no permissions"));

        let err = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SenderError::Rejected { ref address, ref info } if *address == addr("a") && info == "no permissions"
        ));
    }

    #[tokio::test]
    async fn test_empty_redirect_address_is_rejected() {
        let transport = ScriptedTransport::new().reply("a", Response::redirect(1, ""));

        let err = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap_err();
        assert_eq!(err.category(), "rejected");
    }

    #[tokio::test]
    async fn test_exactly_max_redirects_then_success() {
        let transport = ScriptedTransport::new()
            .reply("a", Response::redirect(1, "b"))
            .reply("b", Response::redirect(2, "c:20051"))
            .reply("c", Response::redirect(3, "d"))
            .reply("d", Response::success(OK));

        let delivery = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap();

        assert_eq!(delivery.final_address, addr("d"));
        assert_eq!(delivery.redirects, 3);
        assert_eq!(
            transport.calls(),
            vec!["a:10051", "b:10051", "c:20051", "d:10051"]
        );
    }

    #[tokio::test]
    async fn test_one_redirect_too_many() {
        let transport = ScriptedTransport::new()
            .reply("a", Response::redirect(1, "b"))
            .reply("b", Response::redirect(2, "c"))
            .reply("c", Response::redirect(3, "d"))
            .reply("d", Response::redirect(4, "e"))
            .reply("e", Response::success(OK));

        let err = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SenderError::RedirectLimitExceeded { ref start, max: 3 } if *start == addr("a")
        ));
        // "e" is never contacted
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_zero_redirects_allowed() {
        let transport = ScriptedTransport::new()
            .reply("a", Response::redirect(1, "b"))
            .reply("b", Response::success(OK));

        let err = follow_redirects(&transport, &addr("a"), &packet(), 0)
            .await
            .unwrap_err();
        assert_eq!(err.category(), "redirect_limit");
    }

    #[tokio::test]
    async fn test_invalid_redirect_target() {
        let transport = ScriptedTransport::new().reply("a", Response::redirect(1, "proxy:notaport"));

        let err = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SenderError::InvalidRedirect { ref target, .. } if target == "proxy:notaport"
        ));
    }

    #[tokio::test]
    async fn test_transport_error_stops_drive() {
        let transport = ScriptedTransport::new()
            .reply("a", Response::redirect(1, "b"))
            .refuse("b")
            .reply("c", Response::success(OK));

        let err = follow_redirects(&transport, &addr("a"), &packet(), 3)
            .await
            .unwrap_err();

        assert_eq!(err.category(), "connect");
        assert_eq!(err.address(), Some(&addr("b")));
        assert_eq!(transport.calls(), vec!["a:10051", "b:10051"]);
    }
}
