//! In-memory transport for driver tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use zbx_codec::{Packet, Response};

use crate::address::CollectorAddress;
use crate::error::SenderError;
use crate::transports::Transport;
use crate::Result;

enum Step {
    Reply(Response),
    Refuse,
}

/// Replays scripted replies per host and records every attempted address
///
/// A host with no remaining steps refuses the connection.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
    packets: Mutex<Vec<Packet>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, host: &str, response: Response) -> Self {
        self.push(host, Step::Reply(response));
        self
    }

    pub(crate) fn refuse(self, host: &str) -> Self {
        self.push(host, Step::Refuse);
        self
    }

    fn push(&self, host: &str, step: Step) {
        self.script
            .lock()
            .entry(host.to_string())
            .or_default()
            .push_back(step);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn packets(&self) -> Vec<Packet> {
        self.packets.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&self, address: &CollectorAddress, packet: &Packet) -> Result<Response> {
        self.calls.lock().push(address.to_string());
        self.packets.lock().push(packet.clone());

        let step = self
            .script
            .lock()
            .get_mut(address.host())
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Reply(response)) => Ok(response),
            Some(Step::Refuse) | None => Err(SenderError::connect(
                address,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            )),
        }
    }
}
