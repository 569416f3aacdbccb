use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    error::ChannelError,
    host::page_host::PageHost,
    sync::{channel::AgentTransport, message::AgentMessage},
};

/// `AgentTransport` over a tab shared with the caller.
#[derive(Clone)]
pub struct HostTransport {
    host: Arc<Mutex<PageHost>>,
}

impl HostTransport {
    pub fn new(host: Arc<Mutex<PageHost>>) -> Self {
        HostTransport { host }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PageHost>, ChannelError> {
        self.host
            .lock()
            .map_err(|e| ChannelError::HostUnavailable(e.to_string()))
    }
}

impl AgentTransport for HostTransport {
    fn send(&mut self, message: &AgentMessage) -> Result<(), ChannelError> {
        self.lock()?.deliver(message)
    }

    fn reinject(&mut self) -> Result<(), ChannelError> {
        self.lock()?.inject().map(|_| ())
    }
}
