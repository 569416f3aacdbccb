use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::sync::message::AgentMessage;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Directed, best-effort delivery into the page context.
pub trait AgentTransport {
    /// Hand `message` to the page agent. Fails when none is listening.
    fn send(&mut self, message: &AgentMessage) -> Result<(), ChannelError>;

    /// (Re)install the page agent into the target page.
    fn reinject(&mut self) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Pause between re-injection and the single retry.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Outcome of a first send attempt.
#[derive(Debug)]
pub enum Attempt {
    Sent,
    NeedsReinject(ChannelError),
}

/// Final outcome of a bounded delivery.
#[derive(Debug)]
pub enum Delivery {
    Delivered,
    /// The first send failed; the agent was reinstalled and the retry landed.
    DeliveredAfterReinject,
    Failed(ChannelError),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        !matches!(self, Delivery::Failed(_))
    }
}

fn attempt(transport: &mut dyn AgentTransport, message: &AgentMessage) -> Attempt {
    match transport.send(message) {
        Ok(()) => Attempt::Sent,
        Err(e) => Attempt::NeedsReinject(e),
    }
}

/// Send `message`, reinjecting and retrying exactly once on failure.
///
/// Never retries a second time: a failed retry is reported as `Failed`.
pub fn deliver(
    transport: &mut dyn AgentTransport,
    message: &AgentMessage,
    policy: &RetryPolicy,
) -> Delivery {
    let first_error = match attempt(transport, message) {
        Attempt::Sent => return Delivery::Delivered,
        Attempt::NeedsReinject(e) => e,
    };

    debug!(error = %first_error, ?message, "page agent unreachable, reinjecting");
    if let Err(e) = transport.reinject() {
        warn!(error = %e, "failed to inject page agent");
        return Delivery::Failed(e);
    }

    if !policy.retry_delay.is_zero() {
        thread::sleep(policy.retry_delay);
    }

    match attempt(transport, message) {
        Attempt::Sent => Delivery::DeliveredAfterReinject,
        Attempt::NeedsReinject(e) => {
            warn!(error = %e, ?message, "retry after reinjection failed");
            Delivery::Failed(e)
        }
    }
}
