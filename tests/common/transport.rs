use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use selector_helper::{
    error::ChannelError,
    sync::{channel::AgentTransport, message::AgentMessage},
};

/// Transport whose send/reinject outcomes are scripted up front.
///
/// Once a script runs dry every further call succeeds.
#[derive(Default)]
pub struct ScriptedTransport {
    pub sends: VecDeque<bool>,
    pub reinjects: VecDeque<bool>,
    pub sent: Vec<AgentMessage>,
    pub send_calls: usize,
    pub reinject_calls: usize,
}

impl ScriptedTransport {
    pub fn new(sends: &[bool], reinjects: &[bool]) -> Self {
        ScriptedTransport {
            sends: sends.iter().copied().collect(),
            reinjects: reinjects.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl AgentTransport for ScriptedTransport {
    fn send(&mut self, message: &AgentMessage) -> Result<(), ChannelError> {
        self.send_calls += 1;
        if self.sends.pop_front().unwrap_or(true) {
            self.sent.push(message.clone());
            Ok(())
        } else {
            Err(ChannelError::NoReceiver)
        }
    }

    fn reinject(&mut self) -> Result<(), ChannelError> {
        self.reinject_calls += 1;
        if self.reinjects.pop_front().unwrap_or(true) {
            Ok(())
        } else {
            Err(ChannelError::InjectionFailed("blocked".into()))
        }
    }
}

/// Handle to a `ScriptedTransport` that stays inspectable after being
/// boxed into a panel.
#[derive(Clone, Default)]
pub struct SharedTransport(pub Arc<Mutex<ScriptedTransport>>);

impl SharedTransport {
    pub fn new(sends: &[bool], reinjects: &[bool]) -> Self {
        SharedTransport(Arc::new(Mutex::new(ScriptedTransport::new(sends, reinjects))))
    }

    pub fn send_calls(&self) -> usize {
        self.0.lock().unwrap().send_calls
    }

    pub fn sent(&self) -> Vec<AgentMessage> {
        self.0.lock().unwrap().sent.clone()
    }
}

impl AgentTransport for SharedTransport {
    fn send(&mut self, message: &AgentMessage) -> Result<(), ChannelError> {
        self.0.lock().unwrap().send(message)
    }

    fn reinject(&mut self) -> Result<(), ChannelError> {
        self.0.lock().unwrap().reinject()
    }
}
