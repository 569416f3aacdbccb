pub mod cli;
pub mod dom;
pub mod error;
pub mod host;
pub mod inspector;
pub mod locator;
pub mod logging;
pub mod panel;
pub mod sync;
pub mod trace;
