pub mod page_host;
pub mod transport;
