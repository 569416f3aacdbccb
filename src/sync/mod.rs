pub mod channel;
pub mod history;
pub mod message;
pub mod schema;
pub mod store;
