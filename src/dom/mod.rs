pub mod dom_model;
pub mod escape;
pub mod query;
