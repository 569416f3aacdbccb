pub mod agent;
pub mod overlay;
pub mod pointer;
pub mod state_machine;
