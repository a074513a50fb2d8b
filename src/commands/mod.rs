// Declarative reconciliation
pub mod apply;
pub mod entity;
pub mod membership;
pub mod permission;

// Server probe
pub mod server;
