pub mod dto;
pub mod extract;
pub mod handlers;
pub mod telemetry;
