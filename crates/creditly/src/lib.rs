//! Credit-intake backend for the Creditly Global fiscal-credit brokerage.

pub mod chat;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
