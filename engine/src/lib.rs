// Stock engine library root: dealership stock and sales metrics, the vehicle
// store and loaders feeding them, and the dashboard report built on top.

pub mod config;
pub mod data;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod periods;
pub mod report;
pub mod services;

pub use error::EngineError;
