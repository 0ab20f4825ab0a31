pub mod models;
pub mod utils;

pub use models::{
    Company, MaintenanceRecord, TeamMember, TeamRole, Vehicle, VehicleError, VehicleField,
    VehicleStatus,
};
