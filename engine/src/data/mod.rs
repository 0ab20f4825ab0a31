pub mod csv_parser;
pub mod vehicle_store;

pub use csv_parser::{load_vehicles, load_vehicles_from_json, VehicleCsvParser};
pub use vehicle_store::VehicleStore;
