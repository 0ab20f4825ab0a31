// The stock service owns the vehicle store and answers the report binary's
// requests. Each request type has its handler in a sibling module.
use crate::config::ReportSettings;
use crate::data::VehicleStore;
use crate::metrics::Clock;

pub mod build_dashboard;
pub mod load_vehicles;
pub mod record_sale;

pub use load_vehicles::LoadSummary;

pub struct StockService {
    store: VehicleStore,
    settings: ReportSettings,
    clock: Box<dyn Clock>,
}

impl StockService {
    pub fn new(settings: ReportSettings, clock: Box<dyn Clock>) -> Self {
        StockService {
            store: VehicleStore::new(),
            settings,
            clock,
        }
    }

    pub fn store(&self) -> &VehicleStore {
        &self.store
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}
