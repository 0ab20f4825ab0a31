// Handler for loading a vehicle file into the store.
use serde::Serialize;
use std::path::Path;

use super::StockService;
use crate::data::load_vehicles;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadSummary {
    pub loaded: usize,
    pub company_ids: Vec<String>,
}

impl StockService {
    pub fn load_vehicles(&mut self, path: &Path, default_company: &str) -> Result<LoadSummary, EngineError> {
        tracing::info!(path = %path.display(), default_company, "Loading vehicles");
        let vehicles = load_vehicles(path, default_company)?;

        let mut company_ids: Vec<String> = vehicles.iter().map(|v| v.company_id.clone()).collect();
        company_ids.sort();
        company_ids.dedup();

        let loaded = self.store.add_vehicles(vehicles);
        tracing::info!(loaded, companies = company_ids.len(), "Vehicles loaded");
        Ok(LoadSummary { loaded, company_ids })
    }
}
