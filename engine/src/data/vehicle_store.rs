// In-memory vehicle collection, one list per company.
use chrono::{DateTime, Utc};
use shared::models::{MaintenanceRecord, Vehicle, VehicleStatus};
use std::collections::HashMap;

use crate::error::EngineError;

pub struct VehicleStore {
    // company id -> vehicles sorted by entry date
    data: HashMap<String, Vec<Vehicle>>,
}

impl VehicleStore {
    pub fn new() -> Self {
        VehicleStore { data: HashMap::new() }
    }

    /// Adds vehicles under their own company. A vehicle whose id is already
    /// stored replaces the stored copy. Returns how many were added or replaced.
    pub fn add_vehicles(&mut self, new_vehicles: Vec<Vehicle>) -> usize {
        let count = new_vehicles.len();
        for vehicle in new_vehicles {
            let company_data = self.data.entry(vehicle.company_id.clone()).or_default();
            match company_data.iter_mut().find(|v| v.id == vehicle.id) {
                Some(existing) => *existing = vehicle,
                None => company_data.push(vehicle),
            }
        }
        for company_data in self.data.values_mut() {
            company_data.sort_by_key(|v| v.entry_date);
        }
        tracing::debug!(count, companies = self.data.len(), "Stored vehicles");
        count
    }

    pub fn vehicles(&self, company_id: &str) -> &[Vehicle] {
        self.data.get(company_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn with_status(&self, company_id: &str, status: VehicleStatus) -> Vec<&Vehicle> {
        self.vehicles(company_id)
            .iter()
            .filter(|v| v.status == status)
            .collect()
    }

    pub fn available(&self, company_id: &str) -> Vec<&Vehicle> {
        self.with_status(company_id, VehicleStatus::Available)
    }

    pub fn sold(&self, company_id: &str) -> Vec<&Vehicle> {
        self.with_status(company_id, VehicleStatus::Sold)
    }

    pub fn get(&self, company_id: &str, vehicle_id: &str) -> Option<&Vehicle> {
        self.vehicles(company_id).iter().find(|v| v.id == vehicle_id)
    }

    pub fn companies(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.data.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    fn get_mut(&mut self, company_id: &str, vehicle_id: &str) -> Result<&mut Vehicle, EngineError> {
        self.data
            .get_mut(company_id)
            .and_then(|vehicles| vehicles.iter_mut().find(|v| v.id == vehicle_id))
            .ok_or_else(|| EngineError::vehicle_not_found(company_id, vehicle_id))
    }

    pub fn mark_sold(
        &mut self,
        company_id: &str,
        vehicle_id: &str,
        sold_at: DateTime<Utc>,
        salesperson_id: Option<String>,
    ) -> Result<(), EngineError> {
        let vehicle = self.get_mut(company_id, vehicle_id)?;
        vehicle.mark_sold(sold_at, salesperson_id)?;
        tracing::info!(company_id, vehicle_id, %sold_at, "Vehicle marked as sold");
        Ok(())
    }

    pub fn assign_salesperson(
        &mut self,
        company_id: &str,
        vehicle_id: &str,
        salesperson_id: Option<String>,
    ) -> Result<(), EngineError> {
        let vehicle = self.get_mut(company_id, vehicle_id)?;
        vehicle.salesperson_id = salesperson_id;
        Ok(())
    }

    pub fn remove_vehicle(&mut self, company_id: &str, vehicle_id: &str) -> Result<Vehicle, EngineError> {
        let vehicles = self
            .data
            .get_mut(company_id)
            .ok_or_else(|| EngineError::vehicle_not_found(company_id, vehicle_id))?;
        let pos = vehicles
            .iter()
            .position(|v| v.id == vehicle_id)
            .ok_or_else(|| EngineError::vehicle_not_found(company_id, vehicle_id))?;
        tracing::info!(company_id, vehicle_id, "Vehicle removed");
        Ok(vehicles.remove(pos))
    }

    pub fn add_maintenance(
        &mut self,
        company_id: &str,
        vehicle_id: &str,
        description: &str,
        cost: f64,
        date: DateTime<Utc>,
    ) -> Result<MaintenanceRecord, EngineError> {
        let vehicle = self.get_mut(company_id, vehicle_id)?;
        let record = vehicle.add_maintenance(description, cost, date).clone();
        tracing::debug!(company_id, vehicle_id, cost, "Maintenance recorded");
        Ok(record)
    }

    /// Removes one maintenance record. `Ok(None)` when the vehicle exists but
    /// has no such record.
    pub fn remove_maintenance(
        &mut self,
        company_id: &str,
        vehicle_id: &str,
        record_id: &str,
    ) -> Result<Option<MaintenanceRecord>, EngineError> {
        let vehicle = self.get_mut(company_id, vehicle_id)?;
        Ok(vehicle.remove_maintenance(record_id))
    }
}

impl Default for VehicleStore {
    fn default() -> Self {
        Self::new()
    }
}
