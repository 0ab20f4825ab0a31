use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::utils::{brazilian_format, serde_dates};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    #[default]
    Available,
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub vehicle_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_amount")]
    pub cost: f64,
    #[serde(default, deserialize_with = "serde_dates::deserialize_option")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelType {
    Gasolina,
    Etanol,
    Flex,
    Diesel,
    #[serde(rename = "Híbrido")]
    Hibrido,
    #[serde(rename = "Elétrico")]
    Eletrico,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Transmission {
    Manual,
    #[serde(rename = "Automático")]
    Automatico,
    #[serde(rename = "CVT")]
    Cvt,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Traction {
    Dianteira,
    Traseira,
    #[serde(rename = "4x4")]
    FourByFour,
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FuelType::Gasolina => "Gasolina",
            FuelType::Etanol => "Etanol",
            FuelType::Flex => "Flex",
            FuelType::Diesel => "Diesel",
            FuelType::Hibrido => "Híbrido",
            FuelType::Eletrico => "Elétrico",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Transmission::Manual => "Manual",
            Transmission::Automatico => "Automático",
            Transmission::Cvt => "CVT",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Traction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Traction::Dianteira => "Dianteira",
            Traction::Traseira => "Traseira",
            Traction::FourByFour => "4x4",
        };
        f.write_str(label)
    }
}

/// Optional vehicle attributes a company can choose to show on stock cards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum VehicleField {
    ModelYear,
    FabricationYear,
    Renavam,
    Mileage,
    FuelType,
    Transmission,
    Traction,
    Doors,
    Occupants,
    Chassis,
    History,
    Revisions,
    StandardItems,
    AdditionalAccessories,
    DocumentStatus,
}

impl VehicleField {
    pub const ALL: [VehicleField; 15] = [
        VehicleField::ModelYear,
        VehicleField::FabricationYear,
        VehicleField::Renavam,
        VehicleField::Mileage,
        VehicleField::FuelType,
        VehicleField::Transmission,
        VehicleField::Traction,
        VehicleField::Doors,
        VehicleField::Occupants,
        VehicleField::Chassis,
        VehicleField::History,
        VehicleField::Revisions,
        VehicleField::StandardItems,
        VehicleField::AdditionalAccessories,
        VehicleField::DocumentStatus,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VehicleField::ModelYear => "Ano/Modelo",
            VehicleField::FabricationYear => "Ano Fabricação",
            VehicleField::Renavam => "RENAVAM",
            VehicleField::Mileage => "Quilometragem",
            VehicleField::FuelType => "Combustível",
            VehicleField::Transmission => "Câmbio",
            VehicleField::Traction => "Tração",
            VehicleField::Doors => "Nº de Portas",
            VehicleField::Occupants => "Nº de Ocupantes",
            VehicleField::Chassis => "Chassi",
            VehicleField::History => "Histórico",
            VehicleField::Revisions => "Revisões",
            VehicleField::StandardItems => "Itens de Série",
            VehicleField::AdditionalAccessories => "Acessórios Adicionais",
            VehicleField::DocumentStatus => "Situação Documental",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleDetails {
    pub model_year: Option<u16>,
    pub fabrication_year: Option<u16>,
    pub renavam: Option<String>,
    pub mileage: Option<u32>,
    pub fuel_type: Option<FuelType>,
    pub transmission: Option<Transmission>,
    pub traction: Option<Traction>,
    pub doors: Option<u8>,
    pub occupants: Option<u8>,
    pub chassis: Option<String>,
    pub history: Option<String>,
    pub revisions: Option<String>,
    pub standard_items: Option<String>,
    pub additional_accessories: Option<String>,
    pub document_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub plate: String,

    #[serde(default, deserialize_with = "brazilian_format::deserialize_amount")]
    pub purchase_price: f64,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_amount")]
    pub announced_price: f64,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_amount")]
    pub discount: f64,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_amount")]
    pub daily_cost: f64,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_amount")]
    pub ad_cost: f64,
    #[serde(default)]
    pub sale_goal_days: u32,

    #[serde(deserialize_with = "serde_dates::deserialize")]
    pub entry_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "serde_dates::deserialize_option")]
    pub sale_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub salesperson_id: Option<String>,

    #[serde(default, deserialize_with = "serde_dates::deserialize_option")]
    pub ipva_due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_optional_amount")]
    pub ipva_cost: Option<f64>,

    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub is_ad_active: bool,
    #[serde(default)]
    pub maintenance: Vec<MaintenanceRecord>,

    #[serde(flatten)]
    pub details: VehicleDetails,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VehicleError {
    #[error("vehicle {0} is already sold")]
    AlreadySold(String),

    #[error("vehicle {id} cannot be sold at {sold_at}, before its entry at {entry_date}")]
    SaleBeforeEntry {
        id: String,
        entry_date: DateTime<Utc>,
        sold_at: DateTime<Utc>,
    },
}

impl Vehicle {
    /// A freshly received vehicle: new id, available, in stock since `now`.
    pub fn intake(
        company_id: impl Into<String>,
        brand: impl Into<String>,
        model: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Vehicle {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.into(),
            brand: brand.into(),
            model: model.into(),
            category: String::new(),
            color: String::new(),
            plate: String::new(),
            purchase_price: 0.0,
            announced_price: 0.0,
            discount: 0.0,
            daily_cost: 0.0,
            ad_cost: 0.0,
            sale_goal_days: 0,
            entry_date: now,
            sale_date: None,
            status: VehicleStatus::Available,
            salesperson_id: None,
            ipva_due_date: None,
            ipva_cost: None,
            is_priority: false,
            is_ad_active: false,
            maintenance: Vec::new(),
            details: VehicleDetails::default(),
        }
    }

    /// "Brand Model", the key sales analytics group and filter models by.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }

    pub fn is_sold(&self) -> bool {
        self.status == VehicleStatus::Sold
    }

    pub fn sale_price(&self) -> f64 {
        self.announced_price - self.discount
    }

    pub fn maintenance_cost(&self) -> f64 {
        self.maintenance.iter().map(|m| m.cost).sum()
    }

    /// Sale price minus purchase price and every maintenance cost. Can be negative.
    pub fn profit(&self) -> f64 {
        self.sale_price() - (self.purchase_price + self.maintenance_cost())
    }

    /// Moves the vehicle to sold. A vehicle is sold exactly once.
    pub fn mark_sold(
        &mut self,
        sold_at: DateTime<Utc>,
        salesperson_id: Option<String>,
    ) -> Result<(), VehicleError> {
        if self.is_sold() || self.sale_date.is_some() {
            return Err(VehicleError::AlreadySold(self.id.clone()));
        }
        if sold_at < self.entry_date {
            return Err(VehicleError::SaleBeforeEntry {
                id: self.id.clone(),
                entry_date: self.entry_date,
                sold_at,
            });
        }
        self.status = VehicleStatus::Sold;
        self.sale_date = Some(sold_at);
        if salesperson_id.is_some() {
            self.salesperson_id = salesperson_id;
        }
        Ok(())
    }

    pub fn add_maintenance(
        &mut self,
        description: impl Into<String>,
        cost: f64,
        date: DateTime<Utc>,
    ) -> &MaintenanceRecord {
        self.maintenance.push(MaintenanceRecord {
            id: Uuid::new_v4().to_string(),
            vehicle_id: self.id.clone(),
            description: description.into(),
            cost,
            date: Some(date),
        });
        let last = self.maintenance.len() - 1;
        &self.maintenance[last]
    }

    pub fn remove_maintenance(&mut self, record_id: &str) -> Option<MaintenanceRecord> {
        let pos = self.maintenance.iter().position(|m| m.id == record_id)?;
        Some(self.maintenance.remove(pos))
    }

    /// Display value of an optional attribute. Empty text and zero counts
    /// are treated as absent.
    pub fn field_value(&self, field: VehicleField) -> Option<String> {
        let d = &self.details;
        let non_zero = |n: u32| (n != 0).then(|| n.to_string());
        let non_empty = |s: &Option<String>| s.as_ref().filter(|s| !s.trim().is_empty()).cloned();
        match field {
            VehicleField::ModelYear => d.model_year.and_then(|y| non_zero(y.into())),
            VehicleField::FabricationYear => d.fabrication_year.and_then(|y| non_zero(y.into())),
            VehicleField::Renavam => non_empty(&d.renavam),
            VehicleField::Mileage => d.mileage.and_then(non_zero),
            VehicleField::FuelType => d.fuel_type.map(|f| f.to_string()),
            VehicleField::Transmission => d.transmission.map(|t| t.to_string()),
            VehicleField::Traction => d.traction.map(|t| t.to_string()),
            VehicleField::Doors => d.doors.and_then(|n| non_zero(n.into())),
            VehicleField::Occupants => d.occupants.and_then(|n| non_zero(n.into())),
            VehicleField::Chassis => non_empty(&d.chassis),
            VehicleField::History => non_empty(&d.history),
            VehicleField::Revisions => non_empty(&d.revisions),
            VehicleField::StandardItems => non_empty(&d.standard_items),
            VehicleField::AdditionalAccessories => non_empty(&d.additional_accessories),
            VehicleField::DocumentStatus => non_empty(&d.document_status),
        }
    }

    /// Label/value pairs for the fields `company` shows that this vehicle has.
    pub fn visible_details(&self, company: &Company) -> Vec<(&'static str, String)> {
        company
            .visible_fields
            .iter()
            .filter_map(|field| self.field_value(*field).map(|value| (field.label(), value)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TeamRole {
    #[serde(rename = "Vendedor")]
    Salesperson,
    #[serde(rename = "Gestor de Tráfego")]
    TrafficManager,
    #[serde(rename = "Gestor")]
    Manager,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub monthly_sales_goal: u32,
    pub role: TeamRole,
}

impl TeamMember {
    pub fn is_salesperson(&self) -> bool {
        self.role == TeamRole::Salesperson
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub monthly_sales_goal: u32,
    #[serde(default, deserialize_with = "brazilian_format::deserialize_optional_amount")]
    pub monthly_ad_budget: Option<f64>,
    #[serde(default)]
    pub visible_fields: BTreeSet<VehicleField>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_intake_starts_available() {
        let v = Vehicle::intake("c1", "Fiat", "Argo", now());
        assert!(!v.id.is_empty());
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.entry_date, now());
        assert!(v.sale_date.is_none());
        assert_eq!(v.full_name(), "Fiat Argo");
    }

    #[test]
    fn test_mark_sold_exactly_once() {
        let mut v = Vehicle::intake("c1", "Fiat", "Argo", now());
        v.mark_sold(now() + Duration::days(3), Some("sp1".into())).unwrap();
        assert!(v.is_sold());
        assert_eq!(v.salesperson_id.as_deref(), Some("sp1"));

        let again = v.mark_sold(now() + Duration::days(4), None);
        assert_eq!(again, Err(VehicleError::AlreadySold(v.id.clone())));
        assert_eq!(v.sale_date, Some(now() + Duration::days(3)));
    }

    #[test]
    fn test_mark_sold_rejects_sale_before_entry() {
        let mut v = Vehicle::intake("c1", "Fiat", "Argo", now());
        let err = v.mark_sold(now() - Duration::days(1), None).unwrap_err();
        assert!(matches!(err, VehicleError::SaleBeforeEntry { .. }));
        assert!(!v.is_sold());
    }

    #[test]
    fn test_profit_includes_maintenance() {
        let mut v = Vehicle::intake("c1", "VW", "Gol", now());
        v.purchase_price = 30000.0;
        v.announced_price = 36000.0;
        v.discount = 1000.0;
        v.add_maintenance("Pneus", 2500.0, now());
        let record_id = v.add_maintenance("Funilaria", 4000.0, now()).id.clone();

        assert_eq!(v.sale_price(), 35000.0);
        assert_eq!(v.maintenance_cost(), 6500.0);
        assert_eq!(v.profit(), -1500.0);

        let removed = v.remove_maintenance(&record_id).unwrap();
        assert_eq!(removed.cost, 4000.0);
        assert_eq!(removed.vehicle_id, v.id);
        assert_eq!(v.profit(), 2500.0);
        assert!(v.remove_maintenance("missing").is_none());
    }

    #[test]
    fn test_deserialize_partial_record() {
        let json = r#"{
            "id": "v1",
            "brand": "Honda",
            "model": "Civic",
            "announcedPrice": "R$ 98.500,00",
            "dailyCost": 25,
            "entryDate": "2024-05-01",
            "saleDate": "",
            "ipvaDueDate": "2024-02-10T00:00:00.000Z",
            "ipvaCost": 1800,
            "fuelType": "Híbrido",
            "doors": 4
        }"#;
        let v: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(v.announced_price, 98500.0);
        assert_eq!(v.daily_cost, 25.0);
        assert_eq!(v.purchase_price, 0.0);
        assert_eq!(v.status, VehicleStatus::Available);
        assert!(v.sale_date.is_none());
        assert_eq!(v.ipva_cost, Some(1800.0));
        assert!(v.maintenance.is_empty());
        assert_eq!(v.details.fuel_type, Some(FuelType::Hibrido));
    }

    #[test]
    fn test_deserialize_rejects_bad_entry_date() {
        let json = r#"{ "id": "v1", "entryDate": "not a date" }"#;
        assert!(serde_json::from_str::<Vehicle>(json).is_err());
    }

    #[test]
    fn test_visible_details_skip_missing_values() {
        let mut v = Vehicle::intake("c1", "Jeep", "Compass", now());
        v.details.model_year = Some(2022);
        v.details.mileage = Some(0);
        v.details.transmission = Some(Transmission::Automatico);
        v.details.chassis = Some("  ".into());

        let company = Company {
            id: "c1".into(),
            name: "Loja".into(),
            is_active: true,
            monthly_sales_goal: 10,
            monthly_ad_budget: None,
            visible_fields: [
                VehicleField::Transmission,
                VehicleField::Mileage,
                VehicleField::ModelYear,
                VehicleField::Chassis,
            ]
            .into_iter()
            .collect(),
        };

        assert_eq!(
            v.visible_details(&company),
            vec![("Ano/Modelo", "2022".to_string()), ("Câmbio", "Automático".to_string())]
        );
    }

    #[test]
    fn test_every_field_has_a_distinct_label() {
        let labels: BTreeSet<&str> = VehicleField::ALL.iter().map(VehicleField::label).collect();
        assert_eq!(labels.len(), VehicleField::ALL.len());
    }

    #[test]
    fn test_team_role_wire_names() {
        let member: TeamMember = serde_json::from_str(
            r#"{ "id": "t1", "name": "Ana", "role": "Vendedor", "monthlySalesGoal": 8 }"#,
        )
        .unwrap();
        assert!(member.is_salesperson());
        assert_eq!(member.monthly_sales_goal, 8);
    }
}
