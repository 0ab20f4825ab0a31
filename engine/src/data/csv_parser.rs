use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{Vehicle, VehicleError, VehicleStatus};
use shared::utils::brazilian_format;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use uuid::Uuid;

use crate::error::EngineError;

type Result<T> = std::result::Result<T, EngineError>;

fn csv_data_error(message: String) -> EngineError {
    EngineError::CsvDataFormatError(message)
}

// Keeps the io::ErrorKind but names the file in the message.
fn open_error(kind: &str, file_path: &Path, err: io::Error) -> EngineError {
    let message = format!("Failed to open {} file '{}': {}", kind, file_path.display(), err);
    io::Error::new(err.kind(), message).into()
}

pub struct VehicleCsvParser;

impl VehicleCsvParser {
    // CSV Header (order free, only brand;model;entryDate required):
    // id;companyId;brand;model;category;color;plate;purchasePrice;announcedPrice;discount;dailyCost;adCost;
    // saleGoalDays;entryDate;saleDate;status;salespersonId;ipvaDueDate;ipvaCost;isPriority;isAdActive;
    // maintenanceCost;modelYear;fabricationYear;mileage
    // Example Row: v1;c1;Fiat;Argo;Hatch;Prata;ABC1D23;R$ 62.000,00;74.900,00;900,00;20,00;10,00;45;01/03/2024;;available;sp1;;;false;true;;2022;2021;35.000
    pub fn load_vehicles_from_csv(file_path: &Path, default_company: &str) -> Result<Vec<Vehicle>> {
        let file = File::open(file_path).map_err(|e| open_error("CSV", file_path, e))?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let mut vehicles = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result?;
            if record.iter().all(|field| field.is_empty()) {
                tracing::warn!(line, "Skipping empty CSV record");
                continue;
            }
            vehicles.push(Self::parse_record(&record, &headers, line, default_company)?);
        }

        tracing::info!(path = %file_path.display(), count = vehicles.len(), "Loaded vehicles from CSV");
        Ok(vehicles)
    }

    fn parse_record(
        record: &StringRecord,
        headers: &StringRecord,
        line: usize,
        default_company: &str,
    ) -> Result<Vehicle> {
        let brand = Self::required(record, headers, "brand", line)?;
        let model = Self::required(record, headers, "model", line)?;
        let entry_str = Self::required(record, headers, "entryDate", line)?;
        let entry_date = brazilian_format::parse_date(entry_str)
            .ok_or_else(|| {
                csv_data_error(format!("Error parsing 'entryDate' at line {}: invalid date '{}'", line, entry_str))
            })?;

        let company = Self::get_field(record, headers, "companyId")
            .filter(|value| !value.is_empty())
            .unwrap_or(default_company);

        let mut vehicle = Vehicle::intake(company, brand, model, entry_date);
        if let Some(id) = Self::get_field(record, headers, "id").filter(|value| !value.is_empty()) {
            vehicle.id = id.to_string();
        }
        vehicle.category = Self::text(record, headers, "category");
        vehicle.color = Self::text(record, headers, "color");
        vehicle.plate = Self::text(record, headers, "plate");

        vehicle.purchase_price = Self::amount(record, headers, "purchasePrice", line)?.unwrap_or(0.0);
        vehicle.announced_price = Self::amount(record, headers, "announcedPrice", line)?.unwrap_or(0.0);
        vehicle.discount = Self::amount(record, headers, "discount", line)?.unwrap_or(0.0);
        vehicle.daily_cost = Self::amount(record, headers, "dailyCost", line)?.unwrap_or(0.0);
        vehicle.ad_cost = Self::amount(record, headers, "adCost", line)?.unwrap_or(0.0);
        vehicle.ipva_cost = Self::amount(record, headers, "ipvaCost", line)?;
        vehicle.sale_goal_days = Self::integer(record, headers, "saleGoalDays", line)?.unwrap_or(0);

        vehicle.ipva_due_date = Self::date(record, headers, "ipvaDueDate", line)?;
        vehicle.salesperson_id = Self::get_field(record, headers, "salespersonId")
            .filter(|value| !value.is_empty())
            .map(String::from);
        vehicle.is_priority = Self::flag(record, headers, "isPriority", line)?;
        vehicle.is_ad_active = Self::flag(record, headers, "isAdActive", line)?;

        vehicle.details.model_year = Self::integer(record, headers, "modelYear", line)?;
        vehicle.details.fabrication_year = Self::integer(record, headers, "fabricationYear", line)?;
        vehicle.details.mileage = Self::integer(record, headers, "mileage", line)?;

        if let Some(cost) = Self::amount(record, headers, "maintenanceCost", line)? {
            if cost != 0.0 {
                vehicle.add_maintenance("Manutenção", cost, entry_date);
            }
        }

        let sale_date = Self::date(record, headers, "saleDate", line)?;
        let status = Self::status(record, headers, line)?;
        Self::apply_sale(&mut vehicle, status, sale_date, line)?;

        Ok(vehicle)
    }

    fn apply_sale(
        vehicle: &mut Vehicle,
        status: Option<VehicleStatus>,
        sale_date: Option<DateTime<Utc>>,
        line: usize,
    ) -> Result<()> {
        match (status, sale_date) {
            (Some(VehicleStatus::Sold), None) => {
                Err(csv_data_error(format!("Sold vehicle without 'saleDate' in CSV record at line {}", line)))
            }
            (Some(VehicleStatus::Sold), Some(sold_at)) | (None, Some(sold_at)) => {
                let salesperson = vehicle.salesperson_id.clone();
                vehicle
                    .mark_sold(sold_at, salesperson)
                    .map_err(|e| csv_data_error(format!("Invalid sale in CSV record at line {}: {}", line, e)))
            }
            (Some(VehicleStatus::Available), Some(_)) => {
                tracing::warn!(line, vehicle_id = %vehicle.id, "Ignoring 'saleDate' of available vehicle");
                Ok(())
            }
            (Some(VehicleStatus::Available), None) | (None, None) => Ok(()),
        }
    }

    fn status(record: &StringRecord, headers: &StringRecord, line: usize) -> Result<Option<VehicleStatus>> {
        match Self::get_field(record, headers, "status").map(str::to_lowercase).as_deref() {
            None | Some("") => Ok(None),
            Some("available") | Some("disponivel") | Some("disponível") => Ok(Some(VehicleStatus::Available)),
            Some("sold") | Some("vendido") => Ok(Some(VehicleStatus::Sold)),
            Some(other) => Err(csv_data_error(format!(
                "Error parsing 'status' at line {}: unknown status '{}'",
                line, other
            ))),
        }
    }

    fn required<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        Self::get_field(record, headers, name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| csv_data_error(format!("Missing '{}' field in CSV record at line {}", name, line)))
    }

    fn text(record: &StringRecord, headers: &StringRecord, name: &str) -> String {
        Self::get_field(record, headers, name).unwrap_or_default().to_string()
    }

    // Brazilian decimals with an optional "R$" prefix. Empty means absent.
    fn amount(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<Option<f64>> {
        match Self::get_field(record, headers, name).filter(|value| !value.is_empty()) {
            None => Ok(None),
            Some(raw) => {
                let cleaned = raw.replace(brazilian_format::CURRENCY_SYMBOL, "");
                brazilian_format::parse_decimal(&cleaned)
                    .map(Some)
                    .map_err(|e| csv_data_error(format!("Error parsing '{}' at line {}: {}", name, line, e)))
            }
        }
    }

    // Whole numbers, '.' allowed as thousands separator.
    fn integer<T: std::str::FromStr>(
        record: &StringRecord,
        headers: &StringRecord,
        name: &str,
        line: usize,
    ) -> Result<Option<T>>
    where
        T::Err: std::fmt::Display,
    {
        match Self::get_field(record, headers, name).filter(|value| !value.is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .replace('.', "")
                .parse::<T>()
                .map(Some)
                .map_err(|e| csv_data_error(format!("Error parsing '{}' at line {}: {}", name, line, e))),
        }
    }

    fn date(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<Option<DateTime<Utc>>> {
        match Self::get_field(record, headers, name).filter(|value| !value.is_empty()) {
            None => Ok(None),
            Some(raw) => brazilian_format::parse_date(raw)
                .map(Some)
                .ok_or_else(|| {
                    csv_data_error(format!("Error parsing '{}' at line {}: invalid date '{}'", name, line, raw))
                }),
        }
    }

    fn flag(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<bool> {
        match Self::get_field(record, headers, name).map(str::to_lowercase).as_deref() {
            None | Some("") => Ok(false),
            Some("true") | Some("1") | Some("sim") | Some("s") => Ok(true),
            Some("false") | Some("0") | Some("não") | Some("nao") | Some("n") => Ok(false),
            Some(other) => Err(csv_data_error(format!(
                "Error parsing '{}' at line {}: not a yes/no value '{}'",
                name, line, other
            ))),
        }
    }

    // Looks a field up by header name; None when the column is absent.
    fn get_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .position(|header| header == name)
            .and_then(|pos| record.get(pos))
    }
}

/// Reads a JSON array of vehicles. Records without a company get
/// `default_company`, records without an id get a fresh one. Sold records
/// must carry a sale date no earlier than their entry date.
pub fn load_vehicles_from_json(file_path: &Path, default_company: &str) -> Result<Vec<Vehicle>> {
    let file = File::open(file_path).map_err(|e| open_error("JSON", file_path, e))?;
    let mut vehicles: Vec<Vehicle> = serde_json::from_reader(BufReader::new(file))?;

    for vehicle in &mut vehicles {
        if vehicle.company_id.is_empty() {
            vehicle.company_id = default_company.to_string();
        }
        if vehicle.id.is_empty() {
            vehicle.id = Uuid::new_v4().to_string();
        }
        if vehicle.sale_date.is_some() && vehicle.status == VehicleStatus::Available {
            tracing::warn!(vehicle_id = %vehicle.id, "Ignoring 'saleDate' of available vehicle");
            vehicle.sale_date = None;
        }
        match vehicle.sale_date {
            None if vehicle.is_sold() => {
                return Err(EngineError::JsonDataFormatError(format!(
                    "Sold vehicle '{}' has no 'saleDate'",
                    vehicle.id
                )));
            }
            Some(sold_at) if sold_at < vehicle.entry_date => {
                let err = VehicleError::SaleBeforeEntry {
                    id: vehicle.id.clone(),
                    entry_date: vehicle.entry_date,
                    sold_at,
                };
                return Err(EngineError::JsonDataFormatError(err.to_string()));
            }
            _ => {}
        }
    }

    tracing::info!(path = %file_path.display(), count = vehicles.len(), "Loaded vehicles from JSON");
    Ok(vehicles)
}

/// Picks the reader from the file extension: `.json` or anything else as CSV.
pub fn load_vehicles(file_path: &Path, default_company: &str) -> Result<Vec<Vehicle>> {
    let is_json = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        load_vehicles_from_json(file_path, default_company)
    } else {
        VehicleCsvParser::load_vehicles_from_csv(file_path, default_company)
    }
}
