// Handler for registering a sale against the store.
use chrono::{DateTime, Utc};

use super::StockService;
use crate::error::EngineError;

impl StockService {
    pub fn record_sale(
        &mut self,
        company_id: &str,
        vehicle_id: &str,
        sold_at: DateTime<Utc>,
        salesperson_id: Option<String>,
    ) -> Result<(), EngineError> {
        self.store
            .mark_sold(company_id, vehicle_id, sold_at, salesperson_id)
            .map_err(|e| {
                tracing::warn!(company_id, vehicle_id, error = %e, "Sale rejected");
                e
            })
    }
}
