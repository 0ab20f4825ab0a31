// Handler for the dashboard report of one company.
use super::StockService;
use crate::report::{DashboardReport, ReportRequest};

impl StockService {
    pub fn build_dashboard(&self, request: &ReportRequest) -> DashboardReport {
        let vehicles = self.store.vehicles(&request.company_id);
        if vehicles.is_empty() {
            tracing::warn!(company_id = %request.company_id, "No vehicles stored for company");
        }
        DashboardReport::build(vehicles, request, &self.settings, self.clock.now())
    }
}
