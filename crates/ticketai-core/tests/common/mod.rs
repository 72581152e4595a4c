use std::sync::Arc;

use ticketai_core::{PlanValidator, QueryPlan, ValidatedPlan, ValidationError, ViewRegistry};

pub const TICKETS: &str = "vw_Tickets_AI_Report";
pub const USERS: &str = "vw_Users_AI_Safe";
pub const PRODUCTS: &str = "vw_Products_AI_Safe";

/// Registry with the three shipped views
#[allow(dead_code)]
pub fn registry() -> Arc<ViewRegistry> {
    Arc::new(ViewRegistry::new([TICKETS, USERS, PRODUCTS], 50, "main").unwrap())
}

#[allow(dead_code)]
pub fn validator() -> PlanValidator {
    PlanValidator::new(registry())
}

/// Validate a plan built from raw parts
#[allow(dead_code)]
pub fn validate(view: &str, fragment: &str) -> Result<ValidatedPlan, ValidationError> {
    validator().validate(&QueryPlan::new(view, fragment))
}
