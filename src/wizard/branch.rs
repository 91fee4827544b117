//! Where a flow goes next, chosen from a discriminant field.
//!
//! Every branch value maps to exactly one destination; the matches below are
//! exhaustive so a new variant cannot be left without a route.

use serde::Serialize;

use crate::forms::{Intent, RegistrationType};

pub const CLEANTECH_LISTING_ROUTE: &str = "/cleantech/add-listing";
pub const CLIMATE_FINANCE_REGISTRATION_ROUTE: &str = "/climate-finance/registration";
pub const CLIMATE_FINANCE_DASHBOARD_ROUTE: &str = "/climate-finance/dashboard";
pub const CORPORATE_REGISTRATION_ROUTE: &str = "/register";
pub const CORPORATE_ONBOARDING_ROUTE: &str = "/onboarding";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DestinationFlow {
    CleantechListing,
    ClimateFinanceRegistration,
    VendorRegistration,
    InvestorRegistration,
    ParticipantRegistration,
    ClimateFinanceDashboard,
    CorporateRegistration,
    CorporateOnboarding,
    EsgDashboard,
}

/// A flow to navigate to, and its client route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    pub flow: DestinationFlow,
    pub route: String,
}

impl Destination {
    fn new(flow: DestinationFlow, route: impl Into<String>) -> Self {
        Self {
            flow,
            route: route.into(),
        }
    }
}

/// Clean-tech goal → next flow.
pub fn resolve_intent(intent: Intent) -> Destination {
    match intent {
        Intent::Listing => Destination::new(DestinationFlow::CleantechListing, CLEANTECH_LISTING_ROUTE),
        Intent::Funding => Destination::new(
            DestinationFlow::ClimateFinanceRegistration,
            CLIMATE_FINANCE_REGISTRATION_ROUTE,
        ),
    }
}

/// Climate-finance registration type → variant sub-flow.
pub fn resolve_registration(kind: RegistrationType) -> Destination {
    let flow = match kind {
        RegistrationType::Vendor => DestinationFlow::VendorRegistration,
        RegistrationType::Investor => DestinationFlow::InvestorRegistration,
        RegistrationType::Participant => DestinationFlow::ParticipantRegistration,
    };
    Destination::new(flow, format!("{CLIMATE_FINANCE_REGISTRATION_ROUTE}/{kind}"))
}

pub fn climate_finance_dashboard() -> Destination {
    Destination::new(
        DestinationFlow::ClimateFinanceDashboard,
        CLIMATE_FINANCE_DASHBOARD_ROUTE,
    )
}

pub fn corporate_registration() -> Destination {
    Destination::new(
        DestinationFlow::CorporateRegistration,
        CORPORATE_REGISTRATION_ROUTE,
    )
}

pub fn corporate_onboarding() -> Destination {
    Destination::new(DestinationFlow::CorporateOnboarding, CORPORATE_ONBOARDING_ROUTE)
}

/// The parameterized ESG dashboard for a configured company.
pub fn esg_dashboard_route(location: &str, industry: &str, framework: &str) -> String {
    format!("{DASHBOARD_ROUTE}/{location}/{industry}/{framework}")
}

pub fn esg_dashboard(location: &str, industry: &str, framework: &str) -> Destination {
    Destination::new(
        DestinationFlow::EsgDashboard,
        esg_dashboard_route(location, industry, framework),
    )
}
