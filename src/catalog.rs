//! Fixed option lists shared by the registration flows.

use serde::Serialize;

/// A selectable option with a stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogOption {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
}

const fn option(id: &'static str, label: &'static str, description: &'static str) -> CatalogOption {
    CatalogOption {
        id,
        label,
        description,
    }
}

/// Clean-tech solution categories.
pub const SOLUTION_TYPES: &[CatalogOption] = &[
    option("energy", "Energy Management", "Efficiency and renewable solutions"),
    option("water", "Water Treatment", "Purification and management"),
    option("waste", "Waste Solutions", "Management and recycling"),
    option("analytics", "Analytics & Monitoring", "IoT and data analytics"),
    option("green-buildings", "Green Buildings", "Sustainable construction"),
    option("renewable", "Renewable Energy", "Solar, wind, clean energy"),
    option("carbon", "Carbon Capture & Offsetting", "Carbon reduction tech"),
    option("ev-charging", "EV Charging", "Electric vehicle infrastructure"),
    option("circular-economy", "Circular Economy", "Waste-to-value solutions"),
    option("other", "Other", "Custom solutions"),
];

/// Industries a clean-tech vendor can target.
pub const INDUSTRIES: &[&str] = &[
    "Manufacturing",
    "Real Estate",
    "Agriculture",
    "Transportation",
    "Utilities",
    "Finance",
    "Healthcare",
    "Education",
    "IT / Data Center",
    "Hospitality",
    "Retail",
    "Logistics",
    "Automotive",
    "Steel",
    "Cement",
    "Chemicals",
];

/// Geographic regions.
pub const REGIONS: &[CatalogOption] = &[
    option("IN", "India", ""),
    option("US", "United States", ""),
    option("EU", "European Union", ""),
    option("AE", "United Arab Emirates", ""),
    option("SEA", "Southeast Asia", ""),
    option("AF", "Africa", ""),
    option("SA", "South America", ""),
    option("OTHER", "Other", ""),
];

pub const FUNDING_STAGES: &[&str] = &[
    "Pre-seed",
    "Seed",
    "Series A",
    "Series B",
    "Series C+",
    "Growth/Expansion",
    "Bridge Financing",
];

pub const FUNDING_PURPOSES: &[&str] = &[
    "Product Development",
    "Market Expansion",
    "Team Building",
    "Manufacturing Scale-up",
    "R&D",
    "Marketing & Sales",
    "Working Capital",
    "Infrastructure",
];

/// Financing instruments an investor can offer.
pub const FINANCE_SUBTYPES: &[CatalogOption] = &[
    option("debt", "Debt Financing", "Loans and bonds that must be repaid"),
    option("equity", "Equity Investment", "Ownership stake in return for capital"),
    option("credit", "Credit Facilities", "Lines of credit and trade finance"),
    option(
        "project-finance",
        "Project Finance",
        "Financing for specific projects/assets",
    ),
];

pub const SECTORS: &[&str] = &[
    "Renewable Energy",
    "Energy Storage",
    "EV & Mobility",
    "Green Buildings",
    "Water & Wastewater",
    "Waste Management",
    "Carbon Capture",
    "Agriculture Tech",
    "Clean Manufacturing",
    "Circular Economy",
    "Climate Tech",
    "Sustainability Software",
];

pub const FINANCING_TYPES: &[&str] = &[
    "Early Stage",
    "Growth Stage",
    "Late Stage",
    "Debt",
    "Equity",
    "Mezzanine",
    "Project Finance",
    "Green Bonds",
    "Impact Investment",
];

pub const FUND_SIZES: &[&str] = &[
    "Under ₹10 Cr",
    "₹10-50 Cr",
    "₹50-100 Cr",
    "₹100-500 Cr",
    "₹500 Cr - ₹1000 Cr",
    "Above ₹1000 Cr",
];

/// A reporting location for the corporate ESG setup, with the frameworks
/// (by display name) that apply there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EsgLocation {
    pub id: &'static str,
    pub name: &'static str,
    pub code: &'static str,
    pub reporting_frameworks: &'static [&'static str],
}

pub const ESG_LOCATIONS: &[EsgLocation] = &[
    EsgLocation {
        id: "india",
        name: "India",
        code: "IN",
        reporting_frameworks: &["BRSR", "GRI"],
    },
    EsgLocation {
        id: "usa",
        name: "United States",
        code: "US",
        reporting_frameworks: &["SASB", "GRI", "TCFD"],
    },
    EsgLocation {
        id: "eu",
        name: "European Union",
        code: "EU",
        reporting_frameworks: &["TCFD", "ESRS", "GRI"],
    },
    EsgLocation {
        id: "uae",
        name: "United Arab Emirates",
        code: "AE",
        reporting_frameworks: &["GRI", "TCFD"],
    },
];

pub const ESG_INDUSTRIES: &[CatalogOption] = &[
    option("healthcare", "Healthcare", ""),
    option("real_estate", "Real Estate", ""),
    option("cement", "Cement", ""),
    option("steel", "Steel", ""),
    option("manufacturing", "Manufacturing", ""),
    option("logistics", "Logistics", ""),
    option("automotive", "Automotive", ""),
    option("education", "Education", ""),
    option("finance", "Finance", ""),
    option("it_datacenter", "IT / Data Center", ""),
];

/// An ESG reporting framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingFramework {
    pub id: &'static str,
    pub name: &'static str,
    pub full_name: &'static str,
}

pub const REPORTING_FRAMEWORKS: &[ReportingFramework] = &[
    ReportingFramework {
        id: "brsr",
        name: "BRSR",
        full_name: "Business Responsibility and Sustainability Reporting",
    },
    ReportingFramework {
        id: "gri",
        name: "GRI",
        full_name: "Global Reporting Initiative",
    },
    ReportingFramework {
        id: "sasb",
        name: "SASB",
        full_name: "Sustainability Accounting Standards Board",
    },
    ReportingFramework {
        id: "tcfd",
        name: "TCFD",
        full_name: "Task Force on Climate-related Financial Disclosures",
    },
    ReportingFramework {
        id: "esrs",
        name: "ESRS",
        full_name: "European Sustainability Reporting Standards",
    },
];

pub fn solution_type(id: &str) -> Option<&'static CatalogOption> {
    SOLUTION_TYPES.iter().find(|o| o.id == id)
}

pub fn esg_location(id: &str) -> Option<&'static EsgLocation> {
    ESG_LOCATIONS.iter().find(|l| l.id == id)
}

pub fn esg_industry(id: &str) -> Option<&'static CatalogOption> {
    ESG_INDUSTRIES.iter().find(|i| i.id == id)
}

pub fn reporting_framework(id: &str) -> Option<&'static ReportingFramework> {
    REPORTING_FRAMEWORKS.iter().find(|f| f.id == id)
}

/// Frameworks offered for a location, in catalog order. Empty for an
/// unknown location.
pub fn frameworks_for_location(location_id: &str) -> Vec<&'static ReportingFramework> {
    let Some(location) = esg_location(location_id) else {
        return Vec::new();
    };
    REPORTING_FRAMEWORKS
        .iter()
        .filter(|f| location.reporting_frameworks.contains(&f.name))
        .collect()
}

/// All option lists, as served by `GET /api/catalog`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub solution_types: &'static [CatalogOption],
    pub industries: &'static [&'static str],
    pub regions: &'static [CatalogOption],
    pub funding_stages: &'static [&'static str],
    pub funding_purposes: &'static [&'static str],
    pub finance_subtypes: &'static [CatalogOption],
    pub sectors: &'static [&'static str],
    pub financing_types: &'static [&'static str],
    pub fund_sizes: &'static [&'static str],
    pub esg_locations: &'static [EsgLocation],
    pub esg_industries: &'static [CatalogOption],
    pub reporting_frameworks: &'static [ReportingFramework],
}

pub fn catalog() -> Catalog {
    Catalog {
        solution_types: SOLUTION_TYPES,
        industries: INDUSTRIES,
        regions: REGIONS,
        funding_stages: FUNDING_STAGES,
        funding_purposes: FUNDING_PURPOSES,
        finance_subtypes: FINANCE_SUBTYPES,
        sectors: SECTORS,
        financing_types: FINANCING_TYPES,
        fund_sizes: FUND_SIZES,
        esg_locations: ESG_LOCATIONS,
        esg_industries: ESG_INDUSTRIES,
        reporting_frameworks: REPORTING_FRAMEWORKS,
    }
}
