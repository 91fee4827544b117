//! Navigation bar rules: the dynamic "Dashboard" link, where the bar is
//! hidden, and which item is highlighted.

use serde::{Deserialize, Serialize};

use crate::wizard::branch::{DASHBOARD_ROUTE, esg_dashboard_route};

/// Routes that render without the navigation bar.
pub const HIDDEN_NAVBAR_ROUTES: &[&str] = &[
    "/",
    "/cleantech",
    "/climate-finance",
    "/cleantech/registration",
    "/cleantech/add-listing",
    "/cleantech/dashboard",
    "/climate-finance/dashboard",
    "/climate-finance/registration",
    "/climate-finance/investor-registration",
    "/climate-finance/consultation",
];

const MARKETPLACE_ROUTE: &str = "/marketplace";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdRef {
    pub id: String,
}

/// The parts of a stored dashboard configuration the link needs. Other
/// fields are ignored and missing parts read as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardTarget {
    pub location: Option<IdRef>,
    pub industry: Option<IdRef>,
    pub framework: Option<IdRef>,
}

impl DashboardTarget {
    fn route(&self) -> Option<String> {
        let location = self.location.as_ref()?;
        let industry = self.industry.as_ref()?;
        let framework = self.framework.as_ref()?;
        Some(esg_dashboard_route(&location.id, &industry.id, &framework.id))
    }
}

/// "Dashboard" href: the current dashboard page if already on one, else the
/// configured company dashboard, else the generic dashboard.
pub fn dashboard_link(path: &str, config: Option<&DashboardTarget>) -> String {
    if path.starts_with("/dashboard/") {
        return path.to_string();
    }
    config
        .and_then(DashboardTarget::route)
        .unwrap_or_else(|| DASHBOARD_ROUTE.to_string())
}

pub fn navbar_visible(path: &str) -> bool {
    !HIDDEN_NAVBAR_ROUTES.contains(&path)
}

/// Whether the item linking to `href` is highlighted on `path`.
pub fn is_active(href: &str, path: &str) -> bool {
    if href.starts_with(DASHBOARD_ROUTE) {
        return path.starts_with(DASHBOARD_ROUTE);
    }
    if href == MARKETPLACE_ROUTE {
        return path == MARKETPLACE_ROUTE || path.starts_with("/vendor");
    }
    path.starts_with(href)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub href: String,
    pub active: bool,
}

/// The bar's items for `path`, with the resolved dashboard href.
pub fn nav_items(path: &str, dashboard_href: &str) -> Vec<NavItem> {
    [
        ("Dashboard", dashboard_href),
        ("Benchmarking", "/benchmarking"),
        ("Marketplace", MARKETPLACE_ROUTE),
        ("Compliance", "/compliance"),
        ("Services", "/services"),
    ]
    .into_iter()
    .map(|(name, href)| NavItem {
        name,
        href: href.to_string(),
        active: is_active(href, path),
    })
    .collect()
}
