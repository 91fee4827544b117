//! Named storage slots and the scope each one lives in.

use serde::Serialize;

/// Lifetime of a slot's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Lasts for the visitor's browsing session.
    Session,
    /// Persists across sessions.
    Durable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    CleantechRegistration,
    FundingRequests,
    ClimateInvestors,
    ClimateParticipants,
    RegistrationData,
    DashboardConfig,
    OnboardingData,
    Cart,
    ComplianceProgress,
}

impl Slot {
    pub const ALL: [Slot; 9] = [
        Slot::CleantechRegistration,
        Slot::FundingRequests,
        Slot::ClimateInvestors,
        Slot::ClimateParticipants,
        Slot::RegistrationData,
        Slot::DashboardConfig,
        Slot::OnboardingData,
        Slot::Cart,
        Slot::ComplianceProgress,
    ];

    /// Stable storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::CleantechRegistration => "cleantech-registration",
            Self::FundingRequests => "funding-requests",
            Self::ClimateInvestors => "climate-investors",
            Self::ClimateParticipants => "climate-participants",
            Self::RegistrationData => "registrationData",
            Self::DashboardConfig => "dashboardConfig",
            Self::OnboardingData => "onboardingData",
            Self::Cart => "ploxi-cart",
            Self::ComplianceProgress => "complianceProgress",
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Self::CleantechRegistration
            | Self::FundingRequests
            | Self::ClimateInvestors
            | Self::ClimateParticipants => Scope::Session,
            Self::RegistrationData
            | Self::DashboardConfig
            | Self::OnboardingData
            | Self::Cart
            | Self::ComplianceProgress => Scope::Durable,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_are_unique() {
        let keys: HashSet<_> = Slot::ALL.iter().map(Slot::key).collect();
        assert_eq!(keys.len(), Slot::ALL.len());
    }

    #[test]
    fn scopes() {
        assert_eq!(Slot::CleantechRegistration.scope(), Scope::Session);
        assert_eq!(Slot::ClimateInvestors.scope(), Scope::Session);
        assert_eq!(Slot::RegistrationData.scope(), Scope::Durable);
        assert_eq!(Slot::Cart.key(), "ploxi-cart");
        assert_eq!(Slot::DashboardConfig.to_string(), "dashboardConfig");
    }
}
