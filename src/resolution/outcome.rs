use serde::Serialize;

use crate::config::DestinationsConfig;
use crate::types::ProviderKind;

/// Named places a finished flow can send the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Home,
    ProfileEdit,
    Login,
    AccountSetup(ProviderKind),
    RegistrationComplete(ProviderKind),
    RegistrationClosed(ProviderKind),
    /// A provider's own authorization page.
    Provider(String),
}

impl Destination {
    /// Concrete URL for this destination.
    #[must_use]
    pub fn url(&self, destinations: &DestinationsConfig) -> String {
        match self {
            Self::Home => destinations.home.clone(),
            Self::ProfileEdit => destinations.profile_edit.clone(),
            Self::Login => destinations.login.clone(),
            Self::AccountSetup(provider) => destinations.account_setup_for(*provider),
            Self::RegistrationComplete(provider) => destinations.registration_complete_for(*provider),
            Self::RegistrationClosed(provider) => destinations.registration_closed_for(*provider),
            Self::Provider(url) => url.clone(),
        }
    }
}

/// Result of resolving one verified identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Logged in as the identity's existing owner.
    Granted { user_id: i32, association_id: i32 },
    /// Identity staged in the session, waiting for registration details.
    Staged { provider: ProviderKind },
    /// Unknown identity while registration through the provider is closed.
    RegistrationClosed { provider: ProviderKind },
    /// Identity bound to the already logged-in user.
    Linked { user_id: i32, association_id: i32 },
}

impl Outcome {
    #[must_use]
    pub const fn destination(&self) -> Destination {
        match self {
            Self::Granted { .. } => Destination::Home,
            Self::Staged { provider } => Destination::AccountSetup(*provider),
            Self::RegistrationClosed { provider } => Destination::RegistrationClosed(*provider),
            Self::Linked { .. } => Destination::ProfileEdit,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Granted { .. } => "grant",
            Self::Staged { .. } => "stage_pending",
            Self::RegistrationClosed { .. } => "registration_closed",
            Self::Linked { .. } => "link",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destinations_resolve_against_config() {
        let config = DestinationsConfig::default();

        assert_eq!(Destination::Home.url(&config), "/");
        assert_eq!(Destination::ProfileEdit.url(&config), "/accounts/profile/edit");
        assert_eq!(
            Destination::AccountSetup(ProviderKind::Twitter).url(&config),
            "/accounts/twitter/setup"
        );
        assert_eq!(
            Destination::Provider("https://example.com/auth".into()).url(&config),
            "https://example.com/auth"
        );
    }

    #[test]
    fn test_outcome_destinations() {
        let staged = Outcome::Staged { provider: ProviderKind::Facebook };
        assert_eq!(staged.destination(), Destination::AccountSetup(ProviderKind::Facebook));
        assert_eq!(
            Outcome::Linked { user_id: 1, association_id: 2 }.destination(),
            Destination::ProfileEdit
        );
        assert_eq!(
            Outcome::Granted { user_id: 1, association_id: 2 }.destination(),
            Destination::Home
        );
    }
}
