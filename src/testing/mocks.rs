//! # Mocks
//!
//! mockall stand-in for a provider adapter, for driving the HTTP flow without
//! a provider on the other end.

use async_trait::async_trait;
use mockall::mock;

use crate::provider::{AuthorizationRequest, CallbackParams, PendingHandshake, ProviderClient, ProviderError};
use crate::types::{ProviderKind, VerifiedIdentity};

mock! {
    pub Provider {}

    #[async_trait]
    impl ProviderClient for Provider {
        fn kind(&self) -> ProviderKind;
        async fn begin(&self, return_url: &str) -> Result<AuthorizationRequest, ProviderError>;
        async fn complete(
            &self,
            params: &CallbackParams,
            handshake: Option<PendingHandshake>,
        ) -> Result<VerifiedIdentity, ProviderError>;
    }
}

/// A mock for `kind` whose `begin` hands out an OAuth2-style handshake with
/// state `"state-1"`.
#[must_use]
pub fn mock_provider(kind: ProviderKind) -> MockProvider {
    let mut provider = MockProvider::new();
    provider.expect_kind().return_const(kind);
    provider.expect_begin().returning(move |return_url| {
        Ok(AuthorizationRequest {
            redirect_url: format!("https://{kind}.example.com/authorize?state=state-1"),
            handshake: PendingHandshake::OAuth2 {
                state: "state-1".to_string(),
                redirect_url: return_url.to_string(),
            },
        })
    });
    provider
}
