//! Pending identity staging: at most one per session, consumed exactly once.

use super::Session;
use crate::error::{AppError, Result};
use crate::types::PendingIdentity;
use crate::{ldebug, logging::{LogComponent, LogStage}};

impl Session {
    /// Stage an identity for registration, replacing any earlier one.
    pub async fn stage(&self, pending: PendingIdentity) {
        ldebug!(
            self.id(),
            LogStage::Session,
            LogComponent::Session,
            "stage",
            "pending identity staged",
            provider = pending.provider.as_str()
        );
        self.with_data(|data| data.pending = Some(pending)).await;
    }

    /// Take the staged identity, leaving nothing behind.
    pub async fn consume(&self) -> Result<PendingIdentity> {
        self.with_data(|data| data.pending.take())
            .await
            .ok_or_else(|| AppError::not_found("no pending identity in session"))
    }

    /// Look at the staged identity without consuming it.
    pub async fn peek_pending(&self) -> Option<PendingIdentity> {
        self.with_data(|data| data.pending.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::session::Session;
    use crate::testing::pending_identity;
    use crate::types::ProviderKind;

    #[tokio::test]
    async fn test_consume_is_one_shot() {
        let session = Session::detached();
        session.stage(pending_identity(ProviderKind::Twitter, "120889797")).await;

        let first = session.consume().await.unwrap();
        assert_eq!(first.external_id, "120889797");
        assert!(matches!(session.consume().await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_stage_overwrites_previous() {
        let session = Session::detached();
        session.stage(pending_identity(ProviderKind::Twitter, "1")).await;
        session.stage(pending_identity(ProviderKind::Facebook, "2")).await;

        let pending = session.peek_pending().await.unwrap();
        assert_eq!(pending.provider, ProviderKind::Facebook);
        assert_eq!(session.consume().await.unwrap().external_id, "2");
        assert!(session.peek_pending().await.is_none());
    }

    #[tokio::test]
    async fn test_consume_without_stage_is_not_found() {
        let session = Session::detached();
        assert!(matches!(session.consume().await, Err(AppError::NotFound { .. })));
    }
}
