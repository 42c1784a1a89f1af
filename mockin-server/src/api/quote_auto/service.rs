use crate::api::quote_auto::models::{Quote, QuoteRequestData, QuoteStatus};
use crate::errors::ApiError;
use crate::store::{DocumentStore, Store, StoreError};
use crate::webhook::WebhookNotifier;
use consent_engine::Clock;
use log::{debug, error, info};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const NOT_INFORMED: &str = "NAO_INFORMADO";

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("could not auto quote for consent id {0}")]
    NotFound(String),
    #[error("the quote is not accepted")]
    NotAccepted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::NotFound(_) => ApiError::not_found(err),
            QuoteError::NotAccepted => ApiError::unprocessable(NOT_INFORMED, err),
            QuoteError::Store(err) => err.into(),
        }
    }
}

/// Auto insurance quotes, one per consent, evaluated lazily on each status read.
#[derive(Clone)]
pub struct QuoteAutoService {
    store: Store,
    webhooks: WebhookNotifier,
    clock: Arc<dyn Clock>,
}

impl QuoteAutoService {
    pub fn new(store: Store, webhooks: WebhookNotifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            webhooks,
            clock,
        }
    }

    fn key(consent_id: &str) -> String {
        format!("quote_auto:{consent_id}")
    }

    /// Registers a quote request. A previous quote for the consent is replaced.
    pub async fn create(&self, data: QuoteRequestData) -> Result<Quote, QuoteError> {
        let quote = Quote {
            id: Uuid::new_v4().to_string(),
            consent_id: data.consent_id.clone(),
            status: QuoteStatus::Rcvd,
            updated_at: self.clock.now(),
            data,
        };
        self.save(&quote).await?;
        info!("Received auto quote {} for consent {}", quote.id, quote.consent_id);
        Ok(quote)
    }

    /// Loads the quote and moves it one evaluation step forward. The client
    /// is notified when the status changed.
    pub async fn status(&self, client_id: &str, consent_id: &str) -> Result<Quote, QuoteError> {
        let mut quote = self.load(consent_id).await?;
        if quote.advance(self.clock.now()) {
            self.save(&quote).await?;
            debug!("Auto quote {} is now {:?}", quote.id, quote.status);
            self.webhooks
                .notify(client_id, &format!("/quote/v1/request/{consent_id}/quote-status"));
        }
        Ok(quote)
    }

    /// Acknowledges an accepted quote, or cancels it for any other status.
    pub async fn patch(&self, consent_id: &str, status: &str) -> Result<Quote, QuoteError> {
        let mut quote = self.load(consent_id).await?;
        quote.status = if status == "ACKN" {
            if quote.status != QuoteStatus::Acpt {
                debug!("Auto quote {} cannot be acknowledged in {:?}", quote.id, quote.status);
                return Err(QuoteError::NotAccepted);
            }
            QuoteStatus::Ackn
        } else {
            QuoteStatus::Canc
        };
        quote.updated_at = self.clock.now();
        self.save(&quote).await?;
        info!("Auto quote {} updated to {:?}", quote.id, quote.status);
        Ok(quote)
    }

    async fn load(&self, consent_id: &str) -> Result<Quote, QuoteError> {
        self.store
            .get::<Quote>(&Self::key(consent_id))
            .await
            .inspect_err(|err| error!("Failed to load auto quote for {}: {}", consent_id, err))?
            .ok_or_else(|| QuoteError::NotFound(consent_id.to_string()))
    }

    async fn save(&self, quote: &Quote) -> Result<(), QuoteError> {
        self.store
            .set(&Self::key(&quote.consent_id), quote)
            .await
            .inspect_err(|err| error!("Failed to save auto quote {}: {}", quote.id, err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_state, test_state_with_clock};
    use chrono::Duration;

    fn request(start: &str, end: &str) -> QuoteRequestData {
        serde_json::from_value(serde_json::json!({
            "consentId": "urn:mockin:1",
            "quoteData": {"termStartDate": start, "termEndDate": end},
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_status_walks_through_evaluation() {
        let state = test_state();
        let quotes = &state.quotes;
        quotes.create(request("2026-01-01", "2027-01-01")).await.unwrap();

        let first = quotes.status("mockin_client", "urn:mockin:1").await.unwrap();
        assert_eq!(first.status, QuoteStatus::Eval);
        let second = quotes.status("mockin_client", "urn:mockin:1").await.unwrap();
        assert_eq!(second.status, QuoteStatus::Acpt);
        let third = quotes.status("mockin_client", "urn:mockin:1").await.unwrap();
        assert_eq!(third, second);
    }

    #[tokio::test]
    async fn test_acknowledge_requires_acceptance() {
        let state = test_state();
        let quotes = &state.quotes;
        quotes.create(request("2026-01-01", "2027-01-01")).await.unwrap();

        assert!(matches!(
            quotes.patch("urn:mockin:1", "ACKN").await,
            Err(QuoteError::NotAccepted)
        ));

        quotes.status("mockin_client", "urn:mockin:1").await.unwrap();
        quotes.status("mockin_client", "urn:mockin:1").await.unwrap();
        let acknowledged = quotes.patch("urn:mockin:1", "ACKN").await.unwrap();
        assert_eq!(acknowledged.status, QuoteStatus::Ackn);
    }

    #[tokio::test]
    async fn test_other_status_cancels() {
        let state = test_state();
        state
            .quotes
            .create(request("2026-01-01", "2027-01-01"))
            .await
            .unwrap();
        let cancelled = state.quotes.patch("urn:mockin:1", "CANC").await.unwrap();
        assert_eq!(cancelled.status, QuoteStatus::Canc);
    }

    #[tokio::test]
    async fn test_unknown_quote() {
        let state = test_state();
        let err = state.quotes.status("mockin_client", "urn:mockin:2").await.unwrap_err();
        assert_eq!(err.to_string(), "could not auto quote for consent id urn:mockin:2");
        assert_eq!(ApiError::from(err).status_code, http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_update_uses_clock() {
        let (state, clock) = test_state_with_clock();
        let created = state
            .quotes
            .create(request("2026-01-01", "2027-01-01"))
            .await
            .unwrap();

        clock.advance(Duration::minutes(5));
        let evaluated = state.quotes.status("mockin_client", "urn:mockin:1").await.unwrap();
        assert_eq!(evaluated.updated_at, created.updated_at + Duration::minutes(5));
    }
}
