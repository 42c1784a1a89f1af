use crate::api::envelope::{date_time, Links, Meta};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteStatus {
    /// Received
    Rcvd,
    /// Under evaluation
    Eval,
    /// Accepted
    Acpt,
    /// Rejected
    Rjct,
    /// Acknowledged by the customer
    Ackn,
    /// Cancelled
    Canc,
}

/// Coverage period and the remaining free-form quote fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteData {
    pub term_start_date: NaiveDate,
    pub term_end_date: NaiveDate,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestData {
    pub consent_id: String,
    pub expiration_date_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<Object>)]
    pub quote_customer: Option<Value>,
    pub quote_data: QuoteData,
    #[schema(value_type = Option<Object>)]
    pub quote_custom_data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateQuoteRequest {
    pub data: QuoteRequestData,
}

/// A quote as kept in the store, keyed by consent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub consent_id: String,
    pub status: QuoteStatus,
    pub updated_at: DateTime<Utc>,
    pub data: QuoteRequestData,
}

impl Quote {
    /// Moves the quote one step through evaluation. Returns whether the
    /// status changed.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let next = match self.status {
            QuoteStatus::Rcvd => QuoteStatus::Eval,
            QuoteStatus::Eval
                if self.data.quote_data.term_end_date < self.data.quote_data.term_start_date =>
            {
                QuoteStatus::Rjct
            }
            QuoteStatus::Eval => QuoteStatus::Acpt,
            _ => return false,
        };
        self.status = next;
        self.updated_at = now;
        true
    }

    /// Whether the insurer's offer is visible to the customer.
    pub fn has_offer(&self) -> bool {
        matches!(self.status, QuoteStatus::Acpt | QuoteStatus::Ackn)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatusInfo {
    pub status: QuoteStatus,
    #[serde(serialize_with = "date_time")]
    pub status_update_date_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateQuoteResponse {
    pub data: QuoteStatusInfo,
    pub links: Links,
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AmountUnit {
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AmountDetails {
    pub amount: &'static str,
    pub unit: AmountUnit,
}

impl AmountDetails {
    fn fixed() -> Self {
        Self {
            amount: "100.00",
            unit: AmountUnit {
                code: "BR",
                description: "BRL",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PremiumInfo {
    pub payments_quantity: u32,
    pub total_premium_amount: AmountDetails,
    pub total_net_amount: AmountDetails,
    #[serde(rename = "IOF")]
    pub iof: AmountDetails,
    #[schema(value_type = Vec<Object>)]
    pub coverages: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub payments: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOffer {
    pub insurer_quote_id: String,
    pub susep_process_numbers: Vec<String>,
    pub premium_info: PremiumInfo,
    #[schema(value_type = Vec<Object>)]
    pub assistances: Vec<Value>,
}

impl QuoteOffer {
    /// The single canned offer of the mock insurer.
    pub fn for_quote(quote: &Quote) -> Self {
        Self {
            insurer_quote_id: quote.id.clone(),
            susep_process_numbers: vec!["123456789".to_string()],
            premium_info: PremiumInfo {
                payments_quantity: 6,
                total_premium_amount: AmountDetails::fixed(),
                total_net_amount: AmountDetails::fixed(),
                iof: AmountDetails::fixed(),
                coverages: Vec::new(),
                payments: Vec::new(),
            },
            assistances: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub quote_customer: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub quote_custom_data: Option<Value>,
    pub quotes: Vec<QuoteOffer>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStatusData {
    pub status: QuoteStatus,
    #[serde(serialize_with = "date_time")]
    pub status_update_date_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_info: Option<QuoteInfo>,
}

impl From<&Quote> for QuoteStatusData {
    fn from(quote: &Quote) -> Self {
        let quote_info = quote.has_offer().then(|| QuoteInfo {
            quote_customer: quote.data.quote_customer.clone(),
            quote_custom_data: quote.data.quote_custom_data.clone(),
            quotes: vec![QuoteOffer::for_quote(quote)],
        });
        Self {
            status: quote.status,
            status_update_date_time: quote.updated_at,
            quote_info,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteStatusResponse {
    pub data: QuoteStatusData,
    pub links: Links,
    pub meta: Meta,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchQuoteData {
    /// `ACKN` accepts the offer, anything else cancels the quote
    pub status: String,
    pub insurer_quote_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub author: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatchQuoteRequest {
    pub data: PatchQuoteData,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RedirectLinks {
    pub redirect: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchQuoteResponseData {
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurer_quote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<RedirectLinks>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatchQuoteResponse {
    pub data: PatchQuoteResponseData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quote(start: &str, end: &str) -> Quote {
        let data: QuoteRequestData = serde_json::from_value(serde_json::json!({
            "consentId": "urn:mockin:1",
            "quoteData": {"termStartDate": start, "termEndDate": end, "insuredObject": {"id": "car"}},
        }))
        .unwrap();
        Quote {
            id: "q-1".to_string(),
            consent_id: "urn:mockin:1".to_string(),
            status: QuoteStatus::Rcvd,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            data,
        }
    }

    #[test]
    fn test_advance_accepts_valid_term() {
        let mut quote = quote("2026-01-01", "2027-01-01");
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 1, 0).unwrap();

        assert!(quote.advance(now));
        assert_eq!(quote.status, QuoteStatus::Eval);
        assert!(quote.advance(now));
        assert_eq!(quote.status, QuoteStatus::Acpt);
        assert_eq!(quote.updated_at, now);
        assert!(!quote.advance(now));
        assert!(quote.has_offer());
    }

    #[test]
    fn test_advance_rejects_inverted_term() {
        let mut quote = quote("2027-01-01", "2026-01-01");
        let now = Utc::now();

        quote.advance(now);
        assert!(quote.advance(now));
        assert_eq!(quote.status, QuoteStatus::Rjct);
        assert!(!quote.has_offer());
    }

    #[test]
    fn test_quote_data_keeps_unknown_fields() {
        let quote = quote("2026-01-01", "2027-01-01");
        let json = serde_json::to_value(&quote.data.quote_data).unwrap();
        assert_eq!(json["insuredObject"]["id"], "car");
        assert_eq!(json["termStartDate"], "2026-01-01");
    }

    #[test]
    fn test_offer_wire_format() {
        let mut quote = quote("2026-01-01", "2027-01-01");
        quote.status = QuoteStatus::Acpt;
        let json = serde_json::to_value(QuoteStatusData::from(&quote)).unwrap();

        assert_eq!(json["status"], "ACPT");
        let offer = &json["quoteInfo"]["quotes"][0];
        assert_eq!(offer["insurerQuoteId"], "q-1");
        assert_eq!(offer["premiumInfo"]["paymentsQuantity"], 6);
        assert_eq!(offer["premiumInfo"]["IOF"]["unit"]["description"], "BRL");
    }
}
