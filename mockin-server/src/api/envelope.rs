//! The `links`/`meta` envelope shared by Open Insurance responses.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use url::Url;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PAGE_SIZE: usize = 25;
const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

impl Links {
    pub fn to_self(url: String) -> Self {
        Self {
            self_link: url,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub total_records: usize,
    pub total_pages: usize,
}

impl Meta {
    pub fn single() -> Self {
        Self {
            total_records: 1,
            total_pages: 1,
        }
    }
}

/// Serializes timestamps as RFC 3339 with second precision, `2026-01-01T00:00:00Z`.
pub fn date_time<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// `page` and `page-size` query parameters
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number, starting at 1
    pub page: Option<usize>,
    #[serde(rename = "page-size")]
    #[param(rename = "page-size")]
    pub page_size: Option<usize>,
}

/// One page of a record list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub number: usize,
    pub size: usize,
    pub total_records: usize,
    pub total_pages: usize,
}

impl PageParams {
    pub fn paginate<T>(&self, records: Vec<T>) -> Page<T> {
        let number = self.page.filter(|page| *page > 0).unwrap_or(1);
        let size = self
            .page_size
            .filter(|size| *size > 0 && *size <= MAX_PAGE_SIZE)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let total_records = records.len();
        let total_pages = total_records.div_ceil(size);
        let records = records
            .into_iter()
            .skip((number - 1).saturating_mul(size))
            .take(size)
            .collect();

        Page {
            records,
            number,
            size,
            total_records,
            total_pages,
        }
    }
}

impl<T> Page<T> {
    pub fn meta(&self) -> Meta {
        Meta {
            total_records: self.total_records,
            total_pages: self.total_pages,
        }
    }

    /// Navigation links relative to `requested_url`.
    pub fn links(&self, requested_url: &str) -> Links {
        let link = |number: usize| -> Option<String> {
            let mut url = Url::parse(requested_url).ok()?;
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(name, _)| name != "page" && name != "page-size")
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("page", &number.to_string())
                .append_pair("page-size", &self.size.to_string());
            Some(url.to_string())
        };

        let mut links = Links::to_self(requested_url.to_string());
        if self.number > 1 {
            links.first = link(1);
            links.prev = link(self.number - 1);
        }
        if self.number < self.total_pages {
            links.next = link(self.number + 1);
            links.last = link(self.total_pages);
        }
        links
    }
}
