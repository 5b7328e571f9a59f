use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::ratings::{rating_image, rating_style, KnownRating, RatingStyle};

/// A food business as returned by the Business Query Service.
///
/// Every field but `id` and `name` may be missing in the FSA open data, so they
/// are all optional and default when absent from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address_1: Option<String>,
    #[serde(default)]
    pub address_2: Option<String>,
    #[serde(default)]
    pub address_3: Option<String>,
    #[serde(default)]
    pub address_4: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub local_authority: Option<String>,
    /// A new rating has been issued but not yet published.
    #[serde(default)]
    pub pending: Option<bool>,
    /// Inspection date as sent by the API (ISO date or date-time).
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub rating_key: Option<String>,
    #[serde(default)]
    pub rating_value: Option<String>,
}

impl Business {
    /// Position of the business, if it has a usable one.
    #[must_use]
    pub fn coordinates(&self) -> Option<LatLng> {
        let point = LatLng::new(self.latitude?, self.longitude?);
        point.is_valid().then_some(point)
    }

    /// Non-blank address lines followed by the postcode.
    pub fn address_lines(&self) -> impl Iterator<Item = &str> + '_ {
        [
            &self.address_1,
            &self.address_2,
            &self.address_3,
            &self.address_4,
            &self.postcode,
        ]
        .into_iter()
        .filter_map(|line| line.as_deref().map(str::trim))
        .filter(|line| !line.is_empty())
    }

    /// Parses the inspection date. Accepts `YYYY-MM-DD`, a naive ISO
    /// date-time, or an RFC 3339 timestamp.
    #[must_use]
    pub fn inspection_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|dt| dt.date())
            })
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }

    #[must_use]
    pub fn known_rating(&self) -> Option<KnownRating> {
        self.rating_value.as_deref().and_then(KnownRating::parse)
    }

    #[must_use]
    pub fn rating_style(&self) -> RatingStyle {
        rating_style(self.rating_value.as_deref())
    }

    #[must_use]
    pub fn rating_image(&self) -> Option<String> {
        rating_image(self.rating_key.as_deref())
    }
}
