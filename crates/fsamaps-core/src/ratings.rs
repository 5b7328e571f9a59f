//! Rating value and rating key resolution.
//!
//! The FSA open data carries two rating fields per business: a free-form
//! `RatingValue` (`"5"`, `"Pass and Eat Safe"`, `"AwaitingInspection"`, ...)
//! and a machine-readable `RatingKey` (`fhrs_5_en-gb`, `fhis_pass`, ...).
//! [`rating_style`] turns the former into display tokens and [`rating_image`]
//! turns the latter into the path of the matching badge asset. Neither ever
//! fails: anything unrecognised resolves to [`DEFAULT_RATING_STYLE`] or `None`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Display tokens for a rating: a colour class plus short and long labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingStyle {
    pub colour: &'static str,
    pub short_text: &'static str,
    pub long_text: &'static str,
}

pub const DEFAULT_RATING_STYLE: RatingStyle = RatingStyle {
    colour: "bg-gray-500",
    short_text: "N/A",
    long_text: "N/A",
};

const LOCALES: [&str; 2] = ["en-gb", "cy-gb"];

/// The closed set of rating values the map knows how to style and filter on.
///
/// Declaration order is the display order: FHRS scores best-first, then the
/// FHIS outcomes, then the administrative states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KnownRating {
    Five,
    Four,
    Three,
    Two,
    One,
    Zero,
    Pass,
    PassAndEatSafe,
    ImprovementRequired,
    Exempt,
    AwaitingPublication,
    AwaitingInspection,
}

impl KnownRating {
    pub const ALL: [KnownRating; 12] = [
        KnownRating::Five,
        KnownRating::Four,
        KnownRating::Three,
        KnownRating::Two,
        KnownRating::One,
        KnownRating::Zero,
        KnownRating::Pass,
        KnownRating::PassAndEatSafe,
        KnownRating::ImprovementRequired,
        KnownRating::Exempt,
        KnownRating::AwaitingPublication,
        KnownRating::AwaitingInspection,
    ];

    /// Normalized token, as sent in the `ratings` query parameter.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            KnownRating::Five => "5",
            KnownRating::Four => "4",
            KnownRating::Three => "3",
            KnownRating::Two => "2",
            KnownRating::One => "1",
            KnownRating::Zero => "0",
            KnownRating::Pass => "pass",
            KnownRating::PassAndEatSafe => "passandeatsafe",
            KnownRating::ImprovementRequired => "improvementrequired",
            KnownRating::Exempt => "exempt",
            KnownRating::AwaitingPublication => "awaitingpublication",
            KnownRating::AwaitingInspection => "awaitinginspection",
        }
    }

    #[must_use]
    pub const fn style(self) -> RatingStyle {
        let (colour, short_text, long_text) = match self {
            KnownRating::Five => ("bg-green-600", "5", "5"),
            KnownRating::Four => ("bg-lime-500", "4", "4"),
            KnownRating::Three => ("bg-yellow-400", "3", "3"),
            KnownRating::Two => ("bg-orange-400", "2", "2"),
            KnownRating::One => ("bg-orange-700", "1", "1"),
            KnownRating::Zero => ("bg-red-800", "0", "0"),
            KnownRating::Pass => ("bg-blue-500", "P", "Pass"),
            KnownRating::PassAndEatSafe => ("bg-blue-300", "PES", "Pass and Eat Safe"),
            KnownRating::ImprovementRequired => ("bg-red-600", "ImR", "Improvement Required"),
            KnownRating::Exempt => ("bg-gray-500", "Ex", "Exempt"),
            KnownRating::AwaitingPublication => ("bg-gray-400", "AwP", "Awaiting Publication"),
            KnownRating::AwaitingInspection => ("bg-gray-600", "AwI", "Awaiting Inspection"),
        };
        RatingStyle {
            colour,
            short_text,
            long_text,
        }
    }

    /// Resolves a raw rating value, ignoring case and all whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_value(raw);
        Self::ALL
            .into_iter()
            .find(|rating| rating.token() == normalized)
    }
}

impl fmt::Display for KnownRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rating '{0}'")]
pub struct UnknownRating(pub String);

impl FromStr for KnownRating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRating(s.trim().to_string()))
    }
}

/// Lowercases and strips every whitespace character, so `" Pass and Eat Safe "`
/// becomes `passandeatsafe`.
fn normalize_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns the display style for a raw rating value.
///
/// Absent, empty, and unrecognised values all map to [`DEFAULT_RATING_STYLE`].
#[must_use]
pub fn rating_style(value: Option<&str>) -> RatingStyle {
    value
        .and_then(KnownRating::parse)
        .map_or(DEFAULT_RATING_STYLE, KnownRating::style)
}

/// Derives the badge image path for a rating key.
///
/// `fhis_<rating>` keys map to `/fhis/fhis_<rating>.jpg` and
/// `fhrs_<rating>_<locale>` keys map to `/fhrs/fhrs_<rating>_<locale>.svg`.
/// Returns `None` for unknown schemes, keys with fewer than two tokens, an
/// empty rating segment, or an FHRS key without a locale (no such asset
/// exists).
#[must_use]
pub fn rating_image(key: Option<&str>) -> Option<String> {
    let key = key?.trim().to_lowercase();
    let parts: Vec<&str> = key.split('_').collect();
    if parts.len() < 2 {
        return None;
    }

    let scheme = parts[0];
    let last = parts[parts.len() - 1];
    let locale = LOCALES.contains(&last).then_some(last);
    let rating_parts = if locale.is_some() {
        &parts[1..parts.len() - 1]
    } else {
        &parts[1..]
    };
    let rating = rating_parts.join("_");
    if rating.is_empty() {
        return None;
    }

    match (scheme, locale) {
        ("fhis", _) => Some(format!("/fhis/fhis_{rating}.jpg")),
        ("fhrs", Some(locale)) => Some(format!("/fhrs/fhrs_{rating}_{locale}.svg")),
        _ => None,
    }
}

/// A set of selected rating filters.
///
/// Iterates in [`KnownRating`] order, so the rendered query value is stable
/// regardless of the order ratings were toggled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingFilter(BTreeSet<KnownRating>);

impl RatingFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter selecting every known rating. The API treats this the same as
    /// no filter for businesses carrying a known rating value.
    #[must_use]
    pub fn all() -> Self {
        KnownRating::ALL.into_iter().collect()
    }

    /// Flips one rating in or out of the set. Returns `true` if it is now
    /// selected.
    pub fn toggle(&mut self, rating: KnownRating) -> bool {
        if self.0.remove(&rating) {
            false
        } else {
            self.0.insert(rating);
            true
        }
    }

    pub fn insert(&mut self, rating: KnownRating) -> bool {
        self.0.insert(rating)
    }

    #[must_use]
    pub fn contains(&self, rating: KnownRating) -> bool {
        self.0.contains(&rating)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_exhaustive(&self) -> bool {
        self.0.len() == KnownRating::ALL.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = KnownRating> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined tokens for the `ratings` query parameter, or `None` when
    /// nothing is selected and the parameter should be omitted.
    #[must_use]
    pub fn to_query_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.iter()
                .map(KnownRating::token)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

impl FromIterator<KnownRating> for RatingFilter {
    fn from_iter<I: IntoIterator<Item = KnownRating>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for RatingFilter {
    type Err = UnknownRating;

    /// Parses a comma-separated list such as `"5, pass, Awaiting Inspection"`.
    /// Blank segments are skipped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|segment| !segment.trim().is_empty())
            .map(str::parse::<KnownRating>)
            .collect()
    }
}

impl fmt::Display for RatingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_value().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_resolve_regardless_of_case_and_padding() {
        for rating in KnownRating::ALL {
            let padded = format!("  {}\t", rating.token().to_uppercase());
            assert_eq!(rating_style(Some(&padded)), rating.style(), "{padded:?}");
        }
    }

    #[test]
    fn multi_word_values_collapse_whitespace() {
        assert_eq!(
            rating_style(Some("Pass and Eat Safe")),
            KnownRating::PassAndEatSafe.style()
        );
        assert_eq!(
            rating_style(Some("Improvement  Required")).long_text,
            "Improvement Required"
        );
        assert_eq!(rating_style(Some("AwaitingInspection")).short_text, "AwI");
    }

    #[test]
    fn unknown_and_missing_values_fall_back_to_default() {
        assert_eq!(rating_style(None), DEFAULT_RATING_STYLE);
        assert_eq!(rating_style(Some("")), DEFAULT_RATING_STYLE);
        assert_eq!(rating_style(Some("   ")), DEFAULT_RATING_STYLE);
        assert_eq!(rating_style(Some("6")), DEFAULT_RATING_STYLE);
        assert_eq!(rating_style(Some("fail")), DEFAULT_RATING_STYLE);
        assert_eq!(DEFAULT_RATING_STYLE.short_text, "N/A");
        assert_eq!(DEFAULT_RATING_STYLE.long_text, "N/A");
    }

    #[test]
    fn fhrs_keys_map_to_svg_with_locale() {
        for n in 0..=5 {
            assert_eq!(
                rating_image(Some(&format!("fhrs_{n}_en-gb"))),
                Some(format!("/fhrs/fhrs_{n}_en-gb.svg"))
            );
        }
        assert_eq!(
            rating_image(Some("FHRS_AwaitingInspection_cy-GB")),
            Some("/fhrs/fhrs_awaitinginspection_cy-gb.svg".to_string())
        );
    }

    #[test]
    fn fhis_keys_map_to_jpg_without_locale() {
        assert_eq!(
            rating_image(Some("fhis_pass")),
            Some("/fhis/fhis_pass.jpg".to_string())
        );
        assert_eq!(
            rating_image(Some("fhis_pass_and_eat_safe_en-gb")),
            Some("/fhis/fhis_pass_and_eat_safe.jpg".to_string())
        );
    }

    #[test]
    fn unusable_keys_have_no_image() {
        assert_eq!(rating_image(None), None);
        assert_eq!(rating_image(Some("")), None);
        assert_eq!(rating_image(Some("fhrs")), None);
        assert_eq!(rating_image(Some("xyz_1")), None);
        assert_eq!(rating_image(Some("fhis_")), None);
        assert_eq!(rating_image(Some("fhrs_en-gb")), None);
    }

    #[test]
    fn fhrs_key_without_locale_has_no_image() {
        assert_eq!(rating_image(Some("fhrs_5")), None);
    }

    #[test]
    fn filter_query_value_is_ordered_and_omitted_when_empty() {
        let mut filter = RatingFilter::new();
        assert_eq!(filter.to_query_value(), None);

        filter.insert(KnownRating::Pass);
        filter.insert(KnownRating::Three);
        filter.insert(KnownRating::Five);
        assert_eq!(filter.to_query_value().as_deref(), Some("5,3,pass"));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut filter = RatingFilter::new();
        assert!(filter.toggle(KnownRating::Exempt));
        assert!(filter.contains(KnownRating::Exempt));
        assert!(!filter.toggle(KnownRating::Exempt));
        assert!(filter.is_empty());
    }

    #[test]
    fn filter_parses_comma_list() {
        let filter: RatingFilter = "5, Pass and Eat Safe,,awaitinginspection".parse().unwrap();
        assert_eq!(filter.len(), 3);
        assert!(filter.contains(KnownRating::PassAndEatSafe));

        let err = "5,bogus".parse::<RatingFilter>().unwrap_err();
        assert_eq!(err, UnknownRating("bogus".to_string()));
    }

    #[test]
    fn all_filter_is_exhaustive() {
        assert!(RatingFilter::all().is_exhaustive());
        assert!(!RatingFilter::new().is_exhaustive());
    }
}
