//! Projection of a [`ViewportSnapshot`] into map markers.
//!
//! The layer is rebuilt from each snapshot and holds no state of its own
//! beyond which popup is open.

use std::sync::Arc;

use chrono::NaiveDate;
use fsamaps_core::{Business, LatLng, RatingStyle};

use crate::orchestrator::ViewportSnapshot;

/// Icon configuration shared by every marker on the layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
    pub icon_size: (u32, u32),
    /// Pixel of the icon that sits on the marker's coordinate.
    pub icon_anchor: (i32, i32),
    pub popup_anchor: (i32, i32),
    pub shadow_size: (u32, u32),
}

impl MarkerIcon {
    /// The stock Leaflet pin, served from `asset_root`.
    #[must_use]
    pub fn leaflet_default(asset_root: &str) -> Self {
        let root = asset_root.trim_end_matches('/');
        Self {
            icon_url: format!("{root}/marker-icon.png"),
            icon_retina_url: format!("{root}/marker-icon-2x.png"),
            shadow_url: format!("{root}/marker-shadow.png"),
            icon_size: (25, 41),
            icon_anchor: (12, 41),
            popup_anchor: (1, -34),
            shadow_size: (41, 41),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub address: Vec<String>,
    pub local_authority: Option<String>,
    pub rating: RatingStyle,
    pub badge: Option<String>,
    pub inspected_on: Option<NaiveDate>,
    pub rating_pending: bool,
}

impl PopupContent {
    fn for_business(business: &Business) -> Self {
        Self {
            title: business.name.clone(),
            address: business.address_lines().map(str::to_owned).collect(),
            local_authority: business
                .local_authority
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            rating: business.rating_style(),
            badge: business.rating_image(),
            inspected_on: business.inspection_date(),
            rating_pending: business.pending.unwrap_or(false),
        }
    }

    /// Plain-text rendering, one line per populated field.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.title.clone()];
        lines.extend(self.address.iter().cloned());
        if let Some(authority) = &self.local_authority {
            lines.push(format!("Local authority: {authority}"));
        }
        lines.push(format!("Rating: {}", self.rating.long_text));
        if let Some(date) = self.inspected_on {
            lines.push(format!("Inspected: {}", date.format("%d %B %Y")));
        }
        if self.rating_pending {
            lines.push("New rating pending".to_string());
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub business_id: i64,
    pub position: LatLng,
    pub popup: PopupContent,
}

#[derive(Debug, Clone)]
pub struct MarkerLayer {
    icon: Arc<MarkerIcon>,
    markers: Vec<Marker>,
    skipped: usize,
    open_popup: Option<i64>,
}

impl MarkerLayer {
    /// Builds one marker per business with usable coordinates, in snapshot
    /// order, and opens the snapshot's requested popup.
    #[must_use]
    pub fn project(snapshot: &ViewportSnapshot, icon: Arc<MarkerIcon>) -> Self {
        let markers: Vec<Marker> = snapshot
            .businesses
            .iter()
            .filter_map(|business| {
                Some(Marker {
                    business_id: business.id,
                    position: business.coordinates()?,
                    popup: PopupContent::for_business(business),
                })
            })
            .collect();
        let skipped = snapshot.count() - markers.len();
        if skipped > 0 {
            tracing::debug!(skipped, "businesses without usable coordinates not drawn");
        }

        let mut layer = Self {
            icon,
            markers,
            skipped,
            open_popup: None,
        };
        if let Some(id) = snapshot.popup {
            layer.open_popup(id);
        }
        layer
    }

    #[must_use]
    pub fn icon(&self) -> &MarkerIcon {
        &self.icon
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Businesses in the snapshot that could not be placed on the map.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn get(&self, business_id: i64) -> Option<&Marker> {
        self.markers.iter().find(|m| m.business_id == business_id)
    }

    /// Opens the popup of the marker for `business_id`, closing any other.
    /// Returns `false` and changes nothing if no such marker is drawn.
    pub fn open_popup(&mut self, business_id: i64) -> bool {
        if self.get(business_id).is_none() {
            return false;
        }
        self.open_popup = Some(business_id);
        true
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }

    #[must_use]
    pub fn open_marker(&self) -> Option<&Marker> {
        self.open_popup.and_then(|id| self.get(id))
    }
}
