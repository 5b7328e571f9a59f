use crate::geo::{BoundingBox, MapView};
use crate::ratings::RatingFilter;

/// One businesses-in-viewport request: the visible box, the zoom it was
/// computed at, and the selected rating filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportQuery {
    pub bounds: BoundingBox,
    pub zoom: u8,
    pub ratings: RatingFilter,
}

impl ViewportQuery {
    #[must_use]
    pub fn new(view: MapView, ratings: RatingFilter) -> Self {
        Self {
            bounds: view.bounds,
            zoom: view.zoom,
            ratings,
        }
    }
}

/// Free-text business search. Blank fields are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub name: Option<String>,
    /// Address or postcode fragment.
    pub location: Option<String>,
    pub ratings: RatingFilter,
}

impl SearchQuery {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        non_blank(self.name.as_deref())
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    /// No name, no location, and no rating filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name().is_none() && self.location().is_none() && self.ratings.is_empty()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
