//! Keeps the visible business set in step with the map viewport and the
//! selected rating filters.
//!
//! Every pan, zoom, or filter change becomes a [`ViewportQuery`] stamped with
//! a sequence number. Views zoomed out past the fetch threshold resolve to an
//! empty result without touching the network. Responses are applied only if
//! their sequence number is still the latest issued, so a slow response can
//! never overwrite the result of a newer query. Renderers read the result via
//! [`ViewportOrchestrator::current`] or [`ViewportOrchestrator::subscribe`].

use std::sync::Arc;

use fsamaps_core::{
    AppConfig, Business, KnownRating, LatLng, MapView, PixelSize, RatingFilter, ViewportQuery,
};
use tokio::sync::{watch, Mutex};

use crate::source::BusinessSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Views below this zoom resolve to an empty result without a fetch.
    pub min_fetch_zoom: u8,
    pub fly_to_zoom: u8,
    /// Size used to derive bounds for views the orchestrator creates itself.
    pub viewport_size: PixelSize,
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_fetch_zoom: config.min_fetch_zoom,
            fly_to_zoom: config.fly_to_zoom,
            viewport_size: PixelSize::new(config.viewport_width_px, config.viewport_height_px),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            min_fetch_zoom: 16,
            fly_to_zoom: 18,
            viewport_size: PixelSize::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// The orchestrator's published result.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSnapshot {
    pub state: LoadState,
    pub businesses: Arc<[Business]>,
    /// Sequence number of the query whose result `businesses` holds; 0 before
    /// the first result.
    pub sequence: u64,
    /// Business whose popup should be open, confirmed present in `businesses`.
    pub popup: Option<i64>,
}

impl ViewportSnapshot {
    fn idle() -> Self {
        Self {
            state: LoadState::Idle,
            businesses: Arc::from(Vec::new()),
            sequence: 0,
            popup: None,
        }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.businesses.len()
    }
}

/// A request from outside the map (e.g. a search result) to recentre on a
/// business and open its popup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyToTarget {
    pub business_id: i64,
    pub position: LatLng,
    /// Falls back to the configured fly-to zoom.
    pub zoom: Option<u8>,
}

#[derive(Debug, Clone, Copy)]
struct PendingPopup {
    business_id: i64,
    /// First sequence number whose result may satisfy the request.
    due_at: u64,
}

#[derive(Debug, Default)]
struct Inner {
    view: Option<MapView>,
    filters: RatingFilter,
    latest: u64,
    pending_popup: Option<PendingPopup>,
    detached: bool,
}

pub struct ViewportOrchestrator<S> {
    source: S,
    settings: OrchestratorSettings,
    inner: Mutex<Inner>,
    snapshot: watch::Sender<ViewportSnapshot>,
}

impl<S: BusinessSource> ViewportOrchestrator<S> {
    pub fn new(source: S, settings: OrchestratorSettings) -> Self {
        let (snapshot, _) = watch::channel(ViewportSnapshot::idle());
        Self {
            source,
            settings,
            inner: Mutex::new(Inner::default()),
            snapshot,
        }
    }

    #[must_use]
    pub fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    #[must_use]
    pub fn current(&self) -> ViewportSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot, starting from the
    /// current one.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewportSnapshot> {
        self.snapshot.subscribe()
    }

    pub async fn view(&self) -> Option<MapView> {
        self.inner.lock().await.view
    }

    pub async fn filters(&self) -> RatingFilter {
        self.inner.lock().await.filters.clone()
    }

    /// Handles a pan or zoom reported by the map.
    pub async fn view_changed(&self, view: MapView) -> ViewportSnapshot {
        let issued = {
            let mut inner = self.inner.lock().await;
            if inner.detached {
                return self.current();
            }
            inner.view = Some(view);
            self.issue(&mut inner)
        };
        self.complete(issued).await
    }

    /// Replaces the selected rating filters. With a known view the query is
    /// re-issued immediately against it; otherwise the filters are only
    /// recorded for the next view change.
    pub async fn set_filters(&self, filters: RatingFilter) -> ViewportSnapshot {
        let issued = {
            let mut inner = self.inner.lock().await;
            if inner.detached {
                return self.current();
            }
            inner.filters = filters;
            if inner.view.is_none() {
                tracing::debug!("filters changed before any view was reported");
                return self.current();
            }
            self.issue(&mut inner)
        };
        self.complete(issued).await
    }

    pub async fn toggle_filter(&self, rating: KnownRating) -> ViewportSnapshot {
        let mut filters = self.filters().await;
        filters.toggle(rating);
        self.set_filters(filters).await
    }

    /// Re-issues the query for the last known view, if any.
    pub async fn refresh(&self) -> ViewportSnapshot {
        let issued = {
            let mut inner = self.inner.lock().await;
            if inner.detached || inner.view.is_none() {
                return self.current();
            }
            self.issue(&mut inner)
        };
        self.complete(issued).await
    }

    /// Recentres on `target` and asks for its popup to open.
    ///
    /// The popup is opened by the first result applied for this or a later
    /// query, and only if that result contains the business. If it does not,
    /// the request is dropped.
    pub async fn fly_to(&self, target: FlyToTarget) -> ViewportSnapshot {
        let zoom = target
            .zoom
            .unwrap_or(self.settings.fly_to_zoom)
            .max(self.settings.min_fetch_zoom);
        let view = MapView::around(target.position, zoom, self.settings.viewport_size);

        let issued = {
            let mut inner = self.inner.lock().await;
            if inner.detached {
                return self.current();
            }
            inner.view = Some(view);
            inner.pending_popup = Some(PendingPopup {
                business_id: target.business_id,
                due_at: inner.latest + 1,
            });
            tracing::debug!(business_id = target.business_id, zoom, "flying to business");
            self.issue(&mut inner)
        };
        self.complete(issued).await
    }

    /// Stops reacting to events. In-flight responses are discarded and the
    /// last snapshot stays as it was.
    pub async fn detach(&self) {
        let mut inner = self.inner.lock().await;
        inner.detached = true;
        inner.pending_popup = None;
    }

    /// Stamps a new query for the current view and filters. Returns `None`
    /// when no fetch is needed because the result was already published.
    fn issue(&self, inner: &mut Inner) -> Option<(u64, ViewportQuery)> {
        let view = inner.view?;
        inner.latest += 1;
        let sequence = inner.latest;

        if view.zoom < self.settings.min_fetch_zoom {
            tracing::debug!(
                sequence,
                zoom = view.zoom,
                min_zoom = self.settings.min_fetch_zoom,
                "zoomed out past fetch threshold, clearing businesses"
            );
            self.apply(inner, sequence, LoadState::Loaded, Vec::new());
            return None;
        }

        self.snapshot.send_modify(|snapshot| snapshot.state = LoadState::Loading);
        Some((sequence, ViewportQuery::new(view, inner.filters.clone())))
    }

    async fn complete(&self, issued: Option<(u64, ViewportQuery)>) -> ViewportSnapshot {
        let Some((sequence, query)) = issued else {
            return self.current();
        };

        let outcome = self.source.businesses_in_viewport(&query).await;

        let mut inner = self.inner.lock().await;
        if inner.detached {
            tracing::debug!(sequence, "detached, discarding response");
            return self.current();
        }
        if sequence != inner.latest {
            tracing::debug!(
                sequence,
                latest = inner.latest,
                "discarding response for superseded query"
            );
            return self.current();
        }

        match outcome {
            Ok(businesses) => {
                tracing::info!(sequence, count = businesses.len(), "businesses loaded");
                self.apply(&mut inner, sequence, LoadState::Loaded, businesses);
            }
            Err(error) => {
                tracing::warn!(sequence, %error, "failed to fetch businesses for viewport");
                self.apply(&mut inner, sequence, LoadState::Error, Vec::new());
            }
        }
        self.current()
    }

    fn apply(&self, inner: &mut Inner, sequence: u64, state: LoadState, businesses: Vec<Business>) {
        let contains = |id: i64| businesses.iter().any(|b| b.id == id);

        let requested = match inner.pending_popup {
            Some(pending) if sequence >= pending.due_at => {
                inner.pending_popup = None;
                if contains(pending.business_id) {
                    Some(pending.business_id)
                } else {
                    tracing::debug!(
                        business_id = pending.business_id,
                        "fly-to target not in loaded businesses, popup not opened"
                    );
                    None
                }
            }
            _ => None,
        };
        let carried = self.snapshot.borrow().popup.filter(|&id| contains(id));
        let popup = requested.or(carried);

        self.snapshot.send_replace(ViewportSnapshot {
            state,
            businesses: Arc::from(businesses),
            sequence,
            popup,
        });
    }
}
