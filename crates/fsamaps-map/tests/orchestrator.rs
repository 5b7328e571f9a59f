//! Behavioural tests for `ViewportOrchestrator` against in-memory sources.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fsamaps_core::{
    BoundingBox, Business, KnownRating, LatLng, MapView, RatingFilter, ViewportQuery,
};
use fsamaps_map::{
    BusinessSource, FlyToTarget, LoadState, OrchestratorSettings, ViewportOrchestrator,
};
use tokio::sync::oneshot;

type Reply = Result<Vec<Business>, String>;

fn business(id: i64, lat: f64, lng: f64) -> Business {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("Business {id}"),
        "latitude": lat,
        "longitude": lng,
        "rating_key": "fhrs_4_en-gb",
        "rating_value": "4"
    }))
    .unwrap()
}

fn view(zoom: u8) -> MapView {
    MapView::new(BoundingBox::new(51.50, 51.51, -0.13, -0.12), zoom)
}

/// Answers every query with the configured reply and records the queries.
#[derive(Default)]
struct StaticSource {
    reply: Mutex<Option<Reply>>,
    calls: Mutex<Vec<ViewportQuery>>,
}

impl StaticSource {
    fn replying(reply: Reply) -> Arc<Self> {
        let source = Self::default();
        *source.reply.lock().unwrap() = Some(reply);
        Arc::new(source)
    }

    fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = Some(reply);
    }

    fn calls(&self) -> Vec<ViewportQuery> {
        self.calls.lock().unwrap().clone()
    }
}

impl BusinessSource for StaticSource {
    type Error = String;

    fn businesses_in_viewport(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Vec<Business>, Self::Error>> + Send {
        self.calls.lock().unwrap().push(query.clone());
        let reply = self
            .reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()));
        async move { reply }
    }
}

/// Holds every query open until the test answers it, so responses can be
/// delivered in any order.
#[derive(Default)]
struct GatedSource {
    pending: Mutex<Vec<(ViewportQuery, Option<oneshot::Sender<Reply>>)>>,
}

impl GatedSource {
    async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.pending.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for queries");
    }

    fn answer(&self, index: usize, reply: Reply) {
        let sender = self.pending.lock().unwrap()[index]
            .1
            .take()
            .expect("query already answered");
        sender.send(reply).expect("orchestrator stopped waiting");
    }
}

impl BusinessSource for GatedSource {
    type Error = String;

    fn businesses_in_viewport(
        &self,
        query: &ViewportQuery,
    ) -> impl Future<Output = Result<Vec<Business>, Self::Error>> + Send {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push((query.clone(), Some(tx)));
        async move { rx.await.unwrap_or_else(|_| Err("query abandoned".to_string())) }
    }
}

fn orchestrator<S: BusinessSource>(source: S) -> ViewportOrchestrator<S> {
    ViewportOrchestrator::new(source, OrchestratorSettings::default())
}

#[tokio::test]
async fn starts_idle_with_no_businesses() {
    let orch = orchestrator(StaticSource::replying(Ok(vec![])));
    let snapshot = orch.current();
    assert_eq!(snapshot.state, LoadState::Idle);
    assert_eq!(snapshot.count(), 0);
    assert_eq!(snapshot.sequence, 0);
}

#[tokio::test]
async fn zoom_below_threshold_never_fetches() {
    let source = StaticSource::replying(Ok(vec![business(1, 51.505, -0.125)]));
    let orch = orchestrator(Arc::clone(&source));

    let snapshot = orch.view_changed(view(15)).await;

    assert!(source.calls().is_empty());
    assert_eq!(snapshot.state, LoadState::Loaded);
    assert_eq!(snapshot.count(), 0);

    let world = MapView::new(BoundingBox::new(-85.0, 85.0, -180.0, 180.0), 3);
    assert_eq!(orch.view_changed(world).await.count(), 0);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn loaded_result_matches_response_in_order() {
    let response = vec![
        business(30, 51.505, -0.125),
        business(10, 51.506, -0.126),
        business(20, 51.507, -0.127),
    ];
    let source = StaticSource::replying(Ok(response.clone()));
    let orch = orchestrator(Arc::clone(&source));

    let snapshot = orch.view_changed(view(17)).await;

    assert_eq!(snapshot.state, LoadState::Loaded);
    assert_eq!(snapshot.count(), 3);
    assert_eq!(&*snapshot.businesses, response.as_slice());

    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].bounds, view(17).bounds);
    assert_eq!(calls[0].ratings.to_query_value(), None);
}

#[tokio::test]
async fn threshold_zoom_itself_fetches() {
    let source = StaticSource::replying(Ok(vec![business(1, 51.505, -0.125)]));
    let orch = orchestrator(Arc::clone(&source));
    assert_eq!(orch.view_changed(view(16)).await.count(), 1);
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn failure_clears_previous_result() {
    let source = StaticSource::replying(Ok(vec![
        business(1, 51.505, -0.125),
        business(2, 51.506, -0.126),
    ]));
    let orch = orchestrator(Arc::clone(&source));
    assert_eq!(orch.view_changed(view(17)).await.count(), 2);

    source.set_reply(Err("500".to_string()));
    let snapshot = orch.view_changed(view(18)).await;

    assert_eq!(snapshot.state, LoadState::Error);
    assert_eq!(snapshot.count(), 0);
}

#[tokio::test]
async fn filter_toggle_requeries_last_known_view() {
    let source = StaticSource::replying(Ok(vec![business(1, 51.505, -0.125)]));
    let orch = orchestrator(Arc::clone(&source));
    orch.view_changed(view(17)).await;

    orch.toggle_filter(KnownRating::Pass).await;
    orch.toggle_filter(KnownRating::Five).await;

    let calls = source.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].bounds, view(17).bounds);
    assert_eq!(calls[1].ratings.to_query_value().as_deref(), Some("pass"));
    assert_eq!(calls[2].bounds, view(17).bounds);
    assert_eq!(calls[2].ratings.to_query_value().as_deref(), Some("5,pass"));
}

#[tokio::test]
async fn filters_before_first_view_are_applied_to_it() {
    let source = StaticSource::replying(Ok(vec![]));
    let orch = orchestrator(Arc::clone(&source));

    let filters: RatingFilter = [KnownRating::Zero].into_iter().collect();
    let snapshot = orch.set_filters(filters.clone()).await;
    assert_eq!(snapshot.state, LoadState::Idle);
    assert!(source.calls().is_empty());

    orch.view_changed(view(17)).await;
    assert_eq!(source.calls()[0].ratings, filters);
}

#[tokio::test]
async fn filter_change_while_zoomed_out_does_not_fetch() {
    let source = StaticSource::replying(Ok(vec![]));
    let orch = orchestrator(Arc::clone(&source));
    orch.view_changed(view(12)).await;

    let snapshot = orch.toggle_filter(KnownRating::Exempt).await;
    assert!(source.calls().is_empty());
    assert_eq!(snapshot.state, LoadState::Loaded);
    assert!(orch.filters().await.contains(KnownRating::Exempt));
}

#[tokio::test]
async fn late_response_for_superseded_query_is_discarded() {
    let source = Arc::new(GatedSource::default());
    let orch = Arc::new(orchestrator(Arc::clone(&source)));

    let first = tokio::spawn({
        let orch = Arc::clone(&orch);
        async move { orch.view_changed(view(17)).await }
    });
    source.wait_for_calls(1).await;
    assert_eq!(orch.current().state, LoadState::Loading);

    let second = tokio::spawn({
        let orch = Arc::clone(&orch);
        async move { orch.view_changed(view(18)).await }
    });
    source.wait_for_calls(2).await;

    source.answer(1, Ok(vec![business(2, 51.505, -0.125)]));
    let newer = second.await.unwrap();
    assert_eq!(newer.state, LoadState::Loaded);
    assert_eq!(newer.businesses[0].id, 2);

    source.answer(0, Ok(vec![business(1, 51.505, -0.125), business(3, 51.5, -0.12)]));
    first.await.unwrap();

    let current = orch.current();
    assert_eq!(current.count(), 1);
    assert_eq!(current.businesses[0].id, 2);
    assert_eq!(current.sequence, newer.sequence);
}

#[tokio::test]
async fn zooming_out_supersedes_in_flight_fetch() {
    let source = Arc::new(GatedSource::default());
    let orch = orchestrator(Arc::clone(&source));

    let (loaded, ()) = futures::future::join(orch.view_changed(view(17)), async {
        source.wait_for_calls(1).await;
        let zoomed_out = orch.view_changed(view(10)).await;
        assert_eq!(zoomed_out.count(), 0);
        source.answer(0, Ok(vec![business(1, 51.505, -0.125)]));
    })
    .await;

    assert_eq!(loaded.count(), 0);
    assert_eq!(orch.current().state, LoadState::Loaded);
    assert_eq!(orch.current().count(), 0);
}

#[tokio::test]
async fn detached_orchestrator_ignores_events_and_responses() {
    let source = Arc::new(GatedSource::default());
    let orch = Arc::new(orchestrator(Arc::clone(&source)));

    let in_flight = tokio::spawn({
        let orch = Arc::clone(&orch);
        async move { orch.view_changed(view(17)).await }
    });
    source.wait_for_calls(1).await;
    let before = orch.current();

    orch.detach().await;
    source.answer(0, Ok(vec![business(1, 51.505, -0.125)]));
    in_flight.await.unwrap();
    assert_eq!(orch.current(), before);

    orch.view_changed(view(18)).await;
    orch.toggle_filter(KnownRating::One).await;
    assert_eq!(source.pending.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn subscribers_see_published_results() {
    let source = StaticSource::replying(Ok(vec![business(1, 51.505, -0.125)]));
    let orch = orchestrator(source);
    let mut rx = orch.subscribe();
    assert_eq!(rx.borrow_and_update().state, LoadState::Idle);

    orch.view_changed(view(17)).await;

    assert!(rx.has_changed().unwrap());
    let seen = rx.borrow_and_update().clone();
    assert_eq!(seen.state, LoadState::Loaded);
    assert_eq!(seen.count(), 1);
}

#[tokio::test]
async fn fly_to_opens_popup_once_business_is_loaded() {
    let target = business(42, 51.5033, -0.1196);
    let source = StaticSource::replying(Ok(vec![business(7, 51.5034, -0.1197), target.clone()]));
    let orch = orchestrator(Arc::clone(&source));

    let snapshot = orch
        .fly_to(FlyToTarget {
            business_id: 42,
            position: LatLng::new(51.5033, -0.1196),
            zoom: None,
        })
        .await;

    assert_eq!(snapshot.popup, Some(42));
    let call = &source.calls()[0];
    assert_eq!(call.zoom, 18);
    assert!(call.bounds.contains(target.coordinates().unwrap()));
}

#[tokio::test]
async fn fly_to_zoom_is_raised_to_fetch_threshold() {
    let source = StaticSource::replying(Ok(vec![]));
    let orch = orchestrator(Arc::clone(&source));

    orch.fly_to(FlyToTarget {
        business_id: 1,
        position: LatLng::new(55.95, -3.19),
        zoom: Some(5),
    })
    .await;

    assert_eq!(source.calls()[0].zoom, 16);
}

#[tokio::test]
async fn fly_to_missing_business_opens_nothing() {
    let source = StaticSource::replying(Ok(vec![business(7, 51.5034, -0.1197)]));
    let orch = orchestrator(Arc::clone(&source));

    let snapshot = orch
        .fly_to(FlyToTarget {
            business_id: 42,
            position: LatLng::new(51.5033, -0.1196),
            zoom: Some(17),
        })
        .await;
    assert_eq!(snapshot.popup, None);

    // the request is not retried by later loads
    source.set_reply(Ok(vec![business(42, 51.5033, -0.1196)]));
    assert_eq!(orch.refresh().await.popup, None);
}

#[tokio::test]
async fn open_popup_survives_refresh_only_while_business_is_visible() {
    let source = StaticSource::replying(Ok(vec![business(42, 51.5033, -0.1196)]));
    let orch = orchestrator(Arc::clone(&source));
    orch.fly_to(FlyToTarget {
        business_id: 42,
        position: LatLng::new(51.5033, -0.1196),
        zoom: None,
    })
    .await;

    assert_eq!(orch.refresh().await.popup, Some(42));

    source.set_reply(Ok(vec![business(7, 51.5034, -0.1197)]));
    assert_eq!(orch.refresh().await.popup, None);
}
