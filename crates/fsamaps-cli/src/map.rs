//! Map-view commands: list a viewport, and search-then-fly-to.
//!
//! Both drive a [`ViewportOrchestrator`] the way the map view does, then
//! print the resulting [`MarkerLayer`].

use std::sync::Arc;

use fsamaps_client::FsaClient;
use fsamaps_core::{AppConfig, Business, LatLng, MapView, RatingFilter, SearchQuery};
use fsamaps_map::{
    FlyToTarget, LoadState, MarkerIcon, MarkerLayer, OrchestratorSettings, ViewportOrchestrator,
    ViewportSnapshot,
};

const MARKER_ASSET_ROOT: &str = "/images";

/// List the businesses visible in a view centred on `center`.
///
/// # Errors
///
/// Returns an error only if JSON output cannot be serialized; fetch failures
/// show up as an empty result, as they do on the map.
pub(crate) async fn run_viewport(
    client: FsaClient,
    config: &AppConfig,
    center: LatLng,
    zoom: u8,
    ratings: RatingFilter,
    json: bool,
) -> anyhow::Result<()> {
    let settings = OrchestratorSettings::from_app_config(config);
    let orchestrator = ViewportOrchestrator::new(client, settings);
    orchestrator.set_filters(ratings).await;

    let view = MapView::around(center, zoom, settings.viewport_size);
    let snapshot = orchestrator.view_changed(view).await;

    if json {
        return print_snapshot_json(&snapshot);
    }

    if zoom < settings.min_fetch_zoom {
        println!(
            "zoom {zoom} is below {}; zoom in to see businesses",
            settings.min_fetch_zoom
        );
        return Ok(());
    }

    let bounds = view.bounds;
    println!(
        "view {:.5},{:.5} .. {:.5},{:.5} at zoom {}",
        bounds.south, bounds.west, bounds.north, bounds.east, view.zoom
    );
    print_layer(&snapshot);
    Ok(())
}

/// Search for businesses and optionally fly to one of the results.
///
/// # Errors
///
/// Returns an error if the search request fails, `open` is out of range, or
/// the chosen result has no coordinates.
pub(crate) async fn run_search(
    client: FsaClient,
    config: &AppConfig,
    query: &SearchQuery,
    open: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    if query.is_empty() {
        anyhow::bail!("give at least one of --name, --location, or --ratings");
    }

    let results = client
        .search_businesses(query)
        .await
        .map_err(|e| anyhow::anyhow!("search failed: {e}"))?;

    let Some(index) = open else {
        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            print_search_results(&results);
        }
        return Ok(());
    };

    let chosen = index
        .checked_sub(1)
        .and_then(|i| results.get(i))
        .ok_or_else(|| anyhow::anyhow!("--open {index} is out of range ({} results)", results.len()))?;
    let position = chosen
        .coordinates()
        .ok_or_else(|| anyhow::anyhow!("'{}' has no location to fly to", chosen.name))?;

    let settings = OrchestratorSettings::from_app_config(config);
    let orchestrator = ViewportOrchestrator::new(client, settings);
    orchestrator.set_filters(query.ratings.clone()).await;
    let snapshot = orchestrator
        .fly_to(FlyToTarget {
            business_id: chosen.id,
            position,
            zoom: None,
        })
        .await;

    if json {
        return print_snapshot_json(&snapshot);
    }

    let layer = MarkerLayer::project(&snapshot, marker_icon());
    match layer.open_marker() {
        Some(marker) => {
            for line in marker.popup.lines() {
                println!("{line}");
            }
            println!("{} other businesses nearby", layer.len().saturating_sub(1));
        }
        None => println!(
            "'{}' is not on the map at this position (state: {:?})",
            chosen.name, snapshot.state
        ),
    }
    Ok(())
}

fn marker_icon() -> Arc<MarkerIcon> {
    Arc::new(MarkerIcon::leaflet_default(MARKER_ASSET_ROOT))
}

fn print_snapshot_json(snapshot: &ViewportSnapshot) -> anyhow::Result<()> {
    let body = serde_json::json!({
        "state": format!("{:?}", snapshot.state).to_lowercase(),
        "count": snapshot.count(),
        "popup": snapshot.popup,
        "businesses": &*snapshot.businesses,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn print_layer(snapshot: &ViewportSnapshot) {
    if snapshot.state == LoadState::Error {
        println!("0 businesses (the API request failed; see log)");
        return;
    }

    let layer = MarkerLayer::project(snapshot, marker_icon());
    println!("{} businesses", snapshot.count());
    if layer.skipped() > 0 {
        println!("({} without a location are not drawn)", layer.skipped());
    }

    println!("{:<9}{:<5}{:<40}ADDRESS", "ID", "RATING", "NAME");
    for marker in layer.markers() {
        let popup = &marker.popup;
        println!(
            "{:<9}{:<5}{:<40}{}",
            marker.business_id,
            popup.rating.short_text,
            truncate(&popup.title, 38),
            popup.address.join(", ")
        );
    }
}

fn print_search_results(results: &[Business]) {
    if results.is_empty() {
        println!("no businesses matched");
        return;
    }

    println!("{:<4}{:<9}{:<5}{:<40}ADDRESS", "#", "ID", "RATING", "NAME");
    for (i, business) in results.iter().enumerate() {
        println!(
            "{:<4}{:<9}{:<5}{:<40}{}",
            i + 1,
            business.id,
            business.rating_style().short_text,
            truncate(&business.name, 38),
            business.address_lines().collect::<Vec<_>>().join(", ")
        );
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}
