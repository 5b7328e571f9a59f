//! Dataset, health, and offline rating commands.

use fsamaps_client::FsaClient;
use fsamaps_core::{rating_image, rating_style};

/// # Errors
///
/// Returns the API's error detail (or status code) if the metadata request
/// fails.
pub(crate) async fn run_metadata(client: &FsaClient, json: bool) -> anyhow::Result<()> {
    let metadata = client
        .metadata()
        .await
        .map_err(|e| anyhow::anyhow!("metadata unavailable: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("source:            {}", metadata.source);
    println!("downloaded:        {}", metadata.download_date);
    if let Some(modified) = &metadata.csv_last_modified {
        println!("csv last modified: {modified}");
    }
    println!("data age:          {} days", metadata.data_age);
    println!(
        "records:           {} imported, {} skipped, {} total",
        metadata.imported_records, metadata.skipped_records, metadata.total_records
    );
    if let Some(ratio) = metadata.import_ratio() {
        println!("import ratio:      {:.1}%", ratio * 100.0);
    }
    println!("import took:       {:.1}s", metadata.import_duration);
    Ok(())
}

/// # Errors
///
/// Returns the API's error detail (or status code) if the request fails.
pub(crate) async fn run_metadata_history(
    client: &FsaClient,
    limit: u32,
    json: bool,
) -> anyhow::Result<()> {
    let history = client
        .metadata_history(limit)
        .await
        .map_err(|e| anyhow::anyhow!("metadata history unavailable: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("no imports recorded");
        return Ok(());
    }

    println!("{:<28}{:<12}{:<9}SOURCE", "DOWNLOADED", "IMPORTED", "CURRENT");
    for entry in &history {
        println!(
            "{:<28}{:<12}{:<9}{}",
            entry.download_date,
            entry.imported_records,
            if entry.is_current { "yes" } else { "" },
            entry.source
        );
    }
    Ok(())
}

/// Prints the API status. An unreachable API is reported, not returned as an
/// error.
pub(crate) async fn run_health(client: &FsaClient) -> anyhow::Result<()> {
    println!("{}", client.api_status().await);
    Ok(())
}

/// # Errors
///
/// Returns an error if neither `--value` nor `--key` is given.
pub(crate) fn run_rating(value: Option<&str>, key: Option<&str>, json: bool) -> anyhow::Result<()> {
    if value.is_none() && key.is_none() {
        anyhow::bail!("give --value, --key, or both");
    }

    let style = value.map(|v| rating_style(Some(v)));
    let image = key.map(|k| rating_image(Some(k)));

    if json {
        let body = serde_json::json!({
            "style": style,
            "image": image.flatten(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if let Some(style) = style {
        println!(
            "style: {} / {} ({})",
            style.short_text, style.long_text, style.colour
        );
    }
    if let Some(image) = image {
        println!("image: {}", image.as_deref().unwrap_or("none"));
    }
    Ok(())
}
