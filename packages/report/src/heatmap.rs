//! Self-contained Leaflet heatmap document.
//!
//! Renders one weighted point per hotspot row at its mean coordinates,
//! with weight equal to the total incident count, as a density overlay
//! on a fixed-center map. Only the three fields it consumes
//! (`avg_latitude`, `avg_longitude`, `total_incidents`) couple this
//! module to the analytics output.

use std::path::Path;

use crime_stats_models::HotspotRow;

use crate::ReportError;

/// Map center (Calgary) in (latitude, longitude).
const MAP_CENTER: (f64, f64) = (51.0447, -114.0719);

/// Initial zoom level.
const MAP_ZOOM: u8 = 11;

/// Writes the heatmap HTML document for the given analysis year.
///
/// The document is self-contained apart from the Leaflet and
/// leaflet.heat assets loaded from their CDN.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization or the file write fails.
pub fn write_heatmap(path: &Path, year: i32, rows: &[HotspotRow]) -> Result<(), ReportError> {
    std::fs::write(path, render(year, rows)?)?;
    log::info!(
        "Wrote heatmap for {year} ({} points) to {}",
        rows.len(),
        path.display(),
    );
    Ok(())
}

fn render(year: i32, rows: &[HotspotRow]) -> Result<String, ReportError> {
    #[allow(clippy::cast_precision_loss)]
    let points: Vec<[f64; 3]> = rows
        .iter()
        .map(|row| [row.avg_latitude, row.avg_longitude, row.total_incidents as f64])
        .collect();
    let heat_data = serde_json::to_string(&points)?;

    let (center_lat, center_lng) = MAP_CENTER;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Crime Heatmap {year}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{center_lat}, {center_lng}], {MAP_ZOOM});
L.tileLayer('https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png', {{
    attribution: '&copy; OpenStreetMap contributors'
}}).addTo(map);
L.heatLayer({heat_data}).addTo(map);
</script>
</body>
</html>
"#,
    ))
}
