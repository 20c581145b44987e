// Site detail -> Prometheus text exposition lines (one line per site).
// Label values are quoted as-is; embedded quotes are not escaped.

use bytes::Bytes;
use std::fmt;

use crate::models::SiteDetail;

pub const SITE_INFO_METRIC: &str = "vm_cybera_site_info";

const GEOHASH_LEN: usize = 12;

/// One complete exposition line, including the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLine(String);

impl MetricLine {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encodes `detail` as a `vm_cybera_site_info` line with value 1 at `timestamp_ms`.
pub fn encode(detail: &SiteDetail, timestamp_ms: i64) -> MetricLine {
    let addr = &detail.physical_address;
    MetricLine(format!(
        "{SITE_INFO_METRIC}{{name=\"{}\",status=\"{}\",status_id=\"{}\",city=\"{}\",country=\"{}\",state=\"{}\",longitude=\"{:.2}\",latitude=\"{:.2}\",geohash=\"{}\"}} 1 {}\n",
        detail.name,
        detail.status,
        detail.site_status().id(),
        addr.city,
        addr.country,
        addr.state,
        addr.lng,
        addr.lat,
        geohash(addr.lat, addr.lng),
        timestamp_ms,
    ))
}

/// Standard 12-character geohash. Coordinates are clamped into range first and NaN
/// counts as 0, so a bad address still lands on a valid cell.
pub fn geohash(lat: f64, lng: f64) -> String {
    let lat = if lat.is_nan() { 0.0 } else { lat.clamp(-90.0, 90.0) };
    let lng = if lng.is_nan() { 0.0 } else { lng.clamp(-180.0, 180.0) };
    geohash::encode(geohash::Coord { x: lng, y: lat }, GEOHASH_LEN).unwrap_or_default()
}

/// All lines produced by one scrape cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<MetricLine>,
}

impl Snapshot {
    pub fn from_details<'a>(
        details: impl IntoIterator<Item = &'a SiteDetail>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            lines: details
                .into_iter()
                .map(|d| encode(d, timestamp_ms))
                .collect(),
        }
    }

    pub fn lines(&self) -> &[MetricLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Concatenated lines, ready for the buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.0.len()).sum());
        for line in &self.lines {
            out.push_str(&line.0);
        }
        Bytes::from(out)
    }
}
