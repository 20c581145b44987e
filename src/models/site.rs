// Site inventory models

use serde::{Deserialize, Deserializer, Serialize};

/// Site status as reported by the inventory API (e.g. "ONLINE").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Online,
    Pending,
    Offline,
    OnBackup,
    Unknown,
}

impl SiteStatus {
    /// Parse from the inventory API status string. Matching is exact.
    pub fn from_api(s: &str) -> Self {
        match s {
            "ONLINE" => SiteStatus::Online,
            "PENDING" => SiteStatus::Pending,
            "OFFLINE" => SiteStatus::Offline,
            "ONBACKUP" => SiteStatus::OnBackup,
            _ => SiteStatus::Unknown,
        }
    }

    /// Value of the `status_id` label. Unknown statuses share 0 with ONLINE.
    pub fn id(self) -> u8 {
        match self {
            SiteStatus::Online | SiteStatus::Unknown => 0,
            SiteStatus::Pending => 1,
            SiteStatus::Offline => 2,
            SiteStatus::OnBackup => 3,
        }
    }
}

/// One entry of the simple status list; only the id is used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SiteRef {
    #[serde(alias = "ID")]
    pub id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAddress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Raw status string; exported verbatim in the `status` label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub physical_address: PhysicalAddress,
}

impl SiteDetail {
    pub fn site_status(&self) -> SiteStatus {
        SiteStatus::from_api(&self.status)
    }
}

/// Treats an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
