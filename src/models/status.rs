// Status snapshot models: typed form input, parsed report, stored rows

use serde::{Deserialize, Serialize};

use super::parse::{parse_float, parse_int, sanitize_text};

pub const DEFAULT_NAME: &str = "unnamed";
pub const DEFAULT_LOCATION: &str = "unknown";

/// Raw `POST /status` form. Every field is optional at the type level; presence
/// of the required ones is checked by [`StatusForm::has_required_fields`].
#[derive(Debug, Clone, Default)]
pub struct StatusForm {
    pub machine_id: Option<String>,
    pub name: Option<String>,
    pub system: Option<String>,
    pub location: Option<String>,
    pub uptime: Option<String>,
    pub cpu_percent: Option<String>,
    pub net_tx: Option<String>,
    pub net_rx: Option<String>,
    pub disks_total_kb: Option<String>,
    pub disks_avail_kb: Option<String>,
    pub cpu_num_cores: Option<String>,
    pub mem_total: Option<String>,
    pub mem_free: Option<String>,
    pub mem_used: Option<String>,
    pub swap_total: Option<String>,
    pub swap_free: Option<String>,
    pub process_count: Option<String>,
    pub connection_count: Option<String>,
}

impl StatusForm {
    /// Build from decoded form pairs. The first value of a repeated key wins;
    /// unknown keys are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "machine_id" => &mut form.machine_id,
                "name" => &mut form.name,
                "system" => &mut form.system,
                "location" => &mut form.location,
                "uptime" => &mut form.uptime,
                "cpu_percent" => &mut form.cpu_percent,
                "net_tx" => &mut form.net_tx,
                "net_rx" => &mut form.net_rx,
                "disks_total_kb" => &mut form.disks_total_kb,
                "disks_avail_kb" => &mut form.disks_avail_kb,
                "cpu_num_cores" => &mut form.cpu_num_cores,
                "mem_total" => &mut form.mem_total,
                "mem_free" => &mut form.mem_free,
                "mem_used" => &mut form.mem_used,
                "swap_total" => &mut form.swap_total,
                "swap_free" => &mut form.swap_free,
                "process_count" => &mut form.process_count,
                "connection_count" => &mut form.connection_count,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        form
    }

    /// `machine_id`, `name`, `system` and `uptime` must be present (possibly empty).
    pub fn has_required_fields(&self) -> bool {
        self.machine_id.is_some()
            && self.name.is_some()
            && self.system.is_some()
            && self.uptime.is_some()
    }

    /// Sanitize text and parse numbers with defaults. Does not check required fields.
    pub fn normalize(&self) -> StatusReport {
        let text = |v: &Option<String>| sanitize_text(v.as_deref().unwrap_or_default());
        let or_default = |s: String, default: &str| {
            if s.is_empty() { default.to_owned() } else { s }
        };
        let int = |v: &Option<String>| parse_int(v.as_deref());
        let float = |v: &Option<String>| parse_float(v.as_deref());

        StatusReport {
            machine_id: text(&self.machine_id),
            name: or_default(text(&self.name), DEFAULT_NAME),
            system: text(&self.system),
            location: or_default(text(&self.location), DEFAULT_LOCATION),
            metrics: Metrics {
                uptime: int(&self.uptime),
                cpu_percent: float(&self.cpu_percent),
                net_tx: int(&self.net_tx),
                net_rx: int(&self.net_rx),
                disks_total_kb: int(&self.disks_total_kb),
                disks_avail_kb: int(&self.disks_avail_kb),
                cpu_num_cores: int(&self.cpu_num_cores),
                mem_total: float(&self.mem_total),
                mem_free: float(&self.mem_free),
                mem_used: float(&self.mem_used),
                swap_total: float(&self.swap_total),
                swap_free: float(&self.swap_free),
                process_count: int(&self.process_count),
                connection_count: int(&self.connection_count),
            },
        }
    }
}

/// Numeric part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Metrics {
    pub uptime: i64,
    pub cpu_percent: f64,
    pub net_tx: i64,
    pub net_rx: i64,
    pub disks_total_kb: i64,
    pub disks_avail_kb: i64,
    pub cpu_num_cores: i64,
    pub mem_total: f64,
    pub mem_free: f64,
    pub mem_used: f64,
    pub swap_total: f64,
    pub swap_free: f64,
    pub process_count: i64,
    pub connection_count: i64,
}

/// A normalized snapshot ready to store.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub machine_id: String,
    pub name: String,
    pub system: String,
    pub location: String,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub machine_id: String,
    pub name: String,
}

/// `data` of a successful `POST /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub client_id: i64,
    pub name: String,
    pub location: String,
}

/// Latest snapshot of one client, joined with the client's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LatestStatus {
    pub machine_id: String,
    pub name: String,
    pub id: i64,
    pub client_id: i64,
    pub system: String,
    pub location: String,
    pub insert_utc_ts: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub metrics: Metrics,
}
