use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Status string the backend uses for a reel mounted on the corrugator
pub const STATUS_IN_USE: &str = "IN_USE";

/// Lifecycle status of a reel
///
/// The backend sends the status as an upper snake case string. Records are
/// kept verbatim, so unknown statuses survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReelStatus {
    InUse,
    NotInUse,
    PartiallyUsedAvailable,
    UseCompleted,
    Other(String),
}

impl ReelStatus {
    /// Parse a raw status string, ignoring ASCII case
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "IN_USE" => ReelStatus::InUse,
            "NOT_IN_USE" => ReelStatus::NotInUse,
            "PARTIALLY_USED_AVAILABLE" => ReelStatus::PartiallyUsedAvailable,
            "USE_COMPLETED" => ReelStatus::UseCompleted,
            _ => ReelStatus::Other(raw.to_string()),
        }
    }

    /// Human readable label shown in the tables
    pub fn label(&self) -> &str {
        match self {
            ReelStatus::InUse => "In Use",
            ReelStatus::NotInUse => "Not In Use",
            ReelStatus::PartiallyUsedAvailable => "Partially Used (Available)",
            ReelStatus::UseCompleted => "Use Completed",
            ReelStatus::Other(raw) => raw,
        }
    }
}

/// A roll of raw paper stock as returned by the inventory endpoints
///
/// Attribute fields the backend sometimes sends as numbers and sometimes as
/// strings (GSM, burst factor, deckle) are normalised to strings so filters
/// can compare them exactly. Records built with [`Reel::from_json`] also keep
/// the object exactly as the backend sent it in `raw`, for spreadsheet export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reel {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub reel_no: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub barcode_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub gsm: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub bf: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub deckle: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub paper_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub supplier_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub initial_weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub current_weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub previous_weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,

    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl Reel {
    /// Decode one backend record, keeping the original object alongside
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let raw = match &value {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let mut reel: Reel = serde_json::from_value(value)?;
        reel.raw = raw;
        Ok(reel)
    }

    pub fn is_in_use(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(STATUS_IN_USE))
    }

    /// Deckle width as a number; missing or non-numeric deckle counts as zero
    pub fn deckle_value(&self) -> f64 {
        self.deckle
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite())
            .unwrap_or(0.0)
    }

    pub fn status_label(&self) -> String {
        match &self.status {
            Some(raw) => ReelStatus::parse(raw).label().to_string(),
            None => String::new(),
        }
    }
}

/// A single consumption of a reel against a client order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub barcode_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub client_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub product_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub box_count: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub weight_consumed: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub previous_weight: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub usage_type: Option<String>,

    /// Time the reel went onto the corrugator (backend field name kept as is)
    #[serde(rename = "courgationIn", default, deserialize_with = "lenient_string")]
    pub corrugation_in: Option<String>,

    /// `None` while the usage is still open
    #[serde(rename = "courgationOut", default, deserialize_with = "lenient_string")]
    pub corrugation_out: Option<String>,
}

/// Reel currently in use together with its usage events, in backend order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InUseReel {
    #[serde(flatten)]
    pub reel: Reel,

    #[serde(default)]
    pub order_usages: Vec<UsageEvent>,
}

/// Response of the per-barcode usage history endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelUsageHistory {
    #[serde(default, deserialize_with = "lenient_string")]
    pub barcode_id: Option<String>,

    #[serde(default)]
    pub usages: Vec<UsageEvent>,
}

/// Profile of the logged-in administrator, as returned at login
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

/// Accepts a string, number or bool and keeps its textual form; `null` becomes `None`
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Accepts a number or a numeric string; anything else becomes `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reel_accepts_numbers_or_strings() {
        let reel = Reel::from_json(serde_json::json!({
            "_id": "abc",
            "barcodeId": "R1",
            "gsm": 120,
            "deckle": "30",
            "currentWeight": "120.5",
            "status": "IN_USE",
            "location": "Bay 4"
        }))
        .unwrap();

        assert_eq!(reel.id.as_deref(), Some("abc"));
        assert_eq!(reel.gsm.as_deref(), Some("120"));
        assert_eq!(reel.deckle_value(), 30.0);
        assert_eq!(reel.current_weight, Some(120.5));
        assert!(reel.is_in_use());
        assert_eq!(reel.raw.get("location"), Some(&Value::from("Bay 4")));
        assert_eq!(reel.raw.get("gsm"), Some(&Value::from(120)));
    }

    #[test]
    fn deckle_falls_back_to_zero() {
        let mut reel = Reel::default();
        assert_eq!(reel.deckle_value(), 0.0);
        reel.deckle = Some("wide".to_string());
        assert_eq!(reel.deckle_value(), 0.0);
    }

    #[test]
    fn status_parse_ignores_case() {
        assert_eq!(ReelStatus::parse("in_use"), ReelStatus::InUse);
        assert_eq!(ReelStatus::parse("USE_COMPLETED").label(), "Use Completed");
        assert_eq!(ReelStatus::parse("SCRAPPED").label(), "SCRAPPED");
    }

    #[test]
    fn usage_event_without_out_timestamp() {
        let event: UsageEvent = serde_json::from_value(serde_json::json!({
            "clientName": "Acme",
            "courgationIn": "2024-03-05T09:00:00Z",
            "courgationOut": null
        }))
        .unwrap();
        assert_eq!(event.corrugation_in.as_deref(), Some("2024-03-05T09:00:00Z"));
        assert!(event.corrugation_out.is_none());
    }
}
