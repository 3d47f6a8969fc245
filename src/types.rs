use geo::MultiPolygon;
use serde_json::Map;
use std::fmt;

/// Power condition of a district.
///
/// Unrecognized raw values are carried verbatim in `Other` rather than
/// rejected; the map simply styles them as neutral. `Unset` is the state
/// before any status has been recorded for the district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerStatus {
    Powered,
    Outage,
    Other(String),
    Unset,
}

impl PowerStatus {
    /// Total parse: every input maps to a status, nothing errors.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "powered" => PowerStatus::Powered,
            "outage" => PowerStatus::Outage,
            "" => PowerStatus::Unset,
            _ => PowerStatus::Other(raw.to_string()),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, PowerStatus::Unset)
    }
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerStatus::Powered => write!(f, "powered"),
            PowerStatus::Outage => write!(f, "outage"),
            PowerStatus::Other(raw) => write!(f, "{}", raw),
            PowerStatus::Unset => Ok(()),
        }
    }
}

/// One named region tracked for power status.
///
/// `extra` holds every input property the model does not interpret; it is
/// preserved verbatim through updates, as is the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct District {
    pub name: String,
    pub population_estimate: Option<u64>,
    pub status: PowerStatus,
    pub outage_start: Option<String>,
    pub outage_end: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub extra: Map<String, serde_json::Value>,
}

/// One immutable version of the full district collection.
///
/// Published snapshots are never mutated in place; every edit produces a
/// fresh `Dataset` (see `mutate::apply`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub districts: Vec<District>,
}

impl Dataset {
    pub fn find(&self, name: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognized_statuses() {
        assert_eq!(PowerStatus::parse("powered"), PowerStatus::Powered);
        assert_eq!(PowerStatus::parse("Outage"), PowerStatus::Outage);
        assert_eq!(PowerStatus::parse(""), PowerStatus::Unset);
    }

    #[test]
    fn parse_keeps_unrecognized_values_verbatim() {
        let status = PowerStatus::parse("Partially-Restored");
        assert_eq!(status, PowerStatus::Other("Partially-Restored".to_string()));
        assert_eq!(status.to_string(), "Partially-Restored");
    }

    #[test]
    fn display_round_trips_known_values() {
        assert_eq!(PowerStatus::Powered.to_string(), "powered");
        assert_eq!(PowerStatus::Outage.to_string(), "outage");
        assert_eq!(PowerStatus::Unset.to_string(), "");
    }
}
