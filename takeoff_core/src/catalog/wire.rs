//! Wire Classifications
//!
//! Wire type tags, conductor materials, panel voltages and the fixed color
//! and type sets the upsizing pass keys off.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a wire is used for. Totals are requested per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WireType {
    Branch,
    Distribution,
    Feeder,
    #[serde(rename = "Low Voltage")]
    LowVoltage,
    #[serde(rename = "Fire Alarm")]
    FireAlarm,
    Data,
}

/// Wire types that are never resized by voltage drop rules.
pub const LOW_VOLTAGE_TYPES: [WireType; 3] = [WireType::LowVoltage, WireType::FireAlarm, WireType::Data];

impl WireType {
    pub const ALL: [WireType; 6] = [
        WireType::Branch,
        WireType::Distribution,
        WireType::Feeder,
        WireType::LowVoltage,
        WireType::FireAlarm,
        WireType::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WireType::Branch => "Branch",
            WireType::Distribution => "Distribution",
            WireType::Feeder => "Feeder",
            WireType::LowVoltage => "Low Voltage",
            WireType::FireAlarm => "Fire Alarm",
            WireType::Data => "Data",
        }
    }

    pub fn is_low_voltage(&self) -> bool {
        LOW_VOLTAGE_TYPES.contains(self)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WireType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown wire type: {}", s))
    }
}

/// Conductor material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum WireMaterial {
    #[default]
    #[serde(rename = "CU")]
    Copper,
    #[serde(rename = "AL")]
    Aluminum,
}

impl WireMaterial {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireMaterial::Copper => "CU",
            WireMaterial::Aluminum => "AL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            WireMaterial::Copper => "Copper",
            WireMaterial::Aluminum => "Aluminum",
        }
    }
}

impl fmt::Display for WireMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Panel voltage label, compared by exact string equality (`"120V"`,
/// `"208V"`, `"277V"`, `"480V"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Voltage(pub String);

impl Voltage {
    pub fn new(label: impl Into<String>) -> Self {
        Voltage(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insulation colors that mark an equipment grounding conductor.
pub const GROUND_COLORS: [&str; 4] = ["Green", "Green/Yellow", "Green w/ Yellow Stripe", "Bare"];

/// Whether a color marks a ground wire (ASCII case-insensitive)
pub fn is_ground_color(color: &str) -> bool {
    let color = color.trim();
    GROUND_COLORS.iter().any(|g| g.eq_ignore_ascii_case(color))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_voltage_set() {
        assert!(WireType::LowVoltage.is_low_voltage());
        assert!(WireType::Data.is_low_voltage());
        assert!(!WireType::Branch.is_low_voltage());
        assert!(!WireType::Feeder.is_low_voltage());
    }

    #[test]
    fn test_ground_colors() {
        assert!(is_ground_color("Green"));
        assert!(is_ground_color("green"));
        assert!(is_ground_color(" BARE "));
        assert!(!is_ground_color("Black"));
        assert!(!is_ground_color("White"));
    }

    #[test]
    fn test_wire_type_parse() {
        assert_eq!("branch".parse::<WireType>(), Ok(WireType::Branch));
        assert_eq!("Fire Alarm".parse::<WireType>(), Ok(WireType::FireAlarm));
        assert!("Signal".parse::<WireType>().is_err());
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&WireType::LowVoltage).unwrap(), "\"Low Voltage\"");
        assert_eq!(serde_json::to_string(&WireMaterial::Aluminum).unwrap(), "\"AL\"");
        assert_eq!(serde_json::to_string(&Voltage::new("208V")).unwrap(), "\"208V\"");
    }
}
