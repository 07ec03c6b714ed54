//! Conduit Materials
//!
//! Raceway types that show up on a takeoff. The serialized form of each
//! variant is the catalog string the estimating sheets use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conduit (raceway) material type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConduitMaterial {
    /// Electrical metallic tubing
    #[serde(rename = "EMT")]
    Emt,
    /// Intermediate metal conduit
    #[serde(rename = "IMC")]
    Imc,
    /// Rigid metal conduit (galvanized)
    #[serde(rename = "RMC")]
    Rmc,
    /// Rigid PVC, schedule 40
    #[serde(rename = "PVC")]
    Pvc,
    /// Flexible metal conduit
    #[serde(rename = "Flex")]
    Fmc,
    /// Liquidtight flexible metal conduit
    #[serde(rename = "Liquidtight Flex")]
    Lfmc,
}

impl ConduitMaterial {
    pub const ALL: [ConduitMaterial; 6] = [
        ConduitMaterial::Emt,
        ConduitMaterial::Imc,
        ConduitMaterial::Rmc,
        ConduitMaterial::Pvc,
        ConduitMaterial::Fmc,
        ConduitMaterial::Lfmc,
    ];

    /// Catalog string, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ConduitMaterial::Emt => "EMT",
            ConduitMaterial::Imc => "IMC",
            ConduitMaterial::Rmc => "RMC",
            ConduitMaterial::Pvc => "PVC",
            ConduitMaterial::Fmc => "Flex",
            ConduitMaterial::Lfmc => "Liquidtight Flex",
        }
    }

    /// Flexible raceway gets no connectors or couplings on the BOM
    pub fn is_flexible(&self) -> bool {
        self.as_str().to_lowercase().contains("flex")
    }
}

impl fmt::Display for ConduitMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConduitMaterial {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EMT" => Ok(ConduitMaterial::Emt),
            "IMC" => Ok(ConduitMaterial::Imc),
            "RMC" | "GRC" | "RIGID" => Ok(ConduitMaterial::Rmc),
            "PVC" | "PVC SCH 40" | "PVC40" => Ok(ConduitMaterial::Pvc),
            "FLEX" | "FMC" => Ok(ConduitMaterial::Fmc),
            "LIQUIDTIGHT FLEX" | "LFMC" | "SEALTITE" => Ok(ConduitMaterial::Lfmc),
            _ => Err(format!("Unknown conduit material: {}", s)),
        }
    }
}
