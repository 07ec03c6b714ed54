//! Wire Size Catalog
//!
//! The fixed catalog of conductor sizes, ordered by physical cross-section:
//! AWG gauges from #18 down to #1, then the aught sizes, then kcmil.
//!
//! ## Breaker and Ground Tables
//!
//! Two lookups ride on the catalog:
//! - conductor size → associated breaker amperage (75 °C copper column,
//!   rounded to a standard overcurrent rating)
//! - breaker amperage → minimum equipment grounding conductor (NEC 250.122,
//!   copper)
//!
//! The ground table is searched with a binary search over its ascending
//! amperage keys: an exact key returns its row, anything else returns the row
//! at the insertion index, i.e. the smallest tabulated amperage above the
//! request. Requests above the last key have no ground size.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{LookupMiss, LookupTable};

/// Conductor size, smallest cross-section first.
///
/// `Ord` follows the cross-section, so `a > b` reads "a is a larger wire".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WireSize {
    #[serde(rename = "#18")]
    Awg18,
    #[serde(rename = "#16")]
    Awg16,
    #[serde(rename = "#14")]
    Awg14,
    #[serde(rename = "#12")]
    Awg12,
    #[serde(rename = "#10")]
    Awg10,
    #[serde(rename = "#8")]
    Awg8,
    #[serde(rename = "#6")]
    Awg6,
    #[serde(rename = "#4")]
    Awg4,
    #[serde(rename = "#3")]
    Awg3,
    #[serde(rename = "#2")]
    Awg2,
    #[serde(rename = "#1")]
    Awg1,
    #[serde(rename = "1/0")]
    OneAught,
    #[serde(rename = "2/0")]
    TwoAught,
    #[serde(rename = "3/0")]
    ThreeAught,
    #[serde(rename = "4/0")]
    FourAught,
    #[serde(rename = "250 MCM")]
    Kcmil250,
    #[serde(rename = "300 MCM")]
    Kcmil300,
    #[serde(rename = "350 MCM")]
    Kcmil350,
    #[serde(rename = "400 MCM")]
    Kcmil400,
    #[serde(rename = "500 MCM")]
    Kcmil500,
    #[serde(rename = "600 MCM")]
    Kcmil600,
    #[serde(rename = "700 MCM")]
    Kcmil700,
    #[serde(rename = "750 MCM")]
    Kcmil750,
    #[serde(rename = "800 MCM")]
    Kcmil800,
    #[serde(rename = "900 MCM")]
    Kcmil900,
    #[serde(rename = "1000 MCM")]
    Kcmil1000,
}

impl WireSize {
    /// The whole catalog, smallest first
    pub const ALL: [WireSize; 26] = [
        WireSize::Awg18,
        WireSize::Awg16,
        WireSize::Awg14,
        WireSize::Awg12,
        WireSize::Awg10,
        WireSize::Awg8,
        WireSize::Awg6,
        WireSize::Awg4,
        WireSize::Awg3,
        WireSize::Awg2,
        WireSize::Awg1,
        WireSize::OneAught,
        WireSize::TwoAught,
        WireSize::ThreeAught,
        WireSize::FourAught,
        WireSize::Kcmil250,
        WireSize::Kcmil300,
        WireSize::Kcmil350,
        WireSize::Kcmil400,
        WireSize::Kcmil500,
        WireSize::Kcmil600,
        WireSize::Kcmil700,
        WireSize::Kcmil750,
        WireSize::Kcmil800,
        WireSize::Kcmil900,
        WireSize::Kcmil1000,
    ];

    /// Catalog string, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            WireSize::Awg18 => "#18",
            WireSize::Awg16 => "#16",
            WireSize::Awg14 => "#14",
            WireSize::Awg12 => "#12",
            WireSize::Awg10 => "#10",
            WireSize::Awg8 => "#8",
            WireSize::Awg6 => "#6",
            WireSize::Awg4 => "#4",
            WireSize::Awg3 => "#3",
            WireSize::Awg2 => "#2",
            WireSize::Awg1 => "#1",
            WireSize::OneAught => "1/0",
            WireSize::TwoAught => "2/0",
            WireSize::ThreeAught => "3/0",
            WireSize::FourAught => "4/0",
            WireSize::Kcmil250 => "250 MCM",
            WireSize::Kcmil300 => "300 MCM",
            WireSize::Kcmil350 => "350 MCM",
            WireSize::Kcmil400 => "400 MCM",
            WireSize::Kcmil500 => "500 MCM",
            WireSize::Kcmil600 => "600 MCM",
            WireSize::Kcmil700 => "700 MCM",
            WireSize::Kcmil750 => "750 MCM",
            WireSize::Kcmil800 => "800 MCM",
            WireSize::Kcmil900 => "900 MCM",
            WireSize::Kcmil1000 => "1000 MCM",
        }
    }

    /// Strictly larger cross-section than `other`
    pub fn is_larger_than(&self, other: &WireSize) -> bool {
        self > other
    }

    /// Breaker amperage associated with this conductor, if it carries power
    pub fn breaker_amperage(&self) -> Option<u32> {
        let amps = match self {
            WireSize::Awg18 | WireSize::Awg16 => return None,
            WireSize::Awg14 => 15,
            WireSize::Awg12 => 20,
            WireSize::Awg10 => 30,
            WireSize::Awg8 => 50,
            WireSize::Awg6 => 60,
            WireSize::Awg4 => 80,
            WireSize::Awg3 => 100,
            WireSize::Awg2 => 110,
            WireSize::Awg1 => 125,
            WireSize::OneAught => 150,
            WireSize::TwoAught => 175,
            WireSize::ThreeAught => 200,
            WireSize::FourAught => 225,
            WireSize::Kcmil250 => 250,
            WireSize::Kcmil300 => 300,
            WireSize::Kcmil350 | WireSize::Kcmil400 => 350,
            WireSize::Kcmil500 => 400,
            WireSize::Kcmil600 => 450,
            WireSize::Kcmil700 | WireSize::Kcmil750 | WireSize::Kcmil800 => 500,
            WireSize::Kcmil900 | WireSize::Kcmil1000 => 600,
        };
        Some(amps)
    }
}

impl fmt::Display for WireSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireSize {
    type Err = String;

    /// Accepts the catalog strings plus the usual spellings from takeoff
    /// exports: `12`, `#12 AWG`, `1/0 AWG`, `250`, `250kcmil`, `250 MCM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let stripped = upper
            .trim_start_matches('#')
            .trim_end_matches("AWG")
            .trim_end_matches("KCMIL")
            .trim_end_matches("MCM")
            .trim();

        WireSize::ALL
            .iter()
            .copied()
            .find(|size| {
                let canonical = size.as_str();
                let bare = canonical.trim_start_matches('#').trim_end_matches(" MCM");
                bare == stripped
            })
            .ok_or_else(|| format!("Unknown wire size: {}", s))
    }
}

/// Breaker amperage → minimum copper equipment grounding conductor.
/// Keys are strictly ascending.
pub const GROUND_SIZE_TABLE: [(u32, WireSize); 19] = [
    (15, WireSize::Awg14),
    (20, WireSize::Awg12),
    (60, WireSize::Awg10),
    (100, WireSize::Awg8),
    (200, WireSize::Awg6),
    (300, WireSize::Awg4),
    (400, WireSize::Awg3),
    (500, WireSize::Awg2),
    (600, WireSize::Awg1),
    (800, WireSize::OneAught),
    (1000, WireSize::TwoAught),
    (1200, WireSize::ThreeAught),
    (1600, WireSize::FourAught),
    (2000, WireSize::Kcmil250),
    (2500, WireSize::Kcmil350),
    (3000, WireSize::Kcmil400),
    (4000, WireSize::Kcmil500),
    (5000, WireSize::Kcmil700),
    (6000, WireSize::Kcmil800),
];

/// Minimum ground size for a breaker amperage.
pub fn ground_size_for_breaker(amps: u32) -> Result<WireSize, LookupMiss> {
    let index = match GROUND_SIZE_TABLE.binary_search_by_key(&amps, |(key, _)| *key) {
        Ok(i) | Err(i) => i,
    };
    GROUND_SIZE_TABLE
        .get(index)
        .map(|(_, size)| *size)
        .ok_or_else(|| LookupMiss::new(LookupTable::GroundSize, format!("{}A", amps)))
}

/// Ground size sized off a hot conductor: conductor → breaker → ground.
pub fn ground_size_for_conductor(hot: WireSize) -> Result<WireSize, LookupMiss> {
    let amps = hot
        .breaker_amperage()
        .ok_or_else(|| LookupMiss::new(LookupTable::BreakerAmperage, hot.as_str()))?;
    ground_size_for_breaker(amps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        assert!(WireSize::Awg10.is_larger_than(&WireSize::Awg12));
        assert!(!WireSize::Awg12.is_larger_than(&WireSize::Awg10));
        assert!(WireSize::OneAught.is_larger_than(&WireSize::Awg1));
        assert!(WireSize::Kcmil250.is_larger_than(&WireSize::FourAught));
        assert!(!WireSize::Awg12.is_larger_than(&WireSize::Awg12));
    }

    #[test]
    fn test_all_is_sorted() {
        assert!(WireSize::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_serialized_form_is_catalog_string() {
        for size in WireSize::ALL {
            let json = serde_json::to_string(&size).unwrap();
            assert_eq!(json, format!("\"{}\"", size.as_str()));
        }
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!("#12".parse::<WireSize>(), Ok(WireSize::Awg12));
        assert_eq!("12".parse::<WireSize>(), Ok(WireSize::Awg12));
        assert_eq!("#12 AWG".parse::<WireSize>(), Ok(WireSize::Awg12));
        assert_eq!("1/0".parse::<WireSize>(), Ok(WireSize::OneAught));
        assert_eq!("250 MCM".parse::<WireSize>(), Ok(WireSize::Kcmil250));
        assert_eq!("250kcmil".parse::<WireSize>(), Ok(WireSize::Kcmil250));
        assert!("#11".parse::<WireSize>().is_err());
    }

    #[test]
    fn test_ground_lookup_exact_key() {
        assert_eq!(ground_size_for_breaker(20), Ok(WireSize::Awg12));
        assert_eq!(ground_size_for_breaker(100), Ok(WireSize::Awg8));
    }

    #[test]
    fn test_ground_lookup_insertion_point() {
        // 30A sits between 20 and 60 -> the 60A row
        assert_eq!(ground_size_for_breaker(30), Ok(WireSize::Awg10));
        // Below the first key -> first row
        assert_eq!(ground_size_for_breaker(5), Ok(WireSize::Awg14));
        assert_eq!(ground_size_for_breaker(225), Ok(WireSize::Awg4));
    }

    #[test]
    fn test_ground_lookup_exhausted() {
        let miss = ground_size_for_breaker(6001).unwrap_err();
        assert_eq!(miss.table, LookupTable::GroundSize);
        assert_eq!(miss.key, "6001A");
    }

    #[test]
    fn test_ground_for_conductor() {
        assert_eq!(ground_size_for_conductor(WireSize::Awg10), Ok(WireSize::Awg10));
        assert_eq!(ground_size_for_conductor(WireSize::Awg8), Ok(WireSize::Awg10));
        assert_eq!(ground_size_for_conductor(WireSize::ThreeAught), Ok(WireSize::Awg6));
        assert!(ground_size_for_conductor(WireSize::Awg18).is_err());
    }

    #[test]
    fn test_breaker_amperage_monotonic() {
        let amps: Vec<u32> = WireSize::ALL.iter().filter_map(|s| s.breaker_amperage()).collect();
        assert!(amps.windows(2).all(|w| w[0] <= w[1]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_size() -> impl Strategy<Value = WireSize> {
        (0..WireSize::ALL.len()).prop_map(|i| WireSize::ALL[i])
    }

    proptest! {
        #[test]
        fn larger_than_is_strict_total_order(a in any_size(), b in any_size(), c in any_size()) {
            let relations = [a.is_larger_than(&b), b.is_larger_than(&a), a == b];
            prop_assert_eq!(relations.iter().filter(|r| **r).count(), 1);
            if a.is_larger_than(&b) && b.is_larger_than(&c) {
                prop_assert!(a.is_larger_than(&c));
            }
        }

        #[test]
        fn parse_accepts_catalog_string(a in any_size()) {
            prop_assert_eq!(a.as_str().parse::<WireSize>(), Ok(a));
        }
    }
}
