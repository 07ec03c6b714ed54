//! Weight Tables
//!
//! Linear weights used by the rack load calculator. Conduit weights are empty
//! raceway per foot; wire weights are a single insulated conductor per foot
//! (THHN/THWN-2 copper, XHHW-2 aluminum). Values are typical manufacturer
//! catalog figures, not guaranteed maxima.
//!
//! Tables are built once on first use.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::conduit::ConduitMaterial;
use super::wire::WireMaterial;
use super::wire_size::WireSize;
use crate::units::{Inches, NominalDiameter, PlF};

/// (material, trade size in inches, lb/ft)
const CONDUIT_WEIGHT_ROWS: &[(ConduitMaterial, f64, f64)] = &[
    (ConduitMaterial::Emt, 0.5, 0.30),
    (ConduitMaterial::Emt, 0.75, 0.46),
    (ConduitMaterial::Emt, 1.0, 0.67),
    (ConduitMaterial::Emt, 1.25, 1.01),
    (ConduitMaterial::Emt, 1.5, 1.16),
    (ConduitMaterial::Emt, 2.0, 1.48),
    (ConduitMaterial::Emt, 2.5, 2.16),
    (ConduitMaterial::Emt, 3.0, 2.63),
    (ConduitMaterial::Emt, 3.5, 3.49),
    (ConduitMaterial::Emt, 4.0, 3.93),
    (ConduitMaterial::Imc, 0.5, 0.62),
    (ConduitMaterial::Imc, 0.75, 0.84),
    (ConduitMaterial::Imc, 1.0, 1.19),
    (ConduitMaterial::Imc, 1.25, 1.58),
    (ConduitMaterial::Imc, 1.5, 1.94),
    (ConduitMaterial::Imc, 2.0, 2.56),
    (ConduitMaterial::Imc, 2.5, 4.41),
    (ConduitMaterial::Imc, 3.0, 5.43),
    (ConduitMaterial::Imc, 3.5, 6.29),
    (ConduitMaterial::Imc, 4.0, 7.00),
    (ConduitMaterial::Rmc, 0.5, 0.82),
    (ConduitMaterial::Rmc, 0.75, 1.09),
    (ConduitMaterial::Rmc, 1.0, 1.61),
    (ConduitMaterial::Rmc, 1.25, 2.18),
    (ConduitMaterial::Rmc, 1.5, 2.63),
    (ConduitMaterial::Rmc, 2.0, 3.50),
    (ConduitMaterial::Rmc, 2.5, 5.59),
    (ConduitMaterial::Rmc, 3.0, 7.27),
    (ConduitMaterial::Rmc, 3.5, 8.80),
    (ConduitMaterial::Rmc, 4.0, 10.30),
    (ConduitMaterial::Pvc, 0.5, 0.16),
    (ConduitMaterial::Pvc, 0.75, 0.22),
    (ConduitMaterial::Pvc, 1.0, 0.32),
    (ConduitMaterial::Pvc, 1.25, 0.43),
    (ConduitMaterial::Pvc, 1.5, 0.52),
    (ConduitMaterial::Pvc, 2.0, 0.70),
    (ConduitMaterial::Pvc, 2.5, 1.10),
    (ConduitMaterial::Pvc, 3.0, 1.44),
    (ConduitMaterial::Pvc, 3.5, 1.73),
    (ConduitMaterial::Pvc, 4.0, 2.05),
    (ConduitMaterial::Fmc, 0.5, 0.24),
    (ConduitMaterial::Fmc, 0.75, 0.33),
    (ConduitMaterial::Fmc, 1.0, 0.48),
    (ConduitMaterial::Fmc, 1.25, 0.62),
    (ConduitMaterial::Fmc, 1.5, 0.74),
    (ConduitMaterial::Fmc, 2.0, 0.96),
    (ConduitMaterial::Lfmc, 0.5, 0.34),
    (ConduitMaterial::Lfmc, 0.75, 0.44),
    (ConduitMaterial::Lfmc, 1.0, 0.62),
    (ConduitMaterial::Lfmc, 1.25, 0.85),
    (ConduitMaterial::Lfmc, 1.5, 1.00),
    (ConduitMaterial::Lfmc, 2.0, 1.32),
];

/// (size, material, lb/ft)
const WIRE_WEIGHT_ROWS: &[(WireSize, WireMaterial, f64)] = &[
    (WireSize::Awg18, WireMaterial::Copper, 0.008),
    (WireSize::Awg16, WireMaterial::Copper, 0.011),
    (WireSize::Awg14, WireMaterial::Copper, 0.016),
    (WireSize::Awg12, WireMaterial::Copper, 0.024),
    (WireSize::Awg10, WireMaterial::Copper, 0.038),
    (WireSize::Awg8, WireMaterial::Copper, 0.063),
    (WireSize::Awg6, WireMaterial::Copper, 0.100),
    (WireSize::Awg4, WireMaterial::Copper, 0.160),
    (WireSize::Awg3, WireMaterial::Copper, 0.200),
    (WireSize::Awg2, WireMaterial::Copper, 0.250),
    (WireSize::Awg1, WireMaterial::Copper, 0.320),
    (WireSize::OneAught, WireMaterial::Copper, 0.400),
    (WireSize::TwoAught, WireMaterial::Copper, 0.500),
    (WireSize::ThreeAught, WireMaterial::Copper, 0.620),
    (WireSize::FourAught, WireMaterial::Copper, 0.780),
    (WireSize::Kcmil250, WireMaterial::Copper, 0.920),
    (WireSize::Kcmil300, WireMaterial::Copper, 1.090),
    (WireSize::Kcmil350, WireMaterial::Copper, 1.270),
    (WireSize::Kcmil400, WireMaterial::Copper, 1.440),
    (WireSize::Kcmil500, WireMaterial::Copper, 1.790),
    (WireSize::Kcmil600, WireMaterial::Copper, 2.160),
    (WireSize::Kcmil750, WireMaterial::Copper, 2.690),
    (WireSize::Awg4, WireMaterial::Aluminum, 0.062),
    (WireSize::Awg2, WireMaterial::Aluminum, 0.087),
    (WireSize::OneAught, WireMaterial::Aluminum, 0.130),
    (WireSize::TwoAught, WireMaterial::Aluminum, 0.160),
    (WireSize::ThreeAught, WireMaterial::Aluminum, 0.195),
    (WireSize::FourAught, WireMaterial::Aluminum, 0.240),
    (WireSize::Kcmil250, WireMaterial::Aluminum, 0.290),
    (WireSize::Kcmil300, WireMaterial::Aluminum, 0.340),
    (WireSize::Kcmil350, WireMaterial::Aluminum, 0.390),
    (WireSize::Kcmil500, WireMaterial::Aluminum, 0.540),
    (WireSize::Kcmil600, WireMaterial::Aluminum, 0.650),
    (WireSize::Kcmil750, WireMaterial::Aluminum, 0.800),
];

static CONDUIT_WEIGHTS: Lazy<HashMap<(ConduitMaterial, NominalDiameter), PlF>> = Lazy::new(|| {
    CONDUIT_WEIGHT_ROWS
        .iter()
        .map(|&(material, trade_in, plf)| {
            ((material, NominalDiameter::from_inches(Inches(trade_in))), PlF(plf))
        })
        .collect()
});

static WIRE_WEIGHTS: Lazy<HashMap<(WireSize, WireMaterial), PlF>> = Lazy::new(|| {
    WIRE_WEIGHT_ROWS
        .iter()
        .map(|&(size, material, plf)| ((size, material), PlF(plf)))
        .collect()
});

/// Empty raceway weight per foot
pub fn conduit_weight(material: ConduitMaterial, diameter: NominalDiameter) -> Option<PlF> {
    CONDUIT_WEIGHTS.get(&(material, diameter)).copied()
}

/// Single conductor weight per foot
pub fn wire_weight(size: WireSize, material: WireMaterial) -> Option<PlF> {
    WIRE_WEIGHTS.get(&(size, material)).copied()
}
