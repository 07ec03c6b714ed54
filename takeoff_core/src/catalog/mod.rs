//! # Catalogs
//!
//! Closed vocabularies and static lookup tables. Everything the host hands
//! over as a free string (conduit types, wire sizes) is parsed into one of
//! these types at the edge; inside the engine only the typed form exists, and
//! each type serializes back to its catalog string.
//!
//! - [`wire_size`] - conductor sizes, breaker and ground tables
//! - [`wire`] - wire types, conductor materials, voltages, ground colors
//! - [`conduit`] - raceway materials
//! - [`weights`] - conduit and wire weight per foot
//! - [`strut`] - strut beam loading table

pub mod conduit;
pub mod strut;
pub mod weights;
pub mod wire;
pub mod wire_size;

pub use conduit::ConduitMaterial;
pub use strut::{strut_capacity, StrutCapacity};
pub use weights::{conduit_weight, wire_weight};
pub use wire::{is_ground_color, Voltage, WireMaterial, WireType};
pub use wire_size::{ground_size_for_breaker, ground_size_for_conductor, WireSize};
