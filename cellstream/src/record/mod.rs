//! Record normalization.
//!
//! Turns one parsed device message plus its selected cells into a
//! [`CanonicalRecord`], deriving band and carrier frequencies from the band
//! table when the phone did not report them.
//!
//! # Pipeline
//!
//! ```text
//! line ──► RawMessage::from_line ──► select_cells ──► normalize ──► CanonicalRecord
//!                                     (primary +        (dedup key,
//!                                      neighbors)        frequencies)
//! ```

mod canonical;
mod model;
mod normalizer;
mod scalar;
mod selection;

pub use canonical::{CanonicalRecord, FIELD_NAMES, GPS_ONLY_KEY, GPS_ONLY_RAT};
pub use model::{CellObservation, RawMessage};
pub use normalizer::{
    area_code, cell_identity, channel_number, dedup_key, derive_frequencies, neighbor_payload,
    normalize, DerivedFrequencies,
};
pub use scalar::{format_float, Scalar};
pub use selection::{select_cells, CellSelection};

#[cfg(test)]
pub(crate) use canonical::tests::sample_record;
