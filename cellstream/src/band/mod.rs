//! LTE band table: channel number ⇄ carrier frequency.
//!
//! Pure lookups over static data. The normalizer uses these to fill in
//! `band`, `dl_freq_mhz` and `ul_freq_mhz` when the device only reported an
//! EARFCN.
//!
//! # Formula
//!
//! ```text
//! F_DL = F_DL_low + 0.1 × (N_DL − N_Offs-DL)
//! F_UL = F_UL_low + 0.1 × (N_DL − N_Offs-DL)     (FDD bands only)
//! ```
//!
//! # Example
//!
//! ```
//! use cellstream::band::{band_for_channel, carrier_frequencies};
//!
//! assert_eq!(band_for_channel(300), Some(1));
//! let freqs = carrier_frequencies(300, 1).unwrap();
//! assert_eq!(freqs.downlink_mhz, 2140.0);
//! assert_eq!(freqs.uplink_mhz, Some(1950.0));
//! ```

mod table;

pub use table::{BandPlan, ChannelRange, LTE_BANDS, LTE_BAND_RANGES};

/// Channel raster spacing in MHz.
const CHANNEL_RASTER_MHZ: f64 = 0.1;

/// Derived carrier frequencies for a channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierFrequencies {
    /// Downlink carrier in MHz.
    pub downlink_mhz: f64,
    /// Uplink carrier in MHz; absent for downlink-only bands.
    pub uplink_mhz: Option<f64>,
}

/// Look up the plan for a band number.
pub fn band_plan(band: u16) -> Option<&'static BandPlan> {
    LTE_BANDS.iter().find(|plan| plan.band == band)
}

/// Infer the band that owns `channel`.
///
/// Returns `None` when the channel falls outside every known range.
pub fn band_for_channel(channel: u32) -> Option<u16> {
    LTE_BAND_RANGES
        .iter()
        .find(|range| range.contains(channel))
        .map(|range| range.band)
}

/// Compute the carrier frequencies of `channel` within `band`.
///
/// Returns `None` for bands missing from the plan.
pub fn carrier_frequencies(channel: u32, band: u16) -> Option<CarrierFrequencies> {
    let plan = band_plan(band)?;
    let steps = (i64::from(channel) - i64::from(plan.channel_offset)) as f64;
    let delta = CHANNEL_RASTER_MHZ * steps;

    Some(CarrierFrequencies {
        downlink_mhz: round_mhz(plan.downlink_low_mhz + delta),
        uplink_mhz: plan.uplink_low_mhz.map(|low| round_mhz(low + delta)),
    })
}

/// Reverse lookup: the downlink channel carrying `downlink_mhz` in `band`.
///
/// Returns `None` if the band is unknown or the frequency lands outside the
/// band's channel range.
pub fn channel_for_frequency(downlink_mhz: f64, band: u16) -> Option<u32> {
    let plan = band_plan(band)?;
    let steps = ((downlink_mhz - plan.downlink_low_mhz) / CHANNEL_RASTER_MHZ).round();
    if !steps.is_finite() || steps < 0.0 {
        return None;
    }
    let channel = u32::try_from(steps as i64 + i64::from(plan.channel_offset)).ok()?;

    LTE_BAND_RANGES
        .iter()
        .find(|range| range.band == band)
        .filter(|range| range.contains(channel))
        .map(|_| channel)
}

/// Round to kHz precision to hide binary floating point noise.
fn round_mhz(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
