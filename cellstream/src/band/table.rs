//! Static LTE band plan data.
//!
//! Values follow 3GPP TS 36.101 table 5.7.3-1 (subset).

/// Frequency allocation for a single E-UTRA band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPlan {
    /// E-UTRA operating band number.
    pub band: u16,
    /// Lowest downlink frequency in MHz.
    pub downlink_low_mhz: f64,
    /// Lowest uplink frequency in MHz, `None` for downlink-only bands.
    pub uplink_low_mhz: Option<f64>,
    /// Downlink EARFCN offset (N_Offs-DL).
    pub channel_offset: u32,
}

/// Inclusive EARFCN range belonging to one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub band: u16,
    pub first: u32,
    pub last: u32,
}

impl ChannelRange {
    /// Whether `channel` falls inside this range (both ends inclusive).
    pub fn contains(&self, channel: u32) -> bool {
        self.first <= channel && channel <= self.last
    }
}

const fn fdd(band: u16, dl: f64, ul: f64, offset: u32) -> BandPlan {
    BandPlan {
        band,
        downlink_low_mhz: dl,
        uplink_low_mhz: Some(ul),
        channel_offset: offset,
    }
}

const fn dl_only(band: u16, dl: f64, offset: u32) -> BandPlan {
    BandPlan {
        band,
        downlink_low_mhz: dl,
        uplink_low_mhz: None,
        channel_offset: offset,
    }
}

const fn range(band: u16, first: u32, last: u32) -> ChannelRange {
    ChannelRange { band, first, last }
}

/// Known band plans, keyed by band number.
pub const LTE_BANDS: &[BandPlan] = &[
    fdd(1, 2110.0, 1920.0, 0),
    fdd(2, 1930.0, 1850.0, 600),
    fdd(3, 1805.0, 1710.0, 1200),
    fdd(4, 2110.0, 1710.0, 1950),
    fdd(5, 869.0, 824.0, 2400),
    fdd(6, 830.0, 875.0, 2650),
    fdd(7, 2620.0, 2500.0, 2750),
    fdd(8, 925.0, 880.0, 3450),
    fdd(9, 1844.9, 1749.9, 3800),
    fdd(10, 2110.0, 1710.0, 4150),
    fdd(11, 1475.9, 1427.9, 4750),
    fdd(12, 729.0, 699.0, 5010),
    fdd(13, 746.0, 777.0, 5180),
    fdd(14, 758.0, 788.0, 5280),
    fdd(17, 734.0, 704.0, 5035),
    fdd(18, 860.0, 815.0, 5850),
    fdd(19, 875.0, 830.0, 6000),
    fdd(20, 791.0, 832.0, 6150),
    fdd(21, 1495.9, 1447.9, 6450),
    fdd(22, 3510.0, 3410.0, 6600),
    fdd(23, 2180.0, 2000.0, 7500),
    fdd(24, 1525.0, 1626.5, 7700),
    fdd(25, 1930.0, 1850.0, 8040),
    fdd(26, 859.0, 814.0, 8690),
    fdd(27, 852.0, 807.0, 9040),
    fdd(28, 758.0, 703.0, 9210),
    dl_only(29, 717.0, 9660),
    fdd(30, 2350.0, 2305.0, 9770),
    fdd(31, 462.5, 452.5, 9870),
    dl_only(32, 1452.0, 9920),
    // TDD bands carry no separate uplink allocation.
    dl_only(33, 1900.0, 36000),
    dl_only(34, 2010.0, 36200),
    dl_only(35, 1850.0, 36350),
    dl_only(36, 1930.0, 36950),
    dl_only(37, 1910.0, 37550),
    dl_only(38, 2570.0, 37750),
    dl_only(39, 1880.0, 38250),
    dl_only(40, 2300.0, 38650),
    dl_only(41, 2496.0, 39650),
    dl_only(42, 3400.0, 41590),
    dl_only(43, 3600.0, 43590),
    dl_only(48, 3550.0, 55240),
    fdd(65, 2110.0, 1920.0, 65536),
    fdd(66, 2110.0, 1710.0, 66436),
    dl_only(67, 738.0, 67336),
    fdd(68, 753.0, 698.0, 68336),
    fdd(71, 617.0, 663.0, 13470),
];

/// EARFCN ranges used to infer a band when the device did not report one.
///
/// Ranges are pairwise disjoint. Channels in the gaps map to no band.
pub const LTE_BAND_RANGES: &[ChannelRange] = &[
    range(1, 0, 599),
    range(2, 600, 1199),
    range(3, 1200, 1949),
    range(4, 1950, 2399),
    range(5, 2400, 2649),
    range(6, 2650, 2749),
    range(7, 2750, 3449),
    range(8, 3450, 3799),
    range(9, 3800, 4149),
    range(10, 4150, 4749),
    range(11, 4750, 4949),
    range(12, 5010, 5179),
    range(13, 5180, 5279),
    range(14, 5280, 5379),
    range(17, 5730, 5849),
    range(18, 5850, 5999),
    range(19, 6000, 6149),
    range(20, 6150, 6449),
    range(21, 6450, 6599),
    range(22, 6600, 7399),
    range(23, 7500, 7699),
    range(24, 7700, 8039),
    range(25, 8040, 8689),
    range(26, 8690, 9039),
    range(27, 9040, 9209),
    range(28, 9210, 9659),
    range(29, 9660, 9769),
    range(30, 9770, 9869),
    range(31, 9870, 9919),
    range(32, 9920, 10359),
    range(33, 36000, 36199),
    range(34, 36200, 36349),
    range(35, 36350, 36949),
    range(36, 36950, 37549),
    range(37, 37550, 37749),
    range(38, 37750, 38249),
    range(39, 38250, 38649),
    range(40, 38650, 39649),
    range(41, 39650, 41589),
    range(42, 41590, 43589),
    range(43, 43590, 45589),
    range(48, 55240, 56739),
    range(65, 65536, 66435),
    range(66, 66436, 67335),
    range(67, 67336, 67535),
    range(68, 68336, 68585),
    range(71, 13470, 13719),
];
