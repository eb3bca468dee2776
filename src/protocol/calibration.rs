//! # Temperature Sensor Calibration
//!
//! Resolves raw ADC counts from the antenna system's LM94022 temperature
//! sensor (gain select GS=10) to whole degrees Celsius, using the lookup
//! table from the sensor datasheet (Texas Instruments, SNIS140F).
//!
//! ## Resolution
//!
//! The raw count is scaled to millivolts (3.3 V full scale over the
//! 10-bit ADC). The sensor output falls as temperature rises, so the
//! reading resolves to the first table entry whose output voltage is at or
//! below the scaled value. There is no interpolation: the result is
//! truncated to a calibrated degree.
//!
//! Readings above the first entry or below the last entry are reported as
//! [`TemperatureReading::OutOfRange`].
//!
//! ```
//! use ants_driver::protocol::calibration::{resolve_millivolts, TemperatureReading};
//!
//! assert_eq!(resolve_millivolts(2616.0), TemperatureReading::Celsius(-50));
//! assert_eq!(resolve_millivolts(419.0), TemperatureReading::OutOfRange);
//! ```

use serde::Serialize;

/// Millivolts per ADC count (3300 mV over the 10-bit converter)
pub const ADC_MILLIVOLTS_PER_COUNT: f64 = 3.225_806_45;

/// Temperature of the first table entry
pub const TABLE_START_CELSIUS: i16 = -50;

/// Value reported for readings outside the calibrated band
pub const OUT_OF_RANGE_SENTINEL: i16 = -200;

/// Number of calibration points (-50 °C to +150 °C in 1 °C steps)
pub const TABLE_LEN: usize = 201;

/// Sensor output in millivolts, one entry per degree from -50 °C upward.
/// Strictly decreasing.
pub const SIGNAL_MILLIVOLTS: [u16; TABLE_LEN] = [
    2616, 2607, 2598, 2589, 2580, 2571, 2562, 2553, 2543, 2533,
    2522, 2512, 2501, 2491, 2481, 2470, 2460, 2449, 2439, 2429,
    2418, 2408, 2397, 2387, 2376, 2366, 2355, 2345, 2334, 2324,
    2313, 2302, 2292, 2281, 2271, 2260, 2250, 2239, 2228, 2218,
    2207, 2197, 2186, 2175, 2164, 2154, 2143, 2132, 2122, 2111,
    2100, 2089, 2079, 2068, 2057, 2047, 2036, 2025, 2014, 2004,
    1993, 1982, 1971, 1961, 1950, 1939, 1928, 1918, 1907, 1896,
    1885, 1874, 1864, 1853, 1842, 1831, 1820, 1810, 1799, 1788,
    1777, 1766, 1756, 1745, 1734, 1723, 1712, 1701, 1690, 1679,
    1668, 1657, 1646, 1635, 1624, 1613, 1602, 1591, 1580, 1569,
    1558, 1547, 1536, 1525, 1514, 1503, 1492, 1481, 1470, 1459,
    1448, 1436, 1425, 1414, 1403, 1391, 1380, 1369, 1358, 1346,
    1335, 1324, 1313, 1301, 1290, 1279, 1268, 1257, 1245, 1234,
    1223, 1212, 1201, 1189, 1178, 1167, 1155, 1144, 1133, 1122,
    1110, 1099, 1088, 1076, 1065, 1054, 1042, 1031, 1020, 1008,
    997, 986, 974, 963, 951, 940, 929, 917, 906, 895,
    883, 872, 860, 849, 837, 826, 814, 803, 791, 780,
    769, 757, 745, 734, 722, 711, 699, 688, 676, 665,
    653, 642, 630, 618, 607, 595, 584, 572, 560, 549,
    537, 525, 514, 502, 490, 479, 467, 455, 443, 432,
    420,
];

/// One point of the calibration curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationPoint {
    pub signal_millivolts: u16,
    pub temperature_celsius: i16,
}

/// Resolved temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemperatureReading {
    /// Calibrated temperature in whole degrees Celsius
    Celsius(i16),
    /// Reading outside the calibrated signal band
    OutOfRange,
}

impl TemperatureReading {
    /// Temperature, or `None` when out of range
    #[must_use]
    pub fn celsius(self) -> Option<i16> {
        match self {
            Self::Celsius(t) => Some(t),
            Self::OutOfRange => None,
        }
    }

    /// Temperature with out-of-range readings mapped to `OUT_OF_RANGE_SENTINEL`
    #[must_use]
    pub fn value(self) -> i16 {
        self.celsius().unwrap_or(OUT_OF_RANGE_SENTINEL)
    }

    #[must_use]
    pub fn is_out_of_range(self) -> bool {
        matches!(self, Self::OutOfRange)
    }
}

/// Calibration point at `index` (0 = -50 °C)
#[must_use]
pub fn point(index: usize) -> Option<CalibrationPoint> {
    SIGNAL_MILLIVOLTS.get(index).map(|&signal_millivolts| CalibrationPoint {
        signal_millivolts,
        temperature_celsius: TABLE_START_CELSIUS + index as i16,
    })
}

/// Iterate the calibration curve from the coldest point upward
pub fn points() -> impl Iterator<Item = CalibrationPoint> {
    (0..TABLE_LEN).filter_map(point)
}

/// Convert a raw ADC count to millivolts
#[must_use]
pub fn raw_to_millivolts(raw: u16) -> f64 {
    ADC_MILLIVOLTS_PER_COUNT * f64::from(raw)
}

/// Resolve a raw ADC count to a temperature
///
/// # Arguments
///
/// * `raw` - Raw sensor count as returned by `MEASURE_TEMPERATURE`
#[must_use]
pub fn resolve(raw: u16) -> TemperatureReading {
    resolve_millivolts(raw_to_millivolts(raw))
}

/// Resolve a sensor voltage in millivolts to a temperature
#[must_use]
pub fn resolve_millivolts(millivolts: f64) -> TemperatureReading {
    let highest = f64::from(SIGNAL_MILLIVOLTS[0]);
    let lowest = f64::from(SIGNAL_MILLIVOLTS[TABLE_LEN - 1]);

    // NaN fails both comparisons, so check the band rather than its complement
    if !(lowest..=highest).contains(&millivolts) {
        return TemperatureReading::OutOfRange;
    }

    // First entry at or below the reading; the table is strictly decreasing
    let index = SIGNAL_MILLIVOLTS.partition_point(|&entry| f64::from(entry) > millivolts);

    match point(index) {
        Some(p) => TemperatureReading::Celsius(p.temperature_celsius),
        None => TemperatureReading::OutOfRange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference linear scan over the table
    fn linear_scan(millivolts: f64) -> TemperatureReading {
        if millivolts < f64::from(SIGNAL_MILLIVOLTS[TABLE_LEN - 1])
            || millivolts > f64::from(SIGNAL_MILLIVOLTS[0])
        {
            return TemperatureReading::OutOfRange;
        }
        points()
            .find(|p| millivolts >= f64::from(p.signal_millivolts))
            .map_or(TemperatureReading::OutOfRange, |p| TemperatureReading::Celsius(p.temperature_celsius))
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(SIGNAL_MILLIVOLTS.len(), 201);
        assert_eq!(SIGNAL_MILLIVOLTS[0], 2616);
        assert_eq!(SIGNAL_MILLIVOLTS[TABLE_LEN - 1], 420);
        assert!(SIGNAL_MILLIVOLTS.windows(2).all(|w| w[0] > w[1]), "Table must be strictly decreasing");

        assert_eq!(point(0).unwrap().temperature_celsius, -50);
        assert_eq!(point(200).unwrap().temperature_celsius, 150);
        assert_eq!(point(74).unwrap(), CalibrationPoint { signal_millivolts: 1842, temperature_celsius: 24 });
        assert!(point(201).is_none());
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(resolve_millivolts(2616.0), TemperatureReading::Celsius(-50));
        assert_eq!(resolve_millivolts(420.0), TemperatureReading::Celsius(150));
        assert_eq!(resolve_millivolts(419.9), TemperatureReading::OutOfRange);
        assert_eq!(resolve_millivolts(2616.1), TemperatureReading::OutOfRange);
        assert_eq!(resolve_millivolts(f64::NAN), TemperatureReading::OutOfRange);
    }

    #[test]
    fn test_truncates_to_calibrated_degree() {
        // Between 2607 (-49) and 2616 (-50): falls to -49
        assert_eq!(resolve_millivolts(2610.0), TemperatureReading::Celsius(-49));
        // Exact entries resolve to their own degree
        assert_eq!(resolve_millivolts(1842.0), TemperatureReading::Celsius(24));
        assert_eq!(resolve_millivolts(1841.9), TemperatureReading::Celsius(25));
    }

    #[test]
    fn test_resolve_raw_counts() {
        assert_eq!(resolve(0), TemperatureReading::OutOfRange);
        assert_eq!(resolve(130), TemperatureReading::OutOfRange); // 419.35 mV
        assert_eq!(resolve(131), TemperatureReading::Celsius(150)); // 422.58 mV
        assert_eq!(resolve(575), TemperatureReading::Celsius(23)); // 1854.84 mV
        assert_eq!(resolve(620), TemperatureReading::Celsius(10)); // 1999.99 mV
        assert_eq!(resolve(700), TemperatureReading::Celsius(-14)); // 2258.06 mV
        assert_eq!(resolve(810), TemperatureReading::Celsius(-49)); // 2612.90 mV
        assert_eq!(resolve(811), TemperatureReading::OutOfRange); // 2616.13 mV
        assert_eq!(resolve(u16::MAX), TemperatureReading::OutOfRange);
    }

    #[test]
    fn test_monotonic_over_raw_range() {
        // Rising raw count means rising voltage, so temperature never rises
        let mut previous = i16::MAX;
        for raw in 131..=810u16 {
            let t = resolve(raw).celsius().unwrap();
            assert!(t <= previous, "raw {} resolved to {} after {}", raw, t, previous);
            previous = t;
        }
    }

    #[test]
    fn test_matches_linear_scan() {
        let mut mv = 400.0;
        while mv < 2650.0 {
            assert_eq!(resolve_millivolts(mv), linear_scan(mv), "mismatch at {} mV", mv);
            mv += 0.5;
        }
        for p in points() {
            let mv = f64::from(p.signal_millivolts);
            assert_eq!(resolve_millivolts(mv), linear_scan(mv));
        }
    }

    #[test]
    fn test_sentinel_value() {
        assert_eq!(TemperatureReading::OutOfRange.value(), -200);
        assert_eq!(TemperatureReading::Celsius(21).value(), 21);
        assert!(TemperatureReading::OutOfRange.is_out_of_range());
        assert_eq!(TemperatureReading::OutOfRange.celsius(), None);
    }
}
