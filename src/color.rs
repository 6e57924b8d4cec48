// color.rs

use plotters::prelude::RGBColor;

/// Discrete color tiers of the temperature scale, hottest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    Hottest,
    Band2,
    Band3,
    Band4,
    Band5,
    Band6,
    Coldest,
    Unknown,
}

impl Band {
    /// Every band in legend order.
    pub const ALL: [Band; 8] = [
        Band::Hottest,
        Band::Band2,
        Band::Band3,
        Band::Band4,
        Band::Band5,
        Band::Band6,
        Band::Coldest,
        Band::Unknown,
    ];

    pub fn rgb(self) -> RGBColor {
        match self {
            Band::Hottest => RGBColor(0xBD, 0x00, 0x26),
            Band::Band2 => RGBColor(0xE3, 0x1A, 0x1C),
            Band::Band3 => RGBColor(0xFD, 0x8D, 0x3C),
            Band::Band4 => RGBColor(0xFE, 0xD9, 0x76),
            Band::Band5 => RGBColor(0x33, 0xB6, 0xD3),
            Band::Band6 => RGBColor(0x2D, 0x7C, 0xB0),
            Band::Coldest => RGBColor(0x2D, 0x43, 0xB0),
            Band::Unknown => RGBColor(0xCC, 0xCC, 0xCC),
        }
    }

    pub fn legend(self) -> &'static str {
        match self {
            Band::Hottest => "> 25 °C",
            Band::Band2 => "20 – 25 °C",
            Band::Band3 => "15 – 20 °C",
            Band::Band4 => "10 – 15 °C",
            Band::Band5 => "5 – 10 °C",
            Band::Band6 => "0 – 5 °C",
            Band::Coldest => "≤ 0 °C",
            Band::Unknown => "no data",
        }
    }
}

/// Classifies a temperature. Each threshold is a strict `>`, so a value
/// sitting exactly on a threshold belongs to the colder band.
pub fn band(temp: Option<f64>) -> Band {
    let Some(t) = temp.filter(|t| !t.is_nan()) else {
        return Band::Unknown;
    };
    if t > 25.0 {
        Band::Hottest
    } else if t > 20.0 {
        Band::Band2
    } else if t > 15.0 {
        Band::Band3
    } else if t > 10.0 {
        Band::Band4
    } else if t > 5.0 {
        Band::Band5
    } else if t > 0.0 {
        Band::Band6
    } else {
        Band::Coldest
    }
}

pub fn color(temp: Option<f64>) -> RGBColor {
    band(temp).rgb()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_fall_into_colder_band() {
        assert_eq!(band(None), Band::Unknown);
        assert_eq!(band(Some(25.0001)), Band::Hottest);
        assert_eq!(band(Some(25.0)), Band::Band2);
        assert_eq!(band(Some(20.0)), Band::Band3);
        assert_eq!(band(Some(15.0)), Band::Band4);
        assert_eq!(band(Some(10.0)), Band::Band5);
        assert_eq!(band(Some(5.0)), Band::Band6);
        assert_eq!(band(Some(0.0)), Band::Coldest);
        assert_eq!(band(Some(-12.5)), Band::Coldest);
        assert_eq!(band(Some(f64::NAN)), Band::Unknown);
    }

    #[test]
    fn band_is_monotonic_in_temperature() {
        let samples: Vec<f64> = (-100..=400).map(|i| i as f64 * 0.1).collect();
        for pair in samples.windows(2) {
            // Band ordering runs hottest first, so warmer never sorts after colder.
            assert!(band(Some(pair[1])) <= band(Some(pair[0])));
        }
    }

    #[test]
    fn color_uses_band_palette() {
        assert_eq!(color(None), RGBColor(0xCC, 0xCC, 0xCC));
        assert_eq!(color(Some(30.0)), RGBColor(0xBD, 0x00, 0x26));
        assert_eq!(color(Some(-1.0)), Band::Coldest.rgb());
    }
}
