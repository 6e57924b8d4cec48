// view.rs

use std::time::{Duration, Instant};

use crate::geo::BBox;

/// Wait before reframing, so the panel has finished opening or closing.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

const FRAME_PADDING: f64 = 0.1;

/// Visible lon/lat window of the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: BBox,
}

impl Viewport {
    /// Frames `target` with padding, widening one axis so the window keeps
    /// the shape of the drawing area. `aspect` is width over height of the
    /// area in square units.
    pub fn framing(target: BBox, aspect: f64) -> Viewport {
        let padded = target.padded(FRAME_PADDING);
        let (center_lon, center_lat) = padded.center();
        // A degree of longitude shrinks with latitude.
        let lon_scale = center_lat.to_radians().cos().max(0.01);
        let mut half_w = (padded.max_lon - padded.min_lon) / 2.0 * lon_scale;
        let mut half_h = (padded.max_lat - padded.min_lat) / 2.0;

        if aspect.is_finite() && aspect > 0.0 {
            if half_w / half_h < aspect {
                half_w = half_h * aspect;
            } else {
                half_h = half_w / aspect;
            }
        }
        let half_lon = half_w / lon_scale;
        Viewport {
            bounds: BBox {
                min_lon: center_lon - half_lon,
                max_lon: center_lon + half_lon,
                min_lat: center_lat - half_h,
                max_lat: center_lat + half_h,
            },
        }
    }
}

/// What the map should frame once the settling delay is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameTarget {
    Full,
    Region(BBox),
}

/// A reframing scheduled for later. Only one is ever pending; scheduling a
/// new one drops the previous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransition {
    pub due: Instant,
    pub target: FrameTarget,
}

impl ViewTransition {
    pub fn after_settle(now: Instant, target: FrameTarget) -> ViewTransition {
        ViewTransition {
            due: now + SETTLE_DELAY,
            target,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}
