//! Percentage selection: marks, slider track and clamping

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::reconciler::PanelEvent;

/// Marks drawn under the slider
pub const SLIDER_MARKS: [u8; 5] = [0, 25, 50, 75, 100];

/// Clamp into 0..=100; out-of-range input is never rejected
pub fn clamp_percentage(p: Decimal) -> Decimal {
    p.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}

/// Event for `setPercentage(p)`
pub fn set_percentage(p: Decimal) -> PanelEvent {
    PanelEvent::PercentageSelected(clamp_percentage(p))
}

/// Percentage for a click at `click_x` on a track `track_width` wide
///
/// Rounded to a whole percent like the track's visual resolution.
pub fn percentage_from_track(click_x: f64, track_width: f64) -> Decimal {
    if !track_width.is_finite() || track_width <= 0.0 || !click_x.is_finite() {
        return Decimal::ZERO;
    }
    let raw = (click_x / track_width * 100.0).round();
    clamp_percentage(Decimal::from_f64(raw).unwrap_or(Decimal::ZERO))
}

/// Marks highlighted for the current percentage
pub fn active_marks(p: Decimal) -> Vec<u8> {
    SLIDER_MARKS
        .iter()
        .copied()
        .filter(|mark| Decimal::from(*mark) <= p)
        .collect()
}
