//! Display helpers shared by every page. All user-influenced text goes
//! through [`escape`] before it lands in markup.

use crate::types::{AvailabilityColor, TimeOut, ViolationReason, ViolationStatus};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Occupancy as a bar proportion. Out-of-range and NaN inputs are pinned to [0, 100].
pub fn clamp_occupancy(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.max(0.0).min(100.0)
}

pub fn occupancy_label(percent: f64) -> String {
    format!("{:.1}%", clamp_occupancy(percent))
}

pub fn bar_class(color: AvailabilityColor) -> &'static str {
    match color {
        AvailabilityColor::Green => "bg-green-500",
        AvailabilityColor::Yellow => "bg-yellow-400",
        AvailabilityColor::Red => "bg-red-500",
    }
}

pub fn badge_class(color: AvailabilityColor) -> &'static str {
    match color {
        AvailabilityColor::Green => "bg-green-800 text-green-300",
        AvailabilityColor::Yellow => "bg-yellow-800 text-yellow-300",
        AvailabilityColor::Red => "bg-red-800 text-red-300",
    }
}

pub fn marker_color(color: AvailabilityColor) -> &'static str {
    match color {
        AvailabilityColor::Green => "#22c55e",
        AvailabilityColor::Yellow => "#facc15",
        AvailabilityColor::Red => "#ef4444",
    }
}

pub fn status_badge_class(status: &ViolationStatus) -> &'static str {
    match status {
        ViolationStatus::StillInLot => "bg-orange-800 text-orange-200",
        ViolationStatus::Other(_) => "bg-slate-700 text-slate-300",
    }
}

pub fn reason_badge_class(reason: &ViolationReason) -> &'static str {
    match reason {
        ViolationReason::Unregistered => "bg-red-800 text-red-200",
        ViolationReason::Overstay => "bg-yellow-800 text-yellow-200",
        ViolationReason::Other(_) => "bg-purple-800 text-purple-200",
    }
}

pub fn row_class(index: usize) -> &'static str {
    if index % 2 == 0 {
        "row-a"
    } else {
        "row-b"
    }
}

pub fn plate_label(plate: &str) -> String {
    plate.to_uppercase()
}

pub fn time_out_cell(time_out: &TimeOut) -> String {
    match time_out {
        TimeOut::StillInLot => {
            "<span class=\"badge badge-still-in-lot\">Still In Lot</span>".to_string()
        }
        TimeOut::At(t) => format!("<span class=\"font-mono\">{}</span>", escape(t)),
    }
}

pub fn tooltip(lot_name: &str, available: i64) -> String {
    format!("{} — {} available", lot_name, available)
}

pub fn violation_count_label(n: usize) -> String {
    format!("{} violation{}", n, if n == 1 { "" } else { "s" })
}

pub fn unregistered_count_label(n: usize) -> String {
    format!("{} unregistered", n)
}
