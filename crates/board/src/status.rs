//! Status derivation.
//!
//! Pure function over raw schedule + real-time fields, invoked at read
//! time and never stored, so re-derivation after any enrichment update
//! is automatic.

use common::{time_to_minutes, DelayState};

/// Threshold in minutes beyond which an arrival-time difference is
/// reported instead of "On Time".
const SLACK_MINS: i64 = 5;

/// Derive the human-readable status for one row.
pub fn derive_status(scheduled: &str, real_arrival: Option<&str>, delay: Option<&str>) -> String {
    if real_arrival.is_none() && delay.is_none() {
        return "Scheduled".into();
    }

    if let Some(descriptor) = delay {
        match DelayState::from_descriptor(descriptor) {
            // Canonical on-time token: fall through to the arrival diff.
            DelayState::OnTime => {}
            DelayState::Delayed(_) => return "Delayed".into(),
            DelayState::Unknown => return "On Time".into(),
        }
    }

    if let (Some(sched), Some(real)) = (
        time_to_minutes(scheduled),
        real_arrival.and_then(time_to_minutes),
    ) {
        let diff = real as i64 - sched as i64;
        if diff > SLACK_MINS {
            return format!("Delayed by {} min", diff);
        }
        if diff < -SLACK_MINS {
            return format!("Early by {} min", diff.abs());
        }
    }

    "On Time".into()
}
