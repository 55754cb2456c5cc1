use crate::series::Timestamp;

/// Per-service cooldown gate for preventing notification spam
///
/// A service is `CooledDown` when it has never alerted, or when at least
/// `cooldown_minutes` have passed since its last alert. The distance is taken
/// as an absolute value, so a clock that jumps backwards still lets the service
/// alert again once the gap is large enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownGate {
    /// Minimum spacing between alerts for the same service
    cooldown_minutes: f64,
}

/// Result of checking a service against the gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CooldownStatus {
    /// An alert may be sent
    CooledDown,
    /// The last alert was sent too recently
    OnCooldown { elapsed_minutes: f64 },
}

impl CooldownGate {
    /// Create a gate with the given cooldown
    ///
    /// # Arguments
    ///
    /// * `cooldown_minutes` - Minimum spacing between alerts for one service
    pub fn new(cooldown_minutes: f64) -> Self {
        Self { cooldown_minutes }
    }

    pub fn cooldown_minutes(&self) -> f64 {
        self.cooldown_minutes
    }

    /// Absolute distance between two instants in minutes
    pub fn minutes_between(a: &Timestamp, b: &Timestamp) -> f64 {
        let millis = (*b - *a).num_milliseconds().unsigned_abs();
        millis as f64 / 60_000.0
    }

    /// Check whether a service whose last alert was at `last_sent` may alert at `now`
    pub fn check(&self, last_sent: Option<&Timestamp>, now: &Timestamp) -> CooldownStatus {
        match last_sent {
            None => CooldownStatus::CooledDown,
            Some(last) => {
                let elapsed_minutes = Self::minutes_between(last, now);
                if elapsed_minutes >= self.cooldown_minutes {
                    CooldownStatus::CooledDown
                } else {
                    CooldownStatus::OnCooldown { elapsed_minutes }
                }
            }
        }
    }

    /// `true` if an alert may be sent now
    pub fn is_cooled_down(&self, last_sent: Option<&Timestamp>, now: &Timestamp) -> bool {
        self.check(last_sent, now) == CooldownStatus::CooledDown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_no_previous_alert_is_cooled_down() {
        let gate = CooldownGate::new(60.0);
        assert_eq!(gate.check(None, &now()), CooldownStatus::CooledDown);
    }

    #[test]
    fn test_recent_alert_is_on_cooldown() {
        let gate = CooldownGate::new(60.0);
        let last = now() - Duration::minutes(10);

        match gate.check(Some(&last), &now()) {
            CooldownStatus::OnCooldown { elapsed_minutes } => assert_eq!(elapsed_minutes, 10.0),
            other => panic!("expected cooldown, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_cooldown_boundary_is_cooled_down() {
        let gate = CooldownGate::new(60.0);
        let last = now() - Duration::minutes(60);
        assert!(gate.is_cooled_down(Some(&last), &now()));

        let last = now() - Duration::minutes(60) + Duration::milliseconds(1);
        assert!(!gate.is_cooled_down(Some(&last), &now()));
    }

    #[test]
    fn test_clock_moving_backwards_uses_absolute_distance() {
        let gate = CooldownGate::new(60.0);

        // Stored timestamp is in the future relative to now
        let last = now() + Duration::minutes(5);
        assert!(!gate.is_cooled_down(Some(&last), &now()));

        let last = now() + Duration::minutes(90);
        assert!(gate.is_cooled_down(Some(&last), &now()));
    }

    #[test]
    fn test_fractional_minutes() {
        let a = now();
        let b = now() + Duration::seconds(90);
        assert_eq!(CooldownGate::minutes_between(&a, &b), 1.5);
        assert_eq!(CooldownGate::minutes_between(&b, &a), 1.5);

        let gate = CooldownGate::new(1.5);
        assert!(gate.is_cooled_down(Some(&a), &b));
    }

    #[test]
    fn test_zero_cooldown_always_allows() {
        let gate = CooldownGate::new(0.0);
        assert!(gate.is_cooled_down(Some(&now()), &now()));
    }
}
