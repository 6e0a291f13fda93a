//! Wall-clock abstraction so signing timestamps and token expiry checks can be pinned in tests.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Clock that can be pinned and moved manually.
#[derive(Debug)]
pub struct FixedClock(RwLock<OffsetDateTime>);
impl FixedClock {
	/// Pins the clock to `instant`.
	pub fn new(instant: OffsetDateTime) -> Self {
		Self(RwLock::new(instant))
	}

	/// Pins the clock to a Unix timestamp (seconds).
	pub fn at_unix(seconds: i64) -> Result<Self, time::error::ComponentRange> {
		OffsetDateTime::from_unix_timestamp(seconds).map(Self::new)
	}

	/// Replaces the pinned instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.write() = instant;
	}

	/// Moves the pinned instant forward (or backward for negative durations).
	pub fn advance(&self, delta: Duration) {
		*self.0.write() += delta;
	}
}
impl Clock for FixedClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.read()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn fixed_clock_moves_only_when_told() {
		let clock = FixedClock::new(macros::datetime!(2025-01-01 00:00 UTC));

		assert_eq!(clock.now(), macros::datetime!(2025-01-01 00:00 UTC));

		clock.advance(Duration::minutes(90));

		assert_eq!(clock.now(), macros::datetime!(2025-01-01 01:30 UTC));

		clock.set(macros::datetime!(2024-06-30 12:00 UTC));

		assert_eq!(clock.now(), macros::datetime!(2024-06-30 12:00 UTC));
	}

	#[test]
	fn unix_constructor_matches_timestamp() {
		let clock = FixedClock::at_unix(1_700_000_000).expect("Timestamp fixture should be valid.");

		assert_eq!(clock.now().unix_timestamp(), 1_700_000_000);
	}
}
