//! Property-based invariants for the clock ticker.
//!
//! 1. The next deadline is strictly after the tick and at most one second away.
//! 2. Deadlines land on whole seconds.
//! 3. Feeding each deadline back in yields a strictly increasing chain.
//! 4. The rendered text depends only on the whole second, not the fraction.
//! 5. A fixed offset shifts the wall-clock fields by exactly that offset.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::FixedOffset;
use keyhole::clock::{ClockFormat, ClockTicker, ClockZone};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

/// 1970 through 2100, with sub-second precision.
fn instant_strategy() -> impl Strategy<Value = SystemTime> {
    (0u64..4_102_444_800, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| UNIX_EPOCH + Duration::new(secs, nanos))
}

fn ticker() -> ClockTicker {
    ClockTicker::new("%Y-%m-%d %H:%M:%S", "utc").unwrap()
}

proptest! {
    #[test]
    fn deadline_is_next_whole_second(now in instant_strategy()) {
        let (_, next) = ticker().tick(now);
        prop_assert!(next > now);
        prop_assert!(next.duration_since(now).unwrap() <= Duration::from_secs(1));
        prop_assert_eq!(next.duration_since(UNIX_EPOCH).unwrap().subsec_nanos(), 0);
    }

    #[test]
    fn chained_deadlines_increase(now in instant_strategy(), steps in 1usize..50) {
        let clock = ticker();
        let (_, mut at) = clock.tick(now);
        for _ in 0..steps {
            let (_, next) = clock.tick(at);
            prop_assert_eq!(next.duration_since(at).unwrap(), Duration::from_secs(1));
            at = next;
        }
    }

    #[test]
    fn text_ignores_subsecond_part(secs in 0u64..4_102_444_800, nanos in 0u32..1_000_000_000) {
        let whole = UNIX_EPOCH + Duration::from_secs(secs);
        let (a, _) = ticker().tick(whole);
        let (b, _) = ticker().tick(whole + Duration::from_nanos(u64::from(nanos)));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn fixed_offset_matches_shifted_utc(now in instant_strategy(), minutes in -14i32 * 60..=14 * 60) {
        let format = ClockFormat::parse("%Y-%m-%d %H:%M:%S").unwrap();
        let offset = minutes * 60;
        let zone = ClockZone::Fixed(FixedOffset::east_opt(offset).unwrap());
        let local = format.format(now, zone);
        let shifted = if offset >= 0 {
            now + Duration::from_secs(offset.unsigned_abs().into())
        } else {
            now - Duration::from_secs(offset.unsigned_abs().into())
        };
        prop_assert_eq!(local, format.format(shifted, ClockZone::Utc));
    }
}

#[test]
fn boundary_instant_moves_to_following_second() {
    let on_boundary = UNIX_EPOCH + Duration::from_secs(1_614_834_367);
    let (text, next) = ticker().tick(on_boundary);
    assert_eq!(text, "2021-03-04 05:06:07");
    assert_eq!(next, on_boundary + Duration::from_secs(1));
}
