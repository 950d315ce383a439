// SPDX-FileCopyrightText: 2026 Paprika Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff schedule for outbox delivery retries.

use rand::Rng;

/// Deterministic delay for the given attempt number (1-based): base doubling
/// per attempt, capped.
pub fn delay_ms(attempt: u32, base_ms: u64, cap_ms: u64) -> u64 {
    let shift = attempt.saturating_sub(1).min(16);
    base_ms.saturating_mul(1_u64 << shift).min(cap_ms)
}

/// Jittered delay in [50%, 100%] of the deterministic backoff, so retrying
/// workers spread out instead of thundering together.
pub fn jittered_delay_ms(attempt: u32, base_ms: u64, cap_ms: u64) -> u64 {
    let base = delay_ms(attempt, base_ms, cap_ms);
    if base <= 1 {
        return base;
    }
    let low = base / 2;
    rand::thread_rng().gen_range(low..=base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(delay_ms(1, 1_000, 60_000), 1_000);
        assert_eq!(delay_ms(2, 1_000, 60_000), 2_000);
        assert_eq!(delay_ms(3, 1_000, 60_000), 4_000);
        assert_eq!(delay_ms(4, 1_000, 60_000), 8_000);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(delay_ms(10, 1_000, 60_000), 60_000);
        assert_eq!(delay_ms(63, 1_000, 60_000), 60_000);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let base = delay_ms(3, 1_000, 60_000);
        let low = base / 2;
        for _ in 0..64 {
            let value = jittered_delay_ms(3, 1_000, 60_000);
            assert!(value >= low, "expected {value} >= {low}");
            assert!(value <= base, "expected {value} <= {base}");
        }
    }

    #[test]
    fn tiny_delays_skip_jitter() {
        assert_eq!(jittered_delay_ms(1, 1, 10), 1);
    }
}
