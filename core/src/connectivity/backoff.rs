use std::time::Duration;

/// Retries scheduled after the platform reports offline before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

const BASE_DELAY_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 30_000;

/// Delay before reconnect attempt `attempt` (zero-based).
///
/// 1s, 2s, 4s, 8s, 16s, then 30s for every later attempt.
pub fn backoff_delay(attempt: u32) -> Duration {
    // 2^5 * 1000 already exceeds the cap, so larger shifts are never needed
    let shift = attempt.min(5);
    let ms = BASE_DELAY_MS.saturating_mul(1u64 << shift).min(MAX_DELAY_MS);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_then_cap() {
        let delays: Vec<u64> = (0..MAX_RECONNECT_ATTEMPTS)
            .map(|a| backoff_delay(a).as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000, 30000, 30000]
        );
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(30_000));
    }
}
