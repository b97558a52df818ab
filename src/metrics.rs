//! Throughput derivation
//!
//! Server timings are reported in nanoseconds; rates are tokens per second.

/// Nanoseconds per second
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Tokens per second from a token count and a duration in nanoseconds.
///
/// Returns `None` when either input is missing or the duration is zero.
pub fn tokens_per_second(count: Option<u64>, duration_nanos: Option<u64>) -> Option<f64> {
    match (count, duration_nanos) {
        (Some(count), Some(nanos)) if nanos > 0 => {
            Some(count as f64 / (nanos as f64 / NANOS_PER_SECOND))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second() {
        assert_eq!(tokens_per_second(Some(10), Some(1_000_000_000)), Some(10.0));
    }

    #[test]
    fn test_half_second() {
        assert_eq!(tokens_per_second(Some(10), Some(500_000_000)), Some(20.0));
    }

    #[test]
    fn test_not_computable() {
        assert_eq!(tokens_per_second(None, Some(1_000_000_000)), None);
        assert_eq!(tokens_per_second(None, None), None);
        assert_eq!(tokens_per_second(Some(10), None), None);
        assert_eq!(tokens_per_second(Some(10), Some(0)), None);
    }

    #[test]
    fn test_zero_tokens_is_a_rate() {
        assert_eq!(tokens_per_second(Some(0), Some(1_000_000_000)), Some(0.0));
    }
}
