//! Character-based token estimation.
//!
//! A character-count proxy, not a true tokenizer: ~4 characters per token
//! (English average) with a 1.05x multiplier to bias the estimate upward.
//! Good enough for budget math, where overestimating slightly is safer
//! than underestimating.

/// Estimate the token count of a piece of text.
///
/// Empty text estimates to 0. The estimate is non-decreasing in text
/// length and has no failure modes.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let chars = text.chars().count() as f64;
    (chars / 4.0 * 1.05).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn short_text_rounds_up() {
        // 4 chars / 4 * 1.05 = 1.05 → 2
        assert_eq!(estimate_tokens("abcd"), 2);
        // 1 char → 0.2625 → 1
        assert_eq!(estimate_tokens("a"), 1);
    }

    #[test]
    fn nine_thousand_chars_exceeds_medium_threshold() {
        let text = "x".repeat(9_000);
        assert!(estimate_tokens(&text) > 2_000);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // Multibyte chars should estimate the same as ASCII of equal length
        assert_eq!(estimate_tokens("héllö"), estimate_tokens("hello"));
    }

    proptest! {
        #[test]
        fn estimate_is_nonnegative_and_monotonic(s in ".{0,2000}", suffix in ".{0,200}") {
            let base = estimate_tokens(&s);
            let longer = estimate_tokens(&format!("{}{}", s, suffix));
            prop_assert!(longer >= base);
        }
    }
}
