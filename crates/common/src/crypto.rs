//! Secret comparison helpers

/// Compare a presented secret against the configured one in constant time.
///
/// Length mismatch returns early; only the content comparison is constant-time.
pub fn secret_matches(candidate: &str, expected: &str) -> bool {
    let candidate = candidate.as_bytes();
    let expected = expected.as_bytes();

    if candidate.len() != expected.len() {
        return false;
    }

    let mut result = 0u8;
    for (a, b) in candidate.iter().zip(expected.iter()) {
        result |= a ^ b;
    }
    result == 0
}
