//! HTTP Status Code Matching Utilities
//!
//! Matches probe response codes against patterns such as "2xx" or "206".

/// Check if a status code matches any of the acceptable status code patterns
pub fn is_status_acceptable(status: u16, acceptable_codes: &[String]) -> bool {
    acceptable_codes
        .iter()
        .any(|pattern| matches_pattern(status, pattern))
}

/// Rate limiting and request timeouts are worth another attempt
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429)
}

fn matches_pattern(status_code: u16, pattern: &str) -> bool {
    let pattern = pattern.trim();
    if let Some(prefix) = pattern.strip_suffix("xx") {
        // Wildcard classes like "2xx", "4xx"
        if prefix.len() == 1 {
            if let Ok(prefix_digit) = prefix.parse::<u16>() {
                return status_code / 100 == prefix_digit;
            }
        }
        false
    } else {
        pattern
            .parse::<u16>()
            .map(|exact| status_code == exact)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_status_codes() {
        let acceptable = vec!["206".to_string(), "200".to_string()];

        assert!(is_status_acceptable(206, &acceptable));
        assert!(is_status_acceptable(200, &acceptable));
        assert!(!is_status_acceptable(204, &acceptable));
    }

    #[test]
    fn test_wildcard_status_codes() {
        let acceptable = vec!["2xx".to_string()];

        assert!(is_status_acceptable(200, &acceptable));
        assert!(is_status_acceptable(206, &acceptable));
        assert!(!is_status_acceptable(302, &acceptable));
        assert!(!is_status_acceptable(404, &acceptable));
        assert!(!is_status_acceptable(503, &acceptable));
    }

    #[test]
    fn test_malformed_patterns_never_match() {
        let acceptable = vec!["2x".to_string(), "ok".to_string(), "22xx".to_string()];
        assert!(!is_status_acceptable(200, &acceptable));
    }

    #[test]
    fn test_empty_acceptable_codes() {
        let acceptable: Vec<String> = vec![];
        assert!(!is_status_acceptable(200, &acceptable));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(408));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(500));
    }
}
