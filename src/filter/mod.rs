//! Predicate evaluation for candidate events.

use crate::core::{FilterCriteria, TransactionEvent};

/// True when the event satisfies every configured bound. Absent bounds are
/// vacuously true; all bounds are inclusive.
///
/// Market-cap handling is deliberately asymmetric: a configured minimum
/// rejects events with no market cap (fails closed), while a configured
/// maximum lets them through, since missing data cannot exceed a ceiling.
pub fn matches(event: &TransactionEvent, criteria: &FilterCriteria) -> bool {
    if let Some(min_amount) = criteria.min_amount {
        if event.amount_sol < min_amount {
            return false;
        }
    }

    if let Some(max_amount) = criteria.max_amount {
        if event.amount_sol > max_amount {
            return false;
        }
    }

    if let Some(min_market_cap) = criteria.min_market_cap {
        match event.market_cap {
            Some(market_cap) if market_cap >= min_market_cap => {}
            _ => return false,
        }
    }

    if let Some(max_market_cap) = criteria.max_market_cap {
        if let Some(market_cap) = event.market_cap {
            if market_cap > max_market_cap {
                return false;
            }
        }
    }

    if let Some(expected_symbol) = &criteria.token_symbol {
        if &event.token_symbol != expected_symbol {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(amount_sol: f64, market_cap: Option<f64>, symbol: &str) -> TransactionEvent {
        TransactionEvent {
            id: "sig".to_string(),
            wallet_address: "wallet".to_string(),
            token_symbol: symbol.to_string(),
            amount_sol,
            market_cap,
            timestamp: Utc::now(),
            tx_signature: "sig".to_string(),
        }
    }

    #[test]
    fn unconstrained_criteria_admit_everything() {
        assert!(matches(&event(0.0, None, "BONK"), &FilterCriteria::default()));
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        let criteria = FilterCriteria {
            min_amount: Some(20.0),
            max_amount: Some(50.0),
            ..Default::default()
        };
        assert!(matches(&event(20.0, None, "BONK"), &criteria));
        assert!(matches(&event(50.0, None, "BONK"), &criteria));
        assert!(!matches(&event(19.99, None, "BONK"), &criteria));
        assert!(!matches(&event(50.01, None, "BONK"), &criteria));
    }

    #[test]
    fn min_market_cap_fails_closed_on_missing_data() {
        let criteria = FilterCriteria {
            min_market_cap: Some(300_000.0),
            ..Default::default()
        };
        assert!(!matches(&event(10.0, None, "BONK"), &criteria));
        assert!(matches(&event(10.0, Some(300_000.0), "BONK"), &criteria));
    }

    #[test]
    fn max_market_cap_fails_open_on_missing_data() {
        let criteria = FilterCriteria {
            max_market_cap: Some(5_000_000.0),
            ..Default::default()
        };
        assert!(matches(&event(10.0, None, "BONK"), &criteria));
        assert!(matches(&event(10.0, Some(5_000_000.0), "BONK"), &criteria));
        assert!(!matches(&event(10.0, Some(5_000_001.0), "BONK"), &criteria));
    }

    #[test]
    fn symbol_match_is_case_sensitive_and_exact() {
        let criteria = FilterCriteria {
            token_symbol: Some("POPCAT".to_string()),
            ..Default::default()
        };
        assert!(matches(&event(10.0, None, "POPCAT"), &criteria));
        assert!(!matches(&event(10.0, None, "popcat"), &criteria));
        assert!(!matches(&event(10.0, None, "POPCAT2"), &criteria));
    }

    #[test]
    fn all_configured_bounds_must_pass() {
        let criteria = FilterCriteria {
            min_amount: Some(20.0),
            min_market_cap: Some(300_000.0),
            max_market_cap: Some(5_000_000.0),
            ..Default::default()
        };
        assert!(matches(&event(50.0, Some(1_220_000.0), "POPCAT"), &criteria));
        assert!(!matches(&event(10.0, Some(1_220_000.0), "POPCAT"), &criteria));
        assert!(!matches(&event(50.0, Some(6_000_000.0), "POPCAT"), &criteria));
    }
}
