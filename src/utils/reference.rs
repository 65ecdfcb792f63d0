use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

/// Human-readable booking reference, e.g. `BK-7F3K9QAZ`. Distinct from the
/// internal booking id; shown to users and printed on tickets.
pub fn booking_reference() -> String {
    format!("BK-{}", random_suffix(8))
}

/// Transaction id recorded on a completed settlement, e.g.
/// `TXN-1767225600000-4H2PXQ`.
pub fn transaction_id() -> String {
    format!("TXN-{}-{}", Utc::now().timestamp_millis(), random_suffix(6))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_booking_reference_shape() {
        let reference = booking_reference();
        assert!(reference.starts_with("BK-"));
        assert_eq!(reference.len(), 11);
        assert!(reference[3..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_transaction_id_shape() {
        let txn = transaction_id();
        assert!(txn.starts_with("TXN-"));
        assert_eq!(txn.split('-').count(), 3);
    }

    #[test]
    fn test_references_are_distinct() {
        let refs: HashSet<String> = (0..100).map(|_| booking_reference()).collect();
        assert_eq!(refs.len(), 100);
    }
}
