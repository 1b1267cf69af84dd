//! Document identifier generation.

use rand::Rng;
use uuid::Uuid;

use crate::config::IdStrategy;

const RANDOM_SUFFIX_LEN: usize = 8;

/// Generate a new `_id` value.
///
/// Timestamp ids sort roughly by creation time but are only as unique as
/// their random suffix; nothing checks them against existing documents.
pub fn generate_id(strategy: IdStrategy) -> String {
    match strategy {
        IdStrategy::Timestamp => timestamp_id(),
        IdStrategy::Uuid => Uuid::new_v4().to_string(),
    }
}

fn timestamp_id() -> String {
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let mut rng = rand::thread_rng();

    let mut id = to_base36(millis);
    for _ in 0..RANDOM_SUFFIX_LEN {
        let digit = rng.gen_range(0..36);
        id.push(char::from_digit(digit, 36).unwrap_or('0'));
    }
    id
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        let digit = (n % 36) as u32;
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        n /= 36;
    }
    digits.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn timestamp_ids_are_lowercase_alphanumeric() {
        let id = generate_id(IdStrategy::Timestamp);
        assert!(id.len() > RANDOM_SUFFIX_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn uuid_ids() {
        let id = generate_id(IdStrategy::Uuid);
        // xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
        assert_eq!(id.len(), 36);
        assert_eq!(&id[14..15], "4");
    }

    #[test]
    fn ids_differ() {
        let ids: HashSet<String> = (0..100)
            .map(|_| generate_id(IdStrategy::Timestamp))
            .collect();
        assert_eq!(ids.len(), 100);
    }
}
