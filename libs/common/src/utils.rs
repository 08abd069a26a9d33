use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque prefixed identifier, e.g. `wi-a3f1c09b2d44`.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..12])
}

pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_ids_have_prefix_and_12_hex_chars() {
        let id = generate_prefixed_id("wi");
        assert!(id.starts_with("wi-"));
        assert_eq!(id.len(), 15);
        assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn clamp01_bounds_both_ends() {
        assert_eq!(clamp01(-0.2), 0.0);
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(0.42), 0.42);
    }
}
