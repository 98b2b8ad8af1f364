use uuid::Uuid;

pub mod assets;
pub mod persistence;
pub mod pseudo_qr;
pub mod version;

/// Ids for records that only live on the device.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_prefixed_and_unique() {
        let a = generate_id("field");
        let b = generate_id("field");
        assert!(a.starts_with("field-"));
        assert_ne!(a, b);
    }
}
