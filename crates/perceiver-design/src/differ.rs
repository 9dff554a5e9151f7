use crate::model::{PropertyDiff, StyleRecord};

/// Properties whose state value is non-empty and differs from the base value.
pub fn diff_records(base: &StyleRecord, state: &StyleRecord) -> PropertyDiff {
    state
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .filter_map(|(name, value)| {
            let before = base.get(name).map(String::as_str).unwrap_or("");
            (before != value).then(|| (name.clone(), (before.to_string(), value.clone())))
        })
        .collect()
}

/// Restricts `record` to `properties`, keeping entries that exist.
pub fn pick(record: &StyleRecord, properties: &[&str]) -> StyleRecord {
    properties
        .iter()
        .filter_map(|&name| record.get(name).map(|value| (name.to_string(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> StyleRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reports_changed_non_empty_values() {
        let base = record(&[("color", "rgb(0, 0, 0)"), ("opacity", "1"), ("cursor", "auto")]);
        let state = record(&[("color", "rgb(255, 0, 0)"), ("opacity", "1"), ("cursor", "")]);
        let diff = diff_records(&base, &state);
        assert_eq!(diff.len(), 1);
        assert_eq!(
            diff["color"],
            ("rgb(0, 0, 0)".to_string(), "rgb(255, 0, 0)".to_string())
        );
    }

    #[test]
    fn identical_records_have_no_diff() {
        let base = record(&[("color", "red")]);
        assert!(diff_records(&base, &base.clone()).is_empty());
    }
}
