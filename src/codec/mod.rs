//! Property bag codec
//!
//! Converts between the engine's qualified-name keyed property bags and the
//! string keyed records that land on disk.
//!
//! - `externalize` drops write-only values and tombstones, and refuses names
//!   or payloads that would not read back unchanged.
//! - `internalize` rebuilds qualified names from their textual form.
//! - `merge_metadata` patches the visible metadata view with a change set;
//!   there a tombstone removes the key instead of being silently dropped.

use crate::core::{DurableRecord, InstanceValue, PropertyBag, QualifiedName, Result};
use chrono::{DateTime, Utc};

/// True when a value may reach durable storage and be read back.
pub fn is_persistable(value: &InstanceValue) -> bool {
    !value.is_write_only() && !value.is_deleted_value()
}

pub fn externalize(bag: &PropertyBag) -> Result<DurableRecord> {
    bag.iter()
        .filter(|(_, value)| is_persistable(value))
        .map(|(name, value)| durable_entry(name, value))
        .collect()
}

fn durable_entry(name: &QualifiedName, value: &InstanceValue) -> Result<(String, InstanceValue)> {
    name.validate()?;
    value.value.validate()?;
    Ok((name.to_string(), value.clone()))
}

pub fn internalize(record: DurableRecord) -> Result<PropertyBag> {
    record
        .into_iter()
        .map(|(key, value)| Ok((key.parse::<QualifiedName>()?, value)))
        .collect()
}

/// Applies `changes` on top of `current` and returns the full record to persist.
///
/// Write-only changes are ignored. Tombstones remove the key if present and are
/// a no-op otherwise. Everything else upserts.
pub fn merge_metadata(current: &PropertyBag, changes: &PropertyBag) -> Result<DurableRecord> {
    let mut merged = externalize(current)?;
    for (name, change) in changes {
        if change.is_write_only() {
            continue;
        }
        if change.is_deleted_value() {
            merged.remove(&name.to_string());
        } else {
            let (key, value) = durable_entry(name, change)?;
            merged.insert(key, value);
        }
    }
    Ok(merged)
}

/// Same patch as [`merge_metadata`], applied to an in-memory view.
pub fn apply_metadata_changes(view: &mut PropertyBag, changes: &PropertyBag) {
    for (name, change) in changes {
        if change.is_write_only() {
            continue;
        }
        if change.is_deleted_value() {
            view.remove(name);
        } else {
            view.insert(name.clone(), change.clone());
        }
    }
}

/// The instance's view of a saved Data bag: what a later load would return.
pub fn visible(bag: &PropertyBag) -> PropertyBag {
    bag.iter()
        .filter(|(_, value)| is_persistable(value))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Reads the pending timer deadline out of an instance's Data bag.
pub fn pending_timer_expiration(data: &PropertyBag) -> Result<Option<DateTime<Utc>>> {
    match data.get(&QualifiedName::pending_timer_expiration()) {
        Some(value) if !value.is_deleted_value() => value.value.as_datetime().map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PropertyValue, StoreError};
    use std::collections::BTreeMap;

    fn bag(entries: Vec<(QualifiedName, InstanceValue)>) -> PropertyBag {
        entries.into_iter().collect()
    }

    fn sample() -> PropertyBag {
        let mut nested = BTreeMap::new();
        nested.insert("depth".to_string(), PropertyValue::Integer(2));

        bag(vec![
            (QualifiedName::local("Foo"), InstanceValue::new("bar")),
            (QualifiedName::new("urn:test", "Count"), InstanceValue::new(7i64)),
            (
                QualifiedName::new("urn:test", "Nested"),
                InstanceValue::new(PropertyValue::Map(nested)),
            ),
            (
                QualifiedName::pending_timer_expiration(),
                InstanceValue::new(Utc::now()),
            ),
        ])
    }

    #[test]
    fn test_round_trip() {
        let original = sample();
        let restored = internalize(externalize(&original).unwrap()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_round_trip_through_json() {
        let original = sample();
        let text = serde_json::to_string_pretty(&externalize(&original).unwrap()).unwrap();
        let record: DurableRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(internalize(record).unwrap(), original);
    }

    #[test]
    fn test_externalize_filters_write_only_and_tombstones() {
        let mut input = sample();
        input.insert(QualifiedName::local("Secret"), InstanceValue::write_only("hidden"));
        input.insert(QualifiedName::local("Gone"), InstanceValue::deleted());

        let record = externalize(&input).unwrap();
        assert!(!record.contains_key("Secret"));
        assert!(!record.contains_key("Gone"));
        assert!(record.values().all(is_persistable));
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_internalize_rejects_bad_key() {
        let mut record = DurableRecord::new();
        record.insert("{urn:broken".to_string(), InstanceValue::new(1i64));
        assert!(matches!(
            internalize(record),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn test_externalize_rejects_names_that_do_not_reparse() {
        for name in [
            QualifiedName::local("a}b"),
            QualifiedName::local(""),
            QualifiedName::new("urn}x", "Foo"),
        ] {
            let input = bag(vec![(name.clone(), InstanceValue::new(1i64))]);
            assert!(
                matches!(externalize(&input), Err(StoreError::InvalidName(_))),
                "{name:?}"
            );
        }

        // Invalid names on values that never reach disk are ignored.
        let input = bag(vec![(QualifiedName::local("a}b"), InstanceValue::write_only(1i64))]);
        assert!(externalize(&input).unwrap().is_empty());
    }

    #[test]
    fn test_namespaced_text_name_round_trips() {
        let input = bag(vec![(QualifiedName::from("{urn:x}Foo"), InstanceValue::new("bar"))]);
        let restored = internalize(externalize(&input).unwrap()).unwrap();
        assert_eq!(restored, input);
        assert!(restored.contains_key(&QualifiedName::new("urn:x", "Foo")));
    }

    #[test]
    fn test_externalize_rejects_non_finite_floats() {
        for bad in [f64::NAN, f64::INFINITY] {
            let input = bag(vec![(QualifiedName::local("Ratio"), InstanceValue::new(bad))]);
            assert!(matches!(externalize(&input), Err(StoreError::TypeMismatch(_))));

            let changes = input.clone();
            assert!(matches!(
                merge_metadata(&PropertyBag::new(), &changes),
                Err(StoreError::TypeMismatch(_))
            ));
        }
    }

    #[test]
    fn test_merge_metadata_upserts_and_removes() {
        let current = bag(vec![
            (QualifiedName::local("Keep"), InstanceValue::new("a")),
            (QualifiedName::local("Drop"), InstanceValue::new("b")),
        ]);
        let changes = bag(vec![
            (QualifiedName::local("Drop"), InstanceValue::deleted()),
            (QualifiedName::local("New"), InstanceValue::new("c")),
            (QualifiedName::local("Hidden"), InstanceValue::write_only("d")),
        ]);

        let merged = merge_metadata(&current, &changes).unwrap();
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["Keep", "New"]);
    }

    #[test]
    fn test_merge_metadata_keeps_view_without_changes() {
        let current = bag(vec![(QualifiedName::local("Keep"), InstanceValue::new("a"))]);
        let merged = merge_metadata(&current, &PropertyBag::new()).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_merge_metadata_idempotent() {
        let current = bag(vec![(QualifiedName::local("Keep"), InstanceValue::new("a"))]);
        let changes = bag(vec![(QualifiedName::local("Mode"), InstanceValue::new("fast"))]);

        let once = merge_metadata(&current, &changes).unwrap();
        let mut view = internalize(once.clone()).unwrap();
        apply_metadata_changes(&mut view, &changes);
        let twice = merge_metadata(&view, &changes).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_tombstone_for_missing_key_is_noop() {
        let current = bag(vec![(QualifiedName::local("Keep"), InstanceValue::new("a"))]);
        let changes = bag(vec![(QualifiedName::local("Absent"), InstanceValue::deleted())]);
        assert_eq!(
            merge_metadata(&current, &changes).unwrap(),
            externalize(&current).unwrap()
        );
    }

    #[test]
    fn test_pending_timer_expiration() {
        let at = Utc::now();
        let data = bag(vec![(
            QualifiedName::pending_timer_expiration(),
            InstanceValue::new(at),
        )]);
        assert_eq!(pending_timer_expiration(&data).unwrap(), Some(at));
        assert_eq!(pending_timer_expiration(&PropertyBag::new()).unwrap(), None);

        let wrong = bag(vec![(
            QualifiedName::pending_timer_expiration(),
            InstanceValue::new("tomorrow"),
        )]);
        assert!(matches!(
            pending_timer_expiration(&wrong),
            Err(StoreError::TypeMismatch(_))
        ));
    }
}
