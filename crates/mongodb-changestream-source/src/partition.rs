//! Grouping of change events for the bulk-insert optimisation.

use sync_core::ChangeEvent;

/// Split `events` into maximal runs of adjacent inserts.
///
/// Every non-insert event forms a group of its own, so order is preserved
/// and only inserts are ever merged:
/// `[delete, insert, insert, update]` → `[[delete], [insert, insert], [update]]`.
pub fn partition_events(events: &[ChangeEvent]) -> Vec<&[ChangeEvent]> {
    events
        .chunk_by(|a, b| a.is_insert() && b.is_insert())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use sync_core::{OperationType, UpdateDescription};

    fn event(op: OperationType) -> ChangeEvent {
        let id = json!("1");
        match op {
            OperationType::Insert => ChangeEvent::Insert {
                id,
                document: Map::new(),
            },
            OperationType::Update => ChangeEvent::Update {
                id,
                update: UpdateDescription::default(),
                full_document: None,
            },
            OperationType::Replace => ChangeEvent::Replace {
                id,
                document: Map::new(),
            },
            OperationType::Delete => ChangeEvent::Delete { id },
        }
    }

    fn shape(events: &[OperationType]) -> Vec<Vec<OperationType>> {
        let events: Vec<ChangeEvent> = events.iter().copied().map(event).collect();
        partition_events(&events)
            .into_iter()
            .map(|group| group.iter().map(ChangeEvent::operation_type).collect())
            .collect()
    }

    #[test]
    fn test_consecutive_inserts_merge() {
        use OperationType::Insert;
        assert_eq!(shape(&[Insert, Insert, Insert]), vec![vec![Insert; 3]]);
    }

    #[test]
    fn test_mixed_sequence() {
        use OperationType::{Delete, Insert, Update};
        assert_eq!(
            shape(&[Delete, Insert, Insert, Update, Insert, Insert, Update]),
            vec![
                vec![Delete],
                vec![Insert, Insert],
                vec![Update],
                vec![Insert, Insert],
                vec![Update],
            ]
        );
    }

    #[test]
    fn test_non_inserts_never_merge() {
        use OperationType::{Delete, Replace, Update};
        assert_eq!(
            shape(&[Update, Update, Delete, Replace]),
            vec![vec![Update], vec![Update], vec![Delete], vec![Replace]]
        );
    }

    #[test]
    fn test_empty() {
        assert!(shape(&[]).is_empty());
    }
}
