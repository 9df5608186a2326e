use crate::{CURRENT_SCHEMA_VERSION, PersistedState};

/// Stamps a state for an outbound save. The new timestamp is strictly newer
/// than the one the state carried, even when the wall clock is behind it.
pub fn stamp_for_save(mut state: PersistedState, now_unix_ms: u64) -> PersistedState {
    state.timestamp = Some(state.timestamp.map_or(now_unix_ms, |prev| {
        now_unix_ms.max(prev.saturating_add(1))
    }));
    state.schema_version = Some(
        state
            .schema_version
            .map_or(CURRENT_SCHEMA_VERSION, |v| v.max(CURRENT_SCHEMA_VERSION)),
    );
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Job;

    #[test]
    fn stamp_sets_timestamp_and_schema_version() {
        let mut state = PersistedState::default();
        state.unsaved_job = Some(Job::new("draft"));

        let stamped = stamp_for_save(state.clone(), 1_000);
        assert_eq!(stamped.timestamp, Some(1_000));
        assert_eq!(stamped.schema_version, Some(CURRENT_SCHEMA_VERSION));
        assert_eq!(stamped.unsaved_job, state.unsaved_job);
    }

    #[test]
    fn stamp_always_moves_timestamp_forward() {
        let mut state = PersistedState::new();
        state.timestamp = Some(5_000);

        assert_eq!(stamp_for_save(state.clone(), 4_000).timestamp, Some(5_001));
        assert_eq!(stamp_for_save(state.clone(), 5_000).timestamp, Some(5_001));
        assert_eq!(stamp_for_save(state, 6_000).timestamp, Some(6_000));

        let mut state = PersistedState::new();
        state.timestamp = Some(u64::MAX);
        assert_eq!(stamp_for_save(state, 1).timestamp, Some(u64::MAX));
    }

    #[test]
    fn edit_of_adopted_state_wins_over_its_source() {
        let mut adopted = PersistedState::new();
        adopted.timestamp = Some(5_000);

        let edited = stamp_for_save(adopted.clone(), 4_000);
        let serde_json::Value::Object(edited) = serde_json::to_value(&edited).unwrap() else {
            panic!("state serializes to an object");
        };
        assert!(crate::reconcile(Some(&adopted), Some(edited)).is_adopt());
    }

    #[test]
    fn stamp_keeps_newer_schema_version() {
        let mut state = PersistedState::new();
        state.schema_version = Some(CURRENT_SCHEMA_VERSION + 1);
        assert_eq!(
            stamp_for_save(state, 1).schema_version,
            Some(CURRENT_SCHEMA_VERSION + 1)
        );
    }
}
