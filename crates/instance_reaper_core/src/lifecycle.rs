//! Lifecycle state classification for observed instances.
//!
//! Instance state is owned and mutated by the provider; this module only
//! classifies states reported back by describe calls.

use crate::contract::InstanceObservation;

/// States that make an instance eligible for the stop/terminate sweep.
pub const DISCOVERY_ELIGIBLE_STATES: [&str; 2] = ["pending", "running"];

/// States treated as "not yet stopped" while polling after a stop request.
pub const STOP_IN_FLIGHT_STATES: [&str; 3] = ["pending", "running", "shutting-down"];

pub const TERMINATED_STATE: &str = "terminated";

pub fn eligible_instance_ids(observations: &[InstanceObservation]) -> Vec<String> {
    filter_ids(observations, |state| {
        DISCOVERY_ELIGIBLE_STATES.contains(&state)
    })
}

pub fn still_stopping_ids(observations: &[InstanceObservation]) -> Vec<String> {
    filter_ids(observations, |state| STOP_IN_FLIGHT_STATES.contains(&state))
}

pub fn unterminated_ids(observations: &[InstanceObservation]) -> Vec<String> {
    filter_ids(observations, |state| state != TERMINATED_STATE)
}

fn filter_ids(observations: &[InstanceObservation], keep: impl Fn(&str) -> bool) -> Vec<String> {
    observations
        .iter()
        .filter(|observation| keep(observation.state.as_str()))
        .map(|observation| observation.instance_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(instance_id: &str, state: &str) -> InstanceObservation {
        InstanceObservation {
            instance_id: instance_id.to_string(),
            state: state.to_string(),
        }
    }

    #[test]
    fn eligible_ids_keep_pending_and_running_only() {
        let observations = vec![
            observation("i-1", "pending"),
            observation("i-2", "running"),
            observation("i-3", "stopped"),
            observation("i-4", "terminated"),
            observation("i-5", "shutting-down"),
        ];

        assert_eq!(
            eligible_instance_ids(&observations),
            vec!["i-1".to_string(), "i-2".to_string()]
        );
    }

    #[test]
    fn still_stopping_ids_include_shutting_down() {
        let observations = vec![
            observation("i-1", "shutting-down"),
            observation("i-2", "stopped"),
            observation("i-3", "running"),
        ];

        assert_eq!(
            still_stopping_ids(&observations),
            vec!["i-1".to_string(), "i-3".to_string()]
        );
    }

    #[test]
    fn unterminated_ids_keep_everything_but_terminated() {
        let observations = vec![
            observation("i-1", "terminated"),
            observation("i-2", "shutting-down"),
            observation("i-3", "stopped"),
        ];

        assert_eq!(
            unterminated_ids(&observations),
            vec!["i-2".to_string(), "i-3".to_string()]
        );
    }

    #[test]
    fn empty_observations_classify_to_empty_sets() {
        assert!(eligible_instance_ids(&[]).is_empty());
        assert!(still_stopping_ids(&[]).is_empty());
        assert!(unterminated_ids(&[]).is_empty());
    }
}
