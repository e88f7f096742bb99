use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a learner has fared on one tutorial step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Commands tried against the step, the completing one included.
    pub attempts: u32,
    /// First time a command satisfied the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepProgress {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Per-session tutorial progress keyed by step id.
///
/// Step ids are not checked against any tutorial; steps that no longer exist
/// are simply never asked about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorialProgress {
    steps: BTreeMap<String, StepProgress>,
}

impl TutorialProgress {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, step_id: &str) -> Option<&StepProgress> {
        self.steps.get(step_id)
    }

    pub fn is_completed(&self, step_id: &str) -> bool {
        self.step(step_id).is_some_and(StepProgress::is_completed)
    }

    pub fn attempts(&self, step_id: &str) -> u32 {
        self.step(step_id).map_or(0, |step| step.attempts)
    }

    /// Count one attempt at `step_id`. Returns true when this attempt is
    /// the one that completed the step; later passes keep the first
    /// completion time.
    pub fn record_attempt(&mut self, step_id: &str, completed: bool, now: DateTime<Utc>) -> bool {
        let step = self.steps.entry(step_id.to_string()).or_default();
        step.attempts = step.attempts.saturating_add(1);
        let newly_completed = completed && !step.is_completed();
        if newly_completed {
            step.completed_at = Some(now);
        }
        newly_completed
    }

    /// How many of `step_ids` are completed.
    pub fn completed_count<'a>(&self, step_ids: impl IntoIterator<Item = &'a str>) -> usize {
        step_ids
            .into_iter()
            .filter(|id| self.is_completed(id))
            .count()
    }

    /// Share of `step_ids` completed, 0 to 100. An empty tutorial is 0.
    pub fn percentage<'a>(&self, step_ids: impl IntoIterator<Item = &'a str>) -> f64 {
        let (total, completed) = step_ids
            .into_iter()
            .fold((0usize, 0usize), |(total, completed), id| {
                (total + 1, completed + usize::from(self.is_completed(id)))
            });
        if total == 0 {
            return 0.0;
        }
        completed as f64 * 100.0 / total as f64
    }

    /// First of `step_ids`, in order, not yet completed.
    pub fn next_step<'a>(&self, step_ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
        step_ids.into_iter().find(|id| !self.is_completed(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const STEPS: [&str; 4] = ["first-run", "list", "stop", "remove"];

    fn at(minute: u32) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("2025-11-17T12:{minute:02}:00Z"))
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn attempts_count_until_and_after_completion() {
        let mut progress = TutorialProgress::default();

        assert!(!progress.record_attempt("first-run", false, at(0)));
        assert!(progress.record_attempt("first-run", true, at(1)));
        assert!(!progress.record_attempt("first-run", true, at(2)));

        let step = progress.step("first-run").unwrap();
        assert_eq!(step.attempts, 3);
        assert_eq!(step.completed_at, Some(at(1)));
    }

    #[test]
    fn failed_attempt_after_completion_keeps_it_completed() {
        let mut progress = TutorialProgress::default();
        progress.record_attempt("stop", true, at(0));
        progress.record_attempt("stop", false, at(1));

        assert!(progress.is_completed("stop"));
        assert_eq!(progress.attempts("stop"), 2);
    }

    #[test]
    fn unknown_step_has_no_progress() {
        let progress = TutorialProgress::default();
        assert!(!progress.is_completed("nope"));
        assert_eq!(progress.attempts("nope"), 0);
        assert!(progress.is_empty());
    }

    #[rstest]
    #[case::none(&[], 0.0)]
    #[case::one(&["first-run"], 25.0)]
    #[case::half(&["first-run", "stop"], 50.0)]
    #[case::all(&STEPS, 100.0)]
    #[case::stale_ids_ignored(&["first-run", "retired-step"], 25.0)]
    fn percentage_over_tutorial(#[case] completed: &[&str], #[case] expected: f64) {
        let mut progress = TutorialProgress::default();
        for id in completed {
            progress.record_attempt(id, true, at(0));
        }
        assert_eq!(progress.percentage(STEPS), expected);
    }

    #[test]
    fn percentage_of_empty_tutorial_is_zero() {
        let mut progress = TutorialProgress::default();
        progress.record_attempt("first-run", true, at(0));
        assert_eq!(progress.percentage(std::iter::empty()), 0.0);
    }

    #[rstest]
    #[case::fresh(&[], Some("first-run"))]
    #[case::in_order(&["first-run"], Some("list"))]
    #[case::skipped_ahead(&["first-run", "stop"], Some("list"))]
    #[case::finished(&STEPS, None)]
    fn next_step_is_first_pending(#[case] completed: &[&str], #[case] expected: Option<&str>) {
        let mut progress = TutorialProgress::default();
        for id in completed {
            progress.record_attempt(id, true, at(0));
        }
        assert_eq!(progress.next_step(STEPS), expected);
        assert_eq!(progress.completed_count(STEPS), completed.len());
    }

    #[test]
    fn serializes_as_map_of_steps() {
        let mut progress = TutorialProgress::default();
        progress.record_attempt("list", false, at(0));
        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value, serde_json::json!({ "list": { "attempts": 1 } }));
    }
}
