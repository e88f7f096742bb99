use std::collections::HashSet;

use serde::Deserialize;

use crate::engine::ExpectedCommand;

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub limits: Option<LimitsConfig>,
    pub tutorial: Option<Tutorial>,
}

/// `limits` section; unset fields fall back to [`Limits::default`].
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct LimitsConfig {
    pub max_command_length: Option<usize>,
    pub max_suggestions: Option<usize>,
    pub max_suggestion_distance: Option<usize>,
}

/// Resolved limits used by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_command_length: usize,
    pub max_suggestions: usize,
    pub max_suggestion_distance: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_command_length: 500,
            max_suggestions: 3,
            max_suggestion_distance: 2,
        }
    }
}

impl LimitsConfig {
    pub fn resolve(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_command_length: self
                .max_command_length
                .unwrap_or(defaults.max_command_length),
            max_suggestions: self.max_suggestions.unwrap_or(defaults.max_suggestions),
            max_suggestion_distance: self
                .max_suggestion_distance
                .unwrap_or(defaults.max_suggestion_distance),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Tutorial {
    pub steps: Option<Vec<TutorialStep>>,
}

/// How a step compares the learner's command with `expect`.
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    #[default]
    Normalized,
    AnyOf,
    Semantic,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TutorialStep {
    pub id: String,
    pub title: Option<String>,
    pub expect: Option<String>,
    #[serde(rename = "match")]
    pub match_mode: Option<MatchMode>,
    /// Additional accepted commands for `any_of`.
    pub equivalents: Option<Vec<String>>,
    pub hint: Option<String>,
}

impl TutorialStep {
    /// The pattern this step accepts, or `None` for a step without `expect`
    /// (and without equivalents).
    pub fn expected_command(&self) -> Option<ExpectedCommand> {
        match self.match_mode.unwrap_or_default() {
            MatchMode::Exact => self.expect.clone().map(ExpectedCommand::Exact),
            MatchMode::Normalized => self.expect.clone().map(ExpectedCommand::Normalized),
            MatchMode::Semantic => self.expect.clone().map(ExpectedCommand::Semantic),
            MatchMode::AnyOf => {
                let candidates: Vec<String> = self
                    .expect
                    .iter()
                    .chain(self.equivalents.iter().flatten())
                    .cloned()
                    .collect();
                (!candidates.is_empty()).then_some(ExpectedCommand::AnyOf(candidates))
            }
        }
    }
}

/// Supplies the expected command for a tutorial step.
pub trait TutorialContent {
    fn expected_command(&self, step_id: &str) -> Option<ExpectedCommand>;
}

impl TutorialContent for Config {
    fn expected_command(&self, step_id: &str) -> Option<ExpectedCommand> {
        self.find_step(step_id)
            .and_then(|step| step.expected_command())
    }
}

fn builtin_step(id: &str, title: &str, expect: &str, hint: &str) -> TutorialStep {
    TutorialStep {
        id: id.to_string(),
        title: Some(title.to_string()),
        expect: Some(expect.to_string()),
        match_mode: Some(MatchMode::Semantic),
        equivalents: None,
        hint: Some(hint.to_string()),
    }
}

/// Steps used when no configuration defines a tutorial.
pub fn builtin_steps() -> Vec<TutorialStep> {
    vec![
        builtin_step(
            "first-run",
            "Your first command: docker run",
            "docker run nginx",
            "Type: docker run nginx",
        ),
        builtin_step(
            "list-containers",
            "Listing containers: docker ps",
            "docker ps",
            "This shows which containers are currently running",
        ),
        builtin_step(
            "stop-container",
            "Stopping containers: docker stop",
            "docker stop nginx",
            "Stopping is different from removing; the container still exists",
        ),
        builtin_step(
            "remove-container",
            "Removing containers: docker rm",
            "docker rm nginx",
            "Stop first, then remove. The image stays, only the container is deleted",
        ),
        builtin_step(
            "lifecycle-practice",
            "Practice: complete lifecycle",
            "docker run hello-world",
            "Create and start a container from the hello-world image",
        ),
    ]
}

impl Config {
    pub fn limits(&self) -> Limits {
        self.limits.unwrap_or_default().resolve()
    }

    /// Configured steps, or the built-in tutorial when none are configured.
    pub fn steps(&self) -> Vec<TutorialStep> {
        self.tutorial
            .as_ref()
            .and_then(|t| t.steps.clone())
            .unwrap_or_else(builtin_steps)
    }

    pub fn find_step(&self, id: &str) -> Option<TutorialStep> {
        self.steps().into_iter().find(|step| step.id == id)
    }

    /// Validate the config structure.
    ///
    /// Collects all validation errors and returns them at once so that users
    /// can fix every issue in a single pass.
    ///
    /// Checks:
    /// - limits are non-zero
    /// - step ids are non-empty and unique
    /// - every step has an `expect`, except `any_of` steps with equivalents
    pub fn validate(&self) -> Result<(), crate::config::ConfigError> {
        let mut errors = Vec::new();

        if let Some(limits) = &self.limits {
            for (name, value) in [
                ("max_command_length", limits.max_command_length),
                ("max_suggestions", limits.max_suggestions),
                ("max_suggestion_distance", limits.max_suggestion_distance),
            ] {
                if value == Some(0) {
                    errors.push(format!("limits.{name}: must be greater than 0"));
                }
            }
        }

        let steps = self
            .tutorial
            .as_ref()
            .and_then(|t| t.steps.as_deref())
            .unwrap_or_default();
        let mut seen = HashSet::new();

        for (i, step) in steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                errors.push(format!("tutorial.steps[{i}]: id must not be empty"));
            } else if !seen.insert(step.id.as_str()) {
                errors.push(format!(
                    "tutorial.steps[{i}]: duplicate step id '{}'",
                    step.id
                ));
            }

            let has_expect = step.expect.as_deref().is_some_and(|e| !e.trim().is_empty());
            match step.match_mode.unwrap_or_default() {
                MatchMode::AnyOf => {
                    let has_equivalents =
                        step.equivalents.as_ref().is_some_and(|e| !e.is_empty());
                    if !has_expect && !has_equivalents {
                        errors.push(format!(
                            "tutorial.steps[{i}]: 'any_of' step needs 'expect' or 'equivalents'"
                        ));
                    }
                }
                _ if !has_expect => {
                    errors.push(format!("tutorial.steps[{i}]: 'expect' must not be empty"));
                }
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(crate::config::ConfigError::Validation(errors))
        }
    }

    /// Merge two configs, with `other` taking precedence.
    ///
    /// - `limits`: field-wise, `other` wins where set
    /// - `tutorial.steps`: a step in `other` replaces the step with the same
    ///   id in `self`; new steps are appended
    pub fn merge(self, other: Config) -> Config {
        Config {
            limits: Self::merge_limits(self.limits, other.limits),
            tutorial: Self::merge_tutorial(self.tutorial, other.tutorial),
        }
    }

    fn merge_limits(
        base: Option<LimitsConfig>,
        over: Option<LimitsConfig>,
    ) -> Option<LimitsConfig> {
        match (base, over) {
            (Some(b), Some(o)) => Some(LimitsConfig {
                max_command_length: o.max_command_length.or(b.max_command_length),
                max_suggestions: o.max_suggestions.or(b.max_suggestions),
                max_suggestion_distance: o.max_suggestion_distance.or(b.max_suggestion_distance),
            }),
            (b, o) => b.or(o),
        }
    }

    fn merge_tutorial(base: Option<Tutorial>, over: Option<Tutorial>) -> Option<Tutorial> {
        match (base, over) {
            (Some(b), Some(o)) => Some(Tutorial {
                steps: Self::merge_steps(b.steps, o.steps),
            }),
            (b, o) => b.or(o),
        }
    }

    fn merge_steps(
        base: Option<Vec<TutorialStep>>,
        over: Option<Vec<TutorialStep>>,
    ) -> Option<Vec<TutorialStep>> {
        match (base, over) {
            (Some(mut b), Some(o)) => {
                for step in o {
                    match b.iter_mut().find(|existing| existing.id == step.id) {
                        Some(existing) => *existing = step,
                        None => b.push(step),
                    }
                }
                Some(b)
            }
            (b, o) => b.or(o),
        }
    }
}

/// Parse a YAML string into a `Config`.
pub fn parse_config(yaml: &str) -> Result<Config, crate::config::ConfigError> {
    let config: Config = serde_saphyr::from_str(yaml)?;
    Ok(config)
}
