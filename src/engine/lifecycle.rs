use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::SimError;
use crate::engine::command::Command;
use crate::engine::command_parser::{parse_env_assignment, parse_port_mapping};
use crate::engine::grammar::Verb;
use crate::state::{
    ContainerRecord, ContainerState, DANGLING, ImageRecord, ImageRef, ImageSource, StateSnapshot,
    new_short_id,
};

/// A change applied to the snapshot by an effectful verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateDelta {
    ContainerCreated {
        id: String,
        name: String,
        image: String,
        state: ContainerState,
        /// The image was not present and got pulled first.
        implicit_pull: bool,
    },
    ContainerTransition {
        id: String,
        name: String,
        from: ContainerState,
        to: ContainerState,
    },
    ImagePulled {
        id: String,
        reference: String,
        /// The reference already existed and was refreshed.
        refreshed: bool,
    },
    ImageBuilt {
        id: String,
        reference: String,
        path: String,
    },
    ImageTagged {
        id: String,
        source: String,
        target: String,
    },
    ImageRemoved {
        id: String,
        reference: String,
    },
}

/// What applying a command produced: a mutation or a read-only view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transition(StateDelta),
    Containers {
        all: bool,
        rows: Vec<ContainerRecord>,
    },
    Images {
        all: bool,
        rows: Vec<ImageRecord>,
    },
    Logs(ContainerRecord),
    InspectContainer(ContainerRecord),
    InspectImage(ImageRecord),
}

impl Outcome {
    pub fn state_delta(&self) -> Option<&StateDelta> {
        match self {
            Self::Transition(delta) => Some(delta),
            _ => None,
        }
    }
}

/// Apply a parsed command to `snapshot`.
///
/// Every precondition is checked before the first write, so a failing
/// command leaves the snapshot untouched.
pub fn apply(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let outcome = match command.verb() {
        Verb::Run => run(command, snapshot, now)?,
        Verb::Stop => stop(command, snapshot, now)?,
        Verb::Start => start(command, snapshot, now)?,
        Verb::Restart => restart(command, snapshot, now)?,
        Verb::Rm => remove_container(command, snapshot, now)?,
        Verb::Pull => pull(command, snapshot, now)?,
        Verb::Build => build(command, snapshot, now)?,
        Verb::Tag => tag(command, snapshot, now)?,
        Verb::Rmi => remove_image(command, snapshot)?,
        Verb::Ps => list_containers(command, snapshot),
        Verb::Images => list_images(command, snapshot),
        Verb::Logs => {
            let target = resolve(snapshot, required(command, 0)?)?;
            Outcome::Logs(container_at(snapshot, target)?.clone())
        }
        Verb::Inspect => inspect(command, snapshot)?,
    };

    if let Some(delta) = outcome.state_delta() {
        tracing::info!(?delta, "state changed");
    }
    Ok(outcome)
}

fn required(command: &Command, index: usize) -> Result<&str, SimError> {
    command.positional(index).ok_or_else(|| {
        SimError::invalid_syntax(format!("usage: {}", command.verb().spec().usage()))
    })
}

fn image_ref(value: &str) -> Result<ImageRef, SimError> {
    ImageRef::parse(value).map_err(SimError::invalid_syntax)
}

/// A resolved container together with the reference the user typed, so
/// that later lookups report the same name.
#[derive(Debug, Clone, Copy)]
struct Target<'r> {
    index: usize,
    reference: &'r str,
}

impl Target<'_> {
    fn not_found(&self) -> SimError {
        SimError::ContainerNotFound(self.reference.to_string())
    }
}

fn resolve<'r>(snapshot: &StateSnapshot, reference: &'r str) -> Result<Target<'r>, SimError> {
    snapshot
        .resolve_container(reference)
        .map(|index| Target { index, reference })
        .ok_or_else(|| SimError::ContainerNotFound(reference.to_string()))
}

fn container_at<'s>(
    snapshot: &'s StateSnapshot,
    target: Target<'_>,
) -> Result<&'s ContainerRecord, SimError> {
    snapshot
        .container(target.index)
        .ok_or_else(|| target.not_found())
}

/// Move the target container and describe the move.
fn transition(
    snapshot: &mut StateSnapshot,
    target: Target<'_>,
    to: ContainerState,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let record = snapshot
        .container_mut(target.index)
        .ok_or_else(|| target.not_found())?;
    let from = record.transition(to, now);
    Ok(Outcome::Transition(StateDelta::ContainerTransition {
        id: record.id.clone(),
        name: record.name.clone(),
        from,
        to,
    }))
}

fn run(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let image = image_ref(required(command, 0)?)?;
    let name = command
        .flag_value("name")
        .map(str::to_string)
        .unwrap_or_else(|| image.default_container_name());

    if snapshot.find_active_by_name(&name).is_some() {
        return Err(SimError::NameConflict(name));
    }

    let mut record = ContainerRecord::new(name, image.key(), now);
    for mapping in command.flag_values("publish") {
        let (host, container) = parse_port_mapping(mapping).map_err(SimError::invalid_syntax)?;
        record.ports.insert(host, container);
    }
    for assignment in command.flag_values("env") {
        if let Some((key, value)) = parse_env_assignment(assignment) {
            record.env.insert(key.to_string(), value.to_string());
        }
    }
    record.command = command.positionals()[1..].to_vec();
    record.detached = command.has_flag("detach");

    let implicit_pull = snapshot.image(&image.key()).is_none();
    if implicit_pull {
        snapshot.upsert_image(ImageRecord {
            id: new_short_id(),
            repository: image.repository.clone(),
            tag: image.tag.clone(),
            pulled_at: now,
            source: ImageSource::Pulled,
        });
    }

    record.transition(ContainerState::Running, now);
    let delta = StateDelta::ContainerCreated {
        id: record.id.clone(),
        name: record.name.clone(),
        image: record.image.clone(),
        state: record.state,
        implicit_pull,
    };
    snapshot.push_container(record);
    Ok(Outcome::Transition(delta))
}

fn stop(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let reference = required(command, 0)?;
    let target = resolve(snapshot, reference)?;
    if container_at(snapshot, target)?.state != ContainerState::Running {
        return Err(SimError::ContainerNotRunning(reference.to_string()));
    }
    transition(snapshot, target, ContainerState::Stopped, now)
}

fn start(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let reference = required(command, 0)?;
    let target = resolve(snapshot, reference)?;
    if container_at(snapshot, target)?.state == ContainerState::Running {
        return Err(SimError::AlreadyRunning(reference.to_string()));
    }
    transition(snapshot, target, ContainerState::Running, now)
}

/// Stop (when running) then start, reported as one transition from the
/// original state.
fn restart(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let target = resolve(snapshot, required(command, 0)?)?;
    let from = container_at(snapshot, target)?.state;
    if from == ContainerState::Running {
        transition(snapshot, target, ContainerState::Stopped, now)?;
    }
    match transition(snapshot, target, ContainerState::Running, now)? {
        Outcome::Transition(StateDelta::ContainerTransition { id, name, to, .. }) => Ok(
            Outcome::Transition(StateDelta::ContainerTransition { id, name, from, to }),
        ),
        other => Ok(other),
    }
}

fn remove_container(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let reference = required(command, 0)?;
    let target = resolve(snapshot, reference)?;
    if container_at(snapshot, target)?.state == ContainerState::Running && !command.has_flag("force")
    {
        return Err(SimError::ContainerRunning(reference.to_string()));
    }
    transition(snapshot, target, ContainerState::Removed, now)
}

fn pull(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let image = image_ref(required(command, 0)?)?;
    let reference = image.key();
    let existing = snapshot.image(&reference).map(|record| record.id.clone());
    let refreshed = existing.is_some();
    let id = existing.unwrap_or_else(new_short_id);

    snapshot.upsert_image(ImageRecord {
        id: id.clone(),
        repository: image.repository,
        tag: image.tag,
        pulled_at: now,
        source: ImageSource::Pulled,
    });
    Ok(Outcome::Transition(StateDelta::ImagePulled {
        id,
        reference,
        refreshed,
    }))
}

fn build(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let path = required(command, 0)?.to_string();
    let (repository, tag) = match command.flag_value("tag") {
        Some(value) => {
            let image = image_ref(value)?;
            (image.repository, image.tag)
        }
        None => (DANGLING.to_string(), DANGLING.to_string()),
    };

    let record = ImageRecord {
        id: new_short_id(),
        repository,
        tag,
        pulled_at: now,
        source: ImageSource::Built,
    };
    let delta = StateDelta::ImageBuilt {
        id: record.id.clone(),
        reference: record.reference(),
        path,
    };
    snapshot.upsert_image(record);
    Ok(Outcome::Transition(delta))
}

fn tag(
    command: &Command,
    snapshot: &mut StateSnapshot,
    now: DateTime<Utc>,
) -> Result<Outcome, SimError> {
    let source_input = required(command, 0)?;
    let source = image_ref(source_input)?;
    let target = image_ref(required(command, 1)?)?;

    let id = snapshot
        .image(&source.key())
        .map(|record| record.id.clone())
        .ok_or_else(|| SimError::ImageNotFound(source_input.to_string()))?;

    let delta = StateDelta::ImageTagged {
        id: id.clone(),
        source: source.key(),
        target: target.key(),
    };
    snapshot.upsert_image(ImageRecord {
        id,
        repository: target.repository,
        tag: target.tag,
        pulled_at: now,
        source: ImageSource::Tagged,
    });
    Ok(Outcome::Transition(delta))
}

fn remove_image(command: &Command, snapshot: &mut StateSnapshot) -> Result<Outcome, SimError> {
    let input = required(command, 0)?;
    let reference = image_ref(input)?.key();
    if snapshot.image(&reference).is_none() {
        return Err(SimError::ImageNotFound(input.to_string()));
    }

    if !command.has_flag("force")
        && let Some(user) = snapshot.active_containers().find(|c| c.image == reference)
    {
        return Err(SimError::ImageInUse {
            image: input.to_string(),
            container: user.name.clone(),
        });
    }

    let removed = snapshot
        .remove_image(&reference)
        .ok_or_else(|| SimError::ImageNotFound(input.to_string()))?;
    Ok(Outcome::Transition(StateDelta::ImageRemoved {
        id: removed.id,
        reference,
    }))
}

fn list_containers(command: &Command, snapshot: &StateSnapshot) -> Outcome {
    let all = command.has_flag("all");
    let rows = snapshot
        .active_containers()
        .filter(|c| all || c.state == ContainerState::Running)
        .cloned()
        .collect();
    Outcome::Containers { all, rows }
}

fn list_images(command: &Command, snapshot: &StateSnapshot) -> Outcome {
    let all = command.has_flag("all");
    let rows = snapshot
        .images()
        .filter(|image| all || !image.is_dangling())
        .cloned()
        .collect();
    Outcome::Images { all, rows }
}

/// Containers first; an image with that reference otherwise.
fn inspect(command: &Command, snapshot: &StateSnapshot) -> Result<Outcome, SimError> {
    let reference = required(command, 0)?;
    if let Ok(target) = resolve(snapshot, reference) {
        return Ok(Outcome::InspectContainer(
            container_at(snapshot, target)?.clone(),
        ));
    }

    ImageRef::parse(reference)
        .ok()
        .and_then(|image| snapshot.image(&image.key()).cloned())
        .map(Outcome::InspectImage)
        .ok_or_else(|| SimError::ContainerNotFound(reference.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::command_parser::parse;
    use crate::engine::normalizer::normalize;
    use crate::engine::suggestion::Suggester;
    use crate::engine::ErrorKind;
    use rstest::{fixture, rstest};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-11-17T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn exec(snapshot: &mut StateSnapshot, input: &str) -> Result<Outcome, SimError> {
        let normalized = normalize(input.into(), 500).unwrap();
        let command = parse(&normalized, &Suggester::default()).unwrap();
        apply(&command, snapshot, now())
    }

    fn state_of(snapshot: &StateSnapshot, name: &str) -> Option<ContainerState> {
        snapshot.find_active_by_name(name).map(|c| c.state)
    }

    #[fixture]
    fn with_web() -> StateSnapshot {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker run -d --name web nginx").unwrap();
        snapshot
    }

    // ========================================
    // run
    // ========================================

    #[test]
    fn run_creates_running_container_and_pulls_image() {
        let mut snapshot = StateSnapshot::new();
        let outcome = exec(&mut snapshot, "docker run nginx").unwrap();

        match outcome {
            Outcome::Transition(StateDelta::ContainerCreated {
                name,
                image,
                state,
                implicit_pull,
                ..
            }) => {
                assert_eq!(name, "nginx");
                assert_eq!(image, "nginx:latest");
                assert_eq!(state, ContainerState::Running);
                assert!(implicit_pull);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(snapshot.image("nginx:latest").is_some());
        let record = snapshot.find_active_by_name("nginx").unwrap();
        assert_eq!(record.started_at, Some(now()));
        assert_eq!(record.id.len(), 12);
    }

    #[test]
    fn run_records_ports_env_and_command() {
        let mut snapshot = StateSnapshot::new();
        exec(
            &mut snapshot,
            "docker run -d -p 8080:80 -p 8443:443 -e MODE=prod --name api alpine sleep 60",
        )
        .unwrap();

        let record = snapshot.find_active_by_name("api").unwrap();
        assert_eq!(record.ports.get(&8080), Some(&80));
        assert_eq!(record.ports.get(&8443), Some(&443));
        assert_eq!(record.env.get("MODE").map(String::as_str), Some("prod"));
        assert_eq!(record.command, vec!["sleep", "60"]);
        assert!(record.detached);
    }

    #[test]
    fn run_uses_existing_image_without_pull() {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker pull redis").unwrap();
        match exec(&mut snapshot, "docker run redis").unwrap() {
            Outcome::Transition(StateDelta::ContainerCreated { implicit_pull, .. }) => {
                assert!(!implicit_pull)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[rstest]
    #[case::default_name("docker run nginx", "docker run nginx")]
    #[case::explicit_name("docker run --name web nginx", "docker run --name web redis")]
    fn run_twice_with_same_name_conflicts(#[case] first: &str, #[case] second: &str) {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, first).unwrap();
        let before = snapshot.clone();

        let error = exec(&mut snapshot, second).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NameConflict);
        assert_eq!(snapshot, before);
        assert_eq!(snapshot.active_containers().count(), 1);
        assert!(
            snapshot
                .active_containers()
                .all(|c| c.state == ContainerState::Running)
        );
    }

    #[test]
    fn run_default_name_uses_last_repository_segment() {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker run library/redis:7").unwrap();
        assert!(snapshot.find_active_by_name("redis").is_some());
    }

    #[rstest]
    fn name_is_reusable_after_removal(mut with_web: StateSnapshot) {
        exec(&mut with_web, "docker rm -f web").unwrap();
        exec(&mut with_web, "docker run --name web nginx").unwrap();
        assert_eq!(with_web.containers().len(), 2);
        assert_eq!(with_web.containers()[0].state, ContainerState::Removed);
        assert_eq!(state_of(&with_web, "web"), Some(ContainerState::Running));
    }

    // ========================================
    // stop / start / restart / rm
    // ========================================

    #[rstest]
    fn full_round_trip(mut with_web: StateSnapshot) {
        exec(&mut with_web, "docker stop web").unwrap();
        assert_eq!(state_of(&with_web, "web"), Some(ContainerState::Stopped));
        exec(&mut with_web, "docker start web").unwrap();
        assert_eq!(state_of(&with_web, "web"), Some(ContainerState::Running));

        let error = exec(&mut with_web, "docker rm web").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ContainerRunning);

        exec(&mut with_web, "docker stop web").unwrap();
        exec(&mut with_web, "docker rm web").unwrap();
        assert_eq!(state_of(&with_web, "web"), None);
        assert_eq!(with_web.containers()[0].state, ContainerState::Removed);
    }

    #[rstest]
    fn stop_on_stopped_container_fails(mut with_web: StateSnapshot) {
        exec(&mut with_web, "docker stop web").unwrap();
        let error = exec(&mut with_web, "docker stop web").unwrap_err();
        assert_eq!(error, SimError::ContainerNotRunning("web".to_string()));
    }

    #[rstest]
    fn start_on_running_container_fails(mut with_web: StateSnapshot) {
        let error = exec(&mut with_web, "docker start web").unwrap_err();
        assert_eq!(error, SimError::AlreadyRunning("web".to_string()));
    }

    #[rstest]
    #[case("docker stop ghost")]
    #[case("docker start ghost")]
    #[case("docker restart ghost")]
    #[case("docker rm ghost")]
    #[case("docker logs ghost")]
    #[case("docker inspect ghost")]
    fn missing_container_is_reported(mut with_web: StateSnapshot, #[case] input: &str) {
        let before = with_web.clone();
        let error = exec(&mut with_web, input).unwrap_err();
        assert_eq!(error, SimError::ContainerNotFound("ghost".to_string()));
        assert_eq!(with_web, before);
    }

    #[rstest]
    fn removed_container_cannot_be_addressed(mut with_web: StateSnapshot) {
        exec(&mut with_web, "docker rm -f web").unwrap();
        let error = exec(&mut with_web, "docker start web").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ContainerNotFound);
    }

    #[rstest]
    fn rm_force_removes_running_container(mut with_web: StateSnapshot) {
        match exec(&mut with_web, "docker rm -f web").unwrap() {
            Outcome::Transition(StateDelta::ContainerTransition { from, to, .. }) => {
                assert_eq!(from, ContainerState::Running);
                assert_eq!(to, ContainerState::Removed);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(with_web.containers()[0].finished_at, Some(now()));
    }

    #[rstest]
    #[case::from_running(None, ContainerState::Running)]
    #[case::from_stopped(Some("docker stop web"), ContainerState::Stopped)]
    fn restart_reports_single_transition(
        mut with_web: StateSnapshot,
        #[case] setup: Option<&str>,
        #[case] expected_from: ContainerState,
    ) {
        if let Some(setup) = setup {
            exec(&mut with_web, setup).unwrap();
        }
        match exec(&mut with_web, "docker restart web").unwrap() {
            Outcome::Transition(StateDelta::ContainerTransition { from, to, .. }) => {
                assert_eq!(from, expected_from);
                assert_eq!(to, ContainerState::Running);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[rstest]
    fn container_resolves_by_id_prefix(mut with_web: StateSnapshot) {
        let prefix = with_web.containers()[0].id[..6].to_string();
        exec(&mut with_web, &format!("docker stop {prefix}")).unwrap();
        assert_eq!(state_of(&with_web, "web"), Some(ContainerState::Stopped));
    }

    // ========================================
    // images
    // ========================================

    #[test]
    fn pull_distinguishes_tags() {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker pull nginx:alpine").unwrap();
        assert!(snapshot.image("nginx:alpine").is_some());
        assert!(snapshot.image("nginx:latest").is_none());
    }

    #[test]
    fn pull_refreshes_existing_image() {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker pull nginx").unwrap();
        let id = snapshot.image("nginx:latest").unwrap().id.clone();
        match exec(&mut snapshot, "docker pull nginx:latest").unwrap() {
            Outcome::Transition(StateDelta::ImagePulled {
                refreshed,
                id: pulled,
                ..
            }) => {
                assert!(refreshed);
                assert_eq!(pulled, id);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn tag_creates_alias_sharing_id() {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker pull nginx").unwrap();
        exec(&mut snapshot, "docker tag nginx my-registry/nginx:v1").unwrap();

        let source = snapshot.image("nginx:latest").unwrap();
        let alias = snapshot.image("my-registry/nginx:v1").unwrap();
        assert_eq!(source.id, alias.id);
        assert_eq!(alias.source, ImageSource::Tagged);
    }

    #[test]
    fn tag_requires_existing_source() {
        let mut snapshot = StateSnapshot::new();
        let error = exec(&mut snapshot, "docker tag ghost ghost:v2").unwrap_err();
        assert_eq!(error, SimError::ImageNotFound("ghost".to_string()));
        assert!(snapshot.is_empty());
    }

    #[rstest]
    #[case::tagged("docker build -t my-app:1.0 .", "my-app:1.0", false)]
    #[case::untagged("docker build ./app", "<none>:<none>", true)]
    fn build_registers_image(
        #[case] input: &str,
        #[case] reference: &str,
        #[case] dangling: bool,
    ) {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, input).unwrap();
        let image = snapshot.image(reference).unwrap();
        assert_eq!(image.source, ImageSource::Built);
        assert_eq!(image.is_dangling(), dangling);
    }

    #[rstest]
    fn rmi_refuses_image_in_use(mut with_web: StateSnapshot) {
        let error = exec(&mut with_web, "docker rmi nginx").unwrap_err();
        assert_eq!(
            error,
            SimError::ImageInUse {
                image: "nginx".to_string(),
                container: "web".to_string(),
            }
        );
        assert!(with_web.image("nginx:latest").is_some());
    }

    #[rstest]
    #[case::forced("docker rmi -f nginx", None)]
    #[case::after_container_removed("docker rmi nginx", Some("docker rm -f web"))]
    fn rmi_removes_image(
        mut with_web: StateSnapshot,
        #[case] input: &str,
        #[case] setup: Option<&str>,
    ) {
        if let Some(setup) = setup {
            exec(&mut with_web, setup).unwrap();
        }
        exec(&mut with_web, input).unwrap();
        assert!(with_web.image("nginx:latest").is_none());
    }

    #[test]
    fn rmi_missing_image() {
        let mut snapshot = StateSnapshot::new();
        let error = exec(&mut snapshot, "docker rmi redis").unwrap_err();
        assert_eq!(error, SimError::ImageNotFound("redis".to_string()));
    }

    // ========================================
    // read-only verbs
    // ========================================

    #[test]
    fn ps_on_empty_snapshot_is_empty_and_pure() {
        let mut snapshot = StateSnapshot::new();
        let outcome = exec(&mut snapshot, "docker ps").unwrap();
        assert_eq!(
            outcome,
            Outcome::Containers {
                all: false,
                rows: Vec::new()
            }
        );
        assert!(snapshot.is_empty());
    }

    #[rstest]
    fn ps_hides_stopped_unless_all(mut with_web: StateSnapshot) {
        exec(&mut with_web, "docker run --name db redis").unwrap();
        exec(&mut with_web, "docker stop db").unwrap();
        exec(&mut with_web, "docker run --name gone alpine").unwrap();
        exec(&mut with_web, "docker rm -f gone").unwrap();

        let names = |outcome: Outcome| match outcome {
            Outcome::Containers { rows, .. } => {
                rows.into_iter().map(|c| c.name).collect::<Vec<_>>()
            }
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(names(exec(&mut with_web, "docker ps").unwrap()), vec!["web"]);
        assert_eq!(
            names(exec(&mut with_web, "docker ps -a").unwrap()),
            vec!["web", "db"]
        );
    }

    #[test]
    fn images_hides_dangling_unless_all() {
        let mut snapshot = StateSnapshot::new();
        exec(&mut snapshot, "docker pull nginx").unwrap();
        exec(&mut snapshot, "docker build .").unwrap();

        let count = |outcome: Outcome| match outcome {
            Outcome::Images { rows, .. } => rows.len(),
            other => panic!("unexpected outcome {other:?}"),
        };
        assert_eq!(count(exec(&mut snapshot, "docker images").unwrap()), 1);
        assert_eq!(count(exec(&mut snapshot, "docker images -a").unwrap()), 2);
    }

    #[rstest]
    fn read_only_verbs_do_not_mutate(mut with_web: StateSnapshot) {
        let before = with_web.clone();
        for input in [
            "docker ps",
            "docker ps -a",
            "docker images",
            "docker logs web",
            "docker inspect web",
            "docker inspect nginx",
        ] {
            let outcome = exec(&mut with_web, input).unwrap();
            assert!(outcome.state_delta().is_none(), "{input}");
        }
        assert_eq!(with_web, before);
    }

    #[rstest]
    fn inspect_falls_back_to_image(mut with_web: StateSnapshot) {
        match exec(&mut with_web, "docker inspect nginx:latest").unwrap() {
            Outcome::InspectImage(image) => assert_eq!(image.reference(), "nginx:latest"),
            other => panic!("unexpected outcome {other:?}"),
        }
        match exec(&mut with_web, "docker inspect web").unwrap() {
            Outcome::InspectContainer(record) => assert_eq!(record.name, "web"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn uppercase_input_is_equivalent() {
        let mut upper = StateSnapshot::new();
        let mut lower = StateSnapshot::new();
        exec(&mut upper, "DOCKER RUN NGINX").unwrap();
        exec(&mut lower, "docker run nginx").unwrap();

        let summary = |snapshot: &StateSnapshot| {
            snapshot
                .containers()
                .iter()
                .map(|c| (c.name.clone(), c.image.clone(), c.state))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&upper), summary(&lower));
    }

    #[test]
    fn stale_target_reports_the_typed_reference() {
        let mut snapshot = StateSnapshot::new();
        let target = Target {
            index: 7,
            reference: "web",
        };

        assert!(matches!(
            container_at(&snapshot, target),
            Err(SimError::ContainerNotFound(reference)) if reference == "web"
        ));
        assert!(matches!(
            transition(&mut snapshot, target, ContainerState::Stopped, now()),
            Err(SimError::ContainerNotFound(reference)) if reference == "web"
        ));
    }
}
