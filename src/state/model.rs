use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TutorialProgress;

/// Generate a 12-character lowercase hex identifier.
pub fn new_short_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// Lifecycle state of a simulated container.
///
/// `Removed` is terminal: a removed record is never revived, a new `run`
/// allocates a fresh record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Stopped,
    Removed,
}

impl ContainerState {
    /// Whether the record still occupies its name and shows up in listings.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Removed)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    /// Canonical `repository:tag` of the image the container was created from.
    pub image: String,
    pub state: ContainerState,
    /// Host port → container port.
    #[serde(default)]
    pub ports: BTreeMap<u16, u16>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Trailing arguments given to `run` after the image.
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub detached: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ContainerRecord {
    pub fn new(name: impl Into<String>, image: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: new_short_id(),
            name: name.into(),
            image: image.into(),
            state: ContainerState::Created,
            ports: BTreeMap::new(),
            env: BTreeMap::new(),
            command: Vec::new(),
            detached: false,
            created_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// Move to `to`, stamping start/finish times. Returns the previous state.
    ///
    /// Precondition checks belong to the caller; this only records the move.
    pub(crate) fn transition(&mut self, to: ContainerState, now: DateTime<Utc>) -> ContainerState {
        let from = self.state;
        match to {
            ContainerState::Running => {
                self.started_at = Some(now);
                self.finished_at = None;
            }
            ContainerState::Stopped => self.finished_at = Some(now),
            ContainerState::Removed if from == ContainerState::Running => {
                self.finished_at = Some(now)
            }
            ContainerState::Created | ContainerState::Removed => {}
        }
        self.state = to;
        from
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Pulled,
    Built,
    Tagged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Shared by every tag that aliases the same image.
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub pulled_at: DateTime<Utc>,
    pub source: ImageSource,
}

pub const DANGLING: &str = "<none>";

impl ImageRecord {
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Untagged build output, hidden from `images` without `-a`.
    pub fn is_dangling(&self) -> bool {
        self.repository == DANGLING
    }
}

/// Everything one session knows about: its containers and images.
///
/// Containers are kept in creation order and are never dropped, so removed
/// records remain available for audit. Images are keyed by `repository:tag`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    containers: Vec<ContainerRecord>,
    #[serde(default)]
    images: BTreeMap<String, ImageRecord>,
    #[serde(default, skip_serializing_if = "TutorialProgress::is_empty")]
    progress: TutorialProgress,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// All container records, removed ones included.
    pub fn containers(&self) -> &[ContainerRecord] {
        &self.containers
    }

    pub fn active_containers(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.containers.iter().filter(|c| c.state.is_active())
    }

    pub fn find_active_by_name(&self, name: &str) -> Option<&ContainerRecord> {
        self.active_containers().find(|c| c.name == name)
    }

    /// Resolve a user reference to a non-removed record: exact name first,
    /// then a unique ID prefix.
    pub fn resolve_container(&self, reference: &str) -> Option<usize> {
        if let Some(index) = self
            .containers
            .iter()
            .position(|c| c.state.is_active() && c.name == reference)
        {
            return Some(index);
        }

        let mut matches = self
            .containers
            .iter()
            .enumerate()
            .filter(|(_, c)| c.state.is_active() && c.id.starts_with(reference));
        match (matches.next(), matches.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    }

    pub fn container(&self, index: usize) -> Option<&ContainerRecord> {
        self.containers.get(index)
    }

    pub(crate) fn container_mut(&mut self, index: usize) -> Option<&mut ContainerRecord> {
        self.containers.get_mut(index)
    }

    pub(crate) fn push_container(&mut self, record: ContainerRecord) {
        self.containers.push(record);
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageRecord> {
        self.images.values()
    }

    pub fn image(&self, key: &str) -> Option<&ImageRecord> {
        self.images.get(key)
    }

    /// Insert or replace the record under its `repository:tag` key.
    pub(crate) fn upsert_image(&mut self, record: ImageRecord) -> Option<ImageRecord> {
        self.images.insert(record.reference(), record)
    }

    pub(crate) fn remove_image(&mut self, key: &str) -> Option<ImageRecord> {
        self.images.remove(key)
    }

    /// No containers and no images. Tutorial progress does not count.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.images.is_empty()
    }

    pub fn progress(&self) -> &TutorialProgress {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut TutorialProgress {
        &mut self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-11-17T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn record(name: &str, state: ContainerState) -> ContainerRecord {
        let mut record = ContainerRecord::new(name, "nginx:latest", now());
        record.state = state;
        record
    }

    #[test]
    fn short_id_is_twelve_hex_chars() {
        let id = new_short_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[rstest]
    #[case(ContainerState::Created, true)]
    #[case(ContainerState::Running, true)]
    #[case(ContainerState::Stopped, true)]
    #[case(ContainerState::Removed, false)]
    fn container_state_is_active(#[case] state: ContainerState, #[case] expected: bool) {
        assert_eq!(state.is_active(), expected);
    }

    #[test]
    fn transition_stamps_times() {
        let mut record = record("web", ContainerState::Created);
        assert_eq!(record.transition(ContainerState::Running, now()), ContainerState::Created);
        assert_eq!(record.started_at, Some(now()));
        assert_eq!(record.transition(ContainerState::Stopped, now()), ContainerState::Running);
        assert_eq!(record.finished_at, Some(now()));
    }

    #[test]
    fn resolve_prefers_name_and_skips_removed() {
        let mut snapshot = StateSnapshot::new();
        snapshot.push_container(record("web", ContainerState::Removed));
        snapshot.push_container(record("web", ContainerState::Running));
        assert_eq!(snapshot.resolve_container("web"), Some(1));
    }

    #[test]
    fn resolve_by_unique_id_prefix() {
        let mut snapshot = StateSnapshot::new();
        let mut first = record("a", ContainerState::Running);
        first.id = "abc111111111".to_string();
        let mut second = record("b", ContainerState::Running);
        second.id = "abd222222222".to_string();
        snapshot.push_container(first);
        snapshot.push_container(second);

        assert_eq!(snapshot.resolve_container("abc"), Some(0));
        assert_eq!(snapshot.resolve_container("ab"), None, "ambiguous prefix");
        assert_eq!(snapshot.resolve_container("zzz"), None);
    }

    #[test]
    fn removed_records_are_retained_but_inactive() {
        let mut snapshot = StateSnapshot::new();
        snapshot.push_container(record("old", ContainerState::Removed));
        assert_eq!(snapshot.containers().len(), 1);
        assert_eq!(snapshot.active_containers().count(), 0);
        assert!(snapshot.find_active_by_name("old").is_none());
    }

    #[test]
    fn upsert_image_keys_by_reference() {
        let mut snapshot = StateSnapshot::new();
        let image = ImageRecord {
            id: "0123456789ab".to_string(),
            repository: "nginx".to_string(),
            tag: "alpine".to_string(),
            pulled_at: now(),
            source: ImageSource::Pulled,
        };
        assert!(snapshot.upsert_image(image).is_none());
        assert!(snapshot.image("nginx:alpine").is_some());
        assert!(snapshot.image("nginx:latest").is_none());
    }

    #[test]
    fn snapshot_json_uses_lowercase_states() {
        let mut snapshot = StateSnapshot::new();
        snapshot.push_container(record("web", ContainerState::Stopped));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["containers"][0]["state"], "stopped");

        let back: StateSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn empty_document_deserializes_to_empty_snapshot() {
        let snapshot: StateSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_empty());
    }
}
