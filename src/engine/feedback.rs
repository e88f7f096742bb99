use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;

use crate::engine::command::Command;
use crate::engine::grammar::Verb;
use crate::engine::lifecycle::{Outcome, StateDelta};
use crate::engine::result::ParseResult;
use crate::engine::{ErrorKind, SimError};
use crate::state::{ContainerRecord, ContainerState, ImageRecord};

/// Build the result for a command that was applied successfully.
pub fn render_success(command: &Command, outcome: &Outcome, now: DateTime<Utc>) -> ParseResult {
    ParseResult {
        valid: true,
        error_kind: None,
        message: status_message(command, outcome),
        metaphor: verb_metaphor(command.verb()).to_string(),
        suggestions: Vec::new(),
        state_delta: outcome.state_delta().cloned(),
        output: render_output(command, outcome, now),
        help_hint: None,
        command: Some(command.clone()),
    }
}

/// Build the result for a command that parsed but was not applied.
pub fn render_valid(command: &Command) -> ParseResult {
    ParseResult {
        valid: true,
        error_kind: None,
        message: format!("Valid command: {}", command.verb().spec().usage()),
        metaphor: verb_metaphor(command.verb()).to_string(),
        suggestions: Vec::new(),
        state_delta: None,
        output: String::new(),
        help_hint: None,
        command: Some(command.clone()),
    }
}

/// Build the result for a rejected command.
///
/// The message names the problem and the fix; the fix alone is also
/// exposed as `help_hint`.
pub fn render_failure(error: &SimError) -> ParseResult {
    let hint = fix_hint(error);
    ParseResult {
        valid: false,
        error_kind: Some(error.kind()),
        message: format!("{}. {hint}", capitalize(&error.to_string())),
        metaphor: error_metaphor(error.kind()).to_string(),
        suggestions: error.suggestions().to_vec(),
        state_delta: None,
        output: String::new(),
        help_hint: Some(hint),
        command: None,
    }
}

pub fn verb_metaphor(verb: Verb) -> &'static str {
    match verb {
        Verb::Run => {
            "Running a container is like launching a new ship from a blueprint into the harbor. The ship (container) begins its voyage."
        }
        Verb::Ps => {
            "Listing containers is like checking which ships are currently in your harbor. You see every active vessel at a glance."
        }
        Verb::Stop => {
            "Stopping a container is like anchoring a ship. It stays in the harbor but is no longer sailing."
        }
        Verb::Start => {
            "Starting a stopped container is like setting an anchored ship back into motion."
        }
        Verb::Restart => {
            "Restarting a container is like bringing a ship back to the dock and sending it straight out again."
        }
        Verb::Rm => {
            "Removing a container is like decommissioning a ship. Once removed, it leaves the harbor for good."
        }
        Verb::Rmi => {
            "Removing an image is like shredding a blueprint. No new ships can be built from it."
        }
        Verb::Images => {
            "Listing images is like reviewing the blueprints in your shipyard. Each blueprint can launch many ships."
        }
        Verb::Pull => {
            "Pulling an image is like fetching a new ship blueprint from the central shipyard registry."
        }
        Verb::Build => {
            "Building an image is like drafting a new ship blueprint from your own specifications."
        }
        Verb::Tag => {
            "Tagging an image is like giving a blueprint a second label. Both labels point at the same drawing."
        }
        Verb::Logs => {
            "Viewing logs is like reading a ship's logbook to see what happened during its voyage."
        }
        Verb::Inspect => {
            "Inspecting shows the full registration papers of a ship (container) or blueprint (image)."
        }
    }
}

pub fn error_metaphor(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InputTypeError | ErrorKind::EmptyCommand => {
            "The harbor master is waiting for an order, but none was given."
        }
        ErrorKind::TooLong => {
            "That order would not fit on the harbor master's slip. Keep orders short and clear."
        }
        ErrorKind::ControlCharacterError => {
            "The order contains marks the harbor master cannot read."
        }
        ErrorKind::SecurityViolation => {
            "The harbor master accepts one order at a time. Chained or hidden orders are turned away at the gate."
        }
        ErrorKind::MissingDockerPrefix => {
            "Every order in this harbor is addressed to the harbor master: start it with 'docker'."
        }
        ErrorKind::UnknownCommand => {
            "The harbor master does not know that order. Check the list of orders the harbor understands."
        }
        ErrorKind::InvalidSyntax => {
            "The order is recognized, but its details are filled in wrong."
        }
        ErrorKind::NameConflict => {
            "Two ships cannot share a name in the same harbor."
        }
        ErrorKind::ContainerNotFound => "No ship by that name is in the harbor.",
        ErrorKind::ContainerNotRunning => "That ship is already at anchor.",
        ErrorKind::AlreadyRunning => "That ship is already sailing.",
        ErrorKind::ContainerRunning => {
            "A ship cannot be decommissioned while it is still sailing."
        }
        ErrorKind::ImageNotFound => "That blueprint is not in your shipyard.",
        ErrorKind::ImageInUse => {
            "A blueprint cannot be shredded while ships built from it are still in the harbor."
        }
    }
}

fn fix_hint(error: &SimError) -> String {
    match error {
        SimError::InputType(_) => "Commands must be text starting with 'docker'".to_string(),
        SimError::EmptyCommand => "Start with: docker ps".to_string(),
        SimError::TooLong { .. } => {
            "Docker commands should be concise; check for repeated or pasted text".to_string()
        }
        SimError::ControlCharacter(_) => {
            "Use only printable characters and separate arguments with plain spaces".to_string()
        }
        SimError::SecurityViolation { .. } => {
            "Enter one Docker command at a time, without shell operators like ;, &&, || or backticks"
                .to_string()
        }
        SimError::MissingDockerPrefix { input } => format!("Did you mean: docker {input}?"),
        SimError::UnknownCommand { suggestions, .. } if !suggestions.is_empty() => {
            format!("Did you mean: {}?", docker_alternatives(suggestions))
        }
        SimError::UnknownCommand { .. } => {
            "Run 'harbor explain' to see the supported commands".to_string()
        }
        SimError::InvalidSyntax { suggestions, .. } if !suggestions.is_empty() => {
            format!("Did you mean: {}?", suggestions.join(" or "))
        }
        SimError::InvalidSyntax { .. } => {
            "Run 'harbor explain' with the command name to see its usage".to_string()
        }
        SimError::NameConflict(name) => format!(
            "Choose another name with --name, or remove the old container first: docker rm -f {name}"
        ),
        SimError::ContainerNotFound(_) => "List your containers with: docker ps -a".to_string(),
        SimError::ContainerNotRunning(reference) => {
            format!("Start it first: docker start {reference}")
        }
        SimError::AlreadyRunning(reference) => {
            format!("To restart it, use: docker restart {reference}")
        }
        SimError::ContainerRunning(reference) => format!(
            "Stop it first with docker stop {reference}, or force removal with docker rm -f {reference}"
        ),
        SimError::ImageNotFound(image) => format!("Pull it first: docker pull {image}"),
        SimError::ImageInUse { image, container } => format!(
            "Remove the container first with docker rm -f {container}, or force removal with docker rmi -f {image}"
        ),
    }
}

fn docker_alternatives(verbs: &[String]) -> String {
    verbs
        .iter()
        .map(|verb| format!("docker {verb}"))
        .collect::<Vec<_>>()
        .join(" or ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn status_message(command: &Command, outcome: &Outcome) -> String {
    let target = command.positional(0).unwrap_or_default();
    match outcome {
        Outcome::Transition(StateDelta::ContainerCreated {
            name,
            image,
            implicit_pull,
            ..
        }) => {
            let mut message = format!("Launching container '{name}' from image '{image}'");
            if command.has_flag("detach") {
                message.push_str(" in background mode");
            }
            for mapping in command.flag_values("publish") {
                message.push_str(&format!(" with port mapping {mapping}"));
            }
            if *implicit_pull {
                message.push_str(&format!(" (image '{image}' was pulled first)"));
            }
            message
        }
        Outcome::Transition(StateDelta::ContainerTransition { .. }) => match command.verb() {
            Verb::Stop => format!("Anchoring container '{target}'"),
            Verb::Start => format!("Starting container '{target}'"),
            Verb::Restart => format!("Restarting container '{target}'"),
            _ => format!("Removing container '{target}' from the harbor"),
        },
        Outcome::Transition(StateDelta::ImagePulled {
            reference,
            refreshed,
            ..
        }) => {
            if *refreshed {
                format!("Image '{reference}' is up to date")
            } else {
                format!("Downloading image '{reference}' from the registry")
            }
        }
        Outcome::Transition(StateDelta::ImageBuilt { path, .. }) => {
            match command.flag_value("tag") {
                Some(tag) => format!("Building image '{tag}' from '{path}'"),
                None => format!("Building untagged image from '{path}'"),
            }
        }
        Outcome::Transition(StateDelta::ImageTagged { source, target, .. }) => {
            format!("Tagging '{source}' as '{target}'")
        }
        Outcome::Transition(StateDelta::ImageRemoved { reference, .. }) => {
            format!("Removing image '{reference}' from the shipyard")
        }
        Outcome::Containers { all, rows } => {
            let scope = if *all { " (including stopped)" } else { "" };
            format!(
                "Listing containers in your harbor{scope}: {}",
                count(rows.len(), "container")
            )
        }
        Outcome::Images { all, rows } => {
            let scope = if *all { " (including untagged)" } else { "" };
            format!(
                "Showing available ship blueprints{scope}: {}",
                count(rows.len(), "image")
            )
        }
        Outcome::Logs(_) => format!("Reading the logbook of '{target}'"),
        Outcome::InspectContainer(_) | Outcome::InspectImage(_) => {
            format!("Inspecting '{target}'")
        }
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn render_output(command: &Command, outcome: &Outcome, now: DateTime<Utc>) -> String {
    let target = command.positional(0).unwrap_or_default();
    match outcome {
        Outcome::Transition(StateDelta::ContainerCreated {
            id,
            image,
            implicit_pull,
            ..
        }) => {
            let mut output = String::new();
            if *implicit_pull {
                output.push_str(&format!("Unable to find image '{image}' locally\n"));
                output.push_str(&pull_lines(image, false));
            }
            output.push_str(id);
            output
        }
        Outcome::Transition(StateDelta::ContainerTransition { .. }) => target.to_string(),
        Outcome::Transition(StateDelta::ImagePulled {
            reference,
            refreshed,
            ..
        }) => pull_lines(reference, *refreshed).trim_end().to_string(),
        Outcome::Transition(StateDelta::ImageBuilt { id, reference, .. }) => {
            let mut output = format!(
                "Step 1/2 : FROM alpine:latest\nStep 2/2 : COPY . /app\nSuccessfully built {id}"
            );
            if command.has_flag("tag") {
                output.push_str(&format!("\nSuccessfully tagged {reference}"));
            }
            output
        }
        Outcome::Transition(StateDelta::ImageTagged { .. }) => String::new(),
        Outcome::Transition(StateDelta::ImageRemoved { id, reference }) => {
            format!("Untagged: {reference}\nDeleted: {id}")
        }
        Outcome::Containers { rows, .. } => containers_table(rows, now),
        Outcome::Images { rows, .. } => images_table(rows, now),
        Outcome::Logs(record) => log_lines(record),
        Outcome::InspectContainer(record) => inspect_container(record),
        Outcome::InspectImage(image) => inspect_image(image),
    }
}

fn pull_lines(reference: &str, refreshed: bool) -> String {
    let (repository, tag) = reference.rsplit_once(':').unwrap_or((reference, "latest"));
    let source = registry_path(repository);
    if refreshed {
        format!("{tag}: Pulling from {source}\nStatus: Image is up to date for {reference}\n")
    } else {
        format!(
            "{tag}: Pulling from {source}\nPull complete\nStatus: Downloaded newer image for {reference}\n"
        )
    }
}

/// Official images live under `library/` on the default registry.
fn registry_path(repository: &str) -> String {
    if repository.contains('/') {
        repository.to_string()
    } else {
        format!("library/{repository}")
    }
}

/// Left-aligned columns separated by three spaces.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("   ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers.to_vec())];
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

fn containers_table(rows: &[ContainerRecord], now: DateTime<Utc>) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|record| {
            vec![
                record.id.clone(),
                record.image.clone(),
                format!("\"{}\"", record.command.join(" ")),
                format!("{} ago", humanize(now - record.created_at)),
                container_status(record, now),
                record
                    .ports
                    .iter()
                    .map(|(host, container)| format!("0.0.0.0:{host}->{container}/tcp"))
                    .collect::<Vec<_>>()
                    .join(", "),
                record.name.clone(),
            ]
        })
        .collect();
    render_table(
        &[
            "CONTAINER ID",
            "IMAGE",
            "COMMAND",
            "CREATED",
            "STATUS",
            "PORTS",
            "NAMES",
        ],
        &rows,
    )
}

fn container_status(record: &ContainerRecord, now: DateTime<Utc>) -> String {
    match record.state {
        ContainerState::Running => {
            let since = record.started_at.unwrap_or(record.created_at);
            format!("Up {}", humanize(now - since))
        }
        ContainerState::Stopped => {
            let since = record.finished_at.unwrap_or(record.created_at);
            format!("Exited (0) {} ago", humanize(now - since))
        }
        ContainerState::Created => "Created".to_string(),
        ContainerState::Removed => "Removed".to_string(),
    }
}

fn images_table(rows: &[ImageRecord], now: DateTime<Utc>) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|image| {
            vec![
                image.repository.clone(),
                image.tag.clone(),
                image.id.clone(),
                format!("{} ago", humanize(now - image.pulled_at)),
            ]
        })
        .collect();
    render_table(&["REPOSITORY", "TAG", "IMAGE ID", "CREATED"], &rows)
}

/// Docker-style coarse duration: "Less than a second", "5 minutes",
/// "About an hour", "3 days".
pub fn humanize(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds().max(0);
    match seconds {
        0 => "Less than a second".to_string(),
        1 => "1 second".to_string(),
        2..60 => format!("{seconds} seconds"),
        60..120 => "About a minute".to_string(),
        120..3600 => format!("{} minutes", seconds / 60),
        3600..7200 => "About an hour".to_string(),
        7200..172_800 => format!("{} hours", seconds / 3600),
        _ => format!("{} days", seconds / 86_400),
    }
}

fn log_lines(record: &ContainerRecord) -> String {
    let Some(started_at) = record.started_at else {
        return String::new();
    };
    let stamp = |offset: i64| {
        (started_at + TimeDelta::seconds(offset))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    };

    let mut lines = vec![
        format!("[{}] {} Starting {}...", record.name, stamp(0), record.image),
        format!("[{}] {} Service ready", record.name, stamp(1)),
    ];
    for (host, container) in &record.ports {
        lines.push(format!(
            "[{}] {} Listening on port {container} (published on {host})",
            record.name,
            stamp(1)
        ));
    }
    if let Some(finished_at) = record.finished_at
        && record.state != ContainerState::Running
    {
        lines.push(format!(
            "[{}] {} Received stop signal, shutting down",
            record.name,
            finished_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    lines.join("\n")
}

fn inspect_container(record: &ContainerRecord) -> String {
    let env: Vec<String> = record
        .env
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    let ports: serde_json::Map<String, serde_json::Value> = record
        .ports
        .iter()
        .map(|(host, container)| {
            (
                format!("{container}/tcp"),
                json!([{ "HostIp": "0.0.0.0", "HostPort": host.to_string() }]),
            )
        })
        .collect();

    let document = json!([{
        "Id": record.id,
        "Name": format!("/{}", record.name),
        "Created": record.created_at.to_rfc3339(),
        "State": {
            "Status": record.state,
            "Running": record.state == ContainerState::Running,
            "StartedAt": record.started_at.map(|t| t.to_rfc3339()),
            "FinishedAt": record.finished_at.map(|t| t.to_rfc3339()),
        },
        "Image": record.image,
        "Config": {
            "Env": env,
            "Cmd": record.command,
            "AttachStdout": !record.detached,
        },
        "HostConfig": {
            "PortBindings": ports,
        },
    }]);
    serde_json::to_string_pretty(&document).unwrap_or_default()
}

fn inspect_image(image: &ImageRecord) -> String {
    let document = json!([{
        "Id": image.id,
        "RepoTags": [image.reference()],
        "Created": image.pulled_at.to_rfc3339(),
        "Source": image.source,
    }]);
    serde_json::to_string_pretty(&document).unwrap_or_default()
}
