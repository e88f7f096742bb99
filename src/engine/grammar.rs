use std::fmt;

use serde::{Deserialize, Serialize};

/// A Docker subcommand the simulator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Run,
    Ps,
    Stop,
    Start,
    Restart,
    Rm,
    Rmi,
    Images,
    Pull,
    Build,
    Tag,
    Logs,
    Inspect,
}

impl Verb {
    pub const ALL: [Verb; 13] = [
        Verb::Run,
        Verb::Ps,
        Verb::Stop,
        Verb::Start,
        Verb::Restart,
        Verb::Rm,
        Verb::Rmi,
        Verb::Images,
        Verb::Pull,
        Verb::Build,
        Verb::Tag,
        Verb::Logs,
        Verb::Inspect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Run => "run",
            Verb::Ps => "ps",
            Verb::Stop => "stop",
            Verb::Start => "start",
            Verb::Restart => "restart",
            Verb::Rm => "rm",
            Verb::Rmi => "rmi",
            Verb::Images => "images",
            Verb::Pull => "pull",
            Verb::Build => "build",
            Verb::Tag => "tag",
            Verb::Logs => "logs",
            Verb::Inspect => "inspect",
        }
    }

    /// Case-insensitive lookup of a verb token.
    pub fn from_token(token: &str) -> Option<Verb> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(token))
    }

    /// Whether the verb may change session state.
    pub fn is_effectful(self) -> bool {
        !matches!(self, Verb::Ps | Verb::Images | Verb::Logs | Verb::Inspect)
    }

    pub fn spec(self) -> &'static VerbSpec {
        GRAMMAR
            .iter()
            .find(|spec| spec.verb == self)
            .unwrap_or(&GRAMMAR[0])
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a flag value is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `HOST:CONTAINER`, both ports in 1..=65535.
    PortMapping,
    ContainerName,
    /// `KEY=VALUE` with a non-empty key.
    EnvAssignment,
    ImageRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Switch,
    Value(ValueKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// Key under which the flag is stored in a parsed `Command`.
    pub key: &'static str,
    pub short: Option<&'static str>,
    pub long: Option<&'static str>,
    pub arity: Arity,
    pub repeatable: bool,
    pub placeholder: &'static str,
    pub help: &'static str,
}

impl FlagSpec {
    pub fn matches(&self, name: &str) -> bool {
        self.short == Some(name) || self.long == Some(name)
    }

    /// Preferred spelling for messages: the short form when there is one.
    pub fn display_name(&self) -> &'static str {
        self.short.or(self.long).unwrap_or(self.key)
    }

    /// `-p, --publish HOST:CONTAINER` as shown in the command reference.
    pub fn signature(&self) -> String {
        let names = [self.short, self.long]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        match self.arity {
            Arity::Switch => names,
            Arity::Value(_) => format!("{names} {}", self.placeholder),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionalKind {
    ImageRef,
    ContainerRef,
    /// A container or, for `inspect`, an image reference.
    ObjectRef,
    BuildPath,
    /// Everything after the image in `run`.
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalSpec {
    pub name: &'static str,
    pub kind: PositionalKind,
    pub required: bool,
    /// Swallows all remaining tokens, flag-like or not.
    pub variadic: bool,
}

/// Grammar and reference text for one verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbSpec {
    pub verb: Verb,
    pub summary: &'static str,
    pub positionals: &'static [PositionalSpec],
    pub flags: &'static [FlagSpec],
    pub examples: &'static [&'static str],
}

impl VerbSpec {
    pub fn find_flag(&self, name: &str) -> Option<&'static FlagSpec> {
        self.flags.iter().find(|flag| flag.matches(name))
    }

    /// Every spelling of every flag, for suggestions.
    pub fn flag_names(&self) -> impl Iterator<Item = &'static str> {
        self.flags
            .iter()
            .flat_map(|flag| [flag.short, flag.long])
            .flatten()
    }

    pub fn fixed_positionals(&self) -> usize {
        self.positionals.iter().filter(|p| !p.variadic).count()
    }

    pub fn has_variadic(&self) -> bool {
        self.positionals.iter().any(|p| p.variadic)
    }

    /// `docker run [OPTIONS] IMAGE [COMMAND...]`
    pub fn usage(&self) -> String {
        let mut usage = format!("docker {}", self.verb);
        if !self.flags.is_empty() {
            usage.push_str(" [OPTIONS]");
        }
        for positional in self.positionals {
            let name = if positional.variadic {
                format!("{}...", positional.name)
            } else {
                positional.name.to_string()
            };
            if positional.required {
                usage.push_str(&format!(" {name}"));
            } else {
                usage.push_str(&format!(" [{name}]"));
            }
        }
        usage
    }

    /// Full reference entry: usage, summary, options and examples.
    pub fn help_text(&self) -> String {
        let mut text = format!("{}\n\n{}\n", self.usage(), self.summary);
        if !self.examples.is_empty() {
            text.push_str("\nExamples:\n");
            for example in self.examples {
                text.push_str(&format!("  {example}\n"));
            }
        }
        if !self.flags.is_empty() {
            text.push_str("\nOptions:\n");
            let width = self
                .flags
                .iter()
                .map(|f| f.signature().len())
                .max()
                .unwrap_or(0);
            for flag in self.flags {
                text.push_str(&format!(
                    "  {:<width$}  {}\n",
                    flag.signature(),
                    flag.help
                ));
            }
        }
        text
    }
}

/// One-line-per-verb overview of everything the simulator accepts.
pub fn command_reference() -> String {
    let width = Verb::ALL
        .iter()
        .map(|v| v.as_str().len())
        .max()
        .unwrap_or(0);
    let mut text = String::from("Supported commands:\n");
    for spec in GRAMMAR {
        text.push_str(&format!(
            "  {:<width$}  {}\n",
            spec.verb.as_str(),
            spec.summary
        ));
    }
    text
}

const IMAGE: PositionalSpec = PositionalSpec {
    name: "IMAGE",
    kind: PositionalKind::ImageRef,
    required: true,
    variadic: false,
};

const CONTAINER: PositionalSpec = PositionalSpec {
    name: "CONTAINER",
    kind: PositionalKind::ContainerRef,
    required: true,
    variadic: false,
};

const ALL_FLAG: FlagSpec = FlagSpec {
    key: "all",
    short: Some("-a"),
    long: Some("--all"),
    arity: Arity::Switch,
    repeatable: false,
    placeholder: "",
    help: "Show all entries (default hides some)",
};

const FORCE_FLAG: FlagSpec = FlagSpec {
    key: "force",
    short: Some("-f"),
    long: Some("--force"),
    arity: Arity::Switch,
    repeatable: false,
    placeholder: "",
    help: "Force the removal",
};

/// The grammar table. Adding a verb means adding an entry here plus its
/// semantics in the lifecycle module.
pub static GRAMMAR: [VerbSpec; 13] = [
    VerbSpec {
        verb: Verb::Run,
        summary: "Create and start a new container from an image.",
        positionals: &[
            IMAGE,
            PositionalSpec {
                name: "COMMAND",
                kind: PositionalKind::Command,
                required: false,
                variadic: true,
            },
        ],
        flags: &[
            FlagSpec {
                key: "detach",
                short: Some("-d"),
                long: Some("--detach"),
                arity: Arity::Switch,
                repeatable: false,
                placeholder: "",
                help: "Run container in background",
            },
            FlagSpec {
                key: "publish",
                short: Some("-p"),
                long: Some("--publish"),
                arity: Arity::Value(ValueKind::PortMapping),
                repeatable: true,
                placeholder: "HOST:CONTAINER",
                help: "Publish a container port to the host",
            },
            FlagSpec {
                key: "name",
                short: None,
                long: Some("--name"),
                arity: Arity::Value(ValueKind::ContainerName),
                repeatable: false,
                placeholder: "NAME",
                help: "Assign a name to the container",
            },
            FlagSpec {
                key: "env",
                short: Some("-e"),
                long: Some("--env"),
                arity: Arity::Value(ValueKind::EnvAssignment),
                repeatable: true,
                placeholder: "KEY=VALUE",
                help: "Set an environment variable",
            },
        ],
        examples: &["docker run nginx", "docker run -d -p 8080:80 --name my-web nginx"],
    },
    VerbSpec {
        verb: Verb::Ps,
        summary: "List running containers.",
        positionals: &[],
        flags: &[FlagSpec {
            help: "Show all containers (including stopped)",
            ..ALL_FLAG
        }],
        examples: &["docker ps", "docker ps -a"],
    },
    VerbSpec {
        verb: Verb::Stop,
        summary: "Stop a running container.",
        positionals: &[CONTAINER],
        flags: &[],
        examples: &["docker stop my-container"],
    },
    VerbSpec {
        verb: Verb::Start,
        summary: "Start a stopped or created container.",
        positionals: &[CONTAINER],
        flags: &[],
        examples: &["docker start my-container"],
    },
    VerbSpec {
        verb: Verb::Restart,
        summary: "Stop and start a container again.",
        positionals: &[CONTAINER],
        flags: &[],
        examples: &["docker restart my-container"],
    },
    VerbSpec {
        verb: Verb::Rm,
        summary: "Remove a container.",
        positionals: &[CONTAINER],
        flags: &[FlagSpec {
            help: "Force removal of a running container",
            ..FORCE_FLAG
        }],
        examples: &["docker rm my-container", "docker rm -f my-container"],
    },
    VerbSpec {
        verb: Verb::Rmi,
        summary: "Remove an image.",
        positionals: &[IMAGE],
        flags: &[FlagSpec {
            help: "Remove the image even if containers use it",
            ..FORCE_FLAG
        }],
        examples: &["docker rmi nginx:alpine"],
    },
    VerbSpec {
        verb: Verb::Images,
        summary: "List available images.",
        positionals: &[],
        flags: &[FlagSpec {
            help: "Show all images (including untagged builds)",
            ..ALL_FLAG
        }],
        examples: &["docker images", "docker images -a"],
    },
    VerbSpec {
        verb: Verb::Pull,
        summary: "Download an image from a registry.",
        positionals: &[PositionalSpec {
            name: "IMAGE[:TAG]",
            ..IMAGE
        }],
        flags: &[],
        examples: &["docker pull nginx", "docker pull nginx:alpine"],
    },
    VerbSpec {
        verb: Verb::Build,
        summary: "Build an image from a build context.",
        positionals: &[PositionalSpec {
            name: "PATH",
            kind: PositionalKind::BuildPath,
            required: true,
            variadic: false,
        }],
        flags: &[FlagSpec {
            key: "tag",
            short: Some("-t"),
            long: Some("--tag"),
            arity: Arity::Value(ValueKind::ImageRef),
            repeatable: false,
            placeholder: "NAME[:TAG]",
            help: "Name and optionally tag the image",
        }],
        examples: &["docker build -t my-app:1.0 ."],
    },
    VerbSpec {
        verb: Verb::Tag,
        summary: "Create a tag that refers to an existing image.",
        positionals: &[
            PositionalSpec {
                name: "SOURCE_IMAGE",
                ..IMAGE
            },
            PositionalSpec {
                name: "TARGET_IMAGE",
                ..IMAGE
            },
        ],
        flags: &[],
        examples: &["docker tag nginx my-registry/nginx:v1"],
    },
    VerbSpec {
        verb: Verb::Logs,
        summary: "Show the logs of a container.",
        positionals: &[CONTAINER],
        flags: &[],
        examples: &["docker logs my-container"],
    },
    VerbSpec {
        verb: Verb::Inspect,
        summary: "Show detailed information about a container or image.",
        positionals: &[PositionalSpec {
            name: "NAME",
            kind: PositionalKind::ObjectRef,
            required: true,
            variadic: false,
        }],
        flags: &[],
        examples: &["docker inspect my-container", "docker inspect nginx:latest"],
    },
];
