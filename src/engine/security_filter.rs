use crate::engine::SimError;

/// A structural shell pattern that is never allowed in a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeniedPattern {
    pub token: &'static str,
    pub category: &'static str,
}

/// Longer operators come before their shorter prefixes so that a tie at the
/// same position reports the longer operator.
pub const DENYLIST: &[DeniedPattern] = &[
    DeniedPattern {
        token: ">${",
        category: "redirection with expansion",
    },
    DeniedPattern {
        token: "&&",
        category: "logical chaining",
    },
    DeniedPattern {
        token: "||",
        category: "logical chaining",
    },
    DeniedPattern {
        token: "$(",
        category: "command substitution",
    },
    DeniedPattern {
        token: "<(",
        category: "process substitution",
    },
    DeniedPattern {
        token: ">(",
        category: "process substitution",
    },
    DeniedPattern {
        token: ";",
        category: "statement separator",
    },
    DeniedPattern {
        token: "|",
        category: "pipe",
    },
    DeniedPattern {
        token: "`",
        category: "command substitution",
    },
    DeniedPattern {
        token: "&",
        category: "background execution",
    },
];

/// Find the earliest denied pattern in `input`, if any.
pub fn find_violation(input: &str) -> Option<(usize, &'static DeniedPattern)> {
    let mut earliest: Option<(usize, &'static DeniedPattern)> = None;
    for pattern in DENYLIST {
        if let Some(pos) = input.find(pattern.token)
            && earliest.is_none_or(|(best, _)| pos < best)
        {
            earliest = Some((pos, pattern));
        }
    }
    earliest
}

/// Reject input containing command chaining or substitution.
///
/// Runs on the whole normalized string before tokenization; quoting does not
/// exempt an operator because nothing here is ever handed to a shell.
pub fn check(input: &str) -> Result<(), SimError> {
    match find_violation(input) {
        Some((position, pattern)) => {
            tracing::warn!(
                pattern = pattern.token,
                position,
                "rejected command containing shell operator"
            );
            Err(SimError::SecurityViolation {
                pattern: pattern.token,
                category: pattern.category,
            })
        }
        None => Ok(()),
    }
}
