use std::fmt;

pub const DEFAULT_TAG: &str = "latest";

/// A parsed `repository[:tag]` image reference.
///
/// Repositories are case-folded to lowercase, matching how the registry
/// treats them; tags keep their casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    /// Parse an image reference, returning a description of the problem on failure.
    ///
    /// The tag separator is the last `:` after the last `/`, so registry
    /// ports (`localhost:5000/app`) are part of the repository.
    pub fn parse(input: &str) -> Result<Self, String> {
        if input.is_empty() {
            return Err("image reference is empty".to_string());
        }
        if input.contains('@') {
            return Err(format!(
                "digest references are not supported in '{input}'; use NAME[:TAG]"
            ));
        }

        let slash = input.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match input[slash..].rfind(':') {
            Some(i) => (&input[..slash + i], &input[slash + i + 1..]),
            None => (input, DEFAULT_TAG),
        };

        validate_repository(repository, input)?;
        validate_tag(tag, input)?;

        Ok(Self {
            repository: repository.to_ascii_lowercase(),
            tag: tag.to_string(),
        })
    }

    /// Registry key, always `repository:tag`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }

    /// Container name used by `run` when `--name` is absent: the last path
    /// segment of the repository.
    pub fn default_container_name(&self) -> String {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
            .to_string()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

fn validate_repository(repository: &str, input: &str) -> Result<(), String> {
    if repository.is_empty() {
        return Err(format!("missing repository name in '{input}'"));
    }
    for (i, component) in repository.split('/').enumerate() {
        if component.is_empty() {
            return Err(format!("empty path component in '{input}'"));
        }
        // Only the registry host may carry a port.
        let allow_colon = i == 0 && repository.contains('/');
        let valid = component.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') || (allow_colon && c == ':')
        });
        if !valid {
            return Err(format!(
                "invalid image name '{input}'; use letters, digits, '.', '_', '-' and '/'"
            ));
        }
    }
    Ok(())
}

fn validate_tag(tag: &str, input: &str) -> Result<(), String> {
    let mut chars = tag.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    if !first_ok
        || tag.len() > 128
        || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(format!(
            "invalid tag in '{input}'; tags use letters, digits, '.', '_' and '-'"
        ));
    }
    Ok(())
}

/// Check a user-supplied container name (`--name`) or container reference.
pub fn validate_container_name(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Err(format!(
            "invalid container name '{name}'; names start with a letter or digit and may contain '_', '.' and '-'"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare("nginx", "nginx", "latest")]
    #[case::tagged("nginx:alpine", "nginx", "alpine")]
    #[case::uppercase_repository("NGINX", "nginx", "latest")]
    #[case::namespaced("library/redis:7.2", "library/redis", "7.2")]
    #[case::registry_port("localhost:5000/team/app", "localhost:5000/team/app", "latest")]
    #[case::registry_port_and_tag("localhost:5000/app:v1", "localhost:5000/app", "v1")]
    fn parse_valid_references(#[case] input: &str, #[case] repository: &str, #[case] tag: &str) {
        let image = ImageRef::parse(input).unwrap();
        assert_eq!(image.repository, repository);
        assert_eq!(image.tag, tag);
    }

    #[rstest]
    #[case::empty("")]
    #[case::empty_tag("nginx:")]
    #[case::empty_repository(":latest")]
    #[case::double_slash("team//app")]
    #[case::digest("nginx@sha256:abc")]
    #[case::bad_chars("ng!nx")]
    #[case::bad_tag("nginx:-dev")]
    fn parse_rejects_malformed_references(#[case] input: &str) {
        assert!(ImageRef::parse(input).is_err(), "expected error for {input:?}");
    }

    #[test]
    fn key_and_display_agree() {
        let image = ImageRef::parse("nginx").unwrap();
        assert_eq!(image.key(), "nginx:latest");
        assert_eq!(image.to_string(), "nginx:latest");
    }

    #[rstest]
    #[case("nginx", "nginx")]
    #[case("library/redis:7", "redis")]
    #[case("localhost:5000/team/app:v2", "app")]
    fn default_container_name_uses_last_segment(#[case] input: &str, #[case] expected: &str) {
        let image = ImageRef::parse(input).unwrap();
        assert_eq!(image.default_container_name(), expected);
    }

    #[rstest]
    #[case("x")]
    #[case("web-1")]
    #[case("My_App.v2")]
    fn container_names_accepted(#[case] name: &str) {
        assert!(validate_container_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("-web")]
    #[case("web app")]
    #[case("web:1")]
    fn container_names_rejected(#[case] name: &str) {
        assert!(validate_container_name(name).is_err());
    }
}
