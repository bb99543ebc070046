//! Object key layout.
//!
//! Format: `projects[/{project_id}][/threads/{thread_id}]/files/{file_id}`

use std::fmt;

use super::error::StorageError;

/// Namespaced object key together with the prefix it must live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    prefix: String,
    key: String,
}

impl ObjectKey {
    /// Build the key for a file inside an optional project and thread.
    ///
    /// Blank project and thread ids count as absent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the file id is empty, or any segment is a dot
    /// segment or contains characters outside `[A-Za-z0-9._-]`.
    pub fn build(
        project_id: Option<&str>,
        thread_id: Option<&str>,
        file_id: &str,
    ) -> Result<Self, StorageError> {
        let mut prefix = String::from("projects");
        if let Some(project_id) = present(project_id) {
            prefix.push('/');
            prefix.push_str(validate_segment("project_id", project_id)?);
        }
        if let Some(thread_id) = present(thread_id) {
            prefix.push_str("/threads/");
            prefix.push_str(validate_segment("thread_id", thread_id)?);
        }
        prefix.push_str("/files");

        let key = format!("{prefix}/{}", validate_segment("file_name", file_id)?);
        Ok(Self { prefix, key })
    }

    /// The ancestor path every upload for this key is restricted to.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The full object key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

fn present(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

fn validate_segment<'a>(name: &str, segment: &'a str) -> Result<&'a str, StorageError> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(StorageError::invalid_key(format!(
            "{name} must be a non-empty path segment"
        )));
    }
    let safe = segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if !safe {
        return Err(StorageError::invalid_key(format!(
            "{name} contains characters outside [A-Za-z0-9._-]"
        )));
    }
    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, "projects/files")]
    #[case(Some("p1"), None, "projects/p1/files")]
    #[case(None, Some("t1"), "projects/threads/t1/files")]
    #[case(Some("p1"), Some("t1"), "projects/p1/threads/t1/files")]
    fn test_prefix_layout(
        #[case] project: Option<&str>,
        #[case] thread: Option<&str>,
        #[case] expected_prefix: &str,
    ) {
        let key = ObjectKey::build(project, thread, "abc").expect("valid key");
        assert_eq!(key.prefix(), expected_prefix);
        assert_eq!(key.as_str(), format!("{expected_prefix}/abc"));
        assert!(key.as_str().starts_with(key.prefix()));
    }

    #[rstest]
    #[case(Some(""), Some(""))]
    #[case(Some("  "), None)]
    #[case(None, Some(" "))]
    fn test_blank_ids_are_absent(#[case] project: Option<&str>, #[case] thread: Option<&str>) {
        let key = ObjectKey::build(project, thread, "abc").expect("valid key");
        assert_eq!(key.as_str(), "projects/files/abc");
    }

    #[test]
    fn test_empty_file_id_rejected() {
        let err = ObjectKey::build(None, None, "").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[rstest]
    #[case(".")]
    #[case("..")]
    #[case("../etc/passwd")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("my file.pdf")]
    fn test_rejects_unsafe_segments(#[case] segment: &str) {
        let err = ObjectKey::build(None, None, segment).unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = ObjectKey::build(Some(segment), None, "abc").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn test_display_matches_key() {
        let key = ObjectKey::build(Some("p1"), None, "abc").expect("valid key");
        assert_eq!(key.to_string(), "projects/p1/files/abc");
    }
}
