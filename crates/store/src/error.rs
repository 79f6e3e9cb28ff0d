/// Errors raised by record and log store adapters.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Log stream not found: {0}")]
    StreamNotFound(String),

    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Archive already exists: {0}")]
    ArchiveExists(String),

    /// Names become file names, so only `[A-Za-z0-9_-]` is accepted.
    #[error("Invalid store name: {0:?}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reject names that could escape the store directory.
pub(crate) fn check_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn accepts_ids_and_archive_names() {
        assert!(check_name("abc12345678901234567").is_ok());
        assert!(check_name("chk1-1700000000000").is_ok());
    }

    #[test]
    fn rejects_traversal_and_empty() {
        assert_matches!(check_name("../etc"), Err(StoreError::InvalidName(_)));
        assert_matches!(check_name("a/b"), Err(StoreError::InvalidName(_)));
        assert_matches!(check_name(""), Err(StoreError::InvalidName(_)));
    }

    #[test]
    fn display_not_found() {
        let err = StoreError::NotFound {
            collection: "checks".into(),
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "Record not found: checks/abc");
    }
}
