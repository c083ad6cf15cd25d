use std::path::PathBuf;

/// Supplies the bearer token. Implementations are asked on every request.
pub trait TokenSource: Send + Sync {
    /// `None` when no token is stored; callers send an empty bearer then
    fn token(&self) -> Option<String>;
}

/// Reads the token from a file each time it is asked for, so a login in
/// another process is picked up without restarting.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenSource for FileTokenStore {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) => {
                tracing::debug!("No token at {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_token_is_read_on_every_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        let store = FileTokenStore::new(&path);

        assert_eq!(store.token(), None);

        std::fs::write(&path, "first\n").unwrap();
        assert_eq!(store.token(), Some("first".to_string()));

        std::fs::write(&path, "second").unwrap();
        assert_eq!(store.token(), Some("second".to_string()));
    }

    #[test]
    fn test_blank_token_file_counts_as_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(FileTokenStore::new(&path).token(), None);
    }
}
