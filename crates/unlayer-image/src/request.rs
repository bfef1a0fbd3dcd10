use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One extraction request: a source path inside the image and where (and as
/// whom) it should land.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExtractRequest {
    pub src: String,
    #[serde(default)]
    pub dest: Option<PathBuf>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub force: bool,
}

impl ExtractRequest {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Self::default()
        }
    }

    pub fn dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Result of a single request. An empty `extracted` list means the request
/// was already satisfied and nothing was written.
#[derive(Clone, Debug, Default)]
pub struct ExtractOutcome {
    pub changed: bool,
    pub extracted: Vec<PathBuf>,
}

/// Aggregate result over a batch of requests.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionReport {
    pub changed: bool,
    pub extracted: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let request = ExtractRequest::new("/usr/lib/os-release")
            .dest("/tmp/os-release")
            .owner("app")
            .group("app")
            .force(true);
        assert_eq!(request.src, "/usr/lib/os-release");
        assert_eq!(request.dest, Some(PathBuf::from("/tmp/os-release")));
        assert_eq!(request.owner.as_deref(), Some("app"));
        assert_eq!(request.group.as_deref(), Some("app"));
        assert!(request.force);
    }

    #[test]
    fn deserializes_with_src_only() {
        let request: ExtractRequest = serde_json::from_str(r#"{"src": "/usr/bin/*"}"#).unwrap();
        assert_eq!(request.src, "/usr/bin/*");
        assert!(request.dest.is_none());
        assert!(!request.force);
    }

    #[test]
    fn deserializes_full_request() {
        let raw = r#"{"src": "/etc/passwd", "dest": "/tmp/passwd", "owner": "root", "group": "root", "force": true}"#;
        let request: ExtractRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.dest, Some(PathBuf::from("/tmp/passwd")));
        assert!(request.force);
    }

    #[test]
    fn missing_src_is_rejected() {
        let result = serde_json::from_str::<ExtractRequest>(r#"{"dest": "/tmp/x"}"#);
        assert!(result.is_err());
    }
}
