use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_manifest(&self, content: &str) {
        fs::write(self.manifest(), content).unwrap();
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.path().join("provision.kdl")
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    #[allow(dead_code)]
    pub fn state(&self) -> serde_json::Value {
        let content =
            fs::read_to_string(self.path().join(".fleetflow").join("provision.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }
}
