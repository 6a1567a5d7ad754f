#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use hippo::schema::Layout;
use tempfile::{TempDir, tempdir};

/// Scratch source root laid out as `pharmacies/`, `claims/` and `reverts/`.
/// Files are cleaned up on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory holding the files of `layout`, created on first use.
    pub fn layout_dir(&self, layout: Layout) -> PathBuf {
        let dir = self.path().join(layout.dir_name());
        fs::create_dir_all(&dir).expect("create layout dir");
        dir
    }

    /// Writes `contents` into `name` under the layout's directory.
    pub fn write(&self, layout: Layout, name: &str, contents: &str) -> PathBuf {
        let path = self.layout_dir(layout).join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("output")
    }
}

pub const PHARMACIES_CSV: &str = "chain,npi\nA,p1\nB,p2\n";

/// Two fills of d1 at p1 and one at p2.
pub const CLAIMS_JSON: &str = r#"[
    {"id": "c1", "npi": "p1", "ndc": "d1", "price": 10.0, "quantity": 2, "timestamp": "2024-01-01T10:00:00"},
    {"id": "c2", "npi": "p1", "ndc": "d1", "price": 20.0, "quantity": 4, "timestamp": "2024-01-02T10:00:00"},
    {"id": "c3", "npi": "p2", "ndc": "d1", "price": 5.0, "quantity": 1, "timestamp": "2024-01-03T10:00:00"}
]"#;

pub const REVERTS_JSON: &str = r#"[
    {"id": "r1", "claim_id": "c1", "timestamp": "2024-01-05T10:00:00"}
]"#;

/// A workspace holding one file per layout with the sample data above.
pub fn sample_workspace() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    workspace.write(Layout::Pharmacies, "pharmacies.csv", PHARMACIES_CSV);
    workspace.write(Layout::Claims, "claims.json", CLAIMS_JSON);
    workspace.write(Layout::Reverts, "reverts.json", REVERTS_JSON);
    workspace
}
