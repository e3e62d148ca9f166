//! Per-request workspace allocation.
//!
//! Every request gets its own identifier, and every artifact path is a pure
//! function of that identifier and the base directory:
//!
//! ```text
//! <work_dir>/
//! ├── <id>.txt                     # submitted source
//! ├── <id>.s                       # assembly written by the front-end compiler
//! ├── <id>.exe                     # linked executable
//! ├── <id>_stack.json              # stack snapshots (optional)
//! ├── <id>_stack.json.asm.json     # line -> instruction map (optional)
//! ├── <id>.dot                     # repaired debug graph (optional)
//! └── <id>.png                     # rendered debug graph (optional)
//! ```
//!
//! Nothing is created at allocation time. Identifiers are random, so no
//! registry or lock is needed to keep concurrent workspaces apart.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;

/// Extension of the generated assembly file.
pub const ASSEMBLY_EXTENSION: &str = "s";

/// Derived artifact paths for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Request identifier all paths are keyed by.
    pub id: String,

    pub source_path: PathBuf,
    pub assembly_path: PathBuf,
    pub executable_path: PathBuf,
    pub stack_artifact_path: PathBuf,
    pub line_map_artifact_path: PathBuf,
    pub graph_path: PathBuf,
    pub image_path: PathBuf,
}

impl Workspace {
    /// Derive the workspace for `id` under `base_dir`.
    pub fn for_id(base_dir: &Path, id: impl Into<String>) -> Self {
        let id = id.into();
        let source_path = base_dir.join(format!("{}.txt", id));
        let stack_artifact_path = base_dir.join(format!("{}_stack.json", id));
        Self {
            assembly_path: assembly_path_for(&source_path),
            executable_path: base_dir.join(format!("{}.exe", id)),
            line_map_artifact_path: base_dir.join(format!("{}_stack.json.asm.json", id)),
            graph_path: base_dir.join(format!("{}.dot", id)),
            image_path: base_dir.join(format!("{}.png", id)),
            source_path,
            stack_artifact_path,
            id,
        }
    }

    /// The five core artifact paths.
    pub fn artifact_paths(&self) -> [&Path; 5] {
        [
            &self.source_path,
            &self.assembly_path,
            &self.executable_path,
            &self.stack_artifact_path,
            &self.line_map_artifact_path,
        ]
    }
}

/// Where the front-end compiler writes assembly for `source_path`: same
/// stem, assembly extension.
pub fn assembly_path_for(source_path: &Path) -> PathBuf {
    source_path.with_extension(ASSEMBLY_EXTENSION)
}

/// Hands out workspaces under a fixed base directory.
#[derive(Debug, Clone)]
pub struct WorkspaceAllocator {
    base_dir: PathBuf,
}

impl WorkspaceAllocator {
    /// Create an allocator rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create the base directory if it doesn't exist.
    ///
    /// Called once at startup; allocation itself never touches the disk.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    /// Base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Allocate a fresh workspace with a random 128-bit identifier.
    pub fn allocate(&self) -> Workspace {
        let id = Uuid::new_v4().simple().to_string();
        Workspace::for_id(&self.base_dir, id)
    }
}
