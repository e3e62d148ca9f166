//! Build-and-cache for the front-end compiler binary.
//!
//! The binary is built once at startup from its declared sources and reused
//! by every request. [`CompilerCache::ensure_ready`] is the only way to get a
//! [`CompilerBinary`] handle from sources, so a pipeline can't exist without
//! a ready compiler.

use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustc_hash::FxHasher;
use tokio::process::Command;

use crate::config::{CompilerBuildConfig, Freshness};
use crate::error::{BuildError, StageError};
use crate::process::{Stage, run_bounded};

/// Handle to a ready front-end compiler binary.
///
/// Cheap to clone; shared read-only by all requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerBinary {
    path: PathBuf,
}

impl CompilerBinary {
    /// Use an already built compiler without going through the cache.
    pub fn prebuilt(path: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let path = path.into();
        if !path.is_file() {
            return Err(BuildError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "prebuilt compiler binary not found",
                ),
                path,
            });
        }
        Ok(Self { path })
    }

    /// Path to the binary.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Outcome of [`CompilerCache::ensure_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The binary was (re)built.
    Built,
    /// The existing binary was up to date.
    Fresh,
}

/// Keeps the front-end compiler binary newer than its sources.
///
/// Not re-entrant: call [`ensure_ready`](Self::ensure_ready) once, before
/// any request traffic.
#[derive(Debug, Clone)]
pub struct CompilerCache {
    config: CompilerBuildConfig,
}

impl CompilerCache {
    /// Create a cache for the given build configuration.
    pub fn new(config: CompilerBuildConfig) -> Self {
        Self { config }
    }

    /// Build configuration.
    pub fn config(&self) -> &CompilerBuildConfig {
        &self.config
    }

    /// Make sure a fresh binary exists, rebuilding it if needed.
    pub async fn ensure_ready(&self) -> Result<(CompilerBinary, CacheStatus), BuildError> {
        let status = if self.needs_rebuild()? {
            tracing::info!(
                "Building front-end compiler from {} sources",
                self.config.sources.len()
            );
            self.build().await?;
            tracing::info!("Front-end compiler built: {}", self.config.binary.display());
            CacheStatus::Built
        } else {
            tracing::info!("Using cached front-end compiler");
            CacheStatus::Fresh
        };

        Ok((
            CompilerBinary {
                path: self.config.binary.clone(),
            },
            status,
        ))
    }

    /// Whether the binary is missing or stale under the configured policy.
    ///
    /// Fails if a declared source is missing.
    pub fn needs_rebuild(&self) -> Result<bool, BuildError> {
        for source in &self.config.sources {
            if !source.is_file() {
                return Err(BuildError::MissingSource(source.clone()));
            }
        }

        if !self.config.binary.is_file() {
            return Ok(true);
        }

        match self.config.freshness {
            Freshness::ModifiedTime => {
                let binary_time = modified(&self.config.binary)?;
                for source in &self.config.sources {
                    if modified(source)? > binary_time {
                        tracing::debug!("{} is newer than the binary", source.display());
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Freshness::ContentHash => {
                let Ok(recorded) = fs::read_to_string(self.hash_file()) else {
                    return Ok(true);
                };
                let current = self.sources_hash()?;
                Ok(recorded.trim().parse::<u64>().ok() != Some(current))
            }
        }
    }

    /// Sidecar file holding the recorded source hash.
    fn hash_file(&self) -> PathBuf {
        let mut name = self.config.binary.clone().into_os_string();
        name.push(".hash");
        PathBuf::from(name)
    }

    /// Hash of every declared source's path and contents.
    fn sources_hash(&self) -> Result<u64, BuildError> {
        let mut hasher = FxHasher::default();
        for source in &self.config.sources {
            let bytes = fs::read(source).map_err(|e| io_error(source, e))?;
            hasher.write(source.to_string_lossy().as_bytes());
            hasher.write_usize(bytes.len());
            hasher.write(&bytes);
        }
        Ok(hasher.finish())
    }

    /// Invoke the native toolchain on all declared sources.
    async fn build(&self) -> Result<(), BuildError> {
        let toolchain = which::which(&self.config.toolchain).map_err(|_| {
            BuildError::ToolchainNotFound {
                program: self.config.toolchain.clone(),
            }
        })?;

        if let Some(parent) = self.config.binary.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let mut cmd = Command::new(&toolchain);
        cmd.args(&self.config.toolchain_args)
            .args(&self.config.sources)
            .arg("-o")
            .arg(&self.config.binary);

        let output = run_bounded(Stage::Build, &mut cmd, &self.config.limits)
            .await
            .map_err(|e| match e {
                StageError::TimedOut { limit, .. } => BuildError::TimedOut(limit),
                StageError::Spawn { program, source, .. } => BuildError::Spawn { program, source },
                other => BuildError::Io {
                    path: toolchain.clone(),
                    source: std::io::Error::other(other.to_string()),
                },
            })?;

        if !output.status.success() {
            return Err(BuildError::Toolchain {
                status: output.status_text(),
                stderr: output.stderr,
            });
        }

        if !self.config.binary.is_file() {
            return Err(BuildError::Toolchain {
                status: output.status_text(),
                stderr: format!(
                    "toolchain reported success but {} was not produced",
                    self.config.binary.display()
                ),
            });
        }

        if self.config.freshness == Freshness::ContentHash {
            let hash_file = self.hash_file();
            fs::write(&hash_file, self.sources_hash()?.to_string())
                .map_err(|e| io_error(&hash_file, e))?;
        }

        Ok(())
    }
}

fn modified(path: &Path) -> Result<SystemTime, BuildError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_is_reported() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let cache = CompilerCache::new(CompilerBuildConfig {
            sources: vec![temp.path().join("main.cpp")],
            binary: temp.path().join("compiler.out"),
            ..Default::default()
        });

        assert!(matches!(cache.needs_rebuild(), Err(BuildError::MissingSource(_))));
    }

    #[test]
    fn test_missing_binary_needs_rebuild() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let source = temp.path().join("main.cpp");
        fs::write(&source, "int main() {}").unwrap();

        let cache = CompilerCache::new(CompilerBuildConfig {
            sources: vec![source],
            binary: temp.path().join("compiler.out"),
            ..Default::default()
        });

        assert!(cache.needs_rebuild().unwrap());
    }

    #[test]
    fn test_hash_file_sits_next_to_binary() {
        let cache = CompilerCache::new(CompilerBuildConfig {
            binary: PathBuf::from("/work/compiler.out"),
            ..Default::default()
        });
        assert_eq!(cache.hash_file(), PathBuf::from("/work/compiler.out.hash"));
    }

    #[test]
    fn test_prebuilt_requires_file() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        assert!(CompilerBinary::prebuilt(temp.path().join("nope")).is_err());

        let bin = temp.path().join("compiler.out");
        fs::write(&bin, "").unwrap();
        let handle = CompilerBinary::prebuilt(&bin).unwrap();
        assert_eq!(handle.path(), bin.as_path());
    }
}
