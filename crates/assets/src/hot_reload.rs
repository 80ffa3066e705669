use crate::AssetError;
use bubble_ecs::ShaderHandle;
use bubble_render::{ShaderReloader, ShaderSource};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Poller run once per editing tick.
///
/// Implementations reload synchronously and contain their own failures.
pub trait HotReload {
    fn on_update(&mut self, reloader: &mut dyn ShaderReloader);
}

/// Cheap change detector checked before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

struct WatchedShader {
    handle: ShaderHandle,
    source: ShaderSource,
    path: PathBuf,
    fingerprint: Option<Fingerprint>,
    digest: [u8; 32],
}

/// Watches shader files and rebuilds their pipelines when the content changes.
///
/// A file is re-read only when its modification time or length moved, and
/// reloaded only when the SHA-256 of its content differs from the last one
/// seen. Failed reloads are logged and leave the previous pipeline active.
pub struct HotReloader {
    interval: Duration,
    last_poll: Option<Instant>,
    watched: Vec<WatchedShader>,
    reloads: u64,
    failures: u64,
}

impl HotReloader {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_poll: None,
            watched: Vec::new(),
            reloads: 0,
            failures: 0,
        }
    }

    /// Start watching `path`, whose current content was loaded as `source`
    /// into `handle`.
    pub fn watch(
        &mut self,
        handle: ShaderHandle,
        source: ShaderSource,
        path: impl Into<PathBuf>,
    ) -> Result<(), AssetError> {
        let path = path.into();
        let fingerprint = Some(fingerprint(&path)?);
        let digest = content_digest(source.wgsl.as_bytes());
        tracing::debug!(path = %path.display(), ?handle, "watching shader");
        self.watched.push(WatchedShader {
            handle,
            source,
            path,
            fingerprint,
            digest,
        });
        Ok(())
    }

    pub fn watched_len(&self) -> usize {
        self.watched.len()
    }

    pub fn reload_count(&self) -> u64 {
        self.reloads
    }

    pub fn failure_count(&self) -> u64 {
        self.failures
    }

    /// Poll if the interval has elapsed. Returns the number of shaders reloaded.
    pub fn poll(&mut self, reloader: &mut dyn ShaderReloader) -> usize {
        let now = Instant::now();
        if let Some(last) = self.last_poll {
            if now.duration_since(last) < self.interval {
                return 0;
            }
        }
        self.last_poll = Some(now);
        self.poll_now(reloader)
    }

    /// Check every watched file regardless of the interval.
    pub fn poll_now(&mut self, reloader: &mut dyn ShaderReloader) -> usize {
        let mut reloaded = 0;
        for watched in &mut self.watched {
            match watched.check(reloader) {
                Ok(true) => {
                    self.reloads += 1;
                    reloaded += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    self.failures += 1;
                    tracing::warn!(
                        path = %watched.path.display(),
                        error = %err,
                        "hot-reload failed, keeping previous shader"
                    );
                }
            }
        }
        reloaded
    }
}

impl HotReload for HotReloader {
    fn on_update(&mut self, reloader: &mut dyn ShaderReloader) {
        self.poll(reloader);
    }
}

#[derive(Debug, thiserror::Error)]
enum ReloadError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Render(#[from] bubble_render::RenderError),
}

impl WatchedShader {
    fn check(&mut self, reloader: &mut dyn ShaderReloader) -> Result<bool, ReloadError> {
        let current = fingerprint(&self.path)?;
        if self.fingerprint == Some(current) {
            return Ok(false);
        }
        // Recorded first so a broken file is not retried every poll.
        self.fingerprint = Some(current);

        let wgsl = std::fs::read_to_string(&self.path).map_err(|e| AssetError::io(&self.path, e))?;
        let digest = content_digest(wgsl.as_bytes());
        if digest == self.digest {
            return Ok(false);
        }
        self.digest = digest;

        let source = ShaderSource::new(self.source.label.clone(), self.source.kind, wgsl);
        reloader.reload_shader(self.handle, &source)?;
        self.source = source;
        tracing::info!(path = %self.path.display(), handle = ?self.handle, "shader reloaded");
        Ok(true)
    }
}

fn fingerprint(path: &Path) -> Result<Fingerprint, AssetError> {
    let meta = std::fs::metadata(path).map_err(|e| AssetError::io(path, e))?;
    Ok(Fingerprint {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

fn content_digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}
