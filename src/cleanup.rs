use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Paths to delete if an install is interrupted
#[derive(Default, Debug)]
pub struct CleanupContext {
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Forget a path once the step that created it has finished
    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every registered path, newest first. Errors are ignored.
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..).rev() {
            debug!("Cleaning up: {:?}", path);
            if path.is_dir() {
                let _ = std::fs::remove_dir_all(&path);
            } else {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// Lock the context; a poisoned lock still holds a usable path list
pub fn lock(ctx: &SharedCleanupContext) -> MutexGuard<'_, CleanupContext> {
    ctx.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registers a path for the duration of one step
pub struct CleanupGuard {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Self {
        lock(&ctx).add(path.clone());
        Self { ctx, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The step finished; the path no longer needs interrupt cleanup
    pub fn success(self) {
        lock(&self.ctx).remove(&self.path);
    }
}
