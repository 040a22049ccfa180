//! Job Queue Writer.
//!
//! Jobs are handed to external workers through a stage-per-directory queue
//! under `<output>/jobs/services`. A job file is written under the `tmp`
//! stage and renamed into `new` once complete, so a consumer scanning `new`
//! never observes a partial file. Later stages belong to the workers.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::QueueLayout;
use crate::error::QueueError;
use crate::planner::Job;

/// Lifecycle stages of a queued job, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueStage {
    Tmp,
    New,
    Working,
    Success,
    Failure,
}

impl QueueStage {
    pub const ALL: [QueueStage; 5] = [
        QueueStage::Tmp,
        QueueStage::New,
        QueueStage::Working,
        QueueStage::Success,
        QueueStage::Failure,
    ];

    /// Stages this producer writes to. The rest are owned by the workers.
    pub fn is_producer_owned(&self) -> bool {
        matches!(self, QueueStage::Tmp | QueueStage::New)
    }
}

impl fmt::Display for QueueStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueueStage::Tmp => "tmp",
            QueueStage::New => "new",
            QueueStage::Working => "working",
            QueueStage::Success => "success",
            QueueStage::Failure => "failure",
        };
        f.write_str(name)
    }
}

pub struct JobQueue {
    root: PathBuf,
    tmp_dir: PathBuf,
    new_dir: PathBuf,
}

impl JobQueue {
    /// Opens the queue below `output_root`, creating the `tmp` and `new`
    /// stage directories if needed.
    pub fn open(output_root: &Path, layout: &QueueLayout) -> Result<Self, QueueError> {
        let root = output_root.join(&layout.root);
        let tmp_dir = root.join(layout.stage_name(QueueStage::Tmp));
        let new_dir = root.join(layout.stage_name(QueueStage::New));

        for dir in [&tmp_dir, &new_dir] {
            std::fs::create_dir_all(dir).map_err(|e| QueueError::CreateStage {
                path: dir.clone(),
                source: e,
            })?;
        }

        Ok(Self {
            root,
            tmp_dir,
            new_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a job occupies once published.
    pub fn published_path(&self, id: &str) -> PathBuf {
        self.new_dir.join(id)
    }

    /// Serializes `job` and publishes it under the `new` stage.
    pub fn enqueue(&self, job: &Job) -> Result<PathBuf, QueueError> {
        let payload = serde_json::to_vec_pretty(job).map_err(|e| QueueError::Serialize {
            id: job.id.clone(),
            source: e,
        })?;

        self.publish(&job.id, |file| file.write_all(&payload))
    }

    /// Writes through `write` into `tmp/<id>`, flushes to disk, then renames
    /// to `new/<id>`. A failing writer leaves the `tmp` file behind and
    /// nothing under `new`.
    fn publish<F>(&self, id: &str, write: F) -> Result<PathBuf, QueueError>
    where
        F: FnOnce(&mut File) -> std::io::Result<()>,
    {
        let staged = self.tmp_dir.join(id);
        let published = self.new_dir.join(id);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staged)
            .map_err(|e| QueueError::WriteJob {
                path: staged.clone(),
                source: e,
            })?;

        write(&mut file)
            .and_then(|_| file.sync_all())
            .map_err(|e| QueueError::WriteJob {
                path: staged.clone(),
                source: e,
            })?;
        drop(file);

        std::fs::rename(&staged, &published).map_err(|e| QueueError::Publish {
            from: staged.clone(),
            to: published.clone(),
            source: e,
        })?;

        debug!(job_id = %id, "Job published");
        Ok(published)
    }
}
