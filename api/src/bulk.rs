//! Chunked submission and polling of bulk export and delete jobs.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{fmt, thread::sleep, time::Duration};

use crate::{
    error::{Error, Result},
    resources::{
        export::{Export, NewExport},
        file::{File, Id as FileId},
        BulkRecord,
    },
    Client,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Aborted
        )
    }
}

/// Reason the platform gave for rejecting or failing one item of a bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BulkItemError {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for BulkItemError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fn or_dash<T: ToString>(value: Option<T>) -> String {
            value.map_or_else(|| "-".to_owned(), |value| value.to_string())
        }
        write!(
            formatter,
            "<Error: status={}, code={}>; {}",
            or_dash(self.status),
            or_dash(self.code),
            self.message
        )
    }
}

pub enum Submission<JobT> {
    Accepted(JobT),
    Rejected(BulkItemError),
}

pub trait BulkJob {
    fn state(&self) -> JobState;
    fn failure_message(&self) -> Option<String>;
}

/// A bulk endpoint: one request submits a chunk of items, another re-fetches their jobs.
pub trait BulkOperation {
    type Item;
    type Job: BulkJob;

    /// Submit at most [`BulkOptions::MAX_CHUNK_SIZE`] items, one submission per item in order.
    fn submit(&self, chunk: &[Self::Item]) -> Result<Vec<Submission<Self::Job>>>;

    /// Current state of `jobs`, in the same order.
    fn poll(&self, jobs: &[Self::Job]) -> Result<Vec<Self::Job>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkOptions {
    pub chunk_size: usize,
    pub poll_interval: Duration,
    /// Status checks allowed per chunk before giving up, unbounded if `None`.
    pub max_polls: Option<usize>,
    /// Log progress every time this many more items are done.
    pub log_every: usize,
}

impl BulkOptions {
    /// Largest number of items the platform accepts in one bulk request.
    pub const MAX_CHUNK_SIZE: usize = 100;
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            chunk_size: Self::MAX_CHUNK_SIZE,
            poll_interval: Duration::from_secs(10),
            max_polls: None,
            log_every: 1000,
        }
    }
}

pub fn submit_and_wait<OperationT>(
    operation: &OperationT,
    items: &[OperationT::Item],
    options: &BulkOptions,
) -> Result<Vec<OperationT::Job>>
where
    OperationT: BulkOperation + ?Sized,
{
    submit_and_wait_observed(operation, items, options, |_| {})
}

/// Submit `items` chunk by chunk, waiting for every job of a chunk to finish before moving on.
///
/// Rejected items abort the chunk before any polling, failed jobs abort it once all of its
/// jobs are terminal. In both cases the error lists every affected item of the chunk. Jobs
/// from earlier chunks are not rolled back. `on_progress` is called with the number of items
/// done after each chunk.
pub fn submit_and_wait_observed<OperationT>(
    operation: &OperationT,
    items: &[OperationT::Item],
    options: &BulkOptions,
    mut on_progress: impl FnMut(usize),
) -> Result<Vec<OperationT::Job>>
where
    OperationT: BulkOperation + ?Sized,
{
    let chunk_size = options.chunk_size.clamp(1, BulkOptions::MAX_CHUNK_SIZE);
    let mut done = Vec::with_capacity(items.len());
    let mut next_log = options.log_every;

    for chunk in items.chunks(chunk_size) {
        let mut jobs = Vec::with_capacity(chunk.len());
        let mut rejected = Vec::new();
        for submission in operation.submit(chunk)? {
            match submission {
                Submission::Accepted(job) => jobs.push(job),
                Submission::Rejected(error) => rejected.push(error),
            }
        }
        if !rejected.is_empty() {
            return Err(Error::BulkSubmission { errors: rejected });
        }

        let mut polls = 0;
        loop {
            let pending = jobs.iter().filter(|job| !job.state().is_terminal()).count();
            if pending == 0 {
                break;
            }
            if options.max_polls.map_or(false, |max_polls| polls >= max_polls) {
                return Err(Error::BulkTimeout { pending, polls });
            }
            sleep(options.poll_interval);
            jobs = operation.poll(&jobs)?;
            polls += 1;
        }

        let failures = jobs
            .iter()
            .filter(|job| job.state() == JobState::Failed)
            .map(|job| {
                job.failure_message()
                    .unwrap_or_else(|| "failed without a reason".to_owned())
            })
            .collect::<Vec<_>>();
        if !failures.is_empty() {
            return Err(Error::BulkCompletion { messages: failures });
        }

        done.extend(jobs);
        on_progress(done.len());
        if options.log_every > 0 && done.len() >= next_log {
            info!("Processed {} / {} items", done.len(), items.len());
            while next_log <= done.len() {
                next_log += options.log_every;
            }
        }
    }

    Ok(done)
}

/// Export platform files to `<location>/<file name>` on a volume.
pub struct BulkExport<'a> {
    pub client: &'a Client,
    pub volume: String,
    pub location: String,
    pub overwrite: bool,
    /// Keep the platform copy, rather than moving the file to the volume.
    pub copy_only: bool,
}

impl BulkOperation for BulkExport<'_> {
    type Item = File;
    type Job = Export;

    fn submit(&self, chunk: &[File]) -> Result<Vec<Submission<Export>>> {
        let exports = chunk
            .iter()
            .map(|file| NewExport::new(file, &self.volume, &self.location, self.overwrite))
            .collect::<Vec<_>>();
        let records = self.client.create_exports(&exports, self.copy_only)?;
        expect_one_per_item(chunk.len(), records.len())?;

        Ok(records
            .into_iter()
            .map(|record| match record {
                BulkRecord {
                    error: Some(error), ..
                } => Submission::Rejected(error),
                BulkRecord {
                    resource: Some(export),
                    ..
                } => Submission::Accepted(export),
                BulkRecord { .. } => Submission::Rejected(BulkItemError {
                    message: "no export was created".to_owned(),
                    ..Default::default()
                }),
            })
            .collect())
    }

    fn poll(&self, jobs: &[Export]) -> Result<Vec<Export>> {
        let records = self
            .client
            .get_exports(jobs.iter().map(|export| export.id.0.as_str()))?;
        expect_one_per_item(jobs.len(), records.len())?;

        Ok(jobs
            .iter()
            .zip(records)
            .map(|(previous, record)| match record {
                BulkRecord {
                    resource: Some(export),
                    ..
                } => export,
                BulkRecord { error, .. } => Export {
                    state: JobState::Failed,
                    error,
                    ..previous.clone()
                },
            })
            .collect())
    }
}

/// Outcome of deleting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub file: FileId,
    /// The file did not exist any more when the request was made.
    pub already_deleted: bool,
}

impl BulkJob for Deletion {
    fn state(&self) -> JobState {
        JobState::Completed
    }

    fn failure_message(&self) -> Option<String> {
        None
    }
}

/// Delete files by id. Deletion is synchronous, there is nothing to poll.
pub struct BulkDelete<'a> {
    pub client: &'a Client,
}

impl BulkOperation for BulkDelete<'_> {
    type Item = FileId;
    type Job = Deletion;

    fn submit(&self, chunk: &[FileId]) -> Result<Vec<Submission<Deletion>>> {
        let records = self.client.delete_files(chunk)?;
        expect_one_per_item(chunk.len(), records.len())?;

        Ok(chunk
            .iter()
            .zip(records)
            .map(|(file, record)| match record.error {
                Some(error) if error.status == Some(404) => {
                    warn!("File `{}` was already deleted, skipping", file);
                    Submission::Accepted(Deletion {
                        file: file.clone(),
                        already_deleted: true,
                    })
                }
                Some(error) => Submission::Rejected(error),
                None => Submission::Accepted(Deletion {
                    file: file.clone(),
                    already_deleted: false,
                }),
            })
            .collect())
    }

    fn poll(&self, jobs: &[Deletion]) -> Result<Vec<Deletion>> {
        Ok(jobs.to_vec())
    }
}

fn expect_one_per_item(expected: usize, received: usize) -> Result<()> {
    if expected == received {
        Ok(())
    } else {
        Err(Error::BadBulkResponse { expected, received })
    }
}
