use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use crate::{thousands::Thousands, utils::LOG_PREFIX_INFO};

pub type ProgressMessage = (u64, String);

/// Counters shared between a bulk operation and its progress bar.
#[derive(Debug, Default)]
pub struct BulkStatistics {
    done: AtomicUsize,
}

impl BulkStatistics {
    pub fn set_done(&self, done: usize) {
        self.done.store(done, Ordering::SeqCst);
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }
}

/// Progress bar over `total` items for a bulk operation, labelled with `verb`.
pub fn bulk_progress(verb: &'static str, total: usize, statistics: &Arc<BulkStatistics>) -> Progress {
    Progress::new(
        move |statistics: &BulkStatistics| {
            let done = statistics.done();
            (done as u64, format!("{} {}", verb, Thousands(done as u64)))
        },
        statistics,
        Some(total as u64),
    )
}

pub struct Progress {
    report_progress_flag: Arc<AtomicBool>,
    progress_thread: Option<thread::JoinHandle<()>>,
}

impl Progress {
    pub fn new<ProgressFnT, StatisticsT>(
        progress_fn: ProgressFnT,
        statistics: &Arc<StatisticsT>,
        target_value: Option<u64>,
    ) -> Self
    where
        ProgressFnT: Fn(&StatisticsT) -> ProgressMessage + Sync + Send + 'static,
        StatisticsT: Sync + Send + 'static,
    {
        let report_progress_flag = Arc::new(AtomicBool::new(true));
        let progress_thread = spawn_progress_thread(
            Arc::clone(statistics),
            progress_fn,
            target_value,
            Arc::clone(&report_progress_flag),
        );

        Progress {
            report_progress_flag,
            progress_thread: Some(progress_thread),
        }
    }

    pub fn done(&mut self) {
        if let Some(handle) = self.progress_thread.take() {
            self.report_progress_flag.store(false, Ordering::SeqCst);
            if handle.join().is_err() {
                debug!("Progress thread panicked");
            }
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.done();
    }
}

fn spawn_progress_thread<Statistics, ProgressFn>(
    statistics: Arc<Statistics>,
    progress_fn: ProgressFn,
    max_progress_value: Option<u64>,
    report_progress: Arc<AtomicBool>,
) -> thread::JoinHandle<()>
where
    ProgressFn: Fn(&Statistics) -> ProgressMessage + Sync + Send + 'static,
    Statistics: Sync + Send + 'static,
{
    let mut template_str = format!("{} ", LOG_PREFIX_INFO.deref());
    template_str.push_str("{spinner:.green} [{elapsed_precise}] {prefix} ");
    if max_progress_value.is_some() {
        template_str.push_str("{bar:32.cyan/blue} {msg} ({eta})");
    } else {
        template_str.push_str("{msg}");
    }

    let progress_bar = ProgressBar::new(max_progress_value.unwrap_or(0));
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(&template_str)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    thread::spawn(move || {
        let sleep_duration = Duration::from_millis(100);

        while report_progress.load(Ordering::SeqCst) {
            thread::sleep(sleep_duration);
            let (progress_value, message) = progress_fn(&statistics);
            progress_bar.set_position(progress_value);
            progress_bar.set_prefix(message);
            progress_bar.set_message(match max_progress_value {
                Some(value) => format!("{} / {}", Thousands(progress_value), Thousands(value)),
                None => Thousands(progress_value).to_string(),
            });
        }

        progress_bar.finish_and_clear();
        eprint!("\r");
    })
}
