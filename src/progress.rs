//! Build progress: terminal bar plus the optional `--write-progress` file.
//!
//! The file is rewritten after every status change:
//!
//! ```json
//! {
//!   "total": 120, "processed": 42, "percent": 35,
//!   "current": {"id": "neptune", "step": "build page", "file": ":work.pug",
//!               "language": "fr", "output": "fr/neptune.html"}
//! }
//! ```

use crate::log;
use crate::logger::ProgressBars;
use anyhow::Context;
use parking_lot::Mutex;
use serde::Serialize;
use std::{fs, path::PathBuf};

const BAR: &str = "pages";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum BuildStep {
    #[default]
    #[serde(rename = "load database")]
    LoadDatabase,
    #[serde(rename = "build page")]
    BuildPage,
    #[serde(rename = "write links")]
    WriteLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentStatus {
    pub id: String,
    pub step: BuildStep,
    pub file: String,
    pub language: String,
    pub output: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub processed: usize,
    pub percent: usize,
    pub current: CurrentStatus,
}

impl ProgressSnapshot {
    fn update_percent(&mut self) {
        self.percent = (self.processed * 100).checked_div(self.total).unwrap_or(0);
    }
}

pub struct Progress {
    file: Option<PathBuf>,
    bars: Option<ProgressBars>,
    state: Mutex<ProgressSnapshot>,
}

impl Progress {
    /// `show_bar` draws a terminal bar for the pages.
    pub fn new(total: usize, file: Option<PathBuf>, show_bar: bool) -> Self {
        let state = ProgressSnapshot {
            total,
            ..ProgressSnapshot::default()
        };
        Self {
            file,
            bars: show_bar
                .then(|| ProgressBars::new_filtered(&[(BAR, total)]))
                .flatten(),
            state: Mutex::new(state),
        }
    }

    /// Record what is being worked on.
    pub fn status(&self, current: CurrentStatus) {
        let mut state = self.state.lock();
        state.current = current;
        self.write(&state);
    }

    /// Count one more processed page.
    pub fn advance(&self) {
        let mut state = self.state.lock();
        state.processed += 1;
        state.update_percent();
        self.write(&state);
        drop(state);

        if let Some(bars) = &self.bars {
            bars.inc_by_name(BAR);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().clone()
    }

    pub fn finish(&self) {
        if let Some(bars) = &self.bars {
            bars.finish();
        }
    }

    fn write(&self, state: &ProgressSnapshot) {
        let Some(path) = &self.file else {
            return;
        };
        let written = serde_json::to_string(state)
            .context("failed to serialize progress")
            .and_then(|json| {
                fs::write(path, json)
                    .with_context(|| format!("failed to write progress to {}", path.display()))
            });
        if let Err(err) = written {
            log!("error"; "{err:#}");
        }
    }
}
