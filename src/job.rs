//! Job dispatch: run one long transform against a channel store.
//!
//! A [`Job`] names the transform and carries its parameters. [`run_job`]
//! reads the transform's input interface, computes the result, and only then
//! writes the single output interface, so a failing job leaves the store as
//! it found it.
//!
//! | job          | reads          | writes          | comment                        |
//! |--------------|----------------|-----------------|--------------------------------|
//! | `Preprocess` | `raw`          | `preprocessed`  | `CAR:16,Notch:60,Downsample:400` |
//! | `Decompose`  | `preprocessed` | `decomposition` | band table as JSON             |
//! | `HighGamma`  | `preprocessed` | `high_gamma`    | selected band table as JSON    |
//!
//! [`processing_data`] runs a job over recording blocks on disk and
//! [`spawn_job`] / [`spawn_processing`] move either onto a worker thread so
//! an interactive caller is never blocked.
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::bands::{BandSpec, CompositeBandSelection};
use crate::config::PreprocessConfig;
use crate::decompose::{composite, decompose};
use crate::error::{EcogError, Result};
use crate::io::{block_path, load_store, save_store};
use crate::store::{ChannelStore, DECOMPOSITION, HIGH_GAMMA, PREPROCESSED, RAW};

/// A transform and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "config", rename_all = "snake_case")]
pub enum Job {
    Preprocess(PreprocessConfig),
    #[serde(rename = "decomposition")]
    Decompose(BandSpec),
    HighGamma(CompositeBandSelection),
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Preprocess(_) => "preprocess",
            Job::Decompose(_) => "decomposition",
            Job::HighGamma(_) => "high_gamma",
        }
    }

    pub fn input_interface(&self) -> &'static str {
        match self {
            Job::Preprocess(_) => RAW,
            Job::Decompose(_) | Job::HighGamma(_) => PREPROCESSED,
        }
    }

    pub fn output_interface(&self) -> &'static str {
        match self {
            Job::Preprocess(_) => PREPROCESSED,
            Job::Decompose(_) => DECOMPOSITION,
            Job::HighGamma(_) => HIGH_GAMMA,
        }
    }
}

/// Summary of the interface a job wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    pub interface: &'static str,
    pub rows: usize,
    pub samples: usize,
    pub fs: f64,
    pub comment: String,
}

/// Run `job` against `store`, writing its output interface on success.
pub fn run_job<S: ChannelStore + ?Sized>(store: &mut S, job: &Job) -> Result<JobOutput> {
    let input = store.interface(job.input_interface())?;
    let fs = input.fs;
    info!("{} job: `{}` {:?} @ {fs} Hz", job.name(), job.input_interface(), input.data.dim());

    let (data, out_fs, comment) = match job {
        Job::Preprocess(cfg) => {
            let out = crate::preprocess_excluding(&input.data, fs, cfg, store.bad_channels())?;
            (out.data, out.fs, out.provenance.provenance())
        }
        Job::Decompose(bands) => {
            let power = decompose(&input.data, fs, bands)?;
            (power.to_rows(), fs, serde_json::to_string(bands)?)
        }
        Job::HighGamma(selection) => {
            selection.validate()?;
            let power = decompose(&input.data, fs, &selection.reference)?;
            let trace = composite(&power, &selection.mask)?;
            let chosen: BandSpec = selection
                .reference
                .iter()
                .zip(&selection.mask)
                .filter(|(_, &m)| m)
                .map(|(b, _)| *b)
                .collect();
            (trace, fs, serde_json::to_string(&chosen)?)
        }
    };

    let output = JobOutput {
        interface: job.output_interface(),
        rows: data.nrows(),
        samples: data.ncols(),
        fs: out_fs,
        comment: comment.clone(),
    };
    store.put_interface(output.interface, data, out_fs, comment)?;
    debug!("{} job wrote `{}` [{}, {}]", job.name(), output.interface, output.rows, output.samples);
    Ok(output)
}

/// A job over recording blocks stored as `{path}/{subject}_B{block}.safetensors`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub path: PathBuf,
    pub subject: String,
    pub blocks: Vec<String>,
    pub job: Job,
    /// Destination container. `None` writes back into each source block.
    pub new_file: Option<PathBuf>,
}

/// Load, process and save every block of `request`, in order.
///
/// Each block is saved only after its job succeeded. Blocks processed before
/// a failing one keep their results.
pub fn processing_data(request: &JobRequest) -> Result<Vec<JobOutput>> {
    if request.blocks.is_empty() {
        return Err(EcogError::config("blocks", "no recording block given"));
    }
    if request.new_file.is_some() && request.blocks.len() > 1 {
        return Err(EcogError::config(
            "new_file",
            format!("one destination file for {} blocks", request.blocks.len()),
        ));
    }
    let mut outputs = Vec::with_capacity(request.blocks.len());
    for block in &request.blocks {
        let src = block_path(&request.path, &request.subject, block);
        let mut store = load_store(&src)?;
        let out = run_job(&mut store, &request.job)?;
        let dst = request.new_file.clone().unwrap_or(src);
        save_store(&store, &dst)?;
        info!("block {block}: `{}` saved → {}", out.interface, dst.display());
        outputs.push(out);
    }
    Ok(outputs)
}

/// Handle on a job running on a worker thread.
#[derive(Debug)]
pub struct JobHandle<T> {
    name: &'static str,
    inner: JoinHandle<Result<T>>,
}

impl<T> JobHandle<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Block until the job ends. A panicking job is reported as
    /// [`EcogError::Aborted`].
    pub fn wait(self) -> Result<T> {
        let name = self.name;
        self.inner.join().unwrap_or_else(|_| {
            warn!("{name} job panicked");
            Err(EcogError::Aborted(format!("{name} job panicked")))
        })
    }
}

fn spawn_named<T, F>(name: &'static str, f: F) -> Result<JobHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let inner = thread::Builder::new()
        .name(format!("ecogproc-{name}"))
        .spawn(f)
        .map_err(|e| EcogError::Aborted(format!("cannot start {name} job: {e}")))?;
    Ok(JobHandle { name, inner })
}

/// Run `job` against a shared store on a worker thread.
///
/// The store stays locked while the job runs. A previous job that panicked
/// while holding the lock leaves the store unmodified, so a poisoned lock is
/// recovered rather than reported.
pub fn spawn_job<S>(store: Arc<Mutex<S>>, job: Job) -> Result<JobHandle<JobOutput>>
where
    S: ChannelStore + Send + 'static,
{
    spawn_named(job.name(), move || {
        let mut guard = store.lock().unwrap_or_else(PoisonError::into_inner);
        run_job(&mut *guard, &job)
    })
}

/// [`processing_data`] on a worker thread.
pub fn spawn_processing(request: JobRequest) -> Result<JobHandle<Vec<JobOutput>>> {
    spawn_named(request.job.name(), move || processing_data(&request))
}
