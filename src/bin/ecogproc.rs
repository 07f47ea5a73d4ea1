use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ecogproc::{
    job::{processing_data, JobRequest},
    store::existing_preprocess,
    BandSpec, CompositeBandSelection, Job, PreprocessConfig,
};
use log::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Preprocess,
    Decomposition,
    HighGamma,
}

#[derive(Parser)]
#[command(name = "ecogproc", about = "ECoG preprocessing and spectral decomposition")]
struct Args {
    /// Directory holding `{subject}_B{block}.safetensors` containers
    #[arg(long)]
    path: PathBuf,

    /// Subject identifier
    #[arg(long)]
    subject: String,

    /// Recording block (repeat for several)
    #[arg(long = "block", required = true)]
    blocks: Vec<String>,

    #[arg(long, value_enum)]
    mode: Mode,

    /// JSON parameters for the mode (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write results here instead of back into the source block
    #[arg(long)]
    new_file: Option<PathBuf>,

    /// Recompute even when the block already holds a preprocessed interface
    #[arg(long)]
    force: bool,
}

fn read_config<T: serde::de::DeserializeOwned + Default>(path: Option<&PathBuf>) -> Result<T> {
    match path {
        None => Ok(T::default()),
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", p.display()))
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let job = match args.mode {
        Mode::Preprocess => Job::Preprocess(read_config::<PreprocessConfig>(args.config.as_ref())?),
        Mode::Decomposition => {
            let bands: Option<BandSpec> = match &args.config {
                None => None,
                Some(p) => Some(read_config::<BandSpec>(Some(p))?),
            };
            Job::Decompose(bands.unwrap_or_else(ecogproc::chang_lab))
        }
        Mode::HighGamma => Job::HighGamma(read_config::<CompositeBandSelection>(args.config.as_ref())?),
    };

    let mut blocks = args.blocks.clone();
    if matches!(job, Job::Preprocess(_)) && !args.force {
        blocks.retain(|block| {
            let src = ecogproc::block_path(&args.path, &args.subject, block);
            match ecogproc::load_store(&src).ok().as_ref().and_then(existing_preprocess) {
                Some(done) => {
                    println!("B{block}: already preprocessed ({}), skipping", done.provenance());
                    false
                }
                None => true,
            }
        });
        if blocks.is_empty() {
            return Ok(());
        }
    }

    let request = JobRequest {
        path: args.path,
        subject: args.subject,
        blocks,
        job,
        new_file: args.new_file,
    };
    info!("{} job over {} block(s)", request.job.name(), request.blocks.len());

    let outputs = processing_data(&request)?;
    for (block, out) in request.blocks.iter().zip(&outputs) {
        println!(
            "B{block}: `{}` [{} × {}] @ {} Hz  {}",
            out.interface, out.rows, out.samples, out.fs, out.comment
        );
    }
    Ok(())
}
