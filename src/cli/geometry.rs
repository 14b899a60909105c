use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::geometry::{
    Blend, GeometryConfig, GeometrySpec, TaskSpec, DEFAULT_FOV, DEFAULT_OVERLAP,
};

/// Root directory of all experiments
pub const EXPERIMENTS_DIR: &str = "experiments";

#[derive(Args)]
pub struct GeometryArgs {
    /// Field of view (z y x)
    #[arg(long, num_args = 3, value_names = ["Z", "Y", "X"], default_values_t = DEFAULT_FOV)]
    pub fov: Vec<usize>,

    /// Input size override (z y x), defaults to the field of view
    #[arg(long, num_args = 3, value_names = ["Z", "Y", "X"])]
    pub inputsz: Option<Vec<usize>>,

    /// Output size override (z y x), defaults to the field of view
    #[arg(long, num_args = 3, value_names = ["Z", "Y", "X"])]
    pub outputsz: Option<Vec<usize>>,

    /// Embedding dimensionality (0 disables)
    #[arg(long = "vec", default_value_t = 0)]
    pub embedding: usize,

    /// Convert embeddings to affinity while scanning
    #[arg(long)]
    pub vec2aff: bool,

    /// Affinity channel count (0 disables)
    #[arg(long = "aff", default_value_t = 0)]
    pub affinity: usize,

    /// Synapse detection
    #[arg(long = "psd")]
    pub synapse: bool,

    /// Mitochondria detection
    #[arg(long = "mit")]
    pub mitochondria: bool,

    /// Scan overlap (z y x): fractions in (0, 1) or voxel counts
    #[arg(long, num_args = 3, value_names = ["Z", "Y", "X"], default_values_t = DEFAULT_OVERLAP, allow_negative_numbers = true)]
    pub overlap: Vec<f64>,

    /// Blending mode for tiled inference
    #[arg(long, value_enum, default_value_t = Blend::Bump)]
    pub blend: Blend,

    /// Experiment name, reports the experiment directory layout
    #[arg(long)]
    pub exp_name: Option<String>,
}

impl GeometryArgs {
    /// Build the geometry configuration described by these arguments
    ///
    /// # Errors
    ///
    /// Returns an error if a triple does not have exactly three components.
    pub fn to_config(&self) -> anyhow::Result<GeometryConfig> {
        Ok(GeometryConfig {
            fov: triple("--fov", &self.fov)?,
            input_size: self
                .inputsz
                .as_deref()
                .map(|v| triple("--inputsz", v))
                .transpose()?,
            output_size: self
                .outputsz
                .as_deref()
                .map(|v| triple("--outputsz", v))
                .transpose()?,
            tasks: TaskSpec {
                embedding: self.embedding,
                embedding_to_affinity: self.vec2aff,
                affinity: self.affinity,
                synapse: self.synapse,
                mitochondria: self.mitochondria,
            },
            overlap: triple("--overlap", &self.overlap)?,
            blend: self.blend,
        })
    }
}

fn triple<T: Copy>(flag: &str, values: &[T]) -> anyhow::Result<[T; 3]> {
    match values {
        [z, y, x] => Ok([*z, *y, *x]),
        _ => anyhow::bail!("{flag} takes exactly 3 values, got {}", values.len()),
    }
}

/// Directory layout of a named experiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentLayout {
    pub exp_dir: PathBuf,
    pub model_dir: PathBuf,
    pub fwd_dir: PathBuf,
}

impl ExperimentLayout {
    /// `experiments/<name>`, unless `name` is already rooted there
    #[must_use]
    pub fn new(name: &str) -> Self {
        let exp_dir = if Path::new(name).starts_with(EXPERIMENTS_DIR) {
            PathBuf::from(name)
        } else {
            Path::new(EXPERIMENTS_DIR).join(name)
        };
        Self {
            model_dir: exp_dir.join("models"),
            fwd_dir: exp_dir.join("forward"),
            exp_dir,
        }
    }
}

/// Execute geometry command
///
/// # Errors
///
/// Returns an error if the arguments do not describe a valid geometry.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: GeometryArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = args.to_config()?;
    if verbose {
        eprintln!("Tasks: {:?}", config.tasks);
    }

    let spec = config.resolve()?;
    let layout = args.exp_name.as_deref().map(ExperimentLayout::new);

    match format {
        OutputFormat::Text => print_text(&spec, layout.as_ref()),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "geometry": spec,
                "experiment": layout,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => print_tsv(&spec),
    }

    Ok(())
}

fn print_text(spec: &GeometrySpec, layout: Option<&ExperimentLayout>) {
    println!(
        "Field of view: ({}, {}, {})",
        spec.fov[0], spec.fov[1], spec.fov[2]
    );
    println!("Input: {}", spec.input);

    println!("\nTraining outputs:");
    for (task, shape) in &spec.outputs {
        println!("  {:<14} {shape}", task.to_string());
    }

    println!("\nScan outputs:");
    for (task, shape) in &spec.scan_outputs {
        println!("  {:<14} {shape}", task.to_string());
    }

    let [z, y, x] = &spec.scan_params.stride;
    println!("\nStride: ({z}, {y}, {x})");
    println!("Blend: {}", spec.scan_params.blend);

    if let Some(layout) = layout {
        println!("\nExperiment: {}", layout.exp_dir.display());
        println!("  models:  {}", layout.model_dir.display());
        println!("  forward: {}", layout.fwd_dir.display());
    }
}

fn print_tsv(spec: &GeometrySpec) {
    println!("tensor\tphase\tchannels\tz\ty\tx");
    let [c, z, y, x] = spec.input.dims();
    println!("input\ttrain\t{c}\t{z}\t{y}\t{x}");
    for (phase, outputs) in [("train", &spec.outputs), ("scan", &spec.scan_outputs)] {
        for (task, shape) in outputs {
            let [c, z, y, x] = shape.dims();
            println!("{task}\t{phase}\t{c}\t{z}\t{y}\t{x}");
        }
    }
    let [z, y, x] = &spec.scan_params.stride;
    println!("stride\tscan\t\t{z}\t{y}\t{x}");
}
