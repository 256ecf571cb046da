//! Configuration and snapshot in, artifacts on disk out.

use std::path::PathBuf;

use hostbridge_codegen::{Artifacts, CheckReport, GeneratorOptions, WriteReport, generate};
use hostbridge_core::{BindingModel, GenerationErrors};
use hostbridge_registry::{ExposureConfig, ReflectionSnapshot, resolve};
use thiserror::Error;
use tracing::{info, warn};

const LOG_TARGET: &str = "hostbridge::pipeline";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generation failed:\n{0}")]
    Generation(#[from] GenerationErrors),

    #[error("{} artifact(s) out of date: {}", .0.len(), display_paths(.0))]
    Stale(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

/// What a pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Written(WriteReport),
    UpToDate(CheckReport),
}

/// One generation run: where inputs come from and where artifacts go.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub config: PathBuf,
    pub snapshot: PathBuf,
    pub out_dir: PathBuf,
    pub options: GeneratorOptions,
}

impl Pipeline {
    pub fn new(config: impl Into<PathBuf>, snapshot: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            snapshot: snapshot.into(),
            out_dir: out_dir.into(),
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Load both inputs and resolve them into a binding model.
    pub fn load_model(&self) -> Result<BindingModel, GenerationErrors> {
        let config = ExposureConfig::load(&self.config)?;
        let snapshot = ReflectionSnapshot::load(&self.snapshot)?;
        info!(
            target: LOG_TARGET,
            config = %self.config.display(),
            snapshot = %self.snapshot.display(),
            exposed = config.types.len(),
            reflected = snapshot.types.len(),
            "inputs loaded"
        );
        resolve(&config, &snapshot)
    }

    /// Resolve and emit, without touching the output directory.
    pub fn artifacts(&self) -> Result<Artifacts, GenerationErrors> {
        let model = self.load_model()?;
        generate(&model, &self.options)
    }

    /// Generate and commit the artifacts.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let artifacts = self.artifacts()?;
        let report = artifacts.write_to(&self.out_dir).map_err(GenerationErrors::from)?;
        info!(
            target: LOG_TARGET,
            out_dir = %self.out_dir.display(),
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            "artifacts committed"
        );
        Ok(PipelineOutcome::Written(report))
    }

    /// Generate and compare against the output directory without writing.
    pub fn check(&self) -> Result<PipelineOutcome, PipelineError> {
        let artifacts = self.artifacts()?;
        let report = artifacts.check(&self.out_dir);
        if report.is_up_to_date() {
            return Ok(PipelineOutcome::UpToDate(report));
        }
        for path in &report.stale {
            warn!(target: LOG_TARGET, path = %path.display(), "artifact out of date");
        }
        Err(PipelineError::Stale(report.stale))
    }
}

/// Generate from in-memory inputs, as build scripts and tests do.
pub fn generate_from_str(
    config: &str,
    snapshot: &str,
    options: &GeneratorOptions,
) -> Result<Artifacts, GenerationErrors> {
    let config = ExposureConfig::from_toml_str(config)?;
    let snapshot = ReflectionSnapshot::from_json_str(snapshot)?;
    let model = resolve(&config, &snapshot)?;
    generate(&model, options)
}

