use crate::config::IngestConfig;
use crate::core::orchestrator::{Gate, PipelineOrchestrator, RetryPolicy};
use crate::core::stages::{CommandStage, IngestStage};
use crate::domain::ports::{Fetcher, ObjectStore};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Declarative pipeline: gate, retry policy and ordered stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub gate: Gate,
    #[serde(default)]
    pub retry: RetryPolicy,
    pub ingest: Option<IngestConfig>,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: StageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
    Ingest,
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        working_dir: Option<PathBuf>,
    },
}

impl PipelineFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the variable's value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn has_ingest_stage(&self) -> bool {
        self.stages.iter().any(|s| s.kind == StageKind::Ingest)
    }

    /// Turns the description into an executable orchestrator. `ingest` supplies
    /// the store and fetcher for in-process ingestion stages.
    pub fn build<S, F>(&self, ingest: Option<(S, F)>) -> Result<PipelineOrchestrator>
    where
        S: ObjectStore + Clone + 'static,
        F: Fetcher + Clone + 'static,
    {
        let mut orchestrator =
            PipelineOrchestrator::new(self.pipeline.name.clone(), self.gate.clone(), self.retry);

        for stage in &self.stages {
            match &stage.kind {
                StageKind::Ingest => {
                    let config = self.ingest.as_ref().ok_or_else(|| EtlError::MissingConfigError {
                        field: "ingest".to_string(),
                    })?;
                    let (store, fetcher) = ingest.clone().ok_or_else(|| EtlError::ConfigError {
                        message: format!("Stage {} needs an object store", stage.name),
                    })?;
                    orchestrator.add_stage(Box::new(IngestStage::new(
                        stage.name.clone(),
                        config.engine(store, fetcher),
                    )));
                }
                StageKind::Command {
                    program,
                    args,
                    working_dir,
                } => {
                    let mut command = CommandStage::new(stage.name.clone(), program.clone(), args.clone());
                    if let Some(dir) = working_dir {
                        command = command.with_working_dir(dir.clone());
                    }
                    orchestrator.add_stage(Box::new(command));
                }
            }
        }

        Ok(orchestrator)
    }
}

impl Validate for PipelineFile {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        self.gate.validate()?;

        if self.stages.is_empty() {
            return Err(EtlError::ConfigError {
                message: "Pipeline must declare at least one stage".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            validation::validate_non_empty_string("stages.name", &stage.name)?;
            if !seen.insert(stage.name.as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "stages.name".to_string(),
                    value: stage.name.clone(),
                    reason: "Stage names must be unique".to_string(),
                });
            }
            if let StageKind::Command { program, .. } = &stage.kind {
                validation::validate_non_empty_string("stages.program", program)?;
            }
        }

        if self.has_ingest_stage() {
            validation::validate_required_field("ingest", &self.ingest)?.validate()?;
        }

        Ok(())
    }
}
