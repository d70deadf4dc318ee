//! Masking job files.
//!
//! A job file pairs the table layout with the run configuration:
//!
//! ```yaml
//! table:
//!   name: employees
//!   columns:
//!     - name: id
//!       class: int
//!       length: 8
//!     - name: salary
//!       class: decimal
//!       precision: 10
//!       scale: 2
//! salt: "run-secret"
//! transformers:
//!   - transformer: noise_numeric
//!     column: salary
//!     engine: deterministic
//! ```

pub mod duration;

pub use duration::parse_duration;

use anyhow::Context;
use mask_core::{MaskingConfig, TableMeta, TransformerConfig};
use serde::Deserialize;
use std::path::Path;

/// Table layout plus the transformers to run over it.
#[derive(Debug, Clone, Deserialize)]
pub struct MaskingJob {
    pub table: TableMeta,

    #[serde(flatten)]
    pub masking: MaskingConfig,
}

impl MaskingJob {
    /// Parse a job from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let job: MaskingJob = serde_yaml::from_str(yaml).context("Failed to parse masking job")?;
        Ok(Self {
            // Row positions follow declaration order
            table: TableMeta::new(job.table.name, job.table.columns),
            masking: job.masking,
        })
    }

    pub fn transformers(&self) -> &[TransformerConfig] {
        &self.masking.transformers
    }
}

/// Load a masking job file.
pub fn load_job(path: impl AsRef<Path>) -> anyhow::Result<MaskingJob> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read masking job {}", path.display()))?;
    MaskingJob::from_yaml(&content)
        .with_context(|| format!("Invalid masking job {}", path.display()))
}

/// Load a masking configuration file.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<MaskingConfig> {
    let path = path.as_ref();
    MaskingConfig::from_file(path)
        .with_context(|| format!("Failed to load masking config {}", path.display()))
}

/// Load table metadata from a YAML file.
pub fn load_table(path: impl AsRef<Path>) -> anyhow::Result<TableMeta> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read table metadata {}", path.display()))?;
    TableMeta::from_yaml(&content)
        .with_context(|| format!("Invalid table metadata {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mask_core::{ColumnClass, TransformerKind};

    const JOB: &str = r#"
table:
  name: employees
  columns:
    - name: id
      class: int
      length: 8
    - name: salary
      class: decimal
      precision: 10
      scale: 2
salt: "run-secret"
transformers:
  - transformer: noise_numeric
    column: salary
    engine: deterministic
"#;

    #[test]
    fn test_job_from_yaml_assigns_positions() {
        let job = MaskingJob::from_yaml(JOB).unwrap();
        let salary = job.table.column_by_name("salary").unwrap();
        assert_eq!(salary.idx, 1);
        assert_eq!(salary.class, ColumnClass::Decimal);
        assert_eq!(job.masking.salt_bytes(), b"run-secret");
        assert_eq!(job.transformers()[0].transformer, TransformerKind::NoiseNumeric);
    }

    #[test]
    fn test_job_errors_carry_context() {
        let err = MaskingJob::from_yaml("table: [").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse masking job"));

        let err = load_job("/nonexistent/job.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/job.yaml"));
    }
}
