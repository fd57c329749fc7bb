use contagion_core::{CountColumns, Graph, Trace};
use contagion_sampler::RunConfig;
use arrow::array::{Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::{Serialize, Deserialize};
use std::fs::File;
use std::sync::Arc;
use uuid::Uuid;

pub mod cli;
pub mod graph_file;
pub mod report;

pub use cli::*;
pub use graph_file::GraphFile;

/// Run manifest for complete reproducibility
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub timestamp: String,
    pub seed: u64,
    pub action: String,       // "cascade" | "covid"
    pub initiators: Vec<String>,
    pub model_params: serde_json::Value,
    pub max_steps: Option<usize>,
    pub repetitions: usize,
    pub n_nodes: usize,
    pub n_edges: usize,
    pub commit_hash: Option<String>,
    pub rust_version: String,
}

/// Parquet table of per-step counts:
/// (run_id, repetition, step, <one column per count>)
pub struct ParquetWriter {
    writer: ArrowWriter<File>,
    schema: Arc<Schema>,
    columns: &'static [&'static str],
}

impl RunManifest {
    /// `config.seed` must already be resolved; unseeded runs cannot be replayed.
    pub fn new(config: &RunConfig, seed: u64, repetitions: usize, graph: &Graph) -> anyhow::Result<Self> {
        Ok(Self {
            run_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            seed,
            action: config.model.action().as_str().to_string(),
            initiators: config.initiators.clone(),
            model_params: serde_json::to_value(&config.model)?,
            max_steps: config.max_steps,
            repetitions,
            n_nodes: graph.num_nodes(),
            n_edges: graph.num_edges(),
            commit_hash: get_git_commit(),
            rust_version: get_rust_version(),
        })
    }

    pub fn save_to_file(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let manifest = serde_json::from_str(&json)?;
        Ok(manifest)
    }
}

impl ParquetWriter {
    pub fn new<C: CountColumns>(file_path: &str) -> anyhow::Result<Self> {
        let file = File::create(file_path)?;
        let columns = C::column_names();

        let mut fields = vec![
            Field::new("run_id", DataType::Utf8, false),
            Field::new("repetition", DataType::UInt64, false),
            Field::new("step", DataType::UInt64, false),
        ];
        for name in columns {
            fields.push(Field::new(*name, DataType::UInt64, false));
        }

        let schema = Arc::new(Schema::new(fields));
        let writer = ArrowWriter::try_new(file, schema.clone(), None)?;

        Ok(Self { writer, schema, columns })
    }

    pub fn write_traces<C: CountColumns>(
        &mut self,
        traces: &[Trace<C>],
        manifest: &RunManifest,
    ) -> anyhow::Result<()> {
        let n_rows: usize = traces.iter().map(Trace::len).sum();
        if n_rows == 0 {
            return Ok(());
        }

        let mut repetitions = Vec::with_capacity(n_rows);
        let mut steps = Vec::with_capacity(n_rows);
        let mut values: Vec<Vec<u64>> = vec![Vec::with_capacity(n_rows); self.columns.len()];

        for (repetition, trace) in traces.iter().enumerate() {
            for (step, counts) in trace.iter() {
                repetitions.push(repetition as u64);
                steps.push(step as u64);
                for (column, v) in values.iter_mut().zip(counts.values()) {
                    column.push(v);
                }
            }
        }

        let mut arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec![manifest.run_id.clone(); n_rows])),
            Arc::new(UInt64Array::from(repetitions)),
            Arc::new(UInt64Array::from(steps)),
        ];
        for column in values {
            arrays.push(Arc::new(UInt64Array::from(column)));
        }

        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.writer.write(&batch)?;
        Ok(())
    }

    pub fn close(self) -> anyhow::Result<()> {
        self.writer.close()?;
        Ok(())
    }
}

/// Write traces to Parquet with manifest
pub fn write_traces_with_manifest<C: CountColumns>(
    traces: &[Trace<C>],
    manifest: &RunManifest,
    parquet_path: &str,
    manifest_path: &str,
) -> anyhow::Result<()> {
    let mut writer = ParquetWriter::new::<C>(parquet_path)?;
    writer.write_traces(traces, manifest)?;
    writer.close()?;

    manifest.save_to_file(manifest_path)?;

    println!("Wrote {} trace(s) to {}", traces.len(), parquet_path);
    println!("Wrote manifest to {}", manifest_path);

    Ok(())
}

/// Get git commit hash for reproducibility
fn get_git_commit() -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
}

fn get_rust_version() -> String {
    std::process::Command::new("rustc")
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_models::{CascadeCounts, SirsParams};
    use contagion_sampler::ModelConfig;

    #[test]
    fn test_manifest_records_config() {
        let graph = Graph::cycle(4).unwrap();
        let config = RunConfig::new(
            vec!["0".into()],
            ModelConfig::Covid(SirsParams::new(0.2, 30, 0.1, 0.0)),
        )
        .with_seed(9);
        let manifest = RunManifest::new(&config, 9, 3, &graph).unwrap();

        assert_eq!(manifest.action, "covid");
        assert_eq!(manifest.seed, 9);
        assert_eq!(manifest.n_edges, 4);
        assert_eq!(manifest.model_params["lifespan"], 30);
        assert_eq!(manifest.model_params["action"], "covid");
    }

    #[test]
    fn test_writes_parquet_and_manifest() {
        let graph = Graph::cycle(3).unwrap();
        let config = RunConfig::new(vec!["0".into()], ModelConfig::Cascade { threshold: 0.5 });
        let manifest = RunManifest::new(&config, 1, 1, &graph).unwrap();

        let mut trace = Trace::new();
        trace.push(0, CascadeCounts { active: 1, inactive: 2 });
        trace.push(1, CascadeCounts { active: 2, inactive: 1 });

        let dir = std::env::temp_dir().join(format!("contagion-io-{}", manifest.run_id));
        std::fs::create_dir_all(&dir).unwrap();
        let parquet_path = dir.join("trace.parquet");
        let manifest_path = dir.join("trace.manifest.json");

        write_traces_with_manifest(
            &[trace],
            &manifest,
            parquet_path.to_str().unwrap(),
            manifest_path.to_str().unwrap(),
        )
        .unwrap();

        assert!(std::fs::metadata(&parquet_path).unwrap().len() > 0);
        let loaded = RunManifest::load_from_file(manifest_path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.run_id, manifest.run_id);

        std::fs::remove_dir_all(&dir).ok();
    }
}
