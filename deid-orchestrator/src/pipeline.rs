use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use deid_common::{AppError, OutputPathManager};
use masking_engine::MaskingEngineConfig;
use phi_identifier::StructuredLlmClient;
use phi_retrieval::RegulationRetriever;
use phi_tools::Tool;
use phi_types::{PHIEntity, TypeRegistry};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregates::RunAggregates;
use crate::context::FileContext;
use crate::job::{Job, TaskState};
use crate::loader::DocumentLoader;
use crate::stages::{self, StageDeps};
use crate::state::ready;

/// Static, per-run configuration: identical for every file in a job.
pub struct FileProcessorConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub checkpoint_dir: Option<PathBuf>,
    pub checkpoint_interval: usize,
    pub max_concurrency: usize,
    pub enable_rag: bool,
    pub enable_tools: bool,
    pub context_sample_chars: usize,
    pub default_chars_per_sec: f64,
}

impl Default for FileProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
            checkpoint_dir: None,
            checkpoint_interval: 1,
            max_concurrency: 1,
            enable_rag: true,
            enable_tools: true,
            context_sample_chars: 500,
            default_chars_per_sec: 500.0,
        }
    }
}

/// Outcome of a single file's pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileReport {
    pub entities: Vec<PHIEntity>,
    pub masked_text: String,
    pub processing_time_ms: f64,
}

/// Drives one file through the `Ready -> Loaded -> Streamed -> Merged ->
/// Masked -> Persisted` pipeline, wiring the tool scanners (C2), the
/// regulation retriever (C3), the identifier (C4), the chunk processor
/// (C5) and the masking engine (C6) together.
pub struct FileProcessor {
    config: FileProcessorConfig,
    loader: Arc<dyn DocumentLoader>,
    registry: Arc<TypeRegistry>,
    llm_client: Arc<dyn StructuredLlmClient>,
    retriever: Arc<dyn RegulationRetriever>,
    tools: Arc<Vec<Arc<dyn Tool>>>,
    masking_config: MaskingEngineConfig,
    output_paths: OutputPathManager,
}

impl FileProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: FileProcessorConfig,
        loader: Arc<dyn DocumentLoader>,
        registry: Arc<TypeRegistry>,
        llm_client: Arc<dyn StructuredLlmClient>,
        retriever: Arc<dyn RegulationRetriever>,
        tools: Vec<Arc<dyn Tool>>,
        masking_config: MaskingEngineConfig,
        output_paths: OutputPathManager,
    ) -> Self {
        Self {
            config,
            loader,
            registry,
            llm_client,
            retriever,
            tools: Arc::new(tools),
            masking_config,
            output_paths,
        }
    }

    fn stage_deps(&self) -> StageDeps {
        StageDeps {
            loader: Arc::clone(&self.loader),
            registry: Arc::clone(&self.registry),
            llm_client: Arc::clone(&self.llm_client),
            retriever: Arc::clone(&self.retriever),
            tools: Arc::clone(&self.tools),
            masking_config: self.masking_config.clone(),
            chunk_size: self.config.chunk_size,
            chunk_overlap: self.config.chunk_overlap,
            checkpoint_dir: self.config.checkpoint_dir.clone(),
            checkpoint_interval: self.config.checkpoint_interval,
            max_concurrency: self.config.max_concurrency,
            enable_rag: self.config.enable_rag,
            enable_tools: self.config.enable_tools,
            context_sample_chars: self.config.context_sample_chars,
        }
    }

    pub async fn process_file(&self, path: &Path, resume: bool) -> Result<FileReport, AppError> {
        let started = Instant::now();
        let deps = self.stage_deps();
        let mut ctx = FileContext::new(path.to_path_buf(), resume, self.config.default_chars_per_sec);

        let machine = ready();
        let machine = stages::load(machine, &mut ctx, &deps).await.map_err(|e| ctx.abort(e))?;
        let machine = stages::stream(machine, &mut ctx, &deps).await.map_err(|e| ctx.abort(e))?;
        let machine = stages::merge(machine, &mut ctx).map_err(|e| ctx.abort(e))?;
        let machine = stages::mask(machine, &mut ctx, &deps).map_err(|e| ctx.abort(e))?;
        let _machine = stages::persist(machine, &mut ctx, &self.output_paths)
            .await
            .map_err(|e| ctx.abort(e))?;

        let report = FileReport {
            entities: ctx.entities.unwrap_or_default(),
            masked_text: ctx.masking_report.map(|r| r.masked_text).unwrap_or_default(),
            processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        info!(
            file = %path.display(),
            entities = report.entities.len(),
            ms = report.processing_time_ms,
            "file de-identification complete"
        );

        Ok(report)
    }

    /// Runs every non-terminal task of `job` to completion, persisting `job`
    /// to `job_path` after each task so a crash mid-run leaves behind an
    /// accurate record of what's left to resume. A failed file never halts
    /// the job: it's recorded on its task and the run continues.
    pub async fn run_job(&self, job: &mut Job, job_path: &Path) -> Result<RunAggregates, AppError> {
        let mut aggregates = RunAggregates::default();

        for task in job.tasks.iter_mut() {
            if task.state.is_terminal() {
                if task.state == TaskState::Completed {
                    aggregates.files_processed += 1;
                } else {
                    aggregates.files_failed += 1;
                }
                continue;
            }

            task.mark_processing();
            job.save(job_path)?;

            match self.process_file(&task.file_path, self.config.checkpoint_dir.is_some()).await {
                Ok(report) => {
                    aggregates.record_success(&report);
                    task.mark_completed();
                }
                Err(err) => {
                    aggregates.record_failure();
                    task.mark_failed(err.to_string());
                }
            }
            job.save(job_path)?;
        }

        Ok(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use phi_identifier::PHIDetectionResponse;
    use phi_retrieval::NullRetriever;
    use phi_tools::Tool;

    struct FixedLoader(String);

    #[async_trait]
    impl DocumentLoader for FixedLoader {
        async fn load(&self, _path: &Path) -> Result<String, AppError> {
            Ok(self.0.clone())
        }
    }

    struct FailingLoader;

    #[async_trait]
    impl DocumentLoader for FailingLoader {
        async fn load(&self, path: &Path) -> Result<String, AppError> {
            Err(AppError::Loader(format!("no such file: {}", path.display())))
        }
    }

    struct StubLlmClient(PHIDetectionResponse);

    #[async_trait]
    impl StructuredLlmClient for StubLlmClient {
        async fn invoke_structured(&self, _system: &str, _user: &str) -> Result<PHIDetectionResponse, AppError> {
            Ok(self.0.clone())
        }
    }

    fn raw_entity(text: &str, phi_type: &str, start: i64, end: i64) -> phi_identifier::PHIIdentificationResult {
        phi_identifier::PHIIdentificationResult {
            entity_text: text.to_string(),
            phi_type: phi_type.to_string(),
            custom_type_name: None,
            custom_type_description: None,
            start_position: start,
            end_position: end,
            confidence: 0.95,
            reason: "mentions a patient by name".to_string(),
            regulation_source: None,
            masking_action: None,
        }
    }

    fn test_processor(loader: Arc<dyn DocumentLoader>, llm_client: Arc<dyn StructuredLlmClient>, output_dir: &Path) -> FileProcessor {
        FileProcessor::new(
            FileProcessorConfig {
                chunk_size: 1000,
                chunk_overlap: 0,
                enable_rag: false,
                enable_tools: false,
                ..FileProcessorConfig::default()
            },
            loader,
            Arc::new(TypeRegistry::new()),
            llm_client,
            Arc::new(NullRetriever),
            Vec::<Arc<dyn Tool>>::new(),
            MaskingEngineConfig::default(),
            OutputPathManager::new(output_dir.to_path_buf()),
        )
    }

    #[tokio::test]
    async fn process_file_drives_every_stage_and_masks_the_entity() {
        let dir = tempfile::tempdir().unwrap();
        let text = "Patient John Doe was admitted.".to_string();
        let entity_start = text.find("John Doe").unwrap() as i64;
        let entity_end = entity_start + "John Doe".len() as i64;

        let response = PHIDetectionResponse {
            entities: vec![raw_entity("John Doe", "NAME", entity_start, entity_end)],
            total_entities: 1,
            has_phi: true,
        };

        let processor = test_processor(
            Arc::new(FixedLoader(text.clone())),
            Arc::new(StubLlmClient(response)),
            dir.path(),
        );

        let report = processor.process_file(Path::new("note.txt"), false).await.unwrap();

        assert_eq!(report.entities.len(), 1);
        assert_eq!(report.entities[0].text, "John Doe");
        assert!(!report.masked_text.contains("John Doe"));
    }

    #[tokio::test]
    async fn run_job_continues_past_a_failed_file_and_reports_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let response = PHIDetectionResponse {
            entities: Vec::new(),
            total_entities: 0,
            has_phi: false,
        };

        let processor = test_processor(Arc::new(FailingLoader), Arc::new(StubLlmClient(response)), dir.path());

        let mut job = Job::new(vec![PathBuf::from("missing.txt")]);
        let job_path = dir.path().join("job.json");

        let aggregates = processor.run_job(&mut job, &job_path).await.unwrap();

        assert_eq!(aggregates.files_failed, 1);
        assert_eq!(aggregates.files_processed, 0);
        assert_eq!(job.exit_code(), 1);
        assert!(job.tasks[0].error.is_some());
    }
}
