mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use clap::Parser;
use deid_common::{get_config, OutputPathManager};
use deid_orchestrator::{FileProcessor, FileProcessorConfig, Job, PlainTextLoader};
use masking_engine::MaskingEngineConfig;
use phi_identifier::OpenAiStructuredLlmClient;
use phi_retrieval::NullRetriever;
use phi_tools::{IdValidatorTool, PhoneTool, RegexTool, Tool};
use phi_types::TypeRegistry;
use tracing::{error, info};

use cli::{Cli, Command, ProcessArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    deid_common::logging::init_logging();

    let cli = Cli::parse();
    let Command::Process(args) = cli.command;

    let exit_code = run_process(args).await?;
    std::process::exit(exit_code);
}

async fn run_process(args: ProcessArgs) -> anyhow::Result<i32> {
    let config = get_config().context("loading configuration")?;

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let checkpoint_dir = if args.resume || config.checkpoint_interval > 0 {
        Some(args.checkpoint_dir.unwrap_or_else(|| PathBuf::from(&config.checkpoint_dir)))
    } else {
        None
    };
    let model = args.model.unwrap_or_else(|| config.model.clone());
    let enable_rag = !args.no_rag && config.enable_rag;
    let enable_tools = !args.no_tools && config.enable_tools;

    let processor_config = FileProcessorConfig {
        chunk_size: args.chunk_size.unwrap_or(config.chunk_size),
        chunk_overlap: args.chunk_overlap.unwrap_or(config.chunk_overlap),
        checkpoint_dir: checkpoint_dir.clone(),
        checkpoint_interval: config.checkpoint_interval,
        max_concurrency: config.max_concurrency_per_file,
        enable_rag,
        enable_tools,
        ..FileProcessorConfig::default()
    };

    let registry = Arc::new(TypeRegistry::new());
    let loader = Arc::new(PlainTextLoader);
    let openai_client = async_openai::Client::with_config(
        OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    );
    let llm_client = Arc::new(OpenAiStructuredLlmClient::new(openai_client, model));
    let retriever = Arc::new(NullRetriever);
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(RegexTool::new()),
        Arc::new(IdValidatorTool::new(true)),
        Arc::new(PhoneTool::new()),
    ];
    let output_paths = OutputPathManager::new(output_dir.clone());

    let processor = FileProcessor::new(
        processor_config,
        loader,
        registry,
        llm_client,
        retriever,
        tools,
        MaskingEngineConfig::default(),
        output_paths,
    );

    let job_path = checkpoint_dir
        .clone()
        .unwrap_or_else(|| output_dir.clone())
        .join("job.json");

    let mut job = if args.resume {
        Job::load(&job_path)
            .context("loading job checkpoint")?
            .unwrap_or_else(|| Job::new(args.paths.clone()))
    } else {
        Job::new(args.paths.clone())
    };

    info!(files = job.tasks.len(), "starting de-identification run");
    let aggregates = processor.run_job(&mut job, &job_path).await?;

    for task in &job.tasks {
        match task.state {
            deid_orchestrator::TaskState::Completed => {
                println!("{}: ok", task.file_path.display());
            }
            deid_orchestrator::TaskState::Failed => {
                println!(
                    "{}: failed ({})",
                    task.file_path.display(),
                    task.error.as_deref().unwrap_or("unknown error")
                );
            }
            _ => {
                println!("{}: incomplete", task.file_path.display());
            }
        }
    }

    let report_path = output_dir.join("run_report.json");
    deid_common::io::write_json_atomic(&report_path, &aggregates).context("writing run report")?;

    info!(
        processed = aggregates.files_processed,
        failed = aggregates.files_failed,
        phi_found = aggregates.phi_found,
        "de-identification run complete"
    );
    if aggregates.files_failed > 0 {
        error!(failed = aggregates.files_failed, "one or more files failed during this run");
    }

    Ok(job.exit_code())
}
