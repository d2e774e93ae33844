//! Pipeline command handlers
//!
//! Handles validating pipeline documents, showing them normalized, and
//! launching runs from them.

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use colored::*;
use lattice_core::domain::pipeline::Pipeline;
use lattice_core::dto::run::RunRequest;
use lattice_flow::{
    Edge, PipelineGraph, ResolvedProjects, RunRequestBuilder, Selection, Severity, StepStatus,
    ValidationReport, fetch_projects, parse_pipeline_file, render_pipeline, validate,
};
use std::path::Path;

use crate::commands::run::print_run_details;
use crate::config::Config;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Check bindings and types of a pipeline document
    Validate {
        /// Path to the pipeline document (flow.yaml)
        file: String,

        /// Also print the step flow diagram
        #[arg(long)]
        diagram: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a pipeline and launch a run on the engine
    Run {
        /// Path to the pipeline document (flow.yaml)
        file: String,

        /// Pipeline input value as name=value (name may be written inputs.name)
        #[arg(long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,

        /// Step parameter override as step.param=value
        #[arg(long = "param", value_parser = parse_key_val)]
        param: Vec<(String, String)>,

        /// Stored file ID to feed the pipeline's record-list input
        #[arg(long = "file-id", conflicts_with = "set")]
        file_id: Vec<i64>,

        /// Record URL to feed the pipeline's record-list input; wins over --file-id
        #[arg(long = "url", conflicts_with = "set")]
        url: Vec<String>,

        /// Dataset the selected records belong to
        #[arg(long = "dataset-name", conflicts_with = "set")]
        dataset_name: Option<String>,

        /// Participant ID to narrow the selection
        #[arg(long = "participant-id", conflicts_with = "set")]
        participant_id: Vec<i64>,

        /// Output directory; the engine allocates one when omitted
        #[arg(long)]
        results_dir: Option<String>,

        /// Print the request instead of launching it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the normalized document and its flow diagram
    Show {
        /// Path to the pipeline document (flow.yaml)
        file: String,
    },
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    if key.trim().is_empty() {
        bail!("invalid KEY=value: empty key in `{}`", s);
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    match command {
        PipelineCommands::Validate {
            file,
            diagram,
            json,
        } => validate_pipeline(config, &file, diagram, json).await,
        PipelineCommands::Run {
            file,
            set,
            param,
            file_id,
            url,
            dataset_name,
            participant_id,
            results_dir,
            dry_run,
        } => {
            let options = RunOptions {
                set,
                param,
                selection: SelectionOptions {
                    file_ids: file_id,
                    urls: url,
                    dataset_name,
                    participant_ids: participant_id,
                },
                results_dir,
                dry_run,
            };
            run_pipeline(config, &file, options).await
        }
        PipelineCommands::Show { file } => show_pipeline(&file),
    }
}

struct RunOptions {
    set: Vec<(String, String)>,
    param: Vec<(String, String)>,
    selection: SelectionOptions,
    results_dir: Option<String>,
    dry_run: bool,
}

#[derive(Default)]
struct SelectionOptions {
    file_ids: Vec<i64>,
    urls: Vec<String>,
    dataset_name: Option<String>,
    participant_ids: Vec<i64>,
}

impl SelectionOptions {
    fn is_requested(&self) -> bool {
        !self.file_ids.is_empty() || !self.urls.is_empty()
    }
}

fn load_pipeline(path: &str) -> Result<Pipeline> {
    parse_pipeline_file(Path::new(path))
        .with_context(|| format!("Failed to load pipeline document: {}", path))
}

/// Fetch the descriptors of every step and validate
async fn check(
    config: &Config,
    pipeline: &Pipeline,
) -> Result<(ResolvedProjects, ValidationReport)> {
    let provider = config.project_provider()?;
    let projects = fetch_projects(provider, pipeline).await;
    tracing::debug!(
        "Resolved {} step project(s), {} unavailable",
        projects.len(),
        projects.failures()
    );
    let report = validate(pipeline, &projects);
    Ok((projects, report))
}

async fn validate_pipeline(config: &Config, path: &str, diagram: bool, json: bool) -> Result<()> {
    let pipeline = load_pipeline(path)?;
    let (projects, report) = check(config, &pipeline).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_report(&report);
        if diagram {
            println!();
            println!("{}", "Flow:".bold());
            print!("{}", PipelineGraph::new(&pipeline, &projects).diagram());
        }
    }

    if !report.is_valid() {
        bail!(
            "Pipeline '{}' is invalid: {} error(s)",
            pipeline.name,
            report.errors().len()
        );
    }

    Ok(())
}

async fn run_pipeline(config: &Config, path: &str, options: RunOptions) -> Result<()> {
    let pipeline = load_pipeline(path)?;
    let (_, report) = check(config, &pipeline).await?;

    if !report.is_valid() {
        print_report(&report);
        bail!("Refusing to run invalid pipeline '{}'", pipeline.name);
    }
    for warning in report.warnings() {
        tracing::warn!("{}", warning);
    }

    let request = build_request(&pipeline, options.set, options.selection)?
        .parameters(options.param);
    let request = match options.results_dir {
        Some(dir) => request.results_dir(dir),
        None => request,
    }
    .build();

    if options.dry_run {
        print_request(&request)?;
        return Ok(());
    }

    let client = config.engine_client();
    let run = client
        .launch_run(&request)
        .await
        .context("Failed to start run on the execution engine")?;

    println!("{}", "✓ Run launched successfully!".green().bold());
    print_run_details(&run);

    Ok(())
}

/// Pick the request mode from the options given
///
/// Any file id or URL switches to selection mode.
fn build_request(
    pipeline: &Pipeline,
    set: Vec<(String, String)>,
    options: SelectionOptions,
) -> Result<RunRequestBuilder> {
    if !options.is_requested() {
        if !options.participant_ids.is_empty() || options.dataset_name.is_some() {
            bail!("--participant-id and --dataset-name need --file-id or --url");
        }
        return Ok(RunRequestBuilder::with_overrides(pipeline, set));
    }

    let mut selection = Selection {
        file_ids: options.file_ids,
        urls: options.urls,
        ..Selection::default()
    }
    .with_participants(options.participant_ids);
    if let Some(name) = options.dataset_name {
        selection = selection.with_dataset(name);
    }
    RunRequestBuilder::with_selection(pipeline, selection)
        .with_context(|| format!("Cannot run pipeline '{}' on a data selection", pipeline.name))
}

fn show_pipeline(path: &str) -> Result<()> {
    let pipeline = load_pipeline(path)?;
    let document = render_pipeline(&pipeline).context("Failed to render pipeline")?;

    println!("{}", document);
    let projects = ResolvedProjects::default();
    let graph = PipelineGraph::new(&pipeline, &projects);
    println!("{}", "Flow:".bold());
    print!("{}", graph.diagram());

    let edges = graph.edges();
    if !edges.is_empty() {
        println!();
        println!("{}", "Dependencies:".bold());
        for edge in edges {
            println!("  {}", format_edge(&edge));
        }
    }

    Ok(())
}

fn format_edge(edge: &Edge) -> String {
    format!("{}.{} -> {}.{}", edge.from, edge.output, edge.to, edge.input)
}

/// Stdout carries only the JSON request; everything else goes to the log
fn print_request(request: &RunRequest) -> Result<()> {
    println!("{}", render_request(request)?);

    let args = request.set_args();
    if !args.is_empty() {
        tracing::info!("Engine arguments: {}", args.join(" "));
    }

    Ok(())
}

fn render_request(request: &RunRequest) -> Result<String> {
    serde_json::to_string_pretty(request).context("Failed to serialize run request")
}

fn print_report(report: &ValidationReport) {
    if report.is_valid() {
        println!(
            "{}",
            format!("✓ Pipeline '{}' is valid", report.pipeline).green().bold()
        );
    } else {
        println!(
            "{}",
            format!("✗ Pipeline '{}' is invalid", report.pipeline).red().bold()
        );
    }

    for step in report.steps() {
        let status = match step.status() {
            StepStatus::Ok => "ok".green(),
            StepStatus::Warning => "warning".yellow(),
            StepStatus::Error => "error".red(),
        };
        println!("  {} {} {}", step.step_id.bold(), step.uses.dimmed(), status);

        for issue in step.issues() {
            let marker = match issue.severity {
                Severity::Error => "✗".red(),
                Severity::Warning => "⚠".yellow(),
            };
            println!("    {} {}", marker, issue.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::domain::pipeline::PipelineInput;
    use lattice_core::domain::types::TypeDescriptor;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("inputs.samplesheet=/data/a=b.csv").unwrap(),
            ("inputs.samplesheet".to_string(), "/data/a=b.csv".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_build_request_picks_mode() {
        let pipeline = Pipeline::new("gwas")
            .with_input(
                "genotypes",
                PipelineInput::new(TypeDescriptor::parse("List[GenotypeRecord]")),
            )
            .with_input("label", PipelineInput::new(TypeDescriptor::parse("String")));

        let overrides = build_request(
            &pipeline,
            vec![("label".to_string(), "first".to_string())],
            SelectionOptions::default(),
        )
        .unwrap()
        .build();
        assert!(overrides.input_overrides().is_some());

        let by_id = SelectionOptions {
            file_ids: vec![4, 4, 2],
            participant_ids: vec![7],
            ..Default::default()
        };
        let selection = build_request(&pipeline, vec![], by_id).unwrap().build();
        assert_eq!(selection.selection().unwrap().file_ids, vec![4, 2]);

        let by_url = SelectionOptions {
            file_ids: vec![1],
            urls: vec!["syft://bob@example.org/g.txt".to_string()],
            dataset_name: Some("cohort".to_string()),
            ..Default::default()
        };
        let selection = build_request(&pipeline, vec![], by_url).unwrap().build();
        let selection = selection.selection().unwrap();
        assert_eq!(selection.urls, vec!["syft://bob@example.org/g.txt"]);
        assert!(selection.file_ids.is_empty());
        assert_eq!(selection.dataset_name.as_deref(), Some("cohort"));

        let no_records = Pipeline::new("plain");
        let one_id = SelectionOptions {
            file_ids: vec![1],
            ..Default::default()
        };
        assert!(build_request(&no_records, vec![], one_id).is_err());
    }

    #[test]
    fn test_participants_need_a_selection() {
        let pipeline = Pipeline::new("plain");
        let options = SelectionOptions {
            participant_ids: vec![3],
            ..Default::default()
        };
        assert!(build_request(&pipeline, vec![], options).is_err());
    }

    #[test]
    fn test_dry_run_output_is_plain_json() {
        let pipeline = Pipeline::new("demo")
            .with_input("label", PipelineInput::new(TypeDescriptor::parse("String")));
        let request = build_request(
            &pipeline,
            vec![("label".to_string(), "first".to_string())],
            SelectionOptions::default(),
        )
        .unwrap()
        .parameters([("qc.min_call_rate", "0.9")])
        .build();

        let rendered = render_request(&request).unwrap();
        let back: RunRequest = serde_json::from_str(&rendered).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_format_edge() {
        let edge = Edge {
            from: "filter".to_string(),
            to: "count".to_string(),
            output: "filtered_sheet".to_string(),
            input: "samplesheet".to_string(),
        };
        assert_eq!(format_edge(&edge), "filter.filtered_sheet -> count.samplesheet");
    }
}
