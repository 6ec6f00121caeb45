//! Subcommand handlers.

use crate::{Commands, ConfigAction, Kind};
use gridbench_components::{
    register_builtin_classifiers, register_builtin_clusterers, register_builtin_transforms,
};
use gridbench_core::config::workspace_config_path;
use gridbench_core::{
    BatchDriver, BatchOptions, BatchReport, BenchConfig, CancellationToken, CellOperation,
    CellOutcome, Classification, ClassifierRegistry, ClustererRegistry, Clustering,
    ComponentRegistry, ProblemLoader, TagMatch, TransformRegistry, Transformation, load_config,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::List {
            kind,
            tags,
            all_tags,
        } => handle_list(kind, &tags, tag_mode(all_tags)),
        Commands::Run {
            kind,
            problems,
            algorithms,
            tags,
            all_tags,
            jobs,
            timeout,
            fold,
            data,
            output,
            no_save,
            json,
        } => {
            let mut config = load(workspace, config_file)?;
            apply_overrides(
                &mut config,
                RunOverrides {
                    jobs,
                    timeout,
                    fold,
                    data,
                    output,
                    no_save,
                },
            );
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            let selection = Selection {
                names: algorithms,
                tags,
                mode: tag_mode(all_tags),
            };
            handle_run(kind, &problems, &selection, &config, json).await
        }
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<BenchConfig> {
    load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

fn tag_mode(all_tags: bool) -> TagMatch {
    if all_tags {
        TagMatch::Intersection
    } else {
        TagMatch::Union
    }
}

/// Built-in registries, one per component family.
struct Registries {
    classifiers: Arc<ClassifierRegistry>,
    transforms: Arc<TransformRegistry>,
    clusterers: Arc<ClustererRegistry>,
}

impl Registries {
    fn builtin() -> anyhow::Result<Self> {
        let classifiers = ClassifierRegistry::classifiers();
        register_builtin_classifiers(&classifiers)?;
        let transforms = TransformRegistry::transforms();
        register_builtin_transforms(&transforms)?;
        let clusterers = ClustererRegistry::clusterers();
        register_builtin_clusterers(&clusterers)?;
        Ok(Self {
            classifiers: Arc::new(classifiers),
            transforms: Arc::new(transforms),
            clusterers: Arc::new(clusterers),
        })
    }
}

// --- list ---

fn handle_list(kind: Option<Kind>, tags: &[String], mode: TagMatch) -> anyhow::Result<()> {
    let registries = Registries::builtin()?;
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => vec![Kind::Classifier, Kind::Transform, Kind::Clusterer],
    };
    for kind in kinds {
        let lines = match kind {
            Kind::Classifier => describe(&*registries.classifiers, tags, mode),
            Kind::Transform => describe(&*registries.transforms, tags, mode),
            Kind::Clusterer => describe(&*registries.clusterers, tags, mode),
        };
        println!("{kind:?} ({}):", lines.len());
        for line in lines {
            println!("  {line}");
        }
    }
    Ok(())
}

/// One line per entry: name and tags. With tags given, only matching entries.
fn describe<C: ?Sized>(
    registry: &ComponentRegistry<C>,
    tags: &[String],
    mode: TagMatch,
) -> Vec<String> {
    let entries = if tags.is_empty() {
        registry.entries()
    } else {
        registry.get_by_tags(tags, mode)
    };
    entries
        .iter()
        .map(|entry| {
            let tags: Vec<&str> = entry.tags().iter().map(String::as_str).collect();
            format!("{:<20} [{}]", entry.name(), tags.join(", "))
        })
        .collect()
}

// --- run ---

struct RunOverrides {
    jobs: Option<usize>,
    timeout: Option<f64>,
    fold: Option<usize>,
    data: Option<PathBuf>,
    output: Option<PathBuf>,
    no_save: bool,
}

fn apply_overrides(config: &mut BenchConfig, overrides: RunOverrides) {
    if let Some(jobs) = overrides.jobs {
        config.batch.max_concurrent = jobs;
    }
    if overrides.timeout.is_some() {
        config.batch.cell_timeout_secs = overrides.timeout;
    }
    if overrides.fold.is_some() {
        config.data.fold = overrides.fold;
    }
    if let Some(data) = overrides.data {
        config.data.root = data;
    }
    if let Some(output) = overrides.output {
        config.report.output_dir = output;
    }
    if overrides.no_save {
        config.report.save_json = false;
    }
}

/// Algorithms named explicitly or selected by tag.
struct Selection {
    names: Vec<String>,
    tags: Vec<String>,
    mode: TagMatch,
}

impl Selection {
    /// Explicit names first, in the given order, then tag matches in name
    /// order. Each algorithm appears once. Unknown explicit names are kept so
    /// the batch reports them.
    fn resolve<C: ?Sized>(&self, registry: &ComponentRegistry<C>) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::new();
        let tagged = if self.tags.is_empty() {
            Vec::new()
        } else {
            registry.get_by_tags(&self.tags, self.mode)
        };
        let candidates = self
            .names
            .iter()
            .cloned()
            .chain(tagged.iter().map(|e| e.name().to_string()));
        for name in candidates {
            let key = gridbench_core::registry::normalize_key(&name);
            if !resolved
                .iter()
                .any(|r| gridbench_core::registry::normalize_key(r) == key)
            {
                resolved.push(name);
            }
        }
        resolved
    }
}

async fn handle_run(
    kind: Kind,
    problems: &[String],
    selection: &Selection,
    config: &BenchConfig,
    json: bool,
) -> anyhow::Result<()> {
    let registries = Registries::builtin()?;
    let loader = config
        .data
        .loader()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    let loader: Arc<dyn ProblemLoader> = Arc::new(loader);
    let options = BatchOptions::from(&config.batch);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received; finishing in-flight cells (Ctrl-C again to abort)");
        signal_token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Second interrupt received; aborting");
            std::process::exit(130);
        }
    });

    let run = RunContext {
        problems,
        loader,
        options,
        cancel: &cancel,
    };
    let report = match kind {
        Kind::Classifier => {
            run.execute(registries.classifiers, Classification, selection)
                .await?
        }
        Kind::Transform => {
            run.execute(registries.transforms, Transformation, selection)
                .await?
        }
        Kind::Clusterer => {
            run.execute(registries.clusterers, Clustering, selection)
                .await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if config.report.save_json {
        let path = config.report.output_dir.join(report_file_name(&report));
        report
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save report: {}", e))?;
        info!(path = %path.display(), "Saved batch report");
    }
    Ok(())
}

struct RunContext<'a> {
    problems: &'a [String],
    loader: Arc<dyn ProblemLoader>,
    options: BatchOptions,
    cancel: &'a CancellationToken,
}

impl RunContext<'_> {
    async fn execute<Op: CellOperation>(
        &self,
        registry: Arc<ComponentRegistry<Op::Component>>,
        operation: Op,
        selection: &Selection,
    ) -> anyhow::Result<BatchReport> {
        let algorithms = selection.resolve(&*registry);
        if algorithms.is_empty() {
            anyhow::bail!("No algorithms selected; pass --algorithm or a matching --tag");
        }
        let driver = BatchDriver::new(registry, Arc::clone(&self.loader), operation)
            .with_options(self.options.clone());
        Ok(driver
            .run_with_cancel(self.problems, &algorithms, self.cancel)
            .await?)
    }
}

fn report_file_name(report: &BatchReport) -> String {
    let short_id = report.id.split('-').next().unwrap_or(&report.id);
    format!(
        "{}-{}-{}.json",
        report.operation,
        report.started_at.format("%Y%m%dT%H%M%S"),
        short_id
    )
}

fn print_report(report: &BatchReport) {
    for cell in &report.cells {
        match &cell.outcome {
            CellOutcome::Success { metric } => println!(
                "{:<24} {:<20} {} = {:.4} ({} ms)",
                cell.problem, cell.algorithm, report.metric, metric, cell.elapsed_ms
            ),
            CellOutcome::Failure { cause, message } => println!(
                "{:<24} {:<20} FAILED {}: {}",
                cell.problem, cell.algorithm, cause, message
            ),
        }
    }

    let summaries = report.summaries();
    if !summaries.is_empty() {
        println!();
        println!("Mean {} per algorithm:", report.metric);
        for s in &summaries {
            println!(
                "  {:<20} {:.4} ± {:.4} over {} problem(s)",
                s.algorithm, s.mean, s.std_dev, s.count
            );
        }
    }

    let failing = report.failing_algorithms();
    if !failing.is_empty() {
        println!();
        println!("Failing algorithms:");
        for algorithm in failing {
            println!("  {algorithm}");
        }
        for (cause, count) in report.failure_counts() {
            println!("  {cause}: {count}");
        }
    }

    if report.cancelled {
        println!();
        println!(
            "Cancelled: {} of {} cells completed",
            report.len(),
            report.requested_cells()
        );
    }
}

// --- config ---

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let toml_str = toml::to_string_pretty(&BenchConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_file)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
