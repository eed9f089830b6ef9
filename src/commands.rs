use crate::{OutputMode, emit_success};
use assetgraph::config::{AssetgraphConfig, default_config_path, load_config, write_config};
use assetgraph::graph::Reached;
use assetgraph::index::WalkIndexer;
use assetgraph::output::is_quiet;
use assetgraph::report::stale_references;
use assetgraph::resolve::path_key;
use assetgraph::source::DiskSource;
use assetgraph::ui::{self, Icons, ProgressManager};
use assetgraph::watcher::Watcher;
use assetgraph::{BuildOutcome, Graph, NodeId, ProjectMap};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub output_mode: OutputMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Dependencies,
    Dependents,
}

impl Direction {
    fn command(&self) -> &'static str {
        match self {
            Direction::Dependencies => "deps",
            Direction::Dependents => "dependents",
        }
    }
}

struct Project {
    map: ProjectMap,
    config: AssetgraphConfig,
    progress: Option<ProgressManager>,
}

fn open_project(options: &GlobalOptions, with_progress: bool) -> anyhow::Result<Project> {
    let config = load_config(options.config.as_deref())?.unwrap_or_default();
    let root = options
        .root
        .clone()
        .or_else(|| config.root.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let Ok(root) = std::fs::canonicalize(&root) else {
        anyhow::bail!("project root {} does not exist", root.display());
    };

    let indexer = Arc::new(WalkIndexer::with_excludes(config.exclude.clone()));
    let mut map = ProjectMap::new(root, config.settings(), indexer, Arc::new(DiskSource::new()));

    let progress = if with_progress && options.output_mode.is_human() {
        let (manager, tx) = ProgressManager::new(!is_quiet());
        map = map.with_progress(tx);
        Some(manager)
    } else {
        None
    };

    Ok(Project { map, config, progress })
}

/// Build once, clearing the spinners afterwards
async fn build_once(project: &Project) -> anyhow::Result<BuildOutcome> {
    let outcome = project.map.build().await?;
    if let Some(progress) = &project.progress {
        progress.clear();
    }
    Ok(outcome)
}

pub async fn run_build(options: &GlobalOptions, include_graph: bool) -> anyhow::Result<()> {
    let project = open_project(options, true)?;
    if options.output_mode.is_human() {
        ui::header(&format!("Building project map: {}", project.map.root().display()));
    }

    let started = Instant::now();
    let outcome = project.map.build().await?;
    let stats = outcome.graph.stats();

    if options.output_mode.is_human() {
        if let Some(progress) = &project.progress {
            progress.finish_with_summary(started.elapsed(), &stats);
        }
        print_summary(&outcome);
    } else {
        let mut data = serde_json::json!({
            "report": outcome.report,
            "stats": stats,
        });
        if include_graph {
            data["graph"] = serde_json::to_value(outcome.graph.snapshot())?;
        }
        emit_success(options.output_mode, "build", data)?;
    }
    Ok(())
}

fn print_summary(outcome: &BuildOutcome) {
    let stats = outcome.graph.stats();
    let scan = &outcome.report.scan;
    println!(
        "{}",
        ui::stats_table(&[
            ("Markup files", stats.markup.to_string()),
            ("Style sheets", stats.style.to_string()),
            ("Scripts", stats.script.to_string()),
            ("Edges", stats.edges.to_string()),
            (
                "Passes",
                format!(
                    "{} / {} / {}",
                    scan.markup.passes, scan.style.passes, scan.script.passes
                ),
            ),
            ("Failed reads", outcome.report.failures.len().to_string()),
        ])
    );

    if !outcome.report.skipped.is_empty() {
        ui::warn(&format!(
            "Skipped {} markup files with illegal names",
            outcome.report.skipped.len()
        ));
        for path in &outcome.report.skipped {
            ui::summary_row("skipped", path);
        }
    }

    if !outcome.report.failures.is_empty() {
        ui::section("Unreadable files");
        for failure in &outcome.report.failures {
            ui::broken_reference(&failure.id.to_string(), &failure.error);
        }
    }
}

pub async fn run_walk(
    options: &GlobalOptions,
    file: &Path,
    depth: usize,
    direction: Direction,
) -> anyhow::Result<()> {
    let project = open_project(options, true)?;
    let outcome = build_once(&project).await?;
    let starts = find_nodes(&outcome.graph, &project.map.root(), file)?;
    let reached = walk_from(&outcome.graph, &starts, depth, direction);

    if !options.output_mode.is_human() {
        let data = serde_json::json!({
            "file": starts,
            "depth": depth,
            "reached": reached,
        });
        return emit_success(options.output_mode, direction.command(), data);
    }

    match direction {
        Direction::Dependencies => println!(
            "{} Dependencies of: {} (depth: {})...",
            Icons::LINK,
            file.display(),
            depth
        ),
        Direction::Dependents => println!(
            "{} Impact analysis for: {} (depth: {})...",
            Icons::LINK,
            file.display(),
            depth
        ),
    }

    if reached.is_empty() {
        println!("∅ Nothing found.");
        return Ok(());
    }

    println!("{}", ui::reached_table(&reached));
    let direct = reached.iter().filter(|r| r.is_direct()).count();
    println!(
        "{} {} direct  {} {} indirect",
        Icons::DIRECT,
        direct,
        Icons::INDIRECT,
        reached.len() - direct
    );
    Ok(())
}

/// Walk from every start node, keeping each reached node once at its
/// shortest distance. Start nodes themselves are left out.
fn walk_from(graph: &Graph, starts: &[NodeId], depth: usize, direction: Direction) -> Vec<Reached> {
    let mut reached: Vec<Reached> = Vec::new();
    for start in starts {
        let found = match direction {
            Direction::Dependencies => graph.dependencies(start, depth),
            Direction::Dependents => graph.dependents(start, depth),
        };
        for r in found {
            if starts.contains(&r.id) {
                continue;
            }
            match reached.iter_mut().find(|existing| existing.id == r.id) {
                Some(existing) => existing.depth = existing.depth.min(r.depth),
                None => reached.push(r),
            }
        }
    }
    reached.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));
    reached
}

/// Graph nodes for a file given on the command line, as typed or relative to the root
fn find_nodes(graph: &Graph, root: &Path, file: &Path) -> anyhow::Result<Vec<NodeId>> {
    for candidate in [file.to_path_buf(), root.join(file)] {
        let key = std::fs::canonicalize(&candidate)
            .map(|p| path_key(&p))
            .unwrap_or_else(|_| path_key(&candidate));
        let ids = graph.find_path(&key);
        if !ids.is_empty() {
            return Ok(ids);
        }
    }
    anyhow::bail!("{} is not part of the project graph", file.display())
}

pub async fn run_stale(options: &GlobalOptions) -> anyhow::Result<()> {
    let project = open_project(options, true)?;
    let outcome = build_once(&project).await?;
    let stale = stale_references(&outcome.graph);

    if !options.output_mode.is_human() {
        return emit_success(options.output_mode, "stale", stale);
    }

    if stale.is_empty() {
        ui::success("No stale references.");
        return Ok(());
    }

    ui::section("Stale references");
    for reference in &stale {
        ui::broken_reference(&reference.id.path, &reference.error);
        for parent in &reference.referenced_by {
            println!("    {} {}", ui::muted("referenced by"), parent.path);
        }
    }
    Ok(())
}

pub async fn run_watch(options: &GlobalOptions, debounce_ms: u64) -> anyhow::Result<()> {
    let project = open_project(options, false)?;
    let root = project.map.root();
    let outcome = build_once(&project).await?;
    report_rebuild(options.output_mode, &outcome);

    if options.output_mode.is_human() {
        println!("{} Watching for changes in {}...", Icons::EYE, root.display());
    }

    let mut watcher = Watcher::new(root, &project.config.exclude)
        .with_debounce(Duration::from_millis(debounce_ms));
    let output_mode = options.output_mode;
    let watching = watcher.run(&project.map, |outcome| match outcome {
        Ok(outcome) => report_rebuild(output_mode, &outcome),
        Err(assetgraph::Error::Cancelled) => {}
        Err(e) => ui::error(&format!("Rebuild failed: {}", e)),
    });

    tokio::select! {
        result = watching => result?,
        _ = tokio::signal::ctrl_c() => {
            project.map.cancel();
            if output_mode.is_human() {
                println!();
                ui::success("Stopped watching.");
            }
        }
    }
    Ok(())
}

fn report_rebuild(output_mode: OutputMode, outcome: &BuildOutcome) {
    let stats = outcome.graph.stats();
    if output_mode.is_human() {
        ui::success(&format!(
            "Graph ready: {} markup, {} style, {} script, {} edges ({} ms)",
            stats.markup, stats.style, stats.script, stats.edges, outcome.report.elapsed_ms
        ));
        for failure in &outcome.report.failures {
            ui::broken_reference(&failure.id.path, &failure.error);
        }
        return;
    }

    let data = serde_json::json!({
        "report": outcome.report,
        "stats": stats,
    });
    if let Err(e) = emit_success(output_mode, "watch", data) {
        tracing::warn!("Failed to write build result: {}", e);
    }
}

pub fn run_init(options: &GlobalOptions, force: bool) -> anyhow::Result<()> {
    let path = options.config.clone().unwrap_or_else(default_config_path);
    let mut config = AssetgraphConfig::starter();
    if let Some(root) = &options.root {
        config.root = Some(root.display().to_string());
    }
    write_config(&path, &config, force)?;

    if options.output_mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        ui::info(
            "Project root",
            &config.root.clone().unwrap_or_else(|| ".".to_string()).style(ui::theme().info.clone()).to_string(),
        );
    } else {
        emit_success(options.output_mode, "init", serde_json::json!({ "path": path, "config": config }))?;
    }
    Ok(())
}
