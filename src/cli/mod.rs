//! Command line interface for the packaging pipeline.
//!
//! Loads `packaging.toml`, applies the command line overrides, and runs the
//! requested targets one after another.

mod args;
mod output;
mod report;

pub use args::{Args, Command, RuntimeConfig};
pub use output::OutputManager;

use crate::{
    bundler::{BuildReport, Manifest, Pipeline, Settings, TargetKind},
    config::ProjectConfig,
    error::{CliError, Result},
};
use report::{CheckReport, CleanReport};
use path_absolutize::Absolutize;
use std::time::Duration;

/// Main CLI entry point
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let runtime = RuntimeConfig::from(&args);
    let settings = load_settings(&args)?;

    let mut pipeline = Pipeline::new(settings);
    if let Some(dir) = args.output_dir.as_ref().filter(|_| args.command != Command::All) {
        pipeline = pipeline.with_output_dir(dir.absolutize()?.into_owned());
    }

    match &args.command {
        Command::Clean { target } => clean(&pipeline, *target, &runtime).await,
        Command::Check { .. } => check(&pipeline, &args.targets(), &runtime),
        _ => build(&pipeline, &args.targets(), &runtime).await,
    }
}

/// Builds validated settings from the configuration file and the overrides.
pub fn load_settings(args: &Args) -> Result<Settings> {
    let source_root = args.source.absolutize()?.into_owned();
    let config = ProjectConfig::discover(&source_root, args.config.as_deref())?;
    let mut builder = config.into_builder(&source_root);

    if let Some(path) = &args.manifest {
        builder = builder.manifest(Manifest::load(path)?);
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout_override(Duration::from_secs(secs));
    }
    if let Some(path) = &args.tool_path {
        builder = builder.tool_search_path(path.clone());
    }
    // For `all`, --output-dir is the parent of every target's directory.
    if let Some(dir) = args.output_dir.as_ref().filter(|_| args.command == Command::All) {
        builder = builder.output_root(dir.absolutize()?.into_owned());
    }
    Ok(builder.build()?)
}

async fn build(pipeline: &Pipeline, targets: &[TargetKind], runtime: &RuntimeConfig) -> Result<i32> {
    let output = runtime.output();
    let mut reports: Vec<BuildReport> = Vec::with_capacity(targets.len());
    for kind in targets {
        let target = pipeline.target(*kind);
        output.section(&format!("Building {kind} into {}", target.output_dir().display()));
        let report = pipeline.run(&target).await;
        if runtime.json() {
            if !report.is_success() {
                report::print_failure(output, &report);
            }
        } else {
            report::print_build(output, &report);
        }
        reports.push(report);
    }

    if runtime.json() {
        match reports.as_slice() {
            [single] => report::print_json(output, single)?,
            many => report::print_json(output, many)?,
        }
    }
    Ok(reports
        .iter()
        .map(BuildReport::exit_code)
        .find(|code| *code != 0)
        .unwrap_or(0))
}

fn check(pipeline: &Pipeline, targets: &[TargetKind], runtime: &RuntimeConfig) -> Result<i32> {
    let output = runtime.output();
    let mut exit_code = 0;
    let mut checks = Vec::with_capacity(targets.len());
    for kind in targets {
        let check = match pipeline.check(&pipeline.target(*kind)) {
            Ok(tools) => CheckReport {
                target: *kind,
                ok: true,
                tools,
                error: None,
                hint: None,
            },
            Err(e) => {
                if exit_code == 0 {
                    exit_code = e.kind().exit_code();
                }
                let hint = match &e {
                    crate::bundler::Error::MissingDependency { hint, .. } => Some(hint.clone()),
                    _ => None,
                };
                CheckReport {
                    target: *kind,
                    ok: false,
                    tools: Vec::new(),
                    error: Some(e.to_string()),
                    hint,
                }
            }
        };
        if !runtime.json() {
            report::print_check(output, &check);
        }
        checks.push(check);
    }
    if runtime.json() {
        report::print_json(output, &checks)?;
    }
    Ok(exit_code)
}

async fn clean(pipeline: &Pipeline, kind: TargetKind, runtime: &RuntimeConfig) -> Result<i32> {
    let target = pipeline.target(kind);
    let warnings = pipeline.clean(&target).await?;
    let clean = CleanReport {
        target: kind,
        removed: target
            .owned_dirs()
            .iter()
            .map(|dir| dir.display().to_string())
            .collect(),
        warnings,
    };
    if runtime.json() {
        report::print_json(runtime.output(), &clean)?;
    } else {
        report::print_clean(runtime.output(), &clean);
    }
    Ok(0)
}
