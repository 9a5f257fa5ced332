//! Stage execution.
//!
//! Each [`Stage`] variant runs against the [`BuildContext`] and reports a
//! [`StageResult`]. Stages never halt the run themselves; the orchestrator
//! reads the outcome and decides.

use super::{
    Artifact, BuildContext, PipelineState,
    invoker::ExternalToolSpec,
    verifier,
};
use crate::bundler::{
    assembler::{self, AssemblyContext, AssemblyKind},
    assets,
    error::{Error, Result},
    settings::ToolRole,
    staging,
    target::{ArgTemplate, Stage},
};
use std::path::PathBuf;

/// Outcome tag of one stage.
#[derive(Debug)]
pub enum StageOutcome {
    Success,
    Failed(Error),
    /// Nothing to do, or a best-effort step that left work undone.
    Skipped,
}

/// What a stage reports back to the orchestrator.
#[derive(Debug)]
pub struct StageResult {
    pub outcome: StageOutcome,
    /// Verified or assembled output, appended to the run's artifacts.
    pub artifact: Option<Artifact>,
    pub message: String,
}

impl StageResult {
    pub fn success(artifact: Option<Artifact>, message: impl Into<String>) -> Self {
        Self {
            outcome: StageOutcome::Success,
            artifact,
            message: message.into(),
        }
    }

    pub fn failed(error: Error) -> Self {
        Self {
            message: error.to_string(),
            outcome: StageOutcome::Failed(error),
            artifact: None,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            outcome: StageOutcome::Skipped,
            artifact: None,
            message: message.into(),
        }
    }
}

impl Stage {
    /// Pipeline state entered while this stage runs.
    pub fn state(&self) -> PipelineState {
        match self {
            Stage::PrepareAssets { .. } => PipelineState::Preparing,
            Stage::StageResources => PipelineState::Staging,
            Stage::Invoke { .. } => PipelineState::Invoking,
            Stage::Verify { .. } => PipelineState::Verifying,
            Stage::Assemble { .. } => PipelineState::Assembling,
        }
    }

    /// Runs the stage. Errors come back inside the result, never as a panic.
    pub async fn run(&self, ctx: &mut BuildContext<'_>) -> StageResult {
        let name = self.name();
        let result = match self {
            Stage::PrepareAssets { assets } if assets.is_empty() => {
                return StageResult::skipped("no assets required");
            }
            Stage::PrepareAssets { assets } => prepare_assets(ctx, assets, &name).await,
            Stage::StageResources => stage_resources(ctx, &name).await,
            Stage::Invoke {
                tool,
                args,
                working_dir,
                env,
            } => invoke(ctx, *tool, args, working_dir, env).await,
            Stage::Verify { expected } => verify(ctx, expected, &name).await,
            Stage::Assemble { kind, destination } => assemble(ctx, kind, destination, &name).await,
        };

        match result {
            Ok((artifact, message)) => StageResult::success(artifact, message),
            Err(e) => StageResult::failed(e),
        }
    }
}

type Output = (Option<Artifact>, String);

async fn prepare_assets(
    ctx: &mut BuildContext<'_>,
    kinds: &[assets::AssetKind],
    stage: &str,
) -> Result<Output> {
    let mut synthesized = 0;
    for kind in kinds {
        let destination = ctx.settings.assets_dir().join(kind.file_name());
        let prepared = assets::ensure(*kind, &destination, stage).await?;
        if prepared.synthesized {
            synthesized += 1;
            ctx.warnings.push(format!(
                "{kind} was missing; placeholder written to {}",
                destination.display()
            ));
        }
        ctx.inputs.push(prepared.artifact);
    }
    Ok((
        None,
        format!("{} asset(s) ready, {synthesized} placeholder(s)", kinds.len()),
    ))
}

async fn stage_resources(ctx: &mut BuildContext<'_>, stage: &str) -> Result<Output> {
    let staging_root = ctx.target.staging_root();
    let staged = staging::stage(
        ctx.settings.manifest(),
        ctx.settings.source_root(),
        &staging_root,
        &[
            ctx.settings.build_root(),
            ctx.settings.output_root(),
            ctx.target.output_dir(),
        ],
        stage,
    )
    .await?;
    let count = staged.len();
    ctx.inputs.extend(staged);
    Ok((
        None,
        format!("staged {count} file(s) into {}", staging_root.display()),
    ))
}

async fn invoke(
    ctx: &mut BuildContext<'_>,
    role: ToolRole,
    args: &[ArgTemplate],
    working_dir: &str,
    env: &[(String, String)],
) -> Result<Output> {
    let tool = ctx.settings.tools().get(role).clone();
    let program = ctx.invoker.resolve(&tool)?;

    let mut rendered = tool.extra_args.clone();
    rendered.extend(render_args(ctx, args)?);

    let env = env
        .iter()
        .map(|(k, v)| -> Result<(String, String)> { Ok((k.clone(), ctx.vars.render(v)?)) })
        .collect::<Result<Vec<_>>>()?;

    let spec = ExternalToolSpec {
        tool: tool.program.clone(),
        program,
        args: rendered,
        working_dir: ctx.render_path(working_dir)?,
        timeout: tool.timeout,
        env,
    };

    let output = ctx.invoker.invoke(&spec).await?;
    if !output.stderr.trim().is_empty() {
        log::debug!("{} wrote to stderr but exited 0", spec.tool);
    }
    Ok((
        None,
        format!("{} exited with code {}", spec.tool, output.exit_code),
    ))
}

/// Expands argument templates; `each` groups repeat once per list item.
fn render_args(ctx: &BuildContext<'_>, args: &[ArgTemplate]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            ArgTemplate::One(template) => out.push(ctx.vars.render(template)?),
            ArgTemplate::Each { list, args } => {
                let columns = args
                    .iter()
                    .map(|t| ctx.vars.render_each(*list, t))
                    .collect::<Result<Vec<_>>>()?;
                for row in 0..ctx.vars.list(*list).len() {
                    for column in &columns {
                        out.push(column[row].clone());
                    }
                }
            }
        }
    }
    Ok(out)
}

async fn verify(ctx: &mut BuildContext<'_>, expected: &str, stage: &str) -> Result<Output> {
    let path = ctx.render_path(expected)?;
    let artifact = verifier::verify(&path, stage).await?;
    ctx.primary = Some(artifact.clone());
    Ok((Some(artifact), format!("verified {}", path.display())))
}

async fn assemble(
    ctx: &mut BuildContext<'_>,
    kind: &AssemblyKind,
    destination: &str,
    stage: &str,
) -> Result<Output> {
    let primary = ctx.primary.clone().ok_or_else(|| Error::AssemblyFailed {
        reason: format!("{kind} needs a verified primary artifact and none was produced"),
    })?;
    let destination = ctx.render_path(destination)?;

    if let AssemblyKind::Archive { source } = kind {
        let source = ctx.render_path(source)?;
        if ctx.produced(&source).is_none() {
            return Err(Error::AssemblyFailed {
                reason: format!(
                    "archive source {} was not produced by an earlier stage",
                    source.display()
                ),
            });
        }
    }

    let extra_files = if matches!(kind, AssemblyKind::Archive { .. }) {
        Vec::new()
    } else {
        auxiliary_files(ctx)
    };

    let artifact = assembler::assemble(
        kind,
        &primary,
        &extra_files,
        &destination,
        &AssemblyContext {
            settings: ctx.settings,
            vars: &ctx.vars,
            stage,
        },
    )
    .await?;

    Ok((Some(artifact), format!("assembled {}", destination.display())))
}

/// Configured auxiliary files that exist; missing ones become warnings.
fn auxiliary_files(ctx: &mut BuildContext<'_>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for relative in ctx.settings.auxiliary_files() {
        let path = ctx.settings.source_root().join(relative);
        if path.is_file() {
            found.push(path);
        } else {
            ctx.warn(format!(
                "auxiliary file {} not found, skipping",
                path.display()
            ));
        }
    }
    found
}
