pub mod cli;
pub mod compose;
pub mod emit;
pub mod error;
pub mod expand;
pub mod model;
pub mod plan;
pub mod schema;
pub mod store;

use anyhow::Context;
use clap::Parser;
use globset::{Glob, GlobSetBuilder};
use log::info;

use crate::emit::{Artifact, Emitter};
use crate::store::TemplateStore;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .format_timestamp(None)
        .init();

    let only = match &args.only {
        Some(pattern) => {
            let glob = Glob::new(pattern)
                .with_context(|| format!("parsing --only glob `{pattern}`"))?;
            Some(GlobSetBuilder::new().add(glob).build()?)
        }
        None => None,
    };

    // 1. ── Load schema ────────────────────────────────────────────────
    let project = schema::load(&args.config)?;

    // 2. ── Index templates ────────────────────────────────────────────
    let store = TemplateStore::open(&args.templates)?;

    // 3. ── Plan ───────────────────────────────────────────────────────
    let plans = plan::plan_project(&project)?;

    // 4. ── Compose every artifact, then commit ────────────────────────
    let mut artifacts = Vec::with_capacity(plans.len());
    for plan in &plans {
        let text = compose::compose(&project, &store, plan)?;
        artifacts.push(Artifact {
            path: plan.path.clone(),
            text,
            executable: plan.executable,
        });
    }

    let mut emitter = Emitter::new(&args.output, args.dry_run, only);
    let summary = emitter.emit_all(&artifacts)?;
    info!(
        "{} artifacts, {} changed{}",
        summary.written,
        summary.changed,
        if args.dry_run { " (dry run)" } else { "" }
    );
    Ok(())
}
