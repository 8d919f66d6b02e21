use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use fspec_core::foundation::Foundation;
use fspec_core::ProjectContext;
use std::path::Path;

#[derive(Subcommand)]
pub enum FoundationSubcommand {
    /// Show the project foundation document
    Show,
    /// Update foundation fields (only the flags given are changed)
    Set {
        #[arg(long)]
        project_name: Option<String>,
        #[arg(long)]
        vision: Option<String>,
        #[arg(long)]
        problem: Option<String>,
        #[arg(long)]
        users: Option<String>,
        #[arg(long)]
        architecture: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: FoundationSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FoundationSubcommand::Show => show(root, json),
        FoundationSubcommand::Set {
            project_name,
            vision,
            problem,
            users,
            architecture,
        } => set(root, project_name, vision, problem, users, architecture, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let foundation = Foundation::load(&ctx)?;

    if json {
        print_json(&foundation)?;
        return Ok(());
    }

    println!("Project: {}", foundation.project_name);
    for (label, value) in [
        ("Vision", &foundation.vision),
        ("Problem", &foundation.problem),
        ("Users", &foundation.users),
        ("Architecture", &foundation.architecture),
    ] {
        if let Some(value) = value {
            println!("{label}: {value}");
        }
    }
    Ok(())
}

fn set(
    root: &Path,
    project_name: Option<String>,
    vision: Option<String>,
    problem: Option<String>,
    users: Option<String>,
    architecture: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = ProjectContext::new(root);
    let mut foundation = Foundation::load(&ctx)?;

    if let Some(name) = project_name {
        foundation.project_name = name;
    }
    if vision.is_some() {
        foundation.vision = vision;
    }
    if problem.is_some() {
        foundation.problem = problem;
    }
    if users.is_some() {
        foundation.users = users;
    }
    if architecture.is_some() {
        foundation.architecture = architecture;
    }

    foundation.save(&ctx).context("failed to save foundation")?;

    if json {
        print_json(&foundation)?;
    } else {
        println!("Updated foundation");
    }
    Ok(())
}
