mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    dependency::DependencySubcommand, epic::EpicSubcommand, event_storm::EventStormSubcommand,
    feature::FeatureSubcommand, foundation::FoundationSubcommand, item::AssumptionSubcommand,
    item::ExampleSubcommand, item::NoteSubcommand, item::QuestionSubcommand, item::RuleSubcommand,
    prefix::PrefixSubcommand, query::QuerySubcommand, tag::TagSubcommand,
    work_unit::WorkUnitSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fspec",
    about = "Work unit tracker for acceptance-criteria-driven development",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from spec/ or .git/)
    #[arg(long, global = true, env = "FSPEC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the spec/ directory in the current project
    Init,

    /// Manage work units
    WorkUnit {
        #[command(subcommand)]
        subcommand: WorkUnitSubcommand,
    },

    /// Manage relationships between work units
    Dependency {
        #[command(subcommand)]
        subcommand: DependencySubcommand,
    },

    /// Manage business rules on a work unit
    Rule {
        #[command(subcommand)]
        subcommand: RuleSubcommand,
    },

    /// Manage examples on a work unit
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommand,
    },

    /// Manage open questions on a work unit
    Question {
        #[command(subcommand)]
        subcommand: QuestionSubcommand,
    },

    /// Manage assumptions on a work unit
    Assumption {
        #[command(subcommand)]
        subcommand: AssumptionSubcommand,
    },

    /// Manage architecture notes on a work unit
    Note {
        #[command(subcommand)]
        subcommand: NoteSubcommand,
    },

    /// Manage a work unit's event storm board
    EventStorm {
        #[command(subcommand)]
        subcommand: EventStormSubcommand,
    },

    /// Manage epics
    Epic {
        #[command(subcommand)]
        subcommand: EpicSubcommand,
    },

    /// Manage work unit ID prefixes
    Prefix {
        #[command(subcommand)]
        subcommand: PrefixSubcommand,
    },

    /// Manage the tag registry
    Tag {
        #[command(subcommand)]
        subcommand: TagSubcommand,
    },

    /// Show or update the project foundation document
    Foundation {
        #[command(subcommand)]
        subcommand: FoundationSubcommand,
    },

    /// Manage Gherkin feature files
    Feature {
        #[command(subcommand)]
        subcommand: FeatureSubcommand,
    },

    /// Query work unit state
    Query {
        #[command(subcommand)]
        subcommand: QuerySubcommand,
    },

    /// Re-derive the state index and relationship mirrors
    Repair,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::WorkUnit { subcommand } => cmd::work_unit::run(&root, subcommand, cli.json),
        Commands::Dependency { subcommand } => cmd::dependency::run(&root, subcommand, cli.json),
        Commands::Rule { subcommand } => cmd::item::run_rule(&root, subcommand, cli.json),
        Commands::Example { subcommand } => cmd::item::run_example(&root, subcommand, cli.json),
        Commands::Question { subcommand } => cmd::item::run_question(&root, subcommand, cli.json),
        Commands::Assumption { subcommand } => {
            cmd::item::run_assumption(&root, subcommand, cli.json)
        }
        Commands::Note { subcommand } => cmd::item::run_note(&root, subcommand, cli.json),
        Commands::EventStorm { subcommand } => cmd::event_storm::run(&root, subcommand, cli.json),
        Commands::Epic { subcommand } => cmd::epic::run(&root, subcommand, cli.json),
        Commands::Prefix { subcommand } => cmd::prefix::run(&root, subcommand, cli.json),
        Commands::Tag { subcommand } => cmd::tag::run(&root, subcommand, cli.json),
        Commands::Foundation { subcommand } => cmd::foundation::run(&root, subcommand, cli.json),
        Commands::Feature { subcommand } => cmd::feature::run(&root, subcommand, cli.json),
        Commands::Query { subcommand } => cmd::query::run(&root, subcommand, cli.json),
        Commands::Repair => cmd::repair::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
