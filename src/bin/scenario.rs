use clap::{command, Parser};
use scenario_tree::{
    config::ScenarioConfig, encode, sandbox::SandboxConfig, Dispatcher, EventBus, Evaluator, SandboxWorld,
    ScenarioError, TemplateCatalog, TreeBuilder, TriggerContext,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Additional templates (JSON array)
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Sandbox world description
    #[arg(short, long)]
    world: Option<PathBuf>,

    /// Construction strings, one per line
    #[arg(short, long)]
    script: PathBuf,

    /// Name of the triggering player
    #[arg(short, long)]
    player: Option<String>,

    /// Fire the root action after building
    #[arg(short, long)]
    fire: bool,

    /// Print the canonical construction list
    #[arg(short, long)]
    encode: bool,

    /// Enable debug mode
    #[arg(short, long)]
    verbose: bool,
}

fn read_script(cli: &Cli) -> Result<Vec<String>, ScenarioError> {
    let script = std::fs::read_to_string(&cli.script)
        .map_err(|e| ScenarioError::Internal(format!("Failed to read script file: {}", e)))?;
    Ok(script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

async fn run(cli: &Cli) -> Result<(), ScenarioError> {
    let config = if cli.config.exists() {
        ScenarioConfig::from_file(&cli.config)?
    } else {
        ScenarioConfig::default()
    };
    info!("config loaded.");
    debug!("config: {:?}", config);

    let catalog = TemplateCatalog::with_builtins();
    if let Some(path) = &cli.templates {
        let count = catalog.load_file(path)?;
        info!(count, "templates loaded.");
    }

    let bus = Arc::new(EventBus::new(config.event_buffer_size));
    let (mut events, mut errors) = bus.subscribe();
    let sandbox = match &cli.world {
        Some(path) => SandboxConfig::from_file(path)?,
        None => SandboxConfig::default(),
    };
    let mut world = SandboxWorld::from_config(&sandbox).with_event_bus(bus.clone());

    let constructions = read_script(cli)?;
    let tree = TreeBuilder::new(&catalog, &world)
        .with_max_depth(config.builder.max_template_depth)
        .build(&constructions)?;
    println!("{}", tree);

    if cli.encode {
        for line in encode(&tree)? {
            println!("{}", line);
        }
    }

    if cli.fire {
        let mut context = TriggerContext::new().with_event("cli");
        if let Some(name) = &cli.player {
            let player = world
                .player(name)
                .ok_or_else(|| ScenarioError::internal(format!("Unknown player: {}", name)))?;
            context = context.with_triggering_entity(player.character);
        }

        let dispatcher = Dispatcher::new(
            Evaluator::from_config(&config.evaluator),
            config.evaluator.failure_policy,
        )
        .with_event_bus(bus.clone());
        let report = dispatcher.dispatch(&tree, &[], &[tree.root()], &context, &mut world)?;

        while let Some(event) = events.try_recv() {
            let line = serde_json::to_string(&event)
                .map_err(|e| ScenarioError::Internal(format!("Failed to encode event: {}", e)))?;
            println!("{}", line);
        }
        while let Some(error) = errors.try_recv() {
            eprintln!("{}: {}", error.error_type, error.message);
        }
        if !report.is_success() {
            return Err(ScenarioError::internal("scenario action failed"));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
