//! Skillgraph CLI - knowledge graph of docs, skills, issues and pull requests

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use skillgraph_core::config::Config;
use skillgraph_core::domain::graph::{
    GraphRepository, GraphStats, GraphTraversal, Node, NodeType, NodeView, Relationship,
};
use skillgraph_core::domain::tracker::{
    CorrelationOutcome, EventCorrelator, ExtractionRules, IssuePayload, PullRequestPayload,
};
use skillgraph_core::infrastructure::graph::SqliteGraphRepository;
use skillgraph_core::storage::{self, Database};
use tracing::debug;

#[derive(Parser)]
#[command(name = "skillgraph")]
#[command(author, version, about = "Knowledge graph linking docs, skills, issues and pull requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides `storage.path`)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Record issue events
    Issue {
        #[command(subcommand)]
        action: IssueAction,
    },

    /// Record pull request events
    Pr {
        #[command(subcommand)]
        action: PrAction,
    },

    /// Show node and edge counts
    Stats,

    /// List nodes of one type, newest first
    List {
        /// Node type (documents, concepts, skills, issues, prs)
        #[arg(value_parser = parse_node_type)]
        node_type: NodeType,
    },

    /// Show a node and its edges
    Show {
        /// Node id, e.g. `Issue:42`
        node_id: String,
    },

    /// Nodes one edge away, in either direction
    Related {
        node_id: String,
        /// Only follow this relationship (e.g. ABOUT, FIXED_BY)
        #[arg(short, long, value_parser = parse_relationship)]
        relationship: Option<Relationship>,
    },

    /// Nodes reachable along outgoing edges
    Dependents {
        node_id: String,
        /// Maximum hops (defaults to `traversal.default_max_depth`)
        #[arg(short, long)]
        depth: Option<u32>,
    },

    /// Export the graph
    Export {
        /// Output directory (JSONL) or file (snapshot)
        #[arg(short, long)]
        output: PathBuf,
        /// Write a single JSON snapshot instead of JSONL files
        #[arg(long)]
        snapshot: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum IssueAction {
    /// An issue was opened
    Created {
        number: u64,
        /// JSON payload file (`-` for stdin)
        #[arg(short, long)]
        data: PathBuf,
    },
    /// An issue was closed
    Closed { number: u64 },
}

#[derive(Subcommand)]
enum PrAction {
    /// A pull request was opened
    Created {
        number: u64,
        /// JSON payload file (`-` for stdin)
        #[arg(short, long)]
        data: PathBuf,
    },
    /// A pull request was merged
    Merged { number: u64 },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

fn parse_node_type(s: &str) -> Result<NodeType, String> {
    NodeType::parse(s)
        .ok_or_else(|| skillgraph_core::Error::UnknownNodeType(s.to_string()).to_string())
}

fn parse_relationship(s: &str) -> Result<Relationship, String> {
    Relationship::parse(s)
        .ok_or_else(|| skillgraph_core::Error::UnknownRelationship(s.to_string()).to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let directive = if cli.quiet { "skillgraph=warn" } else { "skillgraph=info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match directive.parse() {
        Ok(d) => filter.add_directive(d),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        report_error(&e);
        std::process::exit(1);
    }
}

fn report_error(error: &anyhow::Error) {
    match error.downcast_ref::<skillgraph_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", error),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let quiet = cli.quiet;

    let command = match cli.command {
        Commands::Config { action } => return cmd_config(action, quiet),
        command => command,
    };

    let config = Config::load()?;
    let rules = config.extraction.rules()?;
    let db_path = cli.db.unwrap_or_else(|| config.storage.resolved_path());
    debug!(path = %db_path.display(), "Opening graph database");
    let db = Database::open(db_path).await?;
    let repo = Arc::new(SqliteGraphRepository::new(db.pool().clone()));

    let result = match command {
        Commands::Issue { action } => {
            let correlator = correlator(&config, rules, repo.clone());
            cmd_issue(&correlator, action, format, quiet).await
        }
        Commands::Pr { action } => {
            let correlator = correlator(&config, rules, repo.clone());
            cmd_pr(&correlator, action, format, quiet).await
        }
        Commands::Stats => cmd_stats(repo.as_ref(), format).await,
        Commands::List { node_type } => cmd_list(repo.as_ref(), node_type, format, quiet).await,
        Commands::Show { node_id } => cmd_show(repo.as_ref(), &node_id, format).await,
        Commands::Related {
            node_id,
            relationship,
        } => cmd_related(repo.clone(), &node_id, relationship, format, quiet).await,
        Commands::Dependents { node_id, depth } => {
            let depth = depth.unwrap_or(config.traversal.default_max_depth);
            cmd_dependents(repo.clone(), &node_id, depth, format, quiet).await
        }
        Commands::Export { output, snapshot } => {
            cmd_export(repo.as_ref(), &output, snapshot, format, quiet).await
        }
        Commands::Doctor => cmd_doctor(&db, repo.as_ref(), quiet).await,
        Commands::Config { .. } => unreachable!("handled before opening the database"),
    };

    db.close().await;
    result
}

fn correlator(
    config: &Config,
    rules: ExtractionRules,
    repo: Arc<SqliteGraphRepository>,
) -> EventCorrelator<SqliteGraphRepository> {
    EventCorrelator::new(repo)
        .with_rules(rules)
        .with_impact_depth(config.traversal.default_max_depth)
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read payload {}: {}", path.display(), e))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_issue(
    correlator: &EventCorrelator<SqliteGraphRepository>,
    action: IssueAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let outcome = match action {
        IssueAction::Created { number, data } => {
            let payload = IssuePayload::from_json(&read_payload(&data)?)?;
            correlator.on_issue_created(number, &payload).await?
        }
        IssueAction::Closed { number } => correlator.on_issue_closed(number).await?,
    };
    print_outcome(&outcome, format, quiet)
}

async fn cmd_pr(
    correlator: &EventCorrelator<SqliteGraphRepository>,
    action: PrAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let outcome = match action {
        PrAction::Created { number, data } => {
            let payload = PullRequestPayload::from_json(&read_payload(&data)?)?;
            correlator.on_pr_created(number, &payload).await?
        }
        PrAction::Merged { number } => correlator.on_pr_merged(number).await?,
    };
    print_outcome(&outcome, format, quiet)
}

fn print_outcome(
    outcome: &CorrelationOutcome,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(outcome);
    }
    if quiet {
        return Ok(());
    }

    for event in &outcome.events {
        println!("  {}", event);
    }
    if !outcome.closed_issues.is_empty() {
        println!("Closed issues: {}", outcome.closed_issues.join(", "));
    }
    if !outcome.affected_skills.is_empty() {
        println!("Affected skills:");
        for skill in &outcome.affected_skills {
            println!("  - {}", skill);
        }
    }
    Ok(())
}

async fn cmd_stats(repo: &SqliteGraphRepository, format: OutputFormat) -> anyhow::Result<()> {
    let stats = repo.get_stats().await?;
    if format == OutputFormat::Json {
        return print_json(&stats);
    }
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &GraphStats) {
    println!("Graph statistics:");
    println!("  Nodes: {}", stats.total_nodes);
    for node_type in NodeType::all() {
        println!("    {:<12} {}", node_type.as_str(), stats.count_of(*node_type));
    }
    println!("  Edges: {}", stats.total_edges);
}

async fn cmd_list(
    repo: &SqliteGraphRepository,
    node_type: NodeType,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let nodes = repo.list_nodes_by_type(node_type).await?;
    if format == OutputFormat::Json {
        return print_json(&nodes);
    }

    if nodes.is_empty() {
        if !quiet {
            println!("No {} nodes found.", node_type);
        }
        return Ok(());
    }
    print_nodes(&nodes);
    Ok(())
}

fn print_nodes(nodes: &[Node]) {
    for node in nodes {
        let label = NodeView::from_node(node).label();
        match node.status() {
            Some(status) => println!("  {}  {} [{}]", node.id, label, status),
            None => println!("  {}  {}", node.id, label),
        }
    }
}

async fn cmd_show(
    repo: &SqliteGraphRepository,
    node_id: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let node = repo
        .get_node(node_id)
        .await?
        .ok_or_else(|| skillgraph_core::Error::NotFound(node_id.to_string()))?;
    let edges = repo.list_edges_for_node(node_id, None).await?;

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({ "node": node, "edges": edges }));
    }

    println!("{}: {}", node.node_type, NodeView::from_node(&node).label());
    println!("  ID: {}", node.id);
    for (key, value) in &node.properties {
        println!("  {}: {}", key, serde_json::to_string(value)?);
    }
    println!("  Created: {}", node.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Updated: {}", node.updated_at.format("%Y-%m-%d %H:%M:%S"));
    if !edges.is_empty() {
        println!("Edges:");
        for edge in &edges {
            println!("  {}", edge);
        }
    }
    Ok(())
}

async fn cmd_related(
    repo: Arc<SqliteGraphRepository>,
    node_id: &str,
    relationship: Option<Relationship>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let traversal = GraphTraversal::new(repo);
    let related = traversal.find_related(node_id, relationship).await?;
    if format == OutputFormat::Json {
        return print_json(&related);
    }

    if related.is_empty() {
        if !quiet {
            println!("No related nodes for {}.", node_id);
        }
        return Ok(());
    }
    print_nodes(&related);
    Ok(())
}

async fn cmd_dependents(
    repo: Arc<SqliteGraphRepository>,
    node_id: &str,
    depth: u32,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let traversal = GraphTraversal::new(repo);
    let dependents = traversal.find_dependents(node_id, depth).await?;
    if format == OutputFormat::Json {
        return print_json(&dependents);
    }

    if dependents.is_empty() {
        if !quiet {
            println!("No dependents of {} within {} hop(s).", node_id, depth);
        }
        return Ok(());
    }
    for id in &dependents {
        println!("  {}", id);
    }
    Ok(())
}

async fn cmd_export(
    repo: &SqliteGraphRepository,
    output: &Path,
    snapshot: bool,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    if snapshot {
        let snapshot = storage::write_snapshot(repo, output).await?;
        if format == OutputFormat::Json {
            return print_json(&snapshot.metadata);
        }
        if !quiet {
            println!(
                "Snapshot written to {} ({} nodes, {} edges)",
                output.display(),
                snapshot.metadata.node_count,
                snapshot.metadata.edge_count
            );
        }
        return Ok(());
    }

    let result = storage::export_to_jsonl(repo, output).await?;
    if format == OutputFormat::Json {
        return print_json(&result.metadata);
    }
    if !quiet {
        println!(
            "Exported {} nodes and {} edges to {}",
            result.metadata.node_count,
            result.metadata.edge_count,
            result.export_dir.display()
        );
        for file in &result.files_written {
            println!("  {}", file.display());
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(
    db: &Database,
    repo: &SqliteGraphRepository,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut all_ok = true;

    if !quiet {
        println!("Skillgraph Health Check");
        println!("=======================");
        println!();
    }

    match Config::config_path() {
        Ok(path) if path.exists() => {
            if !quiet {
                println!("[OK] Config file: {}", path.display());
            }
        }
        Ok(path) => {
            if !quiet {
                println!("[--] Config file: {} (using defaults)", path.display());
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    match db.health_check().await {
        Ok(()) => {
            if !quiet {
                println!("[OK] Database: Connected");
                println!("     Path: {}", db.path().display());
            }
            match db.migration_status().await {
                Ok(status) if status.needs_migration => {
                    all_ok = false;
                    if !quiet {
                        println!(
                            "[!!] Database: Migrations pending (v{} -> v{})",
                            status.current_version, status.target_version
                        );
                    }
                }
                Ok(status) => {
                    if !quiet {
                        println!("[OK] Database: Schema v{}", status.current_version);
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Database: Migration check failed - {}", e);
                    }
                }
            }
            if !quiet {
                let stats = repo.get_stats().await?;
                println!("     Nodes: {}  Edges: {}", stats.total_nodes, stats.total_edges);
            }
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Health check failed - {}", e);
            }
        }
    }

    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    if all_ok {
        Ok(())
    } else {
        Err(anyhow::anyhow!("health check failed"))
    }
}
