use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use nodeconstraint_rs::constraint::{evaluate, parse, ConstraintLoader, ConstraintRegistry};
use serde_json::json;

const CATALOG_ENV: &str = "NODECONSTRAINT_CATALOG";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse an expression and print its canonical form
    Parse {
        /// Path to the constraint catalog (defaults to $NODECONSTRAINT_CATALOG)
        #[arg(short, long)]
        catalog: Option<String>,

        /// The constraint expression
        #[arg(short, long)]
        expr: String,
    },
    /// Evaluate an expression against a node's attributes
    Eval {
        /// Path to the constraint catalog (defaults to $NODECONSTRAINT_CATALOG)
        #[arg(short, long)]
        catalog: Option<String>,

        /// The constraint expression
        #[arg(short, long)]
        expr: String,

        /// Path to the node attribute file
        #[arg(short, long)]
        node: String,
    },
}

fn load_registry(loader: &ConstraintLoader, catalog: Option<String>) -> Result<ConstraintRegistry> {
    let path = match catalog {
        Some(path) => path,
        None => std::env::var(CATALOG_ENV)
            .with_context(|| format!("no --catalog given and {} is not set", CATALOG_ENV))?,
    };
    loader
        .load_catalog(&path)
        .with_context(|| format!("failed to load constraint catalog '{}'", path))
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = ConstraintLoader::new();

    match args.command {
        Commands::Parse { catalog, expr } => {
            let registry = load_registry(&loader, catalog)?;
            match parse(&expr, &registry)? {
                Some(tree) => println!("{}", tree),
                None => log::info!("Expression is empty"),
            }
        }
        Commands::Eval {
            catalog,
            expr,
            node,
        } => {
            let registry = load_registry(&loader, catalog)?;
            let attributes = loader
                .load_node(&node, &registry)
                .with_context(|| format!("failed to load node attributes '{}'", node))?;
            log::debug!("Node attributes: {:?}", attributes);

            let tree = parse(&expr, &registry)?.unwrap_or_default();
            let matches = evaluate(&tree, &attributes)?;
            let output = json!({
                "expression": tree.to_string(),
                "matches": matches,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
