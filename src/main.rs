use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use taskgraph_rs::engine::{execute, Environment, ExecutionContext, Graph};
use taskgraph_rs::taskgraph::demos::register_demos;
use taskgraph_rs::taskgraph::render::{print_graph, to_dot};
use taskgraph_rs::taskgraph::{find_graph, GraphRegistry, PipelineLoader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the pipelines document
    #[arg(long, global = true, default_value = "pipelines.yml")]
    pipelines: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the graphs defined by the pipelines document
    List,
    /// Print a graph's nodes and dependencies
    Print {
        /// Name of the graph
        name: String,

        /// Only list node names and their dependencies
        #[arg(long)]
        brief: bool,
    },
    /// Render a graph as Graphviz DOT
    Graphviz {
        /// Name of the graph
        name: String,

        /// Write the DOT source to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Execute a graph
    Execute {
        /// Name of the graph
        name: String,

        /// YAML file with environment arguments
        #[arg(short, long)]
        env: Option<PathBuf>,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_graphs(path: &Path) -> anyhow::Result<Vec<Graph>> {
    let mut registry = GraphRegistry::new();
    register_demos(&mut registry);

    let graphs = PipelineLoader::new()
        .load_graphs(path, &registry)
        .with_context(|| format!("loading pipelines from {}", path.display()))?;
    Ok(graphs)
}

fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let graphs = load_graphs(&args.pipelines)?;

    match args.command {
        Commands::List => {
            for graph in &graphs {
                println!("Graph: {}", graph.name());
            }
        }
        Commands::Print { name, brief } => {
            let graph = find_graph(&graphs, &name)?;
            print!("{}", print_graph(graph, !brief));
        }
        Commands::Graphviz { name, output } => {
            let graph = find_graph(&graphs, &name)?;
            let dot = to_dot(graph);
            match output {
                Some(path) => {
                    std::fs::write(&path, dot)
                        .with_context(|| format!("writing {}", path.display()))?;
                    log::info!("Wrote {}", path.display());
                }
                None => print!("{}", dot),
            }
        }
        Commands::Execute { name, env, json } => {
            let graph = find_graph(&graphs, &name)?;
            let environment = match env {
                Some(path) => Environment::load(&path)
                    .with_context(|| format!("loading environment from {}", path.display()))?,
                None => Environment::empty(),
            };

            let context = ExecutionContext::new().with_tag("graph", graph.name());
            let result = execute(&context, graph, &environment);

            if json {
                println!("{}", serde_json::to_string_pretty(&result.to_json()?)?);
            } else {
                print!("{}", result.summary());
            }

            if !result.success() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
