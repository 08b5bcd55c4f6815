use anyhow::Context;
use clap::Parser;
use neurmill::{
    build_engine, init_logging, Config, Feature, Operation, ToolFilter, ToolId, ToolMaterial,
    ToolType,
};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "neurmill")]
#[command(about = "CNC tool recommendation and speed/feed adjustment")]
#[command(version)]
struct CliArgs {
    /// Configuration file (.toml or .json); defaults to the platform config dir
    #[arg(long, global = true, env = "NEURMILL_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// List catalog tools, optionally filtered
    Tools {
        /// Tool type, e.g. end_mill, ball_end_mill, drill
        #[arg(long = "type")]
        tool_type: Option<ToolType>,
        /// Tool material: hss, carbide, coated_carbide
        #[arg(long)]
        material: Option<ToolMaterial>,
        /// Minimum diameter in mm
        #[arg(long)]
        min_diameter: Option<f64>,
        /// Maximum diameter in mm
        #[arg(long)]
        max_diameter: Option<f64>,
        /// Manufacturer name (substring, case-insensitive)
        #[arg(long)]
        manufacturer: Option<String>,
    },

    /// List catalog machines
    Machines,

    /// List catalog materials
    Materials,

    /// Compute spindle speed and feed for one tool
    Speeds {
        #[arg(long)]
        tool: String,
        #[arg(long)]
        machine: String,
        /// Material id or name
        #[arg(long)]
        material: String,
        /// roughing, semi-finishing, finishing or drilling
        #[arg(long, default_value = "semi-finishing")]
        operation: Operation,
        /// Tool wear score, 0 (fresh) to 10 (worn out)
        #[arg(long)]
        wear: Option<f64>,
    },

    /// Recommend tools for the features of a part
    Recommend {
        /// JSON array of features, or `-` for stdin
        #[arg(long, value_name = "PATH")]
        features: PathBuf,
        #[arg(long)]
        machine: String,
        /// Material id or name
        #[arg(long)]
        material: String,
        /// Identifier of the analysed CAD file
        #[arg(long, default_value = "")]
        file_id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

fn read_features(path: &Path) -> anyhow::Result<Vec<Feature>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read features from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read features from {}", path.display()))?
    };
    serde_json::from_str(&content).context("features must be a JSON array of holes, pockets and slots")
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = Config::load_or_default(args.config.as_deref()).context("failed to load configuration")?;
    init_logging(&config.logging.level, args.json_logs || config.logging.json)?;

    let engine = build_engine(&config)?;

    match args.command {
        SubCommand::Tools {
            tool_type,
            material,
            min_diameter,
            max_diameter,
            manufacturer,
        } => {
            let filter = ToolFilter {
                tool_type,
                material,
                min_diameter,
                max_diameter,
                manufacturer,
            };
            print_json(&engine.filter_tools(&filter))
        }
        SubCommand::Machines => print_json(&engine.list_machines()),
        SubCommand::Materials => print_json(&engine.list_materials()),
        SubCommand::Speeds {
            tool,
            machine,
            material,
            operation,
            wear,
        } => {
            let result = engine.calculate_speeds_feeds(
                &ToolId(tool),
                &machine,
                &material,
                operation,
                wear,
            )?;
            for warning in &result.baseline.warnings {
                tracing::warn!("{}", warning);
            }
            print_json(&result)
        }
        SubCommand::Recommend {
            features,
            machine,
            material,
            file_id,
        } => {
            let features = read_features(&features)?;
            let set = engine.recommend_tools(&machine, &material, &file_id, &features)?;
            print_json(&set.snapshot())
        }
    }
}
