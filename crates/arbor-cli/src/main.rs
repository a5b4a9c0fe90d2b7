//! arbor CLI - printable procedural trees
//!
//! Generates a tree from flags or a TOML/JSON config, unions it into one
//! mesh and writes binary STL.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arbor::gen::foliage::Archetype;
use arbor::gen::species::{
    age_names, effective_max_depth, lookup_age, lookup_species, species_names,
};
use arbor::{AssemblyWorker, GeneratorMode, ManifoldKernel, Request, Response, TreeParams};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Procedural tree generator for 3D printing", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a tree and write it as binary STL
    Generate {
        #[command(flatten)]
        tree: TreeArgs,
        /// Output STL file
        #[arg(short, long, default_value = "tree.stl")]
        output: PathBuf,
        /// Uniform scale applied to positions on export
        #[arg(long)]
        scale: Option<f64>,
        /// Print ratio denominator, e.g. 200 for 1:200
        #[arg(long, conflicts_with = "scale")]
        ratio: Option<f64>,
        /// Also write the effective parameters as TOML
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Print the branch skeleton and foliage clusters as JSON
    Skeleton {
        #[command(flatten)]
        tree: TreeArgs,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// List species presets and age categories
    Species,
}

#[derive(Args)]
struct TreeArgs {
    /// TOML or JSON parameter file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Tree height in model units
    #[arg(long)]
    height: Option<f64>,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Species preset
    #[arg(long)]
    species: Option<String>,
    /// Age category
    #[arg(long)]
    age: Option<String>,
    /// Skeleton generator
    #[arg(long, value_enum)]
    mode: Option<Mode>,
    /// Smallest printable radius
    #[arg(long)]
    min_radius: Option<f64>,
    /// Recursion depth override
    #[arg(long)]
    max_depth: Option<u32>,
    /// Crown width multiplier
    #[arg(long)]
    crown_width: Option<f64>,
    /// Trunk height as a fraction of total height
    #[arg(long)]
    trunk_height: Option<f64>,
    /// Crown density multiplier
    #[arg(long)]
    crown_density: Option<f64>,
    /// Model units to output units
    #[arg(long)]
    model_scale: Option<f64>,
    /// Add foliage clusters
    #[arg(long)]
    foliage: bool,
    /// Foliage archetype (conical, spherical, columnar, umbrella, irregular)
    #[arg(long, requires = "foliage")]
    foliage_style: Option<String>,
    /// Fraction of branch tips that carry a cluster
    #[arg(long, requires = "foliage")]
    foliage_density: Option<f64>,
    /// Cluster size multiplier
    #[arg(long, requires = "foliage")]
    foliage_size: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Realistic,
    Lsystem,
    Organic,
    Connected,
    Abstract,
}

impl From<Mode> for GeneratorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Realistic => GeneratorMode::Realistic,
            Mode::Lsystem => GeneratorMode::LSystem,
            Mode::Organic => GeneratorMode::Organic,
            Mode::Connected => GeneratorMode::Connected,
            Mode::Abstract => GeneratorMode::Abstract,
        }
    }
}

impl TreeArgs {
    fn params(&self) -> Result<TreeParams> {
        let mut p = match &self.config {
            Some(path) => TreeParams::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TreeParams::default(),
        };
        if let Some(v) = self.height {
            p.height = v;
        }
        if let Some(v) = self.seed {
            p.seed = v;
        }
        if let Some(v) = &self.species {
            p.species = v.clone();
        }
        if let Some(v) = &self.age {
            p.age = v.clone();
        }
        if let Some(v) = self.mode {
            p.mode = v.into();
        }
        if let Some(v) = self.min_radius {
            p.min_radius = v;
        }
        if let Some(v) = self.max_depth {
            p.max_depth = Some(v);
        }
        if let Some(v) = self.crown_width {
            p.crown_width = v;
        }
        if let Some(v) = self.trunk_height {
            p.trunk_height = Some(v);
        }
        if let Some(v) = self.crown_density {
            p.crown_density = Some(v);
        }
        if let Some(v) = self.model_scale {
            p.model_scale = v;
        }
        if self.foliage {
            let mut foliage = p.foliage.unwrap_or_default();
            if let Some(name) = &self.foliage_style {
                match Archetype::from_name(name) {
                    Some(style) => foliage.style = Some(style),
                    None => bail!("unknown foliage style: {}", name),
                }
            }
            if let Some(v) = self.foliage_density {
                foliage.density = v;
            }
            if let Some(v) = self.foliage_size {
                foliage.size = v;
            }
            p.foliage = Some(foliage);
        }
        p.validate()?;
        Ok(p)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            tree,
            output,
            scale,
            ratio,
            save_config,
        } => {
            let params = tree.params()?;
            if let Some(path) = save_config {
                std::fs::write(&path, params.to_toml_string()?)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            let scale = scale.or(ratio.map(arbor::stl::export_scale));
            generate(params, scale, &output).await?;
        }
        Commands::Skeleton { tree, pretty } => {
            let params = tree.params()?;
            print_skeleton(&params, pretty)?;
        }
        Commands::Species => list_species(),
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check(response: Response) -> Result<Response> {
    match response {
        Response::Error {
            tag,
            stage,
            message,
        } => bail!("{} failed ({:?}): {}", stage, tag, message),
        other => Ok(other),
    }
}

async fn generate(params: TreeParams, scale: Option<f64>, output: &Path) -> Result<()> {
    let height = params.height;
    let worker = AssemblyWorker::spawn::<ManifoldKernel>().context("starting assembly worker")?;

    let triangles = match check(worker.request(Request::Generate(params)).await)? {
        Response::Mesh { indices, .. } => indices.len() / 3,
        other => bail!("unexpected response: {:?}", other),
    };
    let bytes = match check(worker.request(Request::Export { scale }).await)? {
        Response::Exported { bytes } => bytes,
        other => bail!("unexpected response: {:?}", other),
    };
    worker.shutdown();

    std::fs::write(output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(
        triangles,
        bytes = bytes.len(),
        printed_height = height * scale.unwrap_or(1.0),
        "wrote {}",
        output.display()
    );
    println!("Exported STL to {}", output.display());
    Ok(())
}

fn print_skeleton(params: &TreeParams, pretty: bool) -> Result<()> {
    let segments = params.skeleton();
    let foliage = params.foliage();
    let doc = json!({
        "mode": params.mode,
        "species": params.species,
        "segments": segments,
        "foliage": foliage,
    });
    let text = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    println!("{}", text);
    Ok(())
}

fn list_species() {
    let mature = lookup_age("mature");
    println!("Species:");
    for name in species_names() {
        let s = lookup_species(name);
        println!(
            "  {:<8} {:<10} trunk {:>4.0}%  depth {}",
            name,
            format!("{:?}", s.crown_shape).to_lowercase(),
            s.trunk_height_ratio * 100.0,
            effective_max_depth(&s, &mature),
        );
    }
    println!("Ages:");
    for name in age_names() {
        let a = lookup_age(name);
        println!(
            "  {:<8} thickness x{:.2}  density x{:.2}  depth {:+}",
            name, a.trunk_thickness, a.branch_density, a.depth_adjust
        );
    }
}
