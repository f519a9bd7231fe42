//! CLI commands for butterfly-islands

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::access::AccessModel;
use crate::config::DetectorConfig;
use crate::detector::RoutingIslandDetector;
use crate::finding::FindingRecord;
use crate::ingest::load_pbf;
use crate::network::Bounds;

#[derive(Parser)]
#[command(name = "butterfly-islands")]
#[command(about = "Find routing islands and lonely ways in OSM extracts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check an extract for routing islands, lonely ways and stub ends
    Check {
        /// Input OSM PBF file
        #[arg(short, long)]
        input: PathBuf,

        /// Loaded area as min_lat,min_lon,max_lat,max_lon; nodes outside it
        /// connect to the rest of the network
        #[arg(long)]
        bbox: String,

        /// Detector configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the fixpoint iteration cap
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Only analyse these transport modes (repeatable)
        #[arg(short, long)]
        mode: Vec<String>,

        /// Skip the stub end check
        #[arg(long)]
        no_stub_ends: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the transport mode hierarchy
    Modes {
        /// Family to list (land, water, rail or all)
        #[arg(long, default_value = "all")]
        family: String,
    },
}

/// Reject mode keys the access model does not know, suggesting the closest
pub fn validate_modes(model: &AccessModel, modes: &[String]) -> Result<(), butterfly_common::Error> {
    let keys = model.keys();
    for mode in modes {
        if model.get(mode).is_none() {
            return Err(butterfly_common::Error::UnknownMode {
                mode: mode.clone(),
                suggestion: butterfly_common::suggest_correction(mode, &keys),
            });
        }
    }
    Ok(())
}

/// Indented listing of the modes in `family`
pub fn mode_tree(model: &AccessModel, family: &str) -> Result<Vec<String>, butterfly_common::Error> {
    let families = ["all", "land", "water", "rail"];
    let Some(root) = model.get(family).filter(|_| families.contains(&family)) else {
        return Err(butterfly_common::Error::InvalidInput(
            match butterfly_common::suggest_correction(family, &families) {
                Some(s) => format!("unknown family '{family}', did you mean '{s}'?"),
                None => format!("unknown family '{family}'"),
            },
        ));
    };

    Ok(model
        .inheritance_tree(root)
        .into_iter()
        .map(|id| {
            let key = model.key(id);
            format!("{}{}", "  ".repeat(model.depth(key)), key)
        })
        .collect())
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Check {
                input,
                bbox,
                config,
                max_iterations,
                mode,
                no_stub_ends,
                format,
            } => {
                let bounds: Bounds = bbox.parse()?;
                let model = AccessModel::standard();
                validate_modes(&model, &mode)?;

                let mut detector_config = match &config {
                    Some(path) => DetectorConfig::load(path)
                        .with_context(|| format!("Failed to load config {}", path.display()))?,
                    None => DetectorConfig::default(),
                };
                if let Some(max_iterations) = max_iterations {
                    detector_config = detector_config.with_max_iterations(max_iterations);
                }

                eprintln!("🦋 Checking {}", input.display());
                let start = Instant::now();
                let network = load_pbf(&input, &[bounds])
                    .with_context(|| format!("Failed to load {}", input.display()))?;
                eprintln!(
                    "  ✓ Loaded {} nodes, {} ways, {} restrictions",
                    network.n_vertices(),
                    network.n_edges(),
                    network.n_relations()
                );

                let mut detector = RoutingIslandDetector::new(&model, &detector_config)
                    .with_stub_ends(!no_stub_ends);
                if !mode.is_empty() {
                    detector = detector.with_modes(mode);
                }
                let findings = detector.run(&network);
                eprintln!(
                    "  ✓ {} findings in {:.2}s",
                    findings.len(),
                    start.elapsed().as_secs_f64()
                );

                let records: Vec<FindingRecord> =
                    findings.iter().map(|f| f.to_record(&network)).collect();
                match format {
                    OutputFormat::Text => {
                        for record in &records {
                            println!("{record}");
                        }
                    }
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                }
            }

            Commands::Modes { family } => {
                let model = AccessModel::standard();
                for line in mode_tree(&model, &family)? {
                    println!("{line}");
                }
            }
        }

        Ok(())
    }
}
