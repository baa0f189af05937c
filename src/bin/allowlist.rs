//! Allowlist authoring CLI.
//!
//! Builds the Merkle root a vault manager stores and the per-entry proofs
//! submitted with each managed call.
//!
//! ```bash
//! allowlist root  --config demos/uniswap_v3_manager.toml
//! allowlist build --config demos/uniswap_v3_manager.toml --out artifact.json
//! allowlist prove --config demos/uniswap_v3_manager.toml --label collect
//! allowlist verify --leaf 0x… --root 0x… --proof 0x… --proof 0x…
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use vault_allowlist::artifact::{prove_label, PolicyArtifact};
use vault_allowlist::config::{HasherKind, PolicyConfig};

#[derive(Parser)]
#[command(name = "allowlist")]
#[command(about = "Build and prove vault call allowlist commitments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Merkle root of a policy file
    Root {
        #[arg(long)]
        config: PathBuf,
    },

    /// Write the root and every entry's proof as JSON
    Build {
        #[arg(long)]
        config: PathBuf,
        /// Output file (stdout when absent)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the proof for one labelled entry
    Prove {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        label: String,
    },

    /// Check a proof against a root; exits 1 when it does not verify
    Verify {
        #[arg(long)]
        leaf: B256,
        #[arg(long)]
        root: B256,
        /// Sibling digests, leaf level first (repeat the flag)
        #[arg(long = "proof")]
        proof: Vec<B256>,
        #[arg(long, default_value = "keccak256")]
        hasher: HasherKind,
    },
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Root { config } => {
            let artifact = build_artifact(&config)?;
            println!("{}", artifact.root);
        }
        Commands::Build { config, out } => {
            let artifact = build_artifact(&config)?;
            match out {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    artifact.write_json(BufWriter::new(file))?;
                    info!("wrote {} entries to {}", artifact.entries.len(), path.display());
                }
                None => artifact.write_json(std::io::stdout().lock())?,
            }
        }
        Commands::Prove { config, label } => {
            let policy = load_config(&config)?;
            let proof = prove_label(&policy, &label)
                .with_context(|| format!("proving `{label}` from {}", config.display()))?;
            info!("{} proof elements against root {}", proof.proof.len(), proof.root);
            println!("{}", serde_json::to_string_pretty(&proof)?);
        }
        Commands::Verify {
            leaf,
            root,
            proof,
            hasher,
        } => {
            let valid = hasher.verify(leaf, &proof, root);
            println!("{valid}");
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_config(path: &Path) -> Result<PolicyConfig> {
    let config = PolicyConfig::load(path)
        .with_context(|| format!("loading policy from {}", path.display()))?;
    info!(
        "policy {} v{}: {} actions, hasher {}",
        config.policy.name,
        config.policy.version,
        config.actions.len(),
        config.policy.hasher
    );
    Ok(config)
}

fn build_artifact(path: &Path) -> Result<PolicyArtifact> {
    let config = load_config(path)?;
    let artifact = PolicyArtifact::from_config(&config)?;
    info!("root {} (depth {})", artifact.root, artifact.depth);
    Ok(artifact)
}
