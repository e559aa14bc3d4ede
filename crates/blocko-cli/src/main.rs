use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blocko::{Chain, ChainConfig, KeyKind};

mod render;

/// BlockO: a signed, hash-linked chain where each block names its successor's author.
#[derive(Parser, Debug)]
#[command(name = "blocko", version)]
struct Cli {
    /// Chain database file.
    #[arg(long, global = true, default_value = "BlockO.chain")]
    database: PathBuf,

    /// Private key file written by `new-chain` and read by `add-block`.
    #[arg(long, global = true, default_value = "BlockO.key")]
    private_key: PathBuf,

    /// Public key file written by `new-chain`.
    #[arg(long, global = true, default_value = "BlockO.pub")]
    public_key: PathBuf,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new chain, overwriting the database and key files.
    NewChain {
        /// Chain name, bound into the genesis block.
        name: String,
    },
    /// Generate a keypair and write `<NAME>.pub` and `<NAME>.key`.
    NewKey {
        name: String,
    },
    /// Append a block extending STEM_ID.
    AddBlock {
        /// Id of the block to extend.
        stem_id: u32,
        /// Block payload.
        data: String,
        /// Private key to sign with (defaults to --private-key).
        #[arg(long)]
        key: Option<PathBuf>,
        /// Public key file naming the next owner (defaults to the signer).
        #[arg(long)]
        owner_key: Option<PathBuf>,
    },
    /// Print every block.
    PrintChain {
        #[arg(long)]
        json: bool,
    },
    /// Print one block.
    PrintBlock {
        id: u32,
        #[arg(long)]
        json: bool,
    },
    /// Re-validate the database and report rejected blocks.
    Verify,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut chain = Chain::new(ChainConfig::default());

    match &cli.command {
        Commands::NewChain { name } => handle_new_chain(&cli, &mut chain, name),
        Commands::NewKey { name } => handle_new_key(&mut chain, name),
        Commands::AddBlock {
            stem_id,
            data,
            key,
            owner_key,
        } => handle_add_block(
            &cli,
            &mut chain,
            *stem_id,
            data,
            key.as_deref(),
            owner_key.as_deref(),
        ),
        Commands::PrintChain { json } => handle_print_chain(&cli, &mut chain, *json),
        Commands::PrintBlock { id, json } => handle_print_block(&cli, &mut chain, *id, *json),
        Commands::Verify => handle_verify(&cli, &mut chain),
    }
}

fn handle_new_chain(cli: &Cli, chain: &mut Chain, name: &str) -> Result<()> {
    println!(
        "This will generate a new chain and overwrite {}.",
        cli.database.display()
    );
    if !confirm(cli.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    chain
        .new_chain(name)
        .context("failed to generate new chain")?;
    chain
        .export_chain(&cli.database)
        .with_context(|| format!("failed to export chain to {}", cli.database.display()))?;
    chain
        .export_keys(&cli.public_key, Some(cli.private_key.as_path()))
        .context("failed to export keys")?;

    println!(
        "Chain \"{}\" created. Keys written to {} and {}.",
        name,
        cli.public_key.display(),
        cli.private_key.display()
    );
    Ok(())
}

fn handle_new_key(chain: &mut Chain, name: &str) -> Result<()> {
    let keypair = chain.new_keypair().context("failed to generate keypair")?;
    chain.set_active_keypair(keypair);

    let public_path = PathBuf::from(format!("{}.pub", name));
    let private_path = PathBuf::from(format!("{}.key", name));
    chain
        .export_keys(&public_path, Some(private_path.as_path()))
        .context("failed to write new keypair")?;

    println!(
        "Keypair written to {} and {}.",
        public_path.display(),
        private_path.display()
    );
    Ok(())
}

fn handle_add_block(
    cli: &Cli,
    chain: &mut Chain,
    stem_id: u32,
    data: &str,
    key: Option<&Path>,
    owner_key: Option<&Path>,
) -> Result<()> {
    import_database(chain, &cli.database)?;

    let key = key.unwrap_or(cli.private_key.as_path());
    chain
        .import_key_file(key, KeyKind::Private)
        .with_context(|| format!("failed to import private key {}", key.display()))?;

    let owner = match owner_key {
        Some(path) => match load_owner_key(cli, chain, path)? {
            Some(owner) => owner,
            None => {
                println!("Aborted.");
                return Ok(());
            }
        },
        None => Vec::new(),
    };

    let stem = chain
        .find_block(stem_id)
        .cloned()
        .with_context(|| format!("stem block {} does not exist", stem_id))?;
    let block = chain
        .create_block(&stem, Some(owner.as_slice()), data.as_bytes())
        .context("failed to add new block to the chain")?;
    println!("Block [{}] added to \"{}\".", block.id, chain.name());

    chain
        .export_chain(&cli.database)
        .with_context(|| format!("failed to update {}", cli.database.display()))?;
    Ok(())
}

/// Read the next owner's key file, asking for confirmation when it looks
/// wrong. `None` means the user declined.
fn load_owner_key(cli: &Cli, chain: &Chain, path: &Path) -> Result<Option<Vec<u8>>> {
    let owner = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), "failed to read owner key: {}", e);
            Vec::new()
        }
    };

    if owner.is_empty() {
        println!("The owner key is empty; the signer will keep ownership. Continue?");
        if !confirm(cli.yes)? {
            return Ok(None);
        }
    }
    if chain.config().owner_key_is_suspicious(&owner) {
        println!(
            "Warning: the owner key is {} bytes, larger than normal, and may be invalid. Continue?",
            owner.len()
        );
        if !confirm(cli.yes)? {
            return Ok(None);
        }
    }
    Ok(Some(owner))
}

fn handle_print_chain(cli: &Cli, chain: &mut Chain, json: bool) -> Result<()> {
    import_database(chain, &cli.database)?;

    if json {
        let doc = render::ChainView {
            name: chain.name(),
            blocks: chain
                .blocks()
                .iter()
                .map(|b| render::BlockView::new(chain.provider(), b))
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        for block in chain.blocks() {
            print!("{}", render::render_block(chain.provider(), block));
        }
    }
    Ok(())
}

fn handle_print_block(cli: &Cli, chain: &mut Chain, id: u32, json: bool) -> Result<()> {
    import_database(chain, &cli.database)?;

    let Some(block) = chain.find_block(id) else {
        bail!("could not find block {}", id);
    };
    if json {
        let value = render::BlockView::new(chain.provider(), block);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", render::render_block(chain.provider(), block));
    }
    Ok(())
}

fn handle_verify(cli: &Cli, chain: &mut Chain) -> Result<()> {
    let report = import_database(chain, &cli.database)?;

    for skipped in &report.skipped {
        println!("Block [{}] rejected: {}", skipped.id, skipped.reason.reason());
    }
    if let Some(e) = &report.truncated {
        println!("Import stopped early: {}", e);
    }
    chain
        .verify_all()
        .context("accepted blocks failed re-validation")?;

    println!(
        "{} of {} blocks valid in \"{}\".",
        report.accepted,
        report.declared,
        chain.name()
    );
    if !report.is_clean() {
        bail!(
            "{} block(s) rejected",
            report.declared.saturating_sub(report.accepted as u64)
        );
    }
    Ok(())
}

fn import_database(chain: &mut Chain, path: &Path) -> Result<blocko::ImportReport> {
    let report = chain
        .import_chain(path)
        .with_context(|| format!("failed to import chain database {}", path.display()))?;
    info!(
        accepted = report.accepted,
        declared = report.declared,
        "loaded {}",
        path.display()
    );
    Ok(report)
}

/// Ask for Y or N on stdin. End of input counts as no.
fn confirm(assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("Press Y or N: ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" => return Ok(true),
            "N" | "NO" => return Ok(false),
            _ => continue,
        }
    }
}
