//! camvault: offline operator CLI
//!
//! Works directly against the key files and artifact directory named in the
//! config; the daemon does not need to be running.
//!
//! Commands:
//!   keygen                       - load the keypair, creating it on first use
//!   public-key [--output <file>] - export the SPKI PEM public key
//!   list                         - list stored artifacts with their timestamps
//!   encrypt <file>               - encrypt a local file into the store
//!   decrypt <id> --output <file> - decrypt a stored artifact
//!   config show                  - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use camvault_core::config::VaultConfig;
use camvault_core::types::UploadMeta;
use camvault_crypto::{KeyOrigin, KeyProvider, Keypair};
use camvault_storage::ArtifactStore;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "camvault",
    version,
    about = "camvault encrypted capture store client",
    long_about = "camvault: manage the RSA keypair and encrypted captures of a camvault store"
)]
struct Cli {
    /// Path to camvault.toml configuration file
    #[arg(long, short = 'c', env = "CAMVAULT_CONFIG", default_value = "/etc/camvault/config.toml")]
    config: PathBuf,

    /// Artifact directory (overrides storage.dir)
    #[arg(long, env = "CAMVAULT_STORAGE_DIR", global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the RSA keypair, generating and persisting it if absent
    Keygen,

    /// Print or save the public key (SPKI PEM)
    #[command(name = "public-key")]
    PublicKey {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List stored artifacts, oldest first
    List,

    /// Encrypt a local file into the store
    Encrypt {
        /// File to encrypt
        file: PathBuf,
        /// Capture time recorded in the metadata sidecar
        #[arg(long, short = 't')]
        timestamp: Option<String>,
    },

    /// Decrypt a stored artifact to a local file
    Decrypt {
        /// Artifact id (e.g. image_1714564800123456-0a1b2c3d.enc)
        id: String,
        /// Destination file
        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = VaultConfig::load(&cli.config)?;
    if let Some(dir) = cli.storage_dir {
        config.storage.dir = dir;
    }

    match cli.command {
        Commands::Keygen => cmd_keygen(&config),
        Commands::PublicKey { output } => cmd_public_key(&config, output.as_deref()),
        Commands::List => cmd_list(&config),
        Commands::Encrypt { file, timestamp } => cmd_encrypt(&config, &file, timestamp),
        Commands::Decrypt { id, output } => cmd_decrypt(&config, &id, &output),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_env("CAMVAULT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Load the keypair, showing a spinner while a first-run key is generated.
fn load_keys(config: &VaultConfig) -> Result<Keypair> {
    let provider = KeyProvider::from_config(config);
    let pb = make_spinner("keys");
    pb.set_message(format!("{}", provider.private_path().display()));
    let keys = provider.load_or_create();
    pb.finish_and_clear();
    keys.with_context(|| format!("loading keypair from {}", provider.private_path().display()))
}

/// Load the existing keypair only; never generate one.
fn load_existing_keys(config: &VaultConfig) -> Result<Keypair> {
    let provider = KeyProvider::from_config(config);
    provider
        .load()
        .with_context(|| format!("loading keypair from {}", provider.private_path().display()))
}

fn open_store(config: &VaultConfig) -> Result<ArtifactStore> {
    ArtifactStore::open(&config.storage.dir)
        .with_context(|| format!("opening store {}", config.storage.dir.display()))
}

// ── `camvault keygen` ─────────────────────────────────────────────────────────

fn cmd_keygen(config: &VaultConfig) -> Result<()> {
    let keys = load_keys(config)?;
    let verb = match keys.origin() {
        KeyOrigin::Generated => "generated",
        KeyOrigin::Loaded => "existing",
    };
    println!("RSA-{} keypair ({verb})", keys.modulus_bits());
    println!("  private: {}", config.private_key_path().display());
    println!("  public:  {}", config.public_key_path().display());
    Ok(())
}

// ── `camvault public-key` ─────────────────────────────────────────────────────

fn cmd_public_key(config: &VaultConfig, output: Option<&Path>) -> Result<()> {
    let keys = load_keys(config)?;
    match output {
        Some(path) => {
            std::fs::write(path, keys.public_key_pem())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("public key written to {}", path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(keys.public_key_pem())
                .context("writing public key to stdout")?;
        }
    }
    Ok(())
}

// ── `camvault list` ───────────────────────────────────────────────────────────

fn cmd_list(config: &VaultConfig) -> Result<()> {
    let store = open_store(config)?;
    let ids = store.list()?;
    if ids.is_empty() {
        println!("no artifacts in {}", store.root().display());
        return Ok(());
    }

    println!("{:<44} {:<12} {}", "ID", "RECEIVED", "CAPTURED");
    for id in &ids {
        let (received, captured) = match store.metadata(id.as_str())? {
            Some(meta) => (meta.server_timestamp.to_string(), meta.original_timestamp),
            None => ("-".to_string(), "(no metadata)".to_string()),
        };
        println!("{:<44} {:<12} {}", id.as_str(), received, captured);
    }
    println!("\n{} artifact(s)", ids.len());
    Ok(())
}

// ── `camvault encrypt` ────────────────────────────────────────────────────────

fn cmd_encrypt(config: &VaultConfig, file: &Path, timestamp: Option<String>) -> Result<()> {
    let plaintext =
        std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let keys = load_keys(config)?;
    let store = open_store(config)?;

    let blob = camvault_crypto::encrypt(&plaintext, keys.public_key())?;
    let upload = UploadMeta {
        original_timestamp: timestamp.unwrap_or_default(),
    };
    let id = store.store(&blob, &upload)?;

    println!(
        "{} → {} ({} bytes → {} bytes)",
        file.display(),
        id,
        plaintext.len(),
        blob.len()
    );
    Ok(())
}

// ── `camvault decrypt` ────────────────────────────────────────────────────────

fn cmd_decrypt(config: &VaultConfig, id: &str, output: &Path) -> Result<()> {
    let store = open_store(config)?;
    let blob = store.retrieve(id)?;
    // A fresh keypair could never decrypt an existing artifact
    let keys = load_existing_keys(config)?;

    let plaintext = camvault_crypto::decrypt(&blob, keys.private_key())
        .with_context(|| format!("decrypting {id}"))?;
    std::fs::write(output, &plaintext)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{id} → {} ({} bytes)", output.display(), plaintext.len());
    Ok(())
}

// ── `camvault config show` ────────────────────────────────────────────────────

fn cmd_config_show(config: &VaultConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
