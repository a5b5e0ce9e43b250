use std::path::PathBuf;

/// Relying party identifier under which all credentials are scoped.
/// Constant per installation; stored in every record.
pub const RELYING_PARTY_ID: &str = "keywarden.local";
/// Provider identifier the resolver answers for.
pub const PROVIDER_ID: &str = "keywarden";
pub const PROTOCOL_VERSION: u32 = 1;

/// PBKDF2-HMAC-SHA256 iteration count for credential-bound key derivation.
pub const KDF_ITERATIONS: u32 = 100_000;

/// Upper bound on identifiers in a single resolve request.
pub const MAX_REQUEST_IDS: usize = 64;
/// Per-ceremony user-presence deadline.
pub const VERIFY_TIMEOUT_SECS: u64 = 30;
/// Default whole-request resolve deadline.
pub const RESOLVE_DEADLINE_SECS: u64 = 120;

pub const STORE_FILE_NAME: &str = "secrets.json";

#[derive(clap::Parser, Debug)]
#[command(name = "keywarden", version, about = "Hardware-key-gated secret storage")]
pub struct Config {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Path to the secret store file. Defaults to the per-user data directory.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    #[arg(long, default_value = "pinentry", global = true)]
    pub pinentry: String,
    /// Overall deadline for a resolve invocation, in seconds.
    #[arg(long, default_value_t = RESOLVE_DEADLINE_SECS, global = true)]
    pub deadline_secs: u64,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Store a secret, enrolling a new credential for it.
    Set {
        id: String,
        /// Human-readable label. Defaults to the id.
        #[arg(short, long)]
        label: Option<String>,
        /// Plaintext value. Read from stdin when omitted.
        value: Option<String>,
        /// Replace an existing secret without asking.
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Verify the credential and print one decrypted secret to stdout.
    #[command(visible_alias = "export")]
    Get { id: String },
    /// List stored secrets. Metadata only; never decrypts.
    List,
    /// Delete one secret.
    Delete {
        id: String,
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Delete every stored secret. Irreversible.
    Clear {
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Read one JSON resolve request from stdin, answer on stdout.
    Resolve,
}

impl Config {
    /// Resolve the store file path: explicit flag, else the XDG data dir.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.store {
            return Ok(path.clone());
        }
        let dirs = directories::ProjectDirs::from("", "", "keywarden")
            .ok_or_else(|| anyhow::anyhow!("cannot determine XDG data dir"))?;
        Ok(dirs.data_dir().join(STORE_FILE_NAME))
    }
}
