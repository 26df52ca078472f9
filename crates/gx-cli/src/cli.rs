use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gx",
    about = "GX: expiring key-value storage and crypto helpers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding durable storage (default: .gx)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, default_value = "durable")]
    pub scope: ScopeArg,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ScopeArg {
    Durable,
    Session,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a value (parsed as JSON, otherwise kept as a string)
    Set(SetArgs),
    /// Print a stored value
    Get(GetArgs),
    /// Remove one or more keys
    Rm(RmArgs),
    /// Remove every key
    Clear,
    /// Show remaining capacity
    Space(SpaceArgs),
    /// Drop every expired entry
    Purge,
    /// Report the kind of a JSON value
    Type(TypeArgs),
    /// Hash text
    Hash(HashArgs),
    /// Print random bytes as hex
    Random(RandomArgs),
    /// Generate an AES key and IV
    Keygen(KeygenArgs),
    /// Encrypt text with AES-GCM
    Encrypt(EncryptArgs),
    /// Decrypt hex ciphertext with AES-GCM
    Decrypt(DecryptArgs),
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
    /// Expire after this many milliseconds
    #[arg(long, conflicts_with = "at")]
    pub ttl: Option<u64>,
    /// Expire at this epoch millisecond
    #[arg(long)]
    pub at: Option<u64>,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
}

#[derive(Args)]
pub struct RmArgs {
    #[arg(required = true)]
    pub keys: Vec<String>,
}

#[derive(Args)]
pub struct SpaceArgs {
    /// Warning threshold in bytes (defaults to the configured one)
    #[arg(long)]
    pub threshold: Option<usize>,
    #[arg(long)]
    pub warn: bool,
}

#[derive(Args)]
pub struct TypeArgs {
    pub value: String,
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct HashArgs {
    pub data: String,
    #[arg(short, long, default_value = "SHA-256")]
    pub algorithm: String,
}

#[derive(Args)]
pub struct RandomArgs {
    #[arg(default_value = "16")]
    pub size: usize,
}

#[derive(Args)]
pub struct KeygenArgs {
    #[arg(long, default_value = "32")]
    pub size: usize,
}

#[derive(Args)]
pub struct EncryptArgs {
    pub text: String,
    #[arg(long)]
    pub key: String,
    #[arg(long)]
    pub iv: String,
}

#[derive(Args)]
pub struct DecryptArgs {
    pub ciphertext: String,
    #[arg(long)]
    pub key: String,
    #[arg(long)]
    pub iv: String,
}
