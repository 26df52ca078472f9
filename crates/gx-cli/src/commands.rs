use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use gx_crypto::{CipherKey, HashAlgorithm};
use gx_store::{ExpiringStore, Expiry, Scope, StoreConfig, StoreFactory};
use serde_json::{json, Value};

use crate::cli::*;

const DEFAULT_DATA_DIR: &str = ".gx";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli { command, format, config, data_dir, scope, .. } = cli;
    let json = matches!(format, OutputFormat::Json);
    let store = || open_store(config.as_deref(), data_dir.clone(), scope);
    match command {
        Command::Set(args) => cmd_set(&*store()?, args, json),
        Command::Get(args) => cmd_get(&*store()?, args, json),
        Command::Rm(args) => cmd_rm(&*store()?, args, json),
        Command::Clear => {
            store()?.clear()?;
            emit(json, json!({ "cleared": true }), || println!("{} Storage cleared", "✓".green().bold()));
            Ok(())
        }
        Command::Space(args) => cmd_space(&*store()?, args, json),
        Command::Purge => {
            let purged = store()?.purge_expired()?;
            emit(json, json!({ "purged": purged }), || {
                println!("{} Purged {} expired entries", "✓".green(), purged.to_string().bold())
            });
            Ok(())
        }
        Command::Type(args) => cmd_type(args, json),
        Command::Hash(args) => cmd_hash(args, json),
        Command::Random(args) => {
            let hex = gx_crypto::random_hex(args.size);
            emit(json, json!({ "hex": hex }), || println!("{hex}"));
            Ok(())
        }
        Command::Keygen(args) => cmd_keygen(args, json),
        Command::Encrypt(args) => cmd_encrypt(args, json),
        Command::Decrypt(args) => cmd_decrypt(args, json),
    }
}

/// `--data-dir` wins over the config file, which wins over the environment.
fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> anyhow::Result<StoreConfig> {
    let mut config = match path {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => StoreConfig::from_env(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = Some(dir);
    }
    if config.data_dir.is_none() {
        config.data_dir = Some(PathBuf::from(DEFAULT_DATA_DIR));
    }
    Ok(config)
}

fn open_store(
    config: Option<&Path>,
    data_dir: Option<PathBuf>,
    scope: ScopeArg,
) -> anyhow::Result<Arc<ExpiringStore>> {
    let factory = StoreFactory::new(load_config(config, data_dir)?);
    let scope = match scope {
        ScopeArg::Durable => Scope::Durable,
        ScopeArg::Session => Scope::Session,
    };
    Ok(factory.get(scope)?)
}

/// JSON if it parses as JSON, otherwise the literal text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn emit(json: bool, value: Value, text: impl FnOnce()) {
    if json {
        println!("{value}");
    } else {
        text();
    }
}

fn cmd_set(store: &ExpiringStore, args: SetArgs, json: bool) -> anyhow::Result<()> {
    let value = parse_value(&args.value);
    let expiry = Expiry::from_parts(args.at.or(args.ttl), args.at.is_some());
    store.write(&args.key, &value, expiry)?;
    let expires_at = store.expires_at(&args.key)?;
    emit(json, json!({ "key": args.key, "expiresAt": expires_at }), || {
        println!("{} Stored {}", "✓".green().bold(), args.key.yellow());
        if let Some(at) = expires_at {
            println!("  Expires at: {}", at.to_string().cyan());
        }
    });
    Ok(())
}

fn cmd_get(store: &ExpiringStore, args: GetArgs, json: bool) -> anyhow::Result<()> {
    let value: Option<Value> = store.read_with(&args.key, |key| {
        tracing::debug!(key, "entry had expired");
    })?;
    emit(json, json!({ "key": args.key, "value": value }), || match &value {
        Some(value) => println!("{value}"),
        None => println!("{} {}", args.key.yellow(), "(not found)".dimmed()),
    });
    Ok(())
}

fn cmd_rm(store: &ExpiringStore, args: RmArgs, json: bool) -> anyhow::Result<()> {
    let removed = store.remove_many(args.keys.as_slice())?;
    emit(json, json!({ "removed": removed }), || {
        println!("{} Removed {} of {} keys", "✓".green(), removed, args.keys.len())
    });
    Ok(())
}

fn cmd_space(store: &ExpiringStore, args: SpaceArgs, json: bool) -> anyhow::Result<()> {
    let threshold = args.threshold.unwrap_or(store.config().warn_threshold);
    let remaining = store.remaining_capacity(threshold, args.warn)?;
    let budget = store.config().capacity_budget;
    emit(
        json,
        json!({ "remaining": remaining, "budget": budget, "threshold": threshold }),
        || {
            let shown = if remaining < i64::try_from(threshold).unwrap_or(i64::MAX) {
                remaining.to_string().red().bold()
            } else {
                remaining.to_string().green()
            };
            println!("Remaining: {shown} of {budget} bytes");
        },
    );
    Ok(())
}

fn cmd_type(args: TypeArgs, json: bool) -> anyhow::Result<()> {
    let value = parse_value(&args.value);
    let kind = gx_types::get_type(&value, args.detailed);
    emit(json, json!({ "type": kind }), || println!("{}", kind.cyan()));
    Ok(())
}

fn cmd_hash(args: HashArgs, json: bool) -> anyhow::Result<()> {
    let algorithm: HashAlgorithm = args.algorithm.parse()?;
    let digest = gx_crypto::hash_hex(algorithm, args.data.as_bytes());
    emit(json, json!({ "algorithm": algorithm, "digest": digest }), || {
        println!("{}  {}", digest, algorithm.to_string().dimmed())
    });
    Ok(())
}

fn cmd_keygen(args: KeygenArgs, json: bool) -> anyhow::Result<()> {
    let key = gx_crypto::generate_key(args.size)?;
    let iv = gx_crypto::to_hex(gx_crypto::default_iv());
    let key = key.to_hex();
    emit(json, json!({ "key": key, "iv": iv }), || {
        println!("Key: {}", key.yellow());
        println!("IV:  {}", iv.yellow());
    });
    Ok(())
}

fn cmd_encrypt(args: EncryptArgs, json: bool) -> anyhow::Result<()> {
    let key = CipherKey::from_hex(&args.key).context("invalid --key")?;
    let iv = gx_crypto::from_hex(&args.iv).context("invalid --iv")?;
    let ciphertext = gx_crypto::encrypt(&args.text, &key, &iv)?;
    emit(json, json!({ "ciphertext": ciphertext }), || println!("{ciphertext}"));
    Ok(())
}

fn cmd_decrypt(args: DecryptArgs, json: bool) -> anyhow::Result<()> {
    let key = CipherKey::from_hex(&args.key).context("invalid --key")?;
    let iv = gx_crypto::from_hex(&args.iv).context("invalid --iv")?;
    let plaintext = gx_crypto::decrypt(&args.ciphertext, &key, &iv)?;
    emit(json, json!({ "plaintext": plaintext }), || println!("{plaintext}"));
    Ok(())
}
