use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::debug;
use kafka_admin_core::core::settings::ConnectionSettings;
use kafka_admin_core::storage::{keys, ClusterProfile, ProfileStore};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "kafka-admin", version, subcommand_required = true)]
pub struct Args {
    /// Profile file to use instead of the per-user default
    #[arg(long, global = true, env = "KAFKA_ADMIN_PROFILES")]
    pub profiles: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List saved cluster profiles
    List,
    /// Print one profile, passwords masked
    Show { id: String },
    /// Save a new profile
    Add {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Change fields of an existing profile
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ProfileFields,
    },
    /// Delete a profile
    Remove { id: String },
    /// Validate a profile offline, without contacting the cluster
    Check { id: String },
}

/// Connection fields shared by `add` and `edit`. Unset flags leave the
/// profile untouched.
#[derive(ClapArgs, Debug, Default)]
pub struct ProfileFields {
    /// Comma-separated host:port list
    #[arg(long)]
    pub bootstrap: Option<String>,
    /// PLAINTEXT, SASL_PLAINTEXT, SASL_SSL or SSL
    #[arg(long)]
    pub protocol: Option<String>,
    #[arg(long)]
    pub sasl_mechanism: Option<String>,
    #[arg(long)]
    pub sasl_username: Option<String>,
    #[arg(long)]
    pub sasl_password: Option<String>,
    #[arg(long)]
    pub truststore: Option<PathBuf>,
    #[arg(long)]
    pub truststore_password: Option<String>,
    #[arg(long)]
    pub keystore: Option<PathBuf>,
    #[arg(long)]
    pub keystore_password: Option<String>,
    /// Extra client property, repeatable
    #[arg(long = "property", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub properties: Vec<(String, String)>,
}

impl ProfileFields {
    fn apply_to(self, profile: &mut ClusterProfile) {
        let mut set = |key: &str, value: Option<String>| {
            if let Some(v) = value {
                profile.properties.insert(key.to_string(), v);
            }
        };
        set(keys::BOOTSTRAP_SERVERS, self.bootstrap);
        set(keys::SECURITY_PROTOCOL, self.protocol);
        set(keys::SASL_MECHANISM, self.sasl_mechanism);
        set(keys::SASL_USERNAME, self.sasl_username);
        set(keys::SASL_PASSWORD, self.sasl_password);
        set(
            keys::SSL_TRUSTSTORE_LOCATION,
            self.truststore.map(|p| p.display().to_string()),
        );
        set(keys::SSL_TRUSTSTORE_PASSWORD, self.truststore_password);
        set(
            keys::SSL_KEYSTORE_LOCATION,
            self.keystore.map(|p| p.display().to_string()),
        );
        set(keys::SSL_KEYSTORE_PASSWORD, self.keystore_password);
        for (k, v) in self.properties {
            profile.properties.insert(k, v);
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if k.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

fn masked(key: &str, value: &str) -> String {
    if key.contains("password") || key == keys::SASL_JAAS_CONFIG {
        "********".into()
    } else {
        value.to_string()
    }
}

fn open_store(path: Option<PathBuf>) -> anyhow::Result<ProfileStore> {
    match path {
        Some(p) => Ok(ProfileStore::open(p)),
        None => ProfileStore::new().context("cannot locate the profile file"),
    }
}

fn find(store: &ProfileStore, id: &str) -> anyhow::Result<ClusterProfile> {
    store
        .get(id)
        .ok_or_else(|| anyhow!("no profile with id '{id}' in {:?}", store.path()))
}

pub fn run_cli(args: Args) -> anyhow::Result<()> {
    let mut store = open_store(args.profiles)?;
    debug!("Using profile file {:?}", store.path());

    match args.command {
        Command::List => {
            if store.is_empty() {
                println!("No saved profiles.");
            }
            for p in store.list() {
                println!(
                    "{}  {}  {}  {}",
                    p.id,
                    p.name,
                    p.bootstrap_servers().unwrap_or("-"),
                    p.security_protocol()
                );
            }
        }
        Command::Show { id } => {
            let p = find(&store, &id)?;
            println!("id:   {}", p.id);
            println!("name: {}", p.name);
            for (k, v) in &p.properties {
                println!("  {k} = {}", masked(k, v));
            }
        }
        Command::Add { name, fields } => {
            let mut profile = ClusterProfile::new(name);
            fields.apply_to(&mut profile);
            let saved = store.add(profile)?;
            println!("Saved profile '{}' with id {}", saved.name, saved.id);
        }
        Command::Edit { id, name, fields } => {
            let mut profile = find(&store, &id)?;
            if let Some(name) = name {
                profile.name = name;
            }
            fields.apply_to(&mut profile);
            store.update(profile)?;
            println!("Updated profile {id}");
        }
        Command::Remove { id } => {
            if store.remove(&id)? {
                println!("Removed profile {id}");
            } else {
                println!("No profile with id {id}; nothing removed");
            }
        }
        Command::Check { id } => {
            let profile = find(&store, &id)?;
            let settings = ConnectionSettings::from_profile(&profile)
                .with_context(|| format!("profile '{}' is not usable", profile.name))?;
            println!(
                "Profile '{}' is valid: {} via {}",
                profile.name, settings.bootstrap_servers, settings.protocol
            );
        }
    }
    Ok(())
}
