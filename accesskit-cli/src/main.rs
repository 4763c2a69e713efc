//! `accesskit`: developer CLI for the building access SDK.
//!
//! Drives `accesskit-core` against a live server or the offline cache, with
//! local state kept in files and a simulated NFC radio.

mod file_store;
mod simulated;

use std::path::PathBuf;
use std::sync::Arc;

use accesskit_core::hardware::{Haptics, NfcHardware};
use accesskit_core::storage::BlobStore;
use accesskit_core::{
    AccessKit, AccessKitConfig, AccessLogRecord, AttemptRecord, CredentialRecord,
    InvitationRecord, SessionState,
};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use clap::{Parser, Subcommand};
use eyre::{bail, eyre, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::file_store::FileBlobStore;
use crate::simulated::{SimulatedRadio, TraceHaptics};

/// Building access credentials from the command line
#[derive(Parser)]
#[command(name = "accesskit", version, about)]
struct Cli {
    /// Base URL of the access API
    #[arg(
        long,
        env = "ACCESSKIT_BASE_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    base_url: String,

    /// Bearer token for the access API
    #[arg(
        long,
        env = "ACCESSKIT_TOKEN",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    token: String,

    /// Directory holding the cached credentials and access log
    #[arg(long, env = "ACCESSKIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cached credentials
    Credentials {
        /// Download the current list from the server first
        #[arg(long)]
        refresh: bool,
    },

    /// Check a cached credential against a reader without the radio
    Validate {
        /// Credential id
        #[arg(long)]
        credential: String,

        /// Access point id
        #[arg(long)]
        access_point: String,

        /// Evaluate at this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Run a full session with the simulated radio
    Tap {
        /// Access point id reported by the reader
        #[arg(long)]
        access_point: String,

        /// Access point name reported by the reader
        #[arg(long)]
        name: String,

        /// Credential to arm; defaults to the only active one
        #[arg(long)]
        credential: Option<String>,

        /// Simulate a reader that rejects the payload
        #[arg(long)]
        reject: bool,
    },

    /// Show recent access attempts
    Log {
        /// Number of entries
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Revoke every credential and wipe the local cache
    RevokeAll,

    /// Manage guest invitations
    Invitations {
        #[command(subcommand)]
        command: InvitationCommands,
    },
}

#[derive(Subcommand)]
enum InvitationCommands {
    /// List invitations for a building
    List {
        /// Building id
        #[arg(long)]
        building: String,
    },

    /// Cancel an invitation
    Cancel {
        /// Invitation id
        id: String,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "accesskit_core=debug,accesskit=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn data_dir(cli: &Cli) -> eyre::Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|dir| dir.join("accesskit"))
        .ok_or_else(|| eyre!("no data directory on this platform, pass --data-dir"))
}

fn build_kit(cli: &Cli, radio: Option<SimulatedRadio>) -> eyre::Result<Arc<AccessKit>> {
    let dir = data_dir(cli)?;
    let blob_store = FileBlobStore::new(&dir)
        .wrap_err_with(|| format!("failed to open data directory {}", dir.display()))?;

    let hardware = radio.map(|radio| Arc::new(radio) as Arc<dyn NfcHardware>);
    AccessKit::new(
        AccessKitConfig::new(cli.base_url.clone()),
        Arc::new(blob_store) as Arc<dyn BlobStore>,
        hardware,
        Some(Arc::new(TraceHaptics) as Arc<dyn Haptics>),
        None,
    )
    .wrap_err("invalid configuration")
}

async fn run(cli: Cli) -> eyre::Result<()> {
    let radio = match &cli.command {
        Commands::Tap { reject, .. } => Some(SimulatedRadio::new(*reject)),
        _ => None,
    };
    let kit = build_kit(&cli, radio)?;
    kit.initialize(cli.token.clone()).await;

    match cli.command {
        Commands::Credentials { refresh } => {
            cmd_credentials(&kit, refresh).await;
            Ok(())
        }
        Commands::Validate {
            credential,
            access_point,
            at,
        } => cmd_validate(&kit, &credential, &access_point, at.as_deref()),
        Commands::Tap {
            access_point,
            name,
            credential,
            ..
        } => cmd_tap(&kit, access_point, name, credential).await,
        Commands::Log { limit } => {
            cmd_log(&kit, limit);
            Ok(())
        }
        Commands::RevokeAll => cmd_revoke_all(&kit).await,
        Commands::Invitations { command } => cmd_invitations(&kit, command).await,
    }
}

async fn cmd_credentials(kit: &AccessKit, refresh: bool) {
    let credentials = if refresh {
        kit.fetch_credentials().await
    } else {
        kit.credentials()
    };

    if credentials.is_empty() {
        println!("no credentials cached");
        return;
    }
    for credential in &credentials {
        print_credential(credential);
    }
    if kit.credentials_need_refresh() {
        println!("\nsome credentials expire within a day, run with --refresh");
    }
}

fn cmd_validate(
    kit: &AccessKit,
    credential_id: &str,
    access_point_id: &str,
    at: Option<&str>,
) -> eyre::Result<()> {
    let now: DateTime<FixedOffset> = match at {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .wrap_err_with(|| format!("invalid --at time `{at}`"))?,
        None => Local::now().fixed_offset(),
    };

    let result = kit.validate_access_at(credential_id, access_point_id, now)?;
    print_attempt(&result);
    Ok(())
}

async fn cmd_tap(
    kit: &AccessKit,
    access_point_id: String,
    access_point_name: String,
    credential_id: Option<String>,
) -> eyre::Result<()> {
    if kit.state() != SessionState::Ready {
        bail!("radio is {}", kit.state());
    }

    let credential = kit.start_access_session(credential_id).await?;
    println!("session armed for {} ({})", credential.id, credential.building_name);

    let result = kit.handle_tap(access_point_id, access_point_name).await;
    print_attempt(&result);

    let uploaded = kit.flush_access_log().await;
    let pending = kit.pending_log_uploads();
    if pending > 0 {
        println!("{pending} log entries not uploaded yet");
    } else if uploaded > 0 {
        println!("access log mirrored");
    }
    Ok(())
}

fn cmd_log(kit: &AccessKit, limit: u32) {
    let entries = kit.recent_access_attempts(limit);
    if entries.is_empty() {
        println!("no access attempts recorded");
    }
    for entry in &entries {
        print_log_entry(entry);
    }
}

async fn cmd_revoke_all(kit: &AccessKit) -> eyre::Result<()> {
    let result = kit.emergency_revoke_all().await;
    println!("local credentials wiped");
    result.wrap_err("server revoke failed")
}

async fn cmd_invitations(kit: &AccessKit, command: InvitationCommands) -> eyre::Result<()> {
    match command {
        InvitationCommands::List { building } => {
            let invitations = kit.list_invitations(building).await?;
            if invitations.is_empty() {
                println!("no invitations");
            }
            for invitation in &invitations {
                print_invitation(invitation);
            }
        }
        InvitationCommands::Cancel { id } => {
            kit.cancel_invitation(id.clone()).await?;
            println!("invitation {id} cancelled");
        }
    }
    Ok(())
}

fn format_time(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map_or_else(
            || seconds.to_string(),
            |time| time.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
}

fn print_credential(credential: &CredentialRecord) {
    println!(
        "{}  {} [{}]  {}  until {}  used {}x",
        credential.id,
        credential.building_name,
        credential.access_level,
        credential.status,
        format_time(credential.valid_until),
        credential.usage_count,
    );
    for point in &credential.access_points {
        let windows = if point.time_restrictions.is_empty() {
            String::new()
        } else {
            format!("  ({} time windows)", point.time_restrictions.len())
        };
        println!("    {}  {} [{}]{windows}", point.id, point.name, point.kind);
    }
}

fn print_attempt(result: &AttemptRecord) {
    let verdict = if result.granted { "GRANTED" } else { "DENIED" };
    println!(
        "{verdict}  {} ({})  {}",
        result.access_point_name, result.access_point_id, result.message
    );
    if let Some(reason) = result.denial_reason {
        println!("    reason: {reason}");
    }
}

fn print_log_entry(entry: &AccessLogRecord) {
    let verdict = if entry.attempt.granted {
        "granted"
    } else {
        "denied"
    };
    println!(
        "{}  {verdict:<7}  {}  credential {}  {}",
        format_time(entry.attempt.timestamp),
        entry.attempt.access_point_name,
        entry.credential_id,
        entry.attempt.message,
    );
}

fn print_invitation(invitation: &InvitationRecord) {
    let entries = invitation.max_entries.map_or_else(
        || format!("{} entries", invitation.entry_count),
        |max| format!("{}/{max} entries", invitation.entry_count),
    );
    println!(
        "{}  {}  {}  {} to {}  {entries}",
        invitation.id,
        invitation.guest_name,
        invitation.status,
        format_time(invitation.valid_from),
        format_time(invitation.valid_until),
    );
}
