#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use launchgate_core::invocation::{parse_extra, Invocation};
use launchgate_core::keys::BIOMETRIC_AUTH;
use launchgate_core::traits::PreferenceStore;
use launchgate_core::types::AuthOutcome;
use launchgate_engine::gates::decision::GateReport;
use launchgate_engine::gates::dispatch::{resolve_destination, GateConfig, DEFAULT_TERMINATION_DELAY_MS};
use launchgate_engine::gates::launch::{GateDeps, LaunchGate};
use launchgate_engine::gates::policy::AuthPolicy;
use launchgate_engine::runtime::authenticator::ScriptedAuthenticator;
use launchgate_engine::runtime::host::HostContext;
use launchgate_engine::runtime::looper::Looper;
use launchgate_engine::runtime::navigator::RecordingNavigator;
use launchgate_engine::state::memory::MemoryPreferenceStore;
use launchgate_engine::state::prefs_file::JsonPreferenceStore;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lgate",
    version,
    about = "Launch-time authentication gate for the password store."
)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run one gate to completion and report where it went.
    Enter {
        /// Action tag; DECRYPT_PASS opens the decrypt screen.
        #[arg(long)]
        action: Option<String>,

        /// Invocation extra (repeatable), e.g. FILE_PATH=/a/b.gpg.
        #[arg(long = "extra", value_name = "KEY=VALUE")]
        extras: Vec<String>,

        /// JSON preference file holding the biometric_auth flag.
        #[arg(long)]
        prefs: Option<PathBuf>,

        /// Turn gating on for this run without a preference file.
        #[arg(long, conflicts_with = "prefs")]
        biometric: bool,

        /// Outcomes the authenticator reports, in order (comma-separated).
        #[arg(long, value_delimiter = ',')]
        auth: Vec<String>,

        /// Spacing between scripted outcomes.
        #[arg(long, default_value_t = 0)]
        auth_step_ms: u64,

        /// Delay before the gate closes after an authenticated launch.
        #[arg(long, default_value_t = DEFAULT_TERMINATION_DELAY_MS)]
        termination_delay_ms: u64,

        /// Jump the clock instead of sleeping.
        #[arg(long)]
        virtual_time: bool,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the destination an invocation resolves to, without gating.
    Resolve {
        #[arg(long)]
        action: Option<String>,

        #[arg(long = "extra", value_name = "KEY=VALUE")]
        extras: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show or change the biometric gating preference.
    Policy {
        #[arg(value_enum)]
        op: PolicyOp,

        /// JSON preference file.
        #[arg(long)]
        prefs: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyOp {
    Show,
    Enable,
    Disable,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Cmd::Enter {
            action,
            extras,
            prefs,
            biometric,
            auth,
            auth_step_ms,
            termination_delay_ms,
            virtual_time,
            json,
        } => cmd_enter(
            EnterArgs {
                action,
                extras,
                prefs,
                biometric,
                auth,
                auth_step_ms,
                termination_delay_ms,
                virtual_time,
            },
            json,
        ),
        Cmd::Resolve {
            action,
            extras,
            json,
        } => cmd_resolve(action.as_deref(), &extras, json),
        Cmd::Policy { op, prefs, json } => cmd_policy(op, prefs, json),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_invocation(action: Option<&str>, raw_extras: &[String]) -> Result<Invocation> {
    let mut extras = HashMap::new();
    for raw in raw_extras {
        let (key, value) = parse_extra(raw)?;
        extras.insert(key, value);
    }
    Ok(Invocation::from_intent(action, &extras))
}

fn parse_script(raw: &[String]) -> Result<Vec<AuthOutcome>> {
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<AuthOutcome>().map_err(anyhow::Error::from))
        .collect()
}

struct EnterArgs {
    action: Option<String>,
    extras: Vec<String>,
    prefs: Option<PathBuf>,
    biometric: bool,
    auth: Vec<String>,
    auth_step_ms: u64,
    termination_delay_ms: u64,
    virtual_time: bool,
}

struct EnterRun {
    invocation: Invocation,
    store: Rc<dyn PreferenceStore>,
    script: Vec<AuthOutcome>,
    auth_step: Duration,
    config: GateConfig,
    virtual_time: bool,
}

fn cmd_enter(args: EnterArgs, json: bool) -> Result<()> {
    let invocation = build_invocation(args.action.as_deref(), &args.extras)?;
    let store: Rc<dyn PreferenceStore> = match args.prefs {
        Some(path) => Rc::new(JsonPreferenceStore::open(path)),
        None => Rc::new(MemoryPreferenceStore::new()),
    };
    if args.biometric {
        AuthPolicy::new(Rc::clone(&store)).set_enabled(true)?;
    }
    let report = run_gate(EnterRun {
        invocation,
        store,
        script: parse_script(&args.auth)?,
        auth_step: Duration::from_millis(args.auth_step_ms),
        config: GateConfig {
            termination_delay_ms: args.termination_delay_ms,
        },
        virtual_time: args.virtual_time,
    })?;
    print_report(&report, json)?;
    if !report.granted() {
        bail!("access denied: gate {} without a destination", report.state);
    }
    Ok(())
}

fn cmd_resolve(action: Option<&str>, extras: &[String], json: bool) -> Result<()> {
    let invocation = build_invocation(action, extras)?;
    let destination = resolve_destination(&invocation);
    if json {
        println!("{}", serde_json::to_string_pretty(&destination)?);
    } else {
        println!("{destination}");
    }
    Ok(())
}

fn run_gate(run: EnterRun) -> Result<GateReport> {
    let looper = if run.virtual_time {
        Looper::virtual_time()
    } else {
        Looper::realtime()
    };
    let authenticator =
        ScriptedAuthenticator::new(looper.clone(), run.script).with_step(run.auth_step);
    let gate = LaunchGate::new(
        GateDeps {
            policy: AuthPolicy::new(run.store),
            authenticator: Rc::new(authenticator),
            navigator: Rc::new(RecordingNavigator::new()),
            scheduler: Rc::new(looper.clone()),
            host: Rc::new(HostContext::new()),
        },
        run.config,
    );

    gate.enter(run.invocation).context("cannot enter gate")?;
    let ran = looper.run_until_idle();
    debug!(tasks = ran, elapsed_ms = looper.now().as_millis() as u64, "event loop idle");
    Ok(gate.report())
}

fn print_report(report: &GateReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("state: {}", report.state);
    match &report.destination {
        Some(dest) => println!("destination: {dest}"),
        None => println!("destination: none (access denied)"),
    }
    if let Some(ms) = report.termination_delay_ms {
        println!("termination delay: {ms}ms");
    }
    if report.policy_cleared {
        println!("policy: cleared ({BIOMETRIC_AUTH} removed)");
    }
    Ok(())
}

fn cmd_policy(op: PolicyOp, prefs: PathBuf, json: bool) -> Result<()> {
    let policy = AuthPolicy::new(Rc::new(JsonPreferenceStore::open(&prefs)));
    match op {
        PolicyOp::Show => {}
        PolicyOp::Enable => policy.set_enabled(true)?,
        PolicyOp::Disable => policy.set_enabled(false)?,
    }
    let stored = policy
        .stored()
        .with_context(|| format!("cannot read {}", prefs.display()))?;
    let enabled = stored.unwrap_or(false);

    if json {
        let out = serde_json::json!({
            "key": BIOMETRIC_AUTH,
            "stored": stored,
            "enabled": enabled,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{BIOMETRIC_AUTH}: {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}
