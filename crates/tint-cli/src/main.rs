use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tint_contracts::catalog::Catalog;
use tint_contracts::chat::{parse_command, ChatCommand, ChatRole, CHAT_HELP_COMMANDS};
use tint_contracts::color::Rgb;
use tint_contracts::interpret::{LocalInterpreter, MatchPolicy};
use tint_contracts::vocab::resolve_color;
use tint_engine::{
    match_policy_from_env, AssetFormat, AssetRef, InstructionOutcome, RemoteConfig,
    RemoteInterpreter, Session, Surface,
};

#[derive(Debug, Parser)]
#[command(
    name = "tint",
    version,
    about = "Recolor 3D model surfaces from natural-language instructions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the paintable surfaces of an asset.
    Surfaces(SurfacesArgs),
    /// Interpret one instruction and apply it.
    Run(RunArgs),
    /// Paint one surface directly.
    Paint(PaintArgs),
    /// Interactive session.
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
struct AssetArgs {
    /// Path, http(s) URL, or blob: reference.
    #[arg(long, conflicts_with = "catalog")]
    asset: Option<String>,
    /// Catalog JSON (`models` + `selectedModel`).
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Catalog entry index; defaults to the catalog's selected model.
    #[arg(long, requires = "catalog")]
    model: Option<usize>,
    /// Overrides extension-based format detection (glb, gltf, obj).
    #[arg(long)]
    format: Option<AssetFormat>,
}

#[derive(Debug, Args)]
struct InterpretArgs {
    /// Never call the remote language model.
    #[arg(long)]
    local_only: bool,
    /// Resolve nothing instead of guessing the first surface.
    #[arg(long)]
    strict: bool,
    #[arg(long)]
    text_model: Option<String>,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct SurfacesArgs {
    #[command(flatten)]
    asset: AssetArgs,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[command(flatten)]
    asset: AssetArgs,
    #[command(flatten)]
    interpret: InterpretArgs,
    #[arg(long)]
    instruction: String,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct PaintArgs {
    #[command(flatten)]
    asset: AssetArgs,
    #[arg(long)]
    surface: String,
    /// `#RRGGBB` or a color word.
    #[arg(long)]
    color: String,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    asset: AssetArgs,
    #[command(flatten)]
    interpret: InterpretArgs,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("tint error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Surfaces(args) => run_surfaces(args),
        Command::Run(args) => run_instruction(args),
        Command::Paint(args) => run_paint(args),
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
    }
}

fn run_surfaces(args: SurfacesArgs) -> Result<i32> {
    let session = Session::new(RemoteInterpreter::offline(LocalInterpreter::default()));
    load_required(&session, &args.asset)?;
    let surfaces = session.surfaces();
    if args.json {
        let rows: Vec<Value> = surfaces.iter().map(surface_json).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_surfaces(&surfaces);
    }
    Ok(0)
}

fn run_instruction(args: RunArgs) -> Result<i32> {
    let session = build_session(&args.interpret)?;
    load_required(&session, &args.asset)?;
    let outcome = session.instruct(&args.instruction);
    let interpretation = outcome.interpretation();

    if args.json {
        let report = match &outcome {
            InstructionOutcome::Applied { report, .. } => serde_json::to_value(report)?,
            InstructionOutcome::Superseded { .. } => Value::Null,
        };
        let payload = json!({
            "served_by": interpretation.served_by.as_str(),
            "fallback_reason": interpretation.fallback_reason,
            "plan": interpretation.plan,
            "report": report,
            "surfaces": session.surfaces().iter().map(surface_json).collect::<Vec<Value>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(0);
    }

    print_outcome(&session, &outcome);
    Ok(0)
}

fn run_paint(args: PaintArgs) -> Result<i32> {
    let Some(color) = Rgb::parse_hex(&args.color).or_else(|| resolve_color(&args.color)) else {
        bail!("'{}' is not a #RRGGBB color or known color name", args.color);
    };
    let mut session = Session::new(RemoteInterpreter::offline(LocalInterpreter::default()));
    if let Some(path) = &args.events {
        session = session.with_event_log(path);
    }
    load_required(&session, &args.asset)?;
    if !session.apply_edit(&args.surface, color) {
        bail!(
            "surface '{}' is not paintable (known: {})",
            args.surface,
            session.surface_names().join(", ")
        );
    }
    println!("{} -> {}", args.surface, color);
    Ok(0)
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let session = build_session(&args.interpret)?;
    if let Some(asset) = resolve_asset(&args.asset)? {
        match session.load_asset(&asset, args.asset.format) {
            Ok(summary) => println!("Loaded {} ({} surfaces)", summary.label, summary.surfaces),
            Err(err) => println!("Load failed: {err}"),
        }
    }
    if let Some(greeting) = session.history().first() {
        println!("{}", greeting.content);
    }
    println!("Type /help for commands.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        match parse_command(line.trim_end_matches(['\n', '\r'])) {
            ChatCommand::Noop => {}
            ChatCommand::Help => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            ChatCommand::Quit => break,
            ChatCommand::Surfaces => print_surfaces(&session.surfaces()),
            ChatCommand::Load { path } => {
                match session.load_asset(&AssetRef::parse(&path), None) {
                    Ok(summary) => {
                        println!("Loaded {} ({} surfaces)", summary.label, summary.surfaces)
                    }
                    Err(err) => println!("Load failed: {err}"),
                }
            }
            ChatCommand::Paint { surface, color } => {
                if session.apply_edit(&surface, color) {
                    println!("{surface} -> {color}");
                } else {
                    println!("Unknown surface '{surface}'. Try /surfaces.");
                }
            }
            ChatCommand::Instruct(text) => {
                if session.asset().is_none() {
                    println!("No asset loaded. Use /load <path> first.");
                    continue;
                }
                let outcome = session.instruct(&text);
                print_outcome(&session, &outcome);
            }
            ChatCommand::Invalid { reason, .. } => println!("{reason}"),
            ChatCommand::Unknown { command, .. } => {
                println!("Unknown command /{command}. Type /help for commands.")
            }
        }
    }

    let turns = session
        .history()
        .iter()
        .filter(|message| message.role == ChatRole::User)
        .count();
    println!("Session {} ended after {turns} instruction(s).", session.id());
    Ok(())
}

fn build_session(args: &InterpretArgs) -> Result<Session> {
    let mut config = RemoteConfig::from_env();
    if args.local_only {
        config.enabled = false;
    }
    if let Some(model) = args.text_model.as_deref().map(str::trim) {
        if model.is_empty() {
            bail!("--text-model must not be empty");
        }
        config.model = model.to_string();
    }
    let policy = if args.strict {
        MatchPolicy::Strict
    } else {
        match_policy_from_env()
    };
    let session = Session::new(RemoteInterpreter::from_config(
        &config,
        LocalInterpreter::new(policy),
    ));
    Ok(match &args.events {
        Some(path) => session.with_event_log(path),
        None => session,
    })
}

fn resolve_asset(args: &AssetArgs) -> Result<Option<AssetRef>> {
    if let Some(raw) = &args.asset {
        return Ok(Some(AssetRef::parse(raw)));
    }
    let Some(path) = &args.catalog else {
        return Ok(None);
    };
    let catalog = Catalog::from_path(path)?;
    let entry = match args.model {
        Some(index) => catalog.get(index).with_context(|| {
            format!(
                "catalog has no model #{index} ({} entries)",
                catalog.models.len()
            )
        })?,
        None => catalog
            .selected()
            .context("catalog lists no models")?,
    };
    Ok(Some(AssetRef::parse(&catalog.resolve(entry))))
}

fn load_required(session: &Session, args: &AssetArgs) -> Result<()> {
    let Some(asset) = resolve_asset(args)? else {
        bail!("pass --asset or --catalog");
    };
    session.load_asset(&asset, args.format)?;
    Ok(())
}

fn print_outcome(session: &Session, outcome: &InstructionOutcome) {
    let interpretation = outcome.interpretation();
    match outcome {
        InstructionOutcome::Applied { report, .. } => {
            println!("{}", interpretation.plan.message);
            if report.skipped > 0 {
                println!("({} edit(s) skipped)", report.skipped);
            }
        }
        InstructionOutcome::Superseded { .. } => {
            println!("(superseded by a newer request; not applied)");
        }
    }
    if let Some(reason) = &interpretation.fallback_reason {
        println!("(answered offline: {reason})");
    }
    let updated = session.drain_dirty();
    if !updated.is_empty() {
        println!("Updated: {}", updated.join(", "));
    }
}

fn print_surfaces(surfaces: &[Surface]) {
    if surfaces.is_empty() {
        println!("No surfaces.");
        return;
    }
    for surface in surfaces {
        let color = surface.color_hex().unwrap_or_else(|| "-".to_string());
        let opacity = surface
            .transparency
            .map(|value| format!("{:.2}", value.opacity))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<28} {:<9} {color} {opacity}", surface.name, surface.kind);
    }
}

fn surface_json(surface: &Surface) -> Value {
    json!({
        "name": surface.name,
        "kind": surface.kind,
        "capabilities": {
            "color": surface.capabilities.color,
            "transparency": surface.capabilities.transparency,
            "emissive": surface.capabilities.emissive,
        },
        "color": surface.color_hex(),
        "transparent": surface.transparency.map(|value| value.transparent),
        "opacity": surface.transparency.map(|value| value.opacity),
        "emissive": surface.emissive.map(Rgb::to_hex),
    })
}
