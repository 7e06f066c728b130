use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowcanvas_canvas::{
    CanvasAction, CanvasCallbacks, CanvasConfig, CanvasController, CanvasSettings, CanvasView,
    DeleteRequest, VirtualClock,
};
use flowcanvas_core::{CanvasMode, FlowNode, Size};
use flowcanvas_events::{CanvasEvent, EventBus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive a canvas with a scripted list of actions and print the result
    Replay(ReplayArgs),
    /// Print the effective canvas settings
    Settings {
        /// Settings file to read instead of the platform default
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct ReplayArgs {
    /// JSON array of flow nodes
    #[arg(short, long)]
    flow: PathBuf,

    /// JSON array of canvas actions
    #[arg(short, long)]
    script: Option<PathBuf>,

    #[arg(long, value_parser = parse_mode, default_value = "build")]
    mode: CanvasMode,

    /// Enable start/end point menus in test mode
    #[arg(long)]
    selective: bool,

    /// Treat the detail test view as open, so output fields are editable
    #[arg(long)]
    detail_view: bool,

    /// Answer "yes" to delete confirmations (declined otherwise)
    #[arg(long)]
    confirm_deletes: bool,

    /// Viewport as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_viewport, default_value = "1440x900")]
    viewport: Size,

    /// Virtual time between two scripted actions, in milliseconds
    #[arg(long, default_value_t = 16)]
    step_ms: u64,

    /// Settings file to use instead of the platform default
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

fn parse_mode(value: &str) -> Result<CanvasMode, String> {
    match value {
        "build" => Ok(CanvasMode::Build),
        "test" => Ok(CanvasMode::Test),
        other => Err(format!("unknown mode '{other}', expected build or test")),
    }
}

fn parse_viewport(value: &str) -> Result<Size, String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: f32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height: f32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if width <= 0.0 || height <= 0.0 {
        return Err("viewport must be positive".to_string());
    }
    Ok(Size::new(width, height))
}

#[derive(Serialize)]
struct ReplayReport {
    view: Option<CanvasView>,
    events: Vec<CanvasEvent>,
    frames: usize,
}

struct ReplayOptions {
    mode: CanvasMode,
    selective: bool,
    detail_view: bool,
    confirm_deletes: bool,
    viewport: Size,
    step: Duration,
    settings: CanvasSettings,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn replay(nodes: Vec<FlowNode>, actions: Vec<CanvasAction>, options: ReplayOptions) -> ReplayReport {
    let clock = VirtualClock::new();
    let bus = EventBus::new();
    let mut callbacks = CanvasCallbacks::default();
    let confirm = options.confirm_deletes;
    callbacks = callbacks.with_confirm(move |req: &DeleteRequest| {
        tracing::info!(node = %req.node_id, confirm, "delete confirmation");
        confirm
    });
    if options.detail_view {
        callbacks = callbacks.with_detail_view(|| true);
    }

    let config = CanvasConfig::new("replay", nodes)
        .with_mode(options.mode)
        .with_selective_testing(options.selective)
        .with_settings(options.settings)
        .with_viewport(options.viewport);
    let mut canvas = CanvasController::with_clock(config, callbacks, bus.clone(), clock.clone());

    let mut frames = 0;
    for action in actions {
        tracing::debug!(action = action.name(), "replaying");
        canvas.dispatch(action);
        clock.advance(options.step);
        if canvas.tick().is_some() {
            frames += 1;
        }
    }
    // Let pending debounces and panel transitions run out.
    clock.advance(Duration::from_secs(10));
    if canvas.tick().is_some() {
        frames += 1;
    }

    ReplayReport {
        view: canvas.view(),
        events: bus.drain(),
        frames,
    }
}

fn load_settings(path: Option<&Path>) -> Result<CanvasSettings> {
    match path {
        Some(path) => Ok(CanvasSettings::load_from(path)?),
        None => Ok(CanvasSettings::load()),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    match args.command {
        Command::Replay(args) => {
            let nodes: Vec<FlowNode> = read_json(&args.flow)?;
            let actions: Vec<CanvasAction> = match &args.script {
                Some(path) => read_json(path)?,
                None => Vec::new(),
            };
            tracing::info!(nodes = nodes.len(), actions = actions.len(), "replay");
            let options = ReplayOptions {
                mode: args.mode,
                selective: args.selective,
                detail_view: args.detail_view,
                confirm_deletes: args.confirm_deletes,
                viewport: args.viewport,
                step: Duration::from_millis(args.step_ms),
                settings: load_settings(args.settings.as_deref())?,
            };
            let report = replay(nodes, actions, options);
            print_json(&report, args.pretty)
        }
        Command::Settings { path } => print_json(&load_settings(path.as_deref())?, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcanvas_core::{NodeId, NodeKind};
    use tempfile::tempdir;

    fn options() -> ReplayOptions {
        ReplayOptions {
            mode: CanvasMode::Build,
            selective: false,
            detail_view: false,
            confirm_deletes: true,
            viewport: Size::new(1440.0, 900.0),
            step: Duration::from_millis(16),
            settings: CanvasSettings::default(),
        }
    }

    fn flow() -> Vec<FlowNode> {
        vec![
            FlowNode::new("start", NodeKind::Start, "Start"),
            FlowNode::new("create-task", NodeKind::Create, "Create task"),
            FlowNode::new("end", NodeKind::End, "End"),
        ]
    }

    #[test]
    fn test_parse_viewport() {
        assert_eq!(parse_viewport("1200x800"), Ok(Size::new(1200.0, 800.0)));
        assert!(parse_viewport("1200").is_err());
        assert!(parse_viewport("0x800").is_err());
        assert_eq!(parse_mode("test"), Ok(CanvasMode::Test));
        assert!(parse_mode("debug").is_err());
    }

    #[test]
    fn test_replay_script_from_files() {
        let dir = tempdir().unwrap();
        let flow_path = dir.path().join("flow.json");
        let script_path = dir.path().join("script.json");
        std::fs::write(&flow_path, serde_json::to_string(&flow()).unwrap()).unwrap();
        std::fs::write(
            &script_path,
            r#"[{"action": "delete_node", "id": "create-task"}, {"action": "zoom_out"}]"#,
        )
        .unwrap();

        let nodes: Vec<FlowNode> = read_json(&flow_path).unwrap();
        let actions: Vec<CanvasAction> = read_json(&script_path).unwrap();
        let report = replay(nodes, actions, options());

        let view = report.view.unwrap();
        assert_eq!(view.nodes.len(), 2);
        assert_eq!(view.zoom.percent, 95);
        assert_eq!(report.events, vec![CanvasEvent::ContentChanged]);
        assert_eq!(report.frames, 2);
    }

    #[test]
    fn test_replay_commits_debounced_edits_at_end() {
        let actions = vec![CanvasAction::EditOutputField {
            id: NodeId::from("create-task"),
            field: "subject".to_string(),
            value: "Welcome".to_string(),
            kind: Default::default(),
        }];
        let report = replay(
            flow(),
            actions,
            ReplayOptions {
                mode: CanvasMode::Test,
                detail_view: true,
                ..options()
            },
        );
        assert_eq!(
            report.events,
            vec![CanvasEvent::OutputsChanged {
                node_id: NodeId::from("create-task"),
                payload: serde_json::json!({"subject": "Welcome"}),
            }]
        );
    }

    #[test]
    fn test_bad_flow_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flow.json");
        std::fs::write(&path, "[{]").unwrap();
        let err = read_json::<Vec<FlowNode>>(&path).unwrap_err();
        assert!(format!("{err:#}").contains("flow.json"));
    }
}
