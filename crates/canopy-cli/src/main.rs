use canopy::{
    Dispatch, Hypertree, Input, Kind, ManualClock, RGraph, Scene, Spacetree, Visualization, Viz,
    VizConfig,
};
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Canopy(canopy::Error),
    Json(serde_json::Error),
    Stalled,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Canopy(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Stalled => write!(f, "Animation did not finish"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<canopy::Error> for CliError {
    fn from(value: canopy::Error) -> Self {
        Self::Canopy(value)
    }
}

impl From<canopy_graph::Error> for CliError {
    fn from(value: canopy_graph::Error) -> Self {
        Self::Canopy(value.into())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Layout,
    Scene,
    Animate,
}

#[derive(Debug)]
struct Args {
    command: Command,
    kind: Kind,
    input: Option<String>,
    config: Option<String>,
    root_index: usize,
    click: Option<String>,
    pretty: bool,
    out: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: Command::Layout,
            kind: Kind::Spacetree,
            input: None,
            config: None,
            root_index: 0,
            click: None,
            pretty: false,
            out: None,
        }
    }
}

#[derive(Serialize)]
struct LayoutNode<'a> {
    id: &'a str,
    name: &'a str,
    x: f64,
    y: f64,
    depth: i32,
    drawn: bool,
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    kind: Kind,
    root: Option<&'a str>,
    nodes: Vec<LayoutNode<'a>>,
}

#[derive(Serialize)]
struct AnimateOut<'a> {
    kind: Kind,
    clicked: &'a str,
    frames: &'a [Scene],
}

fn usage() -> &'static str {
    "canopy-cli\n\
\n\
USAGE:\n\
  canopy-cli [layout] [--kind spacetree|rgraph|hypertree] [--config <file>] [--root-index <n>] [--click <id>] [--pretty] [--out <path>] [<path>|-]\n\
  canopy-cli scene [--kind ...] [--config <file>] [--root-index <n>] [--click <id>] [--pretty] [--out <path>] [<path>|-]\n\
  canopy-cli animate --click <id> [--kind ...] [--config <file>] [--root-index <n>] [--pretty] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a JSON tree (object with `children`) or a JSON graph (array with `adjacencies`).\n\
  - --config is a JSON object merged over the defaults of the chosen kind.\n\
  - --click runs the click animation to completion before printing; animate prints every frame.\n\
  - Log output goes to stderr and is controlled by CANOPY_LOG (e.g. CANOPY_LOG=debug).\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "scene" => args.command = Command::Scene,
            "animate" => args.command = Command::Animate,
            "--pretty" => args.pretty = true,
            "--kind" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.kind = kind.parse::<Kind>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--root-index" => {
                let Some(index) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.root_index = index.parse::<usize>().map_err(|_| CliError::Usage(usage()))?;
            }
            "--click" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.click = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.command == Command::Animate && args.click.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        None => println!("{text}"),
        Some(path) => std::fs::write(path, text)?,
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("CANOPY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// One of the three visualizations, driven by a simulated clock so runs are instant and repeatable.
enum AnyViz {
    Spacetree(Spacetree),
    RGraph(RGraph),
    Hypertree(Hypertree),
}

impl AnyViz {
    fn new(kind: Kind, config: VizConfig) -> Self {
        let clock = Box::new(ManualClock::new());
        match kind {
            Kind::Spacetree => Self::Spacetree(Spacetree::with_clock(config, clock)),
            Kind::RGraph => Self::RGraph(RGraph::with_clock(config, clock)),
            Kind::Hypertree => Self::Hypertree(Hypertree::with_clock(config, clock)),
        }
    }

    fn viz(&self) -> &Visualization {
        match self {
            Self::Spacetree(st) => st.core(),
            Self::RGraph(rg) => rg.core(),
            Self::Hypertree(ht) => ht.core(),
        }
    }

    fn viz_mut(&mut self) -> &mut Visualization {
        match self {
            Self::Spacetree(st) => st.core_mut(),
            Self::RGraph(rg) => rg.core_mut(),
            Self::Hypertree(ht) => ht.core_mut(),
        }
    }

    fn compute(&mut self) -> canopy::Result<()> {
        match self {
            Self::Spacetree(st) => st.compute(),
            Self::RGraph(rg) => rg.compute(),
            Self::Hypertree(ht) => ht.compute(),
        }
    }

    fn click(&mut self, id: &str) -> canopy::Result<Dispatch> {
        match self {
            Self::Spacetree(st) => st.on_click(id),
            Self::RGraph(rg) => rg.on_click(id),
            Self::Hypertree(ht) => ht.on_click(id),
        }
    }
}

fn build(args: &Args) -> Result<AnyViz, CliError> {
    let overrides = match args.config.as_deref() {
        Some(path) => Some(serde_json::from_str::<Value>(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    let config = VizConfig::for_kind(args.kind, overrides.as_ref())?;
    let input = Input::parse(&read_input(args.input.as_deref())?)?;

    let mut viz = AnyViz::new(args.kind, config);
    viz.viz_mut().load(&input, args.root_index)?;
    viz.compute()?;
    tracing::debug!(
        kind = %args.kind,
        nodes = viz.viz().graph().node_count(),
        "input loaded"
    );
    Ok(viz)
}

fn click(viz: &mut AnyViz, id: &str) -> Result<(), CliError> {
    viz.click(id)?;
    viz.viz_mut().run_until_idle()?;
    if viz.viz().is_busy() {
        return Err(CliError::Stalled);
    }
    Ok(())
}

fn layout_out(viz: &Visualization) -> LayoutOut<'_> {
    let nodes = viz
        .graph()
        .nodes()
        .map(|n| {
            let pos = n.pos.getc();
            LayoutNode {
                id: &n.id,
                name: &n.name,
                x: pos.x,
                y: pos.y,
                depth: viz.traversal().depth(&n.id),
                drawn: n.drawn,
            }
        })
        .collect();
    LayoutOut {
        kind: viz.kind(),
        root: viz.root(),
        nodes,
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut viz = build(&args)?;

    match args.command {
        Command::Layout => {
            if let Some(id) = args.click.as_deref() {
                click(&mut viz, id)?;
            }
            write_json(&layout_out(viz.viz()), args.pretty, args.out.as_deref())
        }
        Command::Scene => {
            if let Some(id) = args.click.as_deref() {
                click(&mut viz, id)?;
            }
            viz.viz_mut().plot()?;
            let Some(scene) = viz.viz().scene() else {
                return Ok(());
            };
            write_json(scene, args.pretty, args.out.as_deref())
        }
        Command::Animate => {
            let Some(id) = args.click.as_deref() else {
                return Err(CliError::Usage(usage()));
            };
            let frames: Rc<RefCell<Vec<Scene>>> = Rc::default();
            let sink = Rc::clone(&frames);
            viz.viz_mut().plot()?;
            viz.viz_mut()
                .on_plot(move |scene| sink.borrow_mut().push(scene.clone()));
            click(&mut viz, id)?;
            let frames = frames.borrow();
            let out = AnimateOut {
                kind: args.kind,
                clicked: id,
                frames: &frames,
            };
            write_json(&out, args.pretty, args.out.as_deref())
        }
    }
}

fn main() {
    init_tracing();
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
