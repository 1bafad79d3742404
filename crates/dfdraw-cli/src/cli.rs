//! Command-line interface for the dfdraw utility
//!
//! Renders, validates and edits data flow diagram JSON documents, and runs an
//! external structure proposer against them.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::colorizer::{paint_issue, paint_ok, Palette};
use dfdraw::core::logging::init_logging;
use dfdraw::proposer::{CommandProposer, ImageAttachment};
use dfdraw::scene::{describe, export, SceneConfig, SceneHandle};
use dfdraw::session::{ProposalInput, ProposalOutcome, Workspace};
use dfdraw::{ElementPatch, Graph, NodeFields, NodeKind, Protocol, SequentialIds};

/// dfdraw - Render and edit data flow diagrams
#[derive(Parser)]
#[command(name = "dfdraw")]
#[command(about = "Render, validate and edit data flow diagram JSON documents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Image output formats
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

/// Node kinds accepted on the command line
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum KindChoice {
    Entity,
    Process,
    Store,
}

impl From<KindChoice> for NodeKind {
    fn from(value: KindChoice) -> Self {
        match value {
            KindChoice::Entity => NodeKind::Entity,
            KindChoice::Process => NodeKind::Process,
            KindChoice::Store => NodeKind::Store,
        }
    }
}

/// Flow protocols accepted on the command line
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ProtocolChoice {
    Https,
    Sql,
    #[default]
    Standard,
}

impl From<ProtocolChoice> for Protocol {
    fn from(value: ProtocolChoice) -> Self {
        match value {
            ProtocolChoice::Https => Protocol::Https,
            ProtocolChoice::Sql => Protocol::Sql,
            ProtocolChoice::Standard => Protocol::Standard,
        }
    }
}

/// When to colorize output
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Use colors if output is a terminal and NO_COLOR is not set
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a diagram to SVG or PNG
    Render {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ImageFormat::Svg)]
        format: ImageFormat,

        /// Pixel density for PNG output
        #[arg(long, default_value_t = 2.0)]
        scale: f32,

        /// Padding around the content, in diagram units
        #[arg(long, default_value_t = 60.0)]
        padding: f64,
    },

    /// Print the positioned scene as JSON
    Layout {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Describe the scene as it appears in edit mode
        #[arg(long)]
        edit_mode: bool,
    },

    /// Check a diagram for duplicate ids and dangling flows
    Validate {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// When to use colors in output
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Add a node and print the updated graph
    AddNode {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Node kind
        #[arg(short, long, value_enum)]
        kind: KindChoice,

        /// Node name (defaults per kind)
        #[arg(long)]
        name: Option<String>,

        /// Process number
        #[arg(long)]
        number: Option<String>,

        /// Process description
        #[arg(long)]
        description: Option<String>,

        /// Data store prefix
        #[arg(long)]
        prefix: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        y: Option<f64>,
    },

    /// Add a flow between two nodes and print the updated graph
    AddFlow {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source node id
        #[arg(long)]
        from: String,

        /// Target node id
        #[arg(long)]
        to: String,

        /// Flow label
        #[arg(long, default_value = "Data Sync")]
        label: String,

        #[arg(long, value_enum, default_value_t = ProtocolChoice::Standard)]
        protocol: ProtocolChoice,

        /// Draw arrowheads at both ends
        #[arg(long)]
        bidirectional: bool,
    },

    /// Delete an element (and flows referencing it)
    Delete {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Element id
        id: String,
    },

    /// Store explicit coordinates on a node
    Move {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Node id
        id: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Merge a JSON patch into a node or flow
    Patch {
        /// Input graph JSON (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Element id
        id: String,

        /// Patch object, e.g. '{"name":"Billing"}'
        patch: String,
    },

    /// Ask an external structure proposer for a diagram
    Propose {
        /// Proposer program; receives the request on stdin
        #[arg(long)]
        command: String,

        /// Arguments passed to the proposer program
        #[arg(last = true)]
        args: Vec<String>,

        /// Current graph JSON sent along with instructions
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Output file for the proposed graph (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Diagram image to convert
        #[arg(long, conflicts_with = "csv")]
        image: Option<PathBuf>,

        /// CSV data to convert
        #[arg(long, conflicts_with = "instruction")]
        csv: Option<PathBuf>,

        /// Refinement instruction; needs --graph unless --image starts a new diagram
        #[arg(long)]
        instruction: Option<String>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Main CLI application
pub struct DfdrawApp {
    config: SceneConfig,
}

impl DfdrawApp {
    /// Create a new application instance with default settings
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self { config }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&mut self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var(dfdraw::core::logging::LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var(dfdraw::core::logging::LOG_FORMAT_ENV)
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("dfdraw v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Render {
                input,
                output,
                format,
                scale,
                padding,
            } => self.render_command(input, output, format, scale, padding, cli.verbose),
            Commands::Layout {
                input,
                output,
                edit_mode,
            } => self.layout_command(input, output, edit_mode),
            Commands::Validate { input, color } => self.validate_command(input, color, cli.verbose),
            Commands::AddNode {
                input,
                output,
                kind,
                name,
                number,
                description,
                prefix,
                x,
                y,
            } => {
                let graph = self.read_graph(input)?;
                let fields = NodeFields {
                    name,
                    number,
                    description,
                    prefix,
                    x,
                    y,
                };
                let mut ids = Self::ids_after(&graph);
                let (next, id) = graph.add_node(kind.into(), fields, &mut ids);
                if cli.verbose {
                    eprintln!("Added node {}", id);
                }
                self.write_graph(output, &next)
            }
            Commands::AddFlow {
                input,
                output,
                from,
                to,
                label,
                protocol,
                bidirectional,
            } => {
                let graph = self.read_graph(input)?;
                for endpoint in [&from, &to] {
                    if !graph.contains_node(endpoint) {
                        bail!("No node with id '{}'", endpoint);
                    }
                }
                let mut ids = Self::ids_after(&graph);
                let (mut next, id) = graph.add_flow(&from, &to, &label, protocol.into(), &mut ids)?;
                if bidirectional {
                    next = next.patch_element(&id, &ElementPatch::bidirectional(true));
                }
                if cli.verbose {
                    eprintln!("Added flow {}", id);
                }
                self.write_graph(output, &next)
            }
            Commands::Delete { input, output, id } => {
                let graph = self.read_graph(input)?;
                if !graph.contains_id(&id) {
                    eprintln!("Warning: no element with id '{}'", id);
                }
                self.write_graph(output, &graph.delete_element(&id))
            }
            Commands::Move {
                input,
                output,
                id,
                x,
                y,
            } => {
                let graph = self.read_graph(input)?;
                if !graph.contains_node(&id) {
                    bail!("No node with id '{}'", id);
                }
                self.write_graph(output, &graph.move_node(&id, x, y))
            }
            Commands::Patch {
                input,
                output,
                id,
                patch,
            } => {
                let graph = self.read_graph(input)?;
                if !graph.contains_id(&id) {
                    bail!("No element with id '{}'", id);
                }
                let patch: ElementPatch =
                    serde_json::from_str(&patch).context("Patch is not a valid JSON object")?;
                self.write_graph(output, &graph.patch_element(&id, &patch))
            }
            Commands::Propose {
                command,
                args,
                graph,
                output,
                image,
                csv,
                instruction,
                timeout,
            } => self.propose_command(
                CommandProposer::new(command).args(args),
                graph,
                output,
                image,
                csv,
                instruction,
                timeout,
            ),
        }
    }

    fn ids_after(graph: &Graph) -> SequentialIds {
        SequentialIds::starting_after((graph.node_count() + graph.flow_count()) as u64)
    }

    /// Handle the render command
    fn render_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        format: ImageFormat,
        scale: f32,
        padding: f64,
        verbose: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let mut scene = SceneHandle::mount(self.config.clone());
        scene.render(&graph, false);

        let bytes = match format {
            ImageFormat::Svg => export::to_svg_padded(&scene, padding)?.into_bytes(),
            ImageFormat::Png => export::rasterize(&export::to_svg_padded(&scene, padding)?, scale)?,
        };
        scene.unmount();

        if verbose {
            eprintln!("Rendered {} bytes of {:?}", bytes.len(), format);
        }
        self.write_bytes(output, &bytes)
    }

    /// Handle the layout command
    fn layout_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        edit_mode: bool,
    ) -> Result<()> {
        let graph = self.read_graph(input)?;
        let description = describe(&graph, &self.config, edit_mode);
        self.write_output(output, &serde_json::to_string_pretty(&description)?)
    }

    /// Handle the validate command
    fn validate_command(&self, input: Option<PathBuf>, color: ColorChoice, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;
        let palette = Palette::new(self.should_colorize(color));

        let graph = match Graph::from_json(&content) {
            Ok(graph) => graph,
            Err(e) => {
                println!("{}", paint_issue(&palette, &format!("Not a diagram document: {}", e)));
                return Err(anyhow!("Invalid diagram document"));
            }
        };

        let issues = graph.validate();
        if verbose {
            eprintln!(
                "Checked {} nodes and {} flows",
                graph.node_count(),
                graph.flow_count()
            );
        }

        if issues.is_empty() {
            println!(
                "{}",
                paint_ok(
                    &palette,
                    &format!(
                        "Valid diagram: {} nodes, {} flows",
                        graph.node_count(),
                        graph.flow_count()
                    )
                )
            );
            return Ok(());
        }

        for issue in &issues {
            println!("{}", paint_issue(&palette, &issue.to_string()));
        }
        Err(anyhow!("{} issue(s) found", issues.len()))
    }

    /// Handle the propose command
    #[allow(clippy::too_many_arguments)]
    fn propose_command(
        &self,
        mut proposer: CommandProposer,
        graph: Option<PathBuf>,
        output: Option<PathBuf>,
        image: Option<PathBuf>,
        csv: Option<PathBuf>,
        instruction: Option<String>,
        timeout: Option<u64>,
    ) -> Result<()> {
        if let Some(seconds) = timeout {
            proposer = proposer.timeout(Duration::from_secs(seconds));
        }

        let mut workspace = Workspace::new();
        if let Some(path) = graph {
            workspace.set_graph(self.read_graph(Some(path))?);
        }

        let image = image.map(|path| read_image(&path)).transpose()?;
        let input = match (instruction, csv, image) {
            (Some(text), None, image) => ProposalInput::Message {
                text,
                image: image.map(|(_, attachment)| attachment),
            },
            (None, Some(path), None) => ProposalInput::Csv {
                name: file_name(&path),
                text: fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read CSV file '{}'", path.display()))?,
            },
            (None, None, Some((name, image))) => ProposalInput::Image { name, image },
            _ => bail!("Provide one of --image, --csv or --instruction"),
        };

        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        let outcome = runtime.block_on(workspace.propose(&proposer, input))?;

        if let Some(reply) = workspace
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == dfdraw::proposer::ChatRole::Assistant)
        {
            eprintln!("{}", reply.content);
            for prompt in &reply.suggested_prompts {
                eprintln!("  - {}", prompt);
            }
        }

        match outcome {
            ProposalOutcome::Updated => match workspace.graph() {
                Some(graph) => self.write_graph(output, graph),
                None => Ok(()),
            },
            ProposalOutcome::Answered => Ok(()),
            ProposalOutcome::Failed(message) => Err(anyhow!(message)),
            ProposalOutcome::Stale => Err(anyhow!("Response arrived for a superseded request")),
        }
    }

    /// Determine if we should colorize based on color choice and stdout
    fn should_colorize(&self, color: ColorChoice) -> bool {
        match color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                if std::env::var("NO_COLOR").is_ok() {
                    return false;
                }
                crossterm::tty::IsTty::is_tty(&std::io::stdout())
            }
        }
    }

    fn read_graph(&self, input: Option<PathBuf>) -> Result<Graph> {
        let content = self.read_input(input)?;
        Graph::from_json(&content).context("Failed to parse diagram JSON")
    }

    fn write_graph(&self, output: Option<PathBuf>, graph: &Graph) -> Result<()> {
        self.write_output(output, &graph.to_json_pretty()?)
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write text output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        if content.is_empty() || content.ends_with('\n') {
            self.write_bytes(output, content.as_bytes())
        } else {
            self.write_bytes(output, format!("{}\n", content).as_bytes())
        }
    }

    /// Write raw bytes to file or stdout
    pub fn write_bytes(&self, output: Option<PathBuf>, content: &[u8]) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => fs::write(&path, content)
                .map_err(|e| anyhow!("Failed to write output file '{}': {}", path.display(), e)),
            _ => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(content)?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}

impl Default for DfdrawApp {
    fn default() -> Self {
        Self::new()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

fn read_image(path: &Path) -> Result<(String, ImageAttachment)> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read image '{}'", path.display()))?;
    Ok((file_name(path), ImageAttachment::new(media_type(path), bytes)))
}
