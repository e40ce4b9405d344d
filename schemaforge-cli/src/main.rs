use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use schemaforge::{
    BlockDefinition, DataPath, DocumentFormat, EditOutcome, Element, FormRenderer, FormSession,
    OutputDestination, OutputOptions, RenderNode, RenderOptions, Schema, emit, list_ops,
    load_schema, parse_document_any, parse_typed, render_blueprint,
};

#[derive(Debug, Parser)]
#[command(
    name = "schemaforge",
    version,
    about = "Render annotated schemas into widget blueprints and apply form edits"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the widget blueprint for a schema and its current data
    Render(RenderArgs),
    /// Apply one edit through a form session and print the updated data
    Edit(EditArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Schema spec: file path, inline payload, or "-" for stdin
    #[arg(short = 's', long = "schema", value_name = "SPEC")]
    schema: String,

    /// Data spec: file path, inline payload, or "-" for stdin
    #[arg(short = 'd', long = "data", alias = "config", value_name = "SPEC")]
    data: Option<String>,

    /// Block definition spec: file path, inline payload, or "-" for stdin
    #[arg(short = 'b', long = "block", value_name = "SPEC")]
    block: Option<String>,

    /// Deepest nesting level that still renders
    #[arg(long = "max-depth", value_name = "N")]
    max_depth: Option<usize>,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Output destinations ("-" writes to stdout). Defaults to stdout.
    #[arg(short = 'o', long = "output", value_name = "DEST", num_args = 1.., action = ArgAction::Append)]
    outputs: Vec<String>,

    /// Emit compact JSON/TOML rather than pretty formatting
    #[arg(long = "no-pretty")]
    no_pretty: bool,

    /// Overwrite output files even if they already exist
    #[arg(short = 'f', long = "force", short_alias = 'y', alias = "yes")]
    force: bool,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct EditArgs {
    #[command(flatten)]
    input: InputArgs,

    /// JSON pointer of the field to edit ("" is the root)
    #[arg(short = 'p', long = "pointer", value_name = "PTR", default_value = "")]
    pointer: String,

    /// Treat --value as a branch id for the discriminated union at the pointer
    #[arg(long = "select-branch", requires = "value")]
    select_branch: bool,

    #[command(flatten)]
    action: EditAction,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct EditAction {
    /// New value (JSON; anything that is not valid JSON is taken as a string)
    #[arg(long = "value", value_name = "JSON")]
    value: Option<String>,

    /// Append an item to the list at the pointer; without a value a blank item is added
    #[arg(long = "append", value_name = "JSON", num_args = 0..=1, default_missing_value = "")]
    append: Option<String>,

    /// Remove the list item at this index
    #[arg(long = "remove", value_name = "INDEX")]
    remove: Option<usize>,

    /// Swap the list item at INDEX with its neighbour DELTA steps away
    #[arg(long = "move", value_name = "INDEX:DELTA", allow_hyphen_values = true)]
    move_item: Option<String>,
}

#[derive(Debug)]
enum InputSource {
    File(PathBuf),
    Stdin,
}

struct LoadedInputs {
    schema: Schema,
    data: Value,
    block: Option<BlockDefinition>,
    data_format: Option<DocumentFormat>,
    renderer: FormRenderer,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => run_render(args),
        Command::Edit(args) => run_edit(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_render(args: RenderArgs) -> Result<()> {
    let mut diagnostics = DiagnosticCollector::default();
    let inputs = load_inputs(&args.input, &mut diagnostics);
    let output = build_output_options(&args.output, None, &mut diagnostics);
    diagnostics.into_result()?;
    let (Some(inputs), Some(output)) = (inputs, output) else {
        return Err(eyre!("inputs could not be loaded"));
    };

    let tree = inputs
        .renderer
        .render_root(&inputs.schema, &inputs.data, inputs.block.as_ref());
    let blueprint = tree.as_ref().map(render_blueprint).unwrap_or(Value::Null);
    emit(&blueprint, &output).map_err(Report::msg)
}

fn run_edit(args: EditArgs) -> Result<()> {
    let mut diagnostics = DiagnosticCollector::default();
    let inputs = load_inputs(&args.input, &mut diagnostics);
    let data_format = inputs.as_ref().and_then(|inputs| inputs.data_format);
    let output = build_output_options(&args.output, data_format, &mut diagnostics);
    let path = DataPath::from_pointer(&args.pointer);
    if path.is_none() {
        diagnostics.push_input(
            "pointer",
            format!("'{}' is not a JSON pointer; use \"\" or start with '/'", args.pointer),
        );
    }
    diagnostics.into_result()?;
    let (Some(inputs), Some(output), Some(path)) = (inputs, output, path) else {
        return Err(eyre!("inputs could not be loaded"));
    };

    let mut session = FormSession::new(inputs.schema, inputs.data).with_renderer(inputs.renderer);
    if let Some(block) = inputs.block {
        session = session.with_block(block);
    }
    let tree = session
        .render()
        .ok_or_else(|| eyre!("the schema renders nothing"))?;
    let node = tree
        .node_at(&path, args.select_branch)
        .ok_or_else(|| eyre!("nothing is rendered at '{path}'"))?;

    let value = edit_value(node, &args.action)?;
    debug!(%path, %value, "applying edit");
    match session.apply(&node.handle.edit(value)) {
        EditOutcome::Applied | EditOutcome::Unchanged => {}
        EditOutcome::Stale => return Err(eyre!("the edit at '{path}' was rejected")),
    }
    emit(session.data(), &output).map_err(Report::msg)
}

fn edit_value(node: &RenderNode, action: &EditAction) -> Result<Value> {
    if let Some(raw) = &action.value {
        return Ok(parse_json_arg(raw));
    }

    let (current, blank) = list_parts(node)
        .ok_or_else(|| eyre!("list operations need a list or table at the pointer"))?;
    if let Some(raw) = &action.append {
        let item = if raw.is_empty() {
            blank
        } else {
            parse_json_arg(raw)
        };
        return Ok(list_ops::append_item(current, item));
    }
    if let Some(index) = action.remove {
        return list_ops::remove_item(current, index)
            .ok_or_else(|| eyre!("index {index} is out of range"));
    }
    if let Some(raw) = &action.move_item {
        let (index, delta) = parse_move(raw)?;
        return list_ops::move_item(current, index, delta)
            .ok_or_else(|| eyre!("cannot move item {index} by {delta}"));
    }
    Err(eyre!("no edit requested"))
}

/// The list's current items and the blank item new entries start from.
fn list_parts(node: &RenderNode) -> Option<(Option<&Value>, Value)> {
    match &node.element {
        Element::TagList { props, .. } => {
            Some((props.value.as_ref(), Value::String(String::new())))
        }
        Element::PrimitiveList {
            props, blank_item, ..
        }
        | Element::Table {
            props, blank_item, ..
        } => Some((props.value.as_ref(), blank_item.clone())),
        _ => None,
    }
}

fn parse_json_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_move(raw: &str) -> Result<(usize, isize)> {
    let (index, delta) = raw
        .split_once(':')
        .ok_or_else(|| eyre!("expected INDEX:DELTA, got '{raw}'"))?;
    let index = index
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid index in '{raw}'"))?;
    let delta = delta
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid delta in '{raw}'"))?;
    Ok((index, delta))
}

fn load_inputs(args: &InputArgs, diagnostics: &mut DiagnosticCollector) -> Option<LoadedInputs> {
    let specs = [
        ("schema", Some(args.schema.as_str())),
        ("data", args.data.as_deref()),
        ("block", args.block.as_deref()),
    ];
    let stdin_users: Vec<&str> = specs
        .iter()
        .filter(|(_, spec)| *spec == Some("-"))
        .map(|(label, _)| *label)
        .collect();
    if stdin_users.len() > 1 {
        diagnostics.push_input(
            &stdin_users.join("/"),
            "only one input can be read from stdin; provide inline content or files",
        );
        return None;
    }

    let schema_format = format_hint(Some(&args.schema), "schema", diagnostics);
    let data_format = format_hint(args.data.as_deref(), "data", diagnostics);
    let block_format = format_hint(args.block.as_deref(), "block", diagnostics);

    let schema = load_value(&args.schema, schema_format.unwrap_or_default(), "schema")
        .and_then(|raw| load_schema(&raw).map_err(|err| eyre!("{err:#}")))
        .map_err(|err| diagnostics.push_input("schema", format!("{err:#}")))
        .ok();
    let data = match args.data.as_deref() {
        Some(spec) => load_value(spec, data_format.unwrap_or_default(), "data")
            .map_err(|err| diagnostics.push_input("data", format!("{err:#}")))
            .ok(),
        None => Some(Value::Null),
    };
    let block = match args.block.as_deref() {
        Some(spec) => read_spec(spec, "block")
            .and_then(|(contents, source)| {
                parse_typed::<BlockDefinition>(&contents, block_format.unwrap_or_default())
                    .map_err(|err| eyre!("failed to parse {source}: {err:#}"))
            })
            .map(Some)
            .map_err(|err| diagnostics.push_input("block", format!("{err:#}")))
            .ok(),
        None => Some(None),
    };

    let mut options = RenderOptions::default();
    if let Some(max_depth) = args.max_depth {
        options = options.with_max_depth(max_depth);
    }

    Some(LoadedInputs {
        schema: schema?,
        data: data?,
        block: block?,
        data_format,
        renderer: FormRenderer::new().with_options(options),
    })
}

/// The format named by a file extension. Unknown extensions fall back to
/// content sniffing; extensions of formats this build lacks are an error.
fn format_hint(
    spec: Option<&str>,
    label: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Option<DocumentFormat> {
    let path = Path::new(spec.filter(|spec| *spec != "-")?);
    if let Some(format) = DocumentFormat::from_extension(path) {
        return Some(format);
    }
    if let Some(feature) = missing_feature(path) {
        diagnostics.push_input(
            label,
            format!(
                "{label} '{}' requires {feature} support, but this build lacks the '{feature}' feature",
                path.display()
            ),
        );
    }
    None
}

fn missing_feature(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "yaml" | "yml" => Some("yaml"),
        "toml" => Some("toml"),
        _ => None,
    }
}

fn load_value(spec: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    let (contents, source) = read_spec(spec, label)?;
    parse_contents(&contents, format, &source)
}

/// Contents behind a spec plus the label errors should name. Specs that are
/// not an existing path are taken as inline content.
fn read_spec(spec: &str, label: &str) -> Result<(String, String)> {
    if spec == "-" {
        return Ok((read_from_source(&InputSource::Stdin)?, label.to_string()));
    }

    let path = PathBuf::from(spec);
    if !path.exists() {
        return Ok((spec.to_string(), format!("inline {label}")));
    }
    let contents = read_from_source(&InputSource::File(path.clone()))
        .wrap_err_with(|| format!("failed to load {label} from {}", path.display()))?;
    Ok((contents, label.to_string()))
}

fn read_from_source(source: &InputSource) -> Result<String> {
    match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .wrap_err("failed to read from stdin")?;
            Ok(buffer)
        }
        InputSource::File(path) => fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read file {}", path.display())),
    }
}

fn parse_contents(contents: &str, format: DocumentFormat, label: &str) -> Result<Value> {
    parse_document_any(contents, format).map_err(|err| eyre!("failed to parse {label}: {err:#}"))
}

#[derive(Default)]
struct DiagnosticCollector {
    messages: Vec<String>,
}

impl DiagnosticCollector {
    fn push_input(&mut self, label: &str, message: impl Into<String>) {
        self.messages
            .push(format!("input ({label}): {}", message.into()));
    }

    fn push_output(&mut self, message: impl Into<String>) {
        self.messages.push(format!("output: {}", message.into()));
    }

    fn len(&self) -> usize {
        self.messages.len()
    }

    fn into_result(self) -> Result<()> {
        if self.messages.is_empty() {
            return Ok(());
        }
        let mut body = String::from("encountered input/output issues:\n");
        for (idx, msg) in self.messages.iter().enumerate() {
            let _ = writeln!(body, "  {}. {}", idx + 1, msg);
        }
        Err(eyre!(body))
    }
}

/// Stdout output uses the data's format when it came from a typed file;
/// file outputs use their own extension.
fn build_output_options(
    args: &OutputArgs,
    stdout_hint: Option<DocumentFormat>,
    diagnostics: &mut DiagnosticCollector,
) -> Option<OutputOptions> {
    let mut destinations = Vec::new();
    for raw in &args.outputs {
        if raw.trim().is_empty() {
            diagnostics.push_output("output destination cannot be empty");
            continue;
        }
        destinations.push(OutputDestination::parse(raw));
    }
    if destinations.is_empty() {
        destinations.push(OutputDestination::Stdout);
    }

    let file_paths: Vec<PathBuf> = destinations
        .iter()
        .filter_map(|dest| match dest {
            OutputDestination::File(path) => Some(path.clone()),
            OutputDestination::Stdout => None,
        })
        .collect();

    let start = diagnostics.len();
    if !args.force {
        for path in file_paths.iter().filter(|path| path.exists()) {
            diagnostics.push_output(format!(
                "file {} already exists (pass --force to overwrite)",
                path.display()
            ));
        }
    }
    let format = if file_paths.is_empty() {
        stdout_hint.unwrap_or_default()
    } else {
        infer_format_from_files(&file_paths, diagnostics).unwrap_or_default()
    };
    if diagnostics.len() > start {
        return None;
    }

    Some(
        OutputOptions::new(format)
            .with_pretty(!args.no_pretty)
            .with_destinations(destinations),
    )
}

fn infer_format_from_files(
    file_paths: &[PathBuf],
    diagnostics: &mut DiagnosticCollector,
) -> Option<DocumentFormat> {
    let mut detected: Option<DocumentFormat> = None;
    for path in file_paths {
        match DocumentFormat::from_extension(path) {
            Some(format) => match detected {
                Some(existing) if existing != format => diagnostics.push_output(format!(
                    "output file {} uses {format} but other destinations use {existing}; align extensions",
                    path.display()
                )),
                Some(_) => {}
                None => detected = Some(format),
            },
            None => match missing_feature(path) {
                Some(feature) => diagnostics.push_output(format!(
                    "output file {} requires {feature} support, but this build was compiled without the '{feature}' feature",
                    path.display()
                )),
                None => diagnostics.push_output(format!(
                    "cannot infer format from output file {}; use .json/.yaml/.toml",
                    path.display()
                )),
            },
        }
    }
    detected
}
