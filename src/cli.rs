use crate::config::{DEFAULT_CONFIG_FILE, load_config};
#[cfg(feature = "png")]
use crate::config::ExportConfig;
use crate::ir::EdgeView;
use crate::layout_dump::write_graph_dump;
use crate::render::{ExportFormat, export_timestamp, resolve_output_path, write_output_svg};
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::session::{NullRenderer, Session};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relgraph", version, about = "Relationship survey graph renderer")]
pub struct Args {
    /// Input CSV export or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file or directory. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Relation config JSON (hierarchy, colors, relationGroups). When omitted,
    /// relation-config.json next to the input is used if present.
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Show the original labels instead of merged categories
    #[arg(long = "raw")]
    pub raw: bool,

    /// Only keep relations given by this person (repeatable)
    #[arg(short = 'p', long = "person")]
    pub persons: Vec<String>,

    /// Only keep relations with this label (repeatable)
    #[arg(short = 'r', long = "relation")]
    pub relations: Vec<String>,

    /// PNG scale factor (1-10)
    #[arg(short = 's', long = "scale")]
    pub scale: Option<u32>,

    /// Print the selectable persons and relations instead of rendering
    #[arg(long = "list")]
    pub list: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    init_tracing();
    run_with(Args::parse())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run_with(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = Session::new(config, NullRenderer);
    if args.config.is_none() {
        if let Some(path) = default_config_path(args.input.as_deref()) {
            session.start_config_load(path);
        }
    }

    let input = read_input(args.input.as_deref())?;
    let loaded = session.load_csv(input).map(|_| ());
    // A late override rebuilds the graph from the same input.
    session.finish_config_load();
    loaded?;

    if args.raw {
        session.set_view(EdgeView::Raw);
    }
    session.set_person_filter(args.persons.iter().cloned());
    session.set_relation_filter(args.relations.iter().cloned());

    if args.list {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        print_options(&mut out, &session)?;
        return Ok(());
    }

    let now = chrono::Utc::now();
    match args.output_format {
        OutputFormat::Svg => {
            let svg = session.export_svg();
            let output = args
                .output
                .as_deref()
                .map(|path| resolve_output_path(path, ExportFormat::Svg, now));
            write_output_svg(&svg, output.as_deref())?;
        }
        OutputFormat::Png => write_png(&mut session, &args, now)?,
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => {
                let path = if path.is_dir() {
                    path.join(format!("graph_{}.json", export_timestamp(now)))
                } else {
                    path.to_path_buf()
                };
                let file = std::fs::File::create(&path)?;
                write_graph_dump(io::BufWriter::new(file), session.graph(), Some(session.layout()))?;
            }
            None => {
                let stdout = io::stdout();
                write_graph_dump(stdout.lock(), session.graph(), Some(session.layout()))?;
                println!();
            }
        },
    }

    Ok(())
}

#[cfg(feature = "png")]
fn write_png(
    session: &mut Session<NullRenderer>,
    args: &Args,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    let output = ensure_output(args.output.as_deref(), "png")?;
    let scale = match args.scale {
        Some(scale) => scale.clamp(1, ExportConfig::MAX_PNG_SCALE),
        None => session.config().export.clamped_png_scale(),
    };
    let path = resolve_output_path(output, ExportFormat::Png { scale }, now);
    let svg = session.export_svg();
    if let Err(err) = write_output_png(&svg, &path, scale) {
        session.report_export_error(&err);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(not(feature = "png"))]
fn write_png(
    _session: &mut Session<NullRenderer>,
    _args: &Args,
    _now: chrono::DateTime<chrono::Utc>,
) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn print_options<W: Write>(out: &mut W, session: &Session<NullRenderer>) -> Result<()> {
    writeln!(out, "Persons:")?;
    for node in session.person_options() {
        writeln!(out, "  {}", node.label)?;
    }
    writeln!(out, "Relations:")?;
    for label in session.relation_options() {
        writeln!(out, "  {}", label)?;
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read(path)?);
        }
    }
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

/// `relation-config.json` beside the input file, else in the working
/// directory.
fn default_config_path(input: Option<&Path>) -> Option<PathBuf> {
    let beside_input = input
        .filter(|path| *path != Path::new("-"))
        .and_then(Path::parent)
        .map(|dir| dir.join(DEFAULT_CONFIG_FILE));
    beside_input
        .into_iter()
        .chain(std::iter::once(PathBuf::from(DEFAULT_CONFIG_FILE)))
        .find(|candidate| candidate.is_file())
}

fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY: &str = "t,Nom,Alice,Bob\n1,Alice,,Ami\n2,Bob,haine,\n";

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["relgraph"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_repeatable_filters() {
        let parsed = args(&["-i", "s.csv", "-p", "Alice", "-p", "Bob", "-r", "ami", "--raw", "-e", "png", "-s", "3"]);
        assert_eq!(parsed.persons, vec!["Alice", "Bob"]);
        assert_eq!(parsed.relations, vec!["ami"]);
        assert!(parsed.raw);
        assert_eq!(parsed.output_format, OutputFormat::Png);
        assert_eq!(parsed.scale, Some(3));
    }

    #[test]
    fn png_requires_output() {
        assert!(ensure_output(None, "png").is_err());
        assert!(ensure_output(Some(Path::new("x.png")), "png").is_ok());
    }

    #[test]
    fn writes_svg_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("survey.csv");
        std::fs::write(&input, SURVEY).unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        run_with(args(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
        ]))
        .unwrap();

        let written: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
        assert_eq!(written.len(), 1);
        let path = written[0].as_ref().unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("graph_") && name.ends_with(".svg"), "{name}");
        let svg = std::fs::read_to_string(path).unwrap();
        assert_eq!(svg.matches("<circle ").count(), 2);
        assert_eq!(svg.matches("<line ").count(), 2);
    }

    #[test]
    fn picks_up_config_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("survey.csv");
        std::fs::write(&input, SURVEY).unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r##"{"colors": {"ami": "#ABCDEF"}}"##,
        )
        .unwrap();
        let out = dir.path().join("graph.json");

        run_with(args(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-e",
            "json",
        ]))
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(value["edgesMerged"][0]["label"], "ami");
        assert_eq!(value["edgesMerged"][0]["color"], "#ABCDEF");
        assert_eq!(value["edgesRaw"][0]["label"], "Ami");
    }

    #[test]
    fn empty_survey_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("survey.csv");
        std::fs::write(&input, "t,Nom,Bob\n1,Alice,\n").unwrap();
        let err = run_with(args(&["-i", input.to_str().unwrap()])).unwrap_err();
        assert_eq!(err.to_string(), "No data found in the CSV.");
    }
}
