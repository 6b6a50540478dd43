use clap::{Args, Parser, Subcommand, ValueEnum};
use orbvis::workflows::InputFormat;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "orbvis CLI - renders molecular orbitals, electron densities, and structures computed by quantum-chemistry packages into ray-marched imagery.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a wavefunction or structure file to a PNG image.
    Render(RenderArgs),
    /// Load a file and print a summary of its contents.
    Info(InfoArgs),
}

/// Arguments for the `render` subcommand.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Path to the input file (.molden, .wfx, .xyz, .cube).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output PNG image.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a render settings file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Input format, when the file extension does not give it away.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// What to show: an orbital index, 'homo', 'lumo', or 'density'.
    /// Omitted, only the geometry (and any grid the file carries) is drawn.
    #[arg(short = 'm', long = "orbital", value_name = "SELECTION")]
    pub orbital: Option<String>,

    /// Image width in pixels.
    #[arg(long, default_value_t = 800, value_name = "INT")]
    pub width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 600, value_name = "INT")]
    pub height: u32,

    /// Camera position as 'x,y,z' in Å. Omitted, the camera frames the
    /// model automatically.
    #[arg(long, value_name = "X,Y,Z", requires = "camera_direction")]
    pub camera_position: Option<String>,

    /// Camera view direction as 'x,y,z'.
    #[arg(long, value_name = "X,Y,Z", requires = "camera_position")]
    pub camera_direction: Option<String>,

    /// Explicit sampling grid resolution as 'nx,ny,nz', overriding the
    /// density-derived default.
    #[arg(long, value_name = "NX,NY,NZ")]
    pub resolution: Option<String>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the input file (.molden, .wfx, .xyz, .cube).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Input format, when the file extension does not give it away.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatArg>,
}

/// The input formats nameable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Molden,
    Wfx,
    Xyz,
    Cube,
}

impl From<FormatArg> for InputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Molden => InputFormat::Molden,
            FormatArg::Wfx => InputFormat::Wfx,
            FormatArg::Xyz => InputFormat::Xyz,
            FormatArg::Cube => InputFormat::Cube,
        }
    }
}
