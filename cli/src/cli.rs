use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "oxpoints")]
/// OxPoints command line tool and HTTP query service
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the OxPoints HTTP server
    Serve {
        /// RDF file to load, the format is guessed from its extension
        ///
        /// Can be repeated to load several files.
        #[arg(short, long, required = true, value_hint = ValueHint::FilePath)]
        data: Vec<PathBuf>,
        /// Host and port to listen to
        #[arg(short, long, default_value = "localhost:7878", value_hint = ValueHint::Hostname)]
        bind: String,
        /// Allows cross-origin requests
        #[arg(long)]
        cors: bool,
        /// Refuses uploads to /data
        #[arg(long)]
        read_only: bool,
        /// Path of the GPSBabel executable used for other output formats
        #[arg(long, default_value = oxpoints::gpsbabel::DEFAULT_GPSBABEL_PATH, value_hint = ValueHint::ExecutablePath)]
        gpsbabel: PathBuf,
        /// Public URL of the service, used in the Location header of uploads
        ///
        /// By default it is derived from the bind address.
        #[arg(long, value_hint = ValueHint::Url)]
        base_url: Option<String>,
        /// Name of the administrator shown on error pages
        #[arg(long)]
        admin_name: Option<String>,
        /// Email address of the administrator shown on error pages
        #[arg(long)]
        admin_email: Option<String>,
    },
    /// Answer one path query and write the result to stdout
    Query {
        /// RDF file to load, the format is guessed from its extension
        ///
        /// Can be repeated to load several files.
        #[arg(short, long, required = true, value_hint = ValueHint::FilePath)]
        data: Vec<PathBuf>,
        /// The path query, like "/type/College.kml"
        path: String,
        /// Query parameter given as name=value
        ///
        /// Can be repeated.
        #[arg(short, long, value_parser = parse_param)]
        param: Vec<(String, String)>,
        /// Path of the GPSBabel executable used for other output formats
        #[arg(long, default_value = oxpoints::gpsbabel::DEFAULT_GPSBABEL_PATH, value_hint = ValueHint::ExecutablePath)]
        gpsbabel: PathBuf,
    },
}

fn parse_param(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("Expected name=value, found '{value}'"))
}
