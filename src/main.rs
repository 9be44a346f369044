use clap::Parser;
use csvql::{run_repl, Database, EngineConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Interactive SQL-like shell over a directory of CSV tables.
#[derive(Parser, Debug)]
#[command(name = "csvql", version, about)]
struct Args {
    /// Directory holding the table files
    #[arg(value_name = "DATA_DIR", env = "CSVQL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print each parsed query as JSON before running it
    #[arg(long)]
    explain: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut config = EngineConfig::new();
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    let db = Database::new(config);

    println!("csvql version {} {}", env!("CARGO_PKG_VERSION"), chrono::Local::now().format("%Y-%m-%d"));

    let stdin = io::stdin();
    run_repl(&db, stdin.lock(), &mut io::stdout(), &mut io::stderr(), args.explain)
}
