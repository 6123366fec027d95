//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the adapter described by a YAML file and report the outcome.
//! - Keep output deterministic for quick local sanity checks.

use clap::Parser;
use log::info;
use paperdb_core::{default_log_level, init_logging, Adapter, AdapterLogger};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "paperdb")]
#[command(version)]
#[command(about = "Open a PaperDB database from its adapter config", long_about = None)]
struct Args {
    /// Adapter YAML file (host, user, pass, database, prefix)
    #[arg(short, long, default_value = "paperdb.db.yml")]
    adapter: PathBuf,

    /// Absolute directory for rotating log files; logging stays off when omitted
    #[arg(short, long)]
    log_dir: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    println!("paperdb_core version={}", paperdb_core::core_version());

    if let Some(log_dir) = &args.log_dir {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("failed to start logging: {err}");
            return ExitCode::FAILURE;
        }
    }

    let adapter_path = args.adapter.display();
    let mut adapter = match Adapter::from_config_file(&args.adapter, AdapterLogger::new()) {
        Ok(adapter) => adapter,
        Err(err) => {
            eprintln!("failed to open database from `{adapter_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("event=cli_open module=cli status=ok config={adapter_path}");
    println!(
        "database opened prefix={:?} ping={}",
        adapter.database_prefix(),
        if adapter.ping().is_ok() { "ok" } else { "error" }
    );
    adapter.close();
    ExitCode::SUCCESS
}
