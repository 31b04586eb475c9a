mod db;
mod error;
mod report;
mod run;

use clap::{CommandFactory, Parser, Subcommand};

use error::exit_with_error;
use run::AuditArg;

#[derive(Parser)]
#[clap(
  author,
  version,
  about = "Audit simulator coverage databases against check and exclusion files",
  args_conflicts_with_subcommands = true
)]
struct App {
  #[clap(subcommand)]
  command: Option<Commands>,
  #[clap(flatten)]
  audit: AuditArg,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate shell completions
  Completions {
    #[clap(value_enum)]
    shell: clap_complete::Shell,
  },
}

fn main() -> anyhow::Result<()> {
  let app = App::parse();
  let result = match app.command {
    Some(Commands::Completions { shell }) => {
      clap_complete::generate(shell, &mut App::command(), "covcheck", &mut std::io::stdout());
      Ok(())
    }
    None => run::run_audit(app.audit),
  };
  match result {
    Ok(()) => Ok(()),
    Err(error) => exit_with_error(error),
  }
}
