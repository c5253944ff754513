use crate::demo::{run_demo, run_review_export, run_review_show, DemoArgs, ExportArgs, ShowArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grade_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Grade Review",
    about = "Review, adjust and submit automated homework evaluations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect or export a raw scoring result from disk
    Review {
        #[command(subcommand)]
        command: ReviewCommand,
    },
    /// Run a scripted review session against in-memory collaborators
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ReviewCommand {
    /// Print the grader (or student) view of a raw evaluation
    Show(ShowArgs),
    /// Print the payload that would be stored for a raw evaluation
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Review {
            command: ReviewCommand::Show(args),
        } => run_review_show(args),
        Command::Review {
            command: ReviewCommand::Export(args),
        } => run_review_export(args),
        Command::Demo(args) => run_demo(args),
    }
}
