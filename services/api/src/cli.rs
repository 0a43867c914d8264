use crate::commands::{
    run_contract, run_export, run_pricing, run_quote, run_words, ContractArgs, ExportArgs,
    QuoteArgs, WordsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use microcredit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Micro-loan Origination Service",
    about = "Quote, record and document micro-loan proposals from the command line",
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
    /// Price a principal and installment count from the table
    Quote(QuoteArgs),
    /// Audit the pricing table against the flat 20% monthly formula
    Pricing,
    /// Write an amount out in Brazilian Portuguese words
    Words(WordsArgs),
    /// Render the debt instrument for a proposal held in the local cache
    Contract(ContractArgs),
    /// Export the local cache as CSV
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
        Command::Quote(args) => run_quote(args),
        Command::Pricing => run_pricing(),
        Command::Words(args) => run_words(args),
        Command::Contract(args) => run_contract(args).await,
        Command::Export(args) => run_export(args).await,
    }
}
