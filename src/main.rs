use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use qbd_bill_export::{
    client::{OpenMode, QBConnector, SnapshotTransport},
    functions::{export_bills, BillCsvWriter},
    APIError, APIResult, AppIdentity,
};

/// Exports QuickBooks Desktop bills to CSV.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the company file so the application can be approved in QuickBooks
    Authorize {
        #[command(flatten)]
        company: CompanyArgs,
        /// Disconnect without waiting for Enter
        #[arg(long)]
        yes: bool,
    },
    /// Write bills dated on or after the start date to a CSV file
    Generate {
        #[command(flatten)]
        company: CompanyArgs,
        #[arg(short, long, value_name = "CSV")]
        output: String,
        /// Earliest bill date, YYYY-MM-DD
        #[arg(short = 'd', long, value_name = "DATE")]
        start: String,
        #[arg(short, long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
        batchsize: u32,
    },
    /// List active vendors as id|name
    Vendors {
        #[command(flatten)]
        company: CompanyArgs,
        /// One JSON object per vendor instead
        #[arg(long)]
        json: bool,
    },
    /// List active terms as id|name
    Terms {
        #[command(flatten)]
        company: CompanyArgs,
    },
}

#[derive(Args, Debug)]
struct CompanyArgs {
    #[arg(short, long, value_name = "PATH")]
    companyfile: PathBuf,
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Single,
    Multi,
    Any,
}

impl From<Mode> for OpenMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Single => OpenMode::SingleUser,
            Mode::Multi => OpenMode::MultiUser,
            Mode::Any => OpenMode::DoNotCare,
        }
    }
}

fn check_company_file(path: &Path) -> APIResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(APIError::CompanyFile(path.display().to_string()))
    }
}

fn parse_start(raw: &str) -> APIResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        APIError::InvalidArgument(format!("Start date {raw:?} is not a valid YYYY-MM-DD date : {e}"))
    })
}

async fn open(company: &CompanyArgs) -> APIResult<QBConnector<SnapshotTransport>> {
    check_company_file(&company.companyfile)?;
    let mut qb = QBConnector::new(SnapshotTransport::new(), AppIdentity::from_env());
    let status = qb.connect(&company.companyfile, company.mode.into()).await;
    eprintln!("{}", status.format_message());
    if status.is_connected() {
        Ok(qb)
    } else {
        Err(APIError::NoConnection)
    }
}

async fn run(cli: Cli) -> APIResult<()> {
    match cli.command {
        Command::Authorize { company, yes } => {
            let qb = open(&company).await?;
            if !yes {
                eprintln!("Approve the application in QuickBooks, then press Enter.");
                std::io::stdin().lock().read_line(&mut String::new())?;
            }
            qb.disconnect().await
        }
        Command::Generate {
            company,
            output,
            start,
            batchsize,
        } => {
            check_company_file(&company.companyfile)?;
            if output.trim().is_empty() {
                return Err(APIError::InvalidArgument("An output path is required".into()));
            }
            let start = parse_start(&start)?;

            let qb = open(&company).await?;
            let mut out = BillCsvWriter::create(output.trim())?;
            let written = export_bills(&qb, start, batchsize as usize, &mut out, |status| {
                eprintln!("{}", status.progress_message());
            })
            .await?;
            eprintln!("Wrote {written} bills to {}", output.trim());
            qb.disconnect().await
        }
        Command::Vendors { company, json } => {
            let qb = open(&company).await?;
            let vendors = qb.list_vendors().await?;
            qb.disconnect().await?;
            let mut stdout = std::io::stdout().lock();
            for vendor in &vendors {
                if json {
                    writeln!(stdout, "{}", serde_json::to_string(vendor)?)?;
                } else {
                    writeln!(stdout, "{}|{}", vendor.id, vendor.name)?;
                }
            }
            Ok(())
        }
        Command::Terms { company } => {
            let qb = open(&company).await?;
            let terms = qb.list_terms().await?;
            qb.disconnect().await?;
            let mut stdout = std::io::stdout().lock();
            for pair in &terms {
                writeln!(stdout, "{}", pair.to_formatted_string())?;
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version go to stdout and are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
