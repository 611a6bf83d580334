mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use hirelens::telemetry::{self, LogFormat};

#[derive(Parser)]
#[command(name = "hirelens")]
#[command(about = "Evaluate candidate resumes against job requirements", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.hirelens/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage job requirements
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Store resumes as new candidates and evaluate them
    Submit(SubmitArgs),
    /// Run the evaluation again for an existing candidate
    Reprocess {
        candidate_id: String,
    },
    /// Show a candidate, its current evaluation and the feedback on it
    Status {
        candidate_id: String,
    },
    /// Print a candidate's audit trail
    Logs {
        candidate_id: String,
    },
    /// Record a stakeholder button press
    Callback(CallbackArgs),
}

#[derive(Subcommand)]
enum JobCommands {
    /// Create a job requirement
    Add(JobAddArgs),
    /// Stop accepting submissions for a job requirement
    Deactivate { id: String },
}

#[derive(Args)]
struct JobAddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// Comma-separated required skills
    #[arg(long, value_delimiter = ',')]
    required: Vec<String>,
    /// Comma-separated nice-to-have skills
    #[arg(long, value_delimiter = ',')]
    nice: Vec<String>,
    /// Minimum years of experience
    #[arg(long, default_value_t = 0)]
    years: u32,
}

#[derive(Args)]
struct SubmitArgs {
    /// Job requirement id
    #[arg(long = "job")]
    job_id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    linkedin: Option<String>,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct CallbackArgs {
    /// Raw Bot API update (JSON file) carrying a callback_query
    #[arg(long, conflicts_with_all = ["data", "from_id"])]
    update: Option<PathBuf>,
    /// `{action}_{evaluation_id}`
    #[arg(long, required_unless_present = "update")]
    data: Option<String>,
    #[arg(long, required_unless_present = "update")]
    from_id: Option<String>,
    #[arg(long)]
    from_name: Option<String>,
    #[arg(long)]
    callback_id: Option<String>,
    #[arg(long)]
    comment: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_format);

    let config = commands::load_settings(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Job { command } => match command {
            JobCommands::Add(args) => commands::job_add(
                &config,
                &args.title,
                &args.description,
                args.required,
                args.nice,
                args.years,
            ),
            JobCommands::Deactivate { id } => commands::job_deactivate(&config, &id),
        },
        Commands::Submit(args) => commands::submit(
            &config,
            commands::Submission {
                job_id: args.job_id,
                name: args.name,
                email: args.email,
                phone: args.phone,
                linkedin: args.linkedin,
                files: args.files,
            },
        ),
        Commands::Reprocess { candidate_id } => commands::reprocess(&config, &candidate_id),
        Commands::Status { candidate_id } => commands::status(&config, &candidate_id),
        Commands::Logs { candidate_id } => commands::logs(&config, &candidate_id),
        Commands::Callback(args) => {
            let source = match args.update {
                Some(path) => commands::CallbackSource::Update(path),
                None => commands::CallbackSource::Fields {
                    data: args.data.unwrap_or_default(),
                    from_id: args.from_id.unwrap_or_default(),
                    from_name: args.from_name,
                    callback_id: args.callback_id,
                    comment: args.comment,
                },
            };
            commands::callback(&config, source)
        }
    }
}
