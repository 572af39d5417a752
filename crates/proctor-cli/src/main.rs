//! proctor CLI — run timed evaluation sessions from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "proctor", version, about = "Timed evaluation session engine")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and example evaluations
    Init,

    /// Validate evaluation TOML files
    Validate {
        /// Path to an evaluation file or directory
        #[arg(long)]
        evaluations: PathBuf,
    },

    /// Start (or resume) a session
    Start {
        /// Evaluation id
        #[arg(long)]
        evaluation: String,

        /// Taker id
        #[arg(long)]
        taker: String,
    },

    /// Show a session's status and remaining time
    Status {
        #[arg(long)]
        session: Uuid,
    },

    /// Save a draft answer
    SaveDraft {
        #[arg(long)]
        session: Uuid,

        /// Question id
        #[arg(long)]
        question: String,

        /// Answer value; "file:<ref>" attaches a file to a written-answer question
        #[arg(long)]
        answer: String,
    },

    /// Show the answers a submit would use right now
    LoadDraft {
        #[arg(long)]
        session: Uuid,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Upload a file to attachment storage
    Upload {
        /// File to upload
        #[arg(long)]
        file: PathBuf,
    },

    /// Submit a session
    Submit {
        #[arg(long)]
        session: Uuid,

        /// Final answers as QUESTION=VALUE (repeatable)
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Attachment references (repeatable)
        #[arg(long = "attachment")]
        attachments: Vec<String>,
    },

    /// Show the graded result of a session
    Result {
        #[arg(long)]
        session: Uuid,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also write the result as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Record a manual grade for a short-answer or essay question
    Grade {
        #[arg(long)]
        session: Uuid,

        #[arg(long)]
        question: String,

        #[arg(long, allow_hyphen_values = true)]
        score: i64,

        #[arg(long)]
        feedback: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proctor=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { evaluations } => commands::validate::execute(evaluations),
        Commands::Start { evaluation, taker } => {
            commands::session::start(config, evaluation, taker).await
        }
        Commands::Status { session } => commands::session::status(config, session).await,
        Commands::SaveDraft {
            session,
            question,
            answer,
        } => commands::draft::save(config, session, question, answer).await,
        Commands::LoadDraft { session, json } => {
            commands::draft::load(config, session, json).await
        }
        Commands::Upload { file } => commands::submit::upload(config, file).await,
        Commands::Submit {
            session,
            answers,
            attachments,
        } => commands::submit::execute(config, session, answers, attachments).await,
        Commands::Result {
            session,
            format,
            output,
        } => commands::result::show(config, session, format, output).await,
        Commands::Grade {
            session,
            question,
            score,
            feedback,
        } => commands::result::grade(config, session, question, score, feedback).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
