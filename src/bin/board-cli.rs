use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use board_guard::audit::summary::summarize;
use board_guard::config::{load_config, load_or_default};
use board_guard::security::password::{
    check_password_policy, generate_password, password_digest, validate_password_strength,
};
use board_guard::security::random::random_hex;

#[derive(Parser)]
#[command(name = "board-cli")]
#[command(about = "Operator tools for the announcement board security layer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a security audit log
    AuditSummary {
        /// Audit log to read
        #[arg(short, long, default_value = "logs/security.log")]
        file: PathBuf,
        /// How many client addresses to list
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Generate a random password
    GenPassword {
        #[arg(short, long, default_value_t = 16)]
        length: usize,
    },
    /// Check a password against the strength rules
    CheckPassword {
        password: String,
        /// Configuration whose `security.password_min_length` applies
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Overrides the configured minimum length
        #[arg(short, long)]
        min_length: Option<usize>,
    },
    /// Produce the salt and digest for the [admin] config section
    HashPassword {
        password: String,
        /// Salt to use; a random one is generated when omitted
        #[arg(short, long)]
        salt: Option<String>,
    },
    /// Load and validate a configuration file
    CheckConfig { path: PathBuf },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::AuditSummary { file, top } => {
            let reader = BufReader::new(File::open(&file)?);
            let summary = summarize(reader, top)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::GenPassword { length } => {
            println!("{}", generate_password(length));
        }
        Commands::CheckPassword {
            password,
            config,
            min_length,
        } => {
            let config = load_or_default(config.as_deref())?;
            let problems = match min_length {
                Some(min_length) => validate_password_strength(&password, min_length),
                None => check_password_policy(&password, &config.security),
            };
            if !problems.is_empty() {
                for problem in problems {
                    eprintln!("{}", problem);
                }
                return Ok(ExitCode::FAILURE);
            }
            println!("Password meets the strength rules.");
        }
        Commands::HashPassword { password, salt } => {
            let salt = salt.unwrap_or_else(|| random_hex(16));
            println!("[admin]");
            println!("password_salt = \"{}\"", salt);
            println!("password_sha256 = \"{}\"", password_digest(&salt, &password));
        }
        Commands::CheckConfig { path } => match load_config(&path) {
            Ok(_) => println!("{}: OK", path.display()),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}
