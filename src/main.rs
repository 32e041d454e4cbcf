use clap::{Parser, Subcommand};
use dotenv::dotenv;
use recruitment_criteria::criteria::condition::{self, ValidationOptions};
use recruitment_criteria::criteria::job::{self, BatchSummary, CompiledRules};
use recruitment_criteria::criteria::loader::RulesLoader;

use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse and validate a rules file.
    ///
    /// Exits with 0 when the rules are clean, 1 when they fail to compile
    /// and 2 when they compile with advisory issues.
    Check {
        /// Path to the rules file (YAML or JSON)
        #[arg(short, long)]
        rules: String,
    },
    /// Print the inclusion criteria as a readable expression
    Show {
        /// Path to the rules file (YAML or JSON)
        #[arg(short, long)]
        rules: String,
    },
    /// Run the inclusion and exclusion jobs over a participants file
    Evaluate {
        /// Path to the rules file (YAML or JSON)
        #[arg(short, long)]
        rules: String,

        /// Path to the participants file (YAML or JSON list)
        #[arg(short, long)]
        participants: String,

        /// Participants judged per worker task
        #[arg(long, default_value_t = job::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = RulesLoader::new();
    let options = ValidationOptions::from_env();

    match args.command {
        Commands::Check { rules } => {
            let def = loader.load_rules(&rules)?;
            let compiled = match CompiledRules::compile(&def, &options) {
                Ok(compiled) => compiled,
                Err(e) => {
                    eprintln!("{}: {}", rules, e);
                    return Ok(ExitCode::FAILURE);
                }
            };

            if compiled.issues.is_empty() {
                println!("{}: ok", rules);
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &compiled.issues {
                println!("{}: {}", rules, issue);
            }
            return Ok(ExitCode::from(2));
        }
        Commands::Show { rules } => {
            let def = loader.load_rules(&rules)?;
            let compiled = CompiledRules::compile(&def, &options)?;
            warn_issues(&rules, &compiled);

            if let Some(name) = &def.name {
                println!("List: {}", name);
            }
            println!("Study: {}", def.participant_inclusion.study_key);
            println!("Inclusion: {:?}", compiled.inclusion_type);
            let emails = &def.participant_inclusion.notification_emails;
            if !emails.is_empty() {
                println!("Notify: {}", emails.join(", "));
            }
            println!("Criteria: {}", compiled.criteria);

            if let Some(serialized) = condition::to_criteria_string(&compiled.criteria) {
                println!("Stored form: {}", serialized);
            }
            for exclusion in &compiled.exclusions {
                println!("Exclude when flags[{}] == {:?}", exclusion.key, exclusion.value);
            }
        }
        Commands::Evaluate {
            rules,
            participants,
            chunk_size,
        } => {
            let def = loader.load_rules(&rules)?;
            let compiled = CompiledRules::compile(&def, &options)?;
            warn_issues(&rules, &compiled);
            let compiled = Arc::new(compiled);
            let records = loader.load_participants(&participants)?;
            log::info!(
                "Evaluating {} participants against {}",
                records.len(),
                rules
            );

            let verdicts = job::run_batch(compiled, records, chunk_size).await?;
            for verdict in &verdicts {
                let exclusion = match &verdict.excluded_by {
                    Some(condition) => format!("excluded ({}={})", condition.key, condition.value),
                    None => "kept".to_string(),
                };
                println!("{}\t{}\t{}", verdict.participant_id, verdict.inclusion, exclusion);
            }
            println!("{}", BatchSummary::from_verdicts(&verdicts));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn warn_issues(rules: &str, compiled: &CompiledRules) {
    for issue in &compiled.issues {
        log::warn!("{}: {}", rules, issue);
    }
}
