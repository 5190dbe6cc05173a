//! crewdesk CLI - run generation jobs and manage console configuration.
//!
//! Reuses the same core domain logic (crewdesk-core) and server bootstrap
//! (crewdesk-server) that back the web console.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use crewdesk_core::config::JobConfig;

/// crewdesk CLI - multi-agent content generation console
#[derive(Parser)]
#[command(name = "crewdesk", version, about = "crewdesk CLI - multi-agent content generation console")]
pub struct Cli {
    /// Data root holding public/workflows.json and config/*.json
    #[arg(long, env = "CREWDESK_DATA_DIR", default_value = ".", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// How the generation job is launched.
#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    /// Program that runs a generation job
    #[arg(long, env = "CREWDESK_JOB_PROGRAM", default_value = "python3")]
    job_program: String,
    /// Arguments placed before <topic> <workflow_id>, whitespace-separated
    #[arg(long, env = "CREWDESK_JOB_ARGS", default_value = "-u -m crew.run", allow_hyphen_values = true)]
    job_args: String,
    /// Working directory for the job (defaults to the data root)
    #[arg(long, env = "CREWDESK_JOB_WORKDIR")]
    job_workdir: Option<PathBuf>,
    /// Wall-clock budget for one job, in seconds
    #[arg(long, env = "CREWDESK_JOB_TIMEOUT_SECS", default_value_t = 300)]
    job_timeout_secs: u64,
}

impl JobArgs {
    fn to_config(&self, data_dir: &std::path::Path) -> JobConfig {
        JobConfig {
            program: self.job_program.clone(),
            args: JobConfig::split_args(&self.job_args),
            working_dir: Some(
                self.job_workdir
                    .clone()
                    .unwrap_or_else(|| data_dir.to_path_buf()),
            ),
            timeout: Duration::from_secs(self.job_timeout_secs),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the crewdesk HTTP server
    Server {
        /// Host to bind to
        #[arg(long, env = "CREWDESK_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, env = "CREWDESK_PORT", default_value_t = 3000)]
        port: u16,
        /// Path to static frontend directory
        #[arg(long, env = "CREWDESK_STATIC_DIR")]
        static_dir: Option<String>,
        /// Password required by configuration endpoints
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
        #[command(flatten)]
        job: JobArgs,
    },

    /// Run a generation job and render its transcript
    Run {
        /// Topic to write about
        #[arg(long)]
        topic: String,
        /// Workflow to run
        #[arg(long)]
        workflow_id: String,
        /// Stream from a running crewdesk server instead of running locally
        #[arg(long)]
        server: Option<String>,
        #[command(flatten)]
        job: JobArgs,
    },

    /// Manage workflows
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Manage LLM providers
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Manage per-workflow model selection
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// List workflows
    List,
    /// Show a workflow definition
    Show {
        /// Workflow ID
        id: String,
    },
    /// Check a workflow file (YAML or JSON) without importing it
    Validate {
        file: PathBuf,
    },
    /// Import a workflow file (YAML or JSON)
    Import {
        file: PathBuf,
        /// Overwrite an existing workflow with the same id
        #[arg(long)]
        replace: bool,
    },
    /// Delete a workflow
    Delete {
        /// Workflow ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ProviderAction {
    /// List providers (keys masked) and whether their key is set
    List,
    /// Show preset templates per provider type
    Templates,
    /// Send a test completion through a provider
    Test {
        /// Provider ID
        id: String,
        /// Model to test (defaults to the provider's default model)
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModelsAction {
    /// Show model configuration (all workflows, or one)
    Show {
        workflow_id: Option<String>,
    },
    /// Set a workflow's default provider and model
    SetDefault {
        workflow_id: String,
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: String,
    },
    /// Override the provider and model for one agent
    SetAgent {
        workflow_id: String,
        agent_name: String,
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: String,
    },
    /// Show which provider and model an agent will use
    Resolve {
        workflow_id: String,
        agent_name: String,
    },
    /// Remove a workflow's model configuration
    Clear {
        workflow_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewdesk_core=warn,crewdesk_server=warn,crewdesk_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Server {
            host,
            port,
            static_dir,
            admin_password,
            job,
        } => {
            let config = crewdesk_server::ServerConfig {
                host,
                port,
                job: job.to_config(&cli.data_dir),
                data_dir: cli.data_dir,
                static_dir,
                admin_password,
            };
            commands::server::run(config).await
        }

        Commands::Run {
            topic,
            workflow_id,
            server,
            job,
        } => match server {
            Some(url) => commands::run::remote(&url, &topic, &workflow_id).await,
            None => commands::run::local(job.to_config(&cli.data_dir), &topic, &workflow_id).await,
        },

        Commands::Workflow { action } => {
            let state = commands::init_state(&cli.data_dir);
            match action {
                WorkflowAction::List => commands::workflow::list(&state).await,
                WorkflowAction::Show { id } => commands::workflow::show(&state, &id).await,
                WorkflowAction::Validate { file } => commands::workflow::validate(&file),
                WorkflowAction::Import { file, replace } => {
                    commands::workflow::import(&state, &file, replace).await
                }
                WorkflowAction::Delete { id, yes } => {
                    commands::workflow::delete(&state, &id, yes).await
                }
            }
        }

        Commands::Provider { action } => {
            let state = commands::init_state(&cli.data_dir);
            match action {
                ProviderAction::List => commands::provider::list(&state).await,
                ProviderAction::Templates => commands::provider::templates(),
                ProviderAction::Test { id, model } => {
                    commands::provider::test(&state, &id, model.as_deref()).await
                }
            }
        }

        Commands::Models { action } => {
            let state = commands::init_state(&cli.data_dir);
            match action {
                ModelsAction::Show { workflow_id } => {
                    commands::models::show(&state, workflow_id.as_deref()).await
                }
                ModelsAction::SetDefault {
                    workflow_id,
                    provider,
                    model,
                } => commands::models::set_default(&state, &workflow_id, &provider, &model).await,
                ModelsAction::SetAgent {
                    workflow_id,
                    agent_name,
                    provider,
                    model,
                } => {
                    commands::models::set_agent(&state, &workflow_id, &agent_name, &provider, &model)
                        .await
                }
                ModelsAction::Resolve {
                    workflow_id,
                    agent_name,
                } => commands::models::resolve(&state, &workflow_id, &agent_name).await,
                ModelsAction::Clear { workflow_id } => {
                    commands::models::clear(&state, &workflow_id).await
                }
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
