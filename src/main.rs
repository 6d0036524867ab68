use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use projectdesk_supabase::utils::{logger, validation::Validate};
use projectdesk_supabase::{
    AuthRepository, CreateProjectInput, ProjectRepository, ProjectRole, SignInInput, SignUpInput,
    SupabaseAuthRepository, SupabaseClient, SupabaseConfig, SupabaseProjectRepository,
    UpdateProjectInput,
};

#[derive(Debug, Parser)]
#[command(name = "projectdesk")]
#[command(about = "Project data-access CLI against a Supabase backend")]
struct Cli {
    /// TOML config file; falls back to SUPABASE_URL / SUPABASE_ANON_KEY env vars
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sign in before running the command
    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List projects visible to the current user
    List,
    /// Show a single project
    Show { id: String },
    /// Create a project
    Create { name: String },
    /// Rename a project
    Rename { id: String, name: String },
    /// Delete a project
    Delete { id: String },
    /// Join a project as the current user
    Join {
        project_id: String,
        #[arg(long, default_value = "viewer")]
        role: ProjectRole,
    },
    /// Whether the current user has access to any project
    CheckAccess,
    /// Register a new account
    SignUp { email: String, password: String },
    /// Sign out the current session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => SupabaseConfig::from_file(path)?,
        None => SupabaseConfig::from_env()?,
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let client = Arc::new(SupabaseClient::new(config)?);
    let auth = SupabaseAuthRepository::new(client.clone());
    let projects = SupabaseProjectRepository::new(client.clone());

    if let (Some(email), Some(password)) = (cli.email.clone(), cli.password.clone()) {
        let result = auth.sign_in(SignInInput { email, password }).await?;
        tracing::info!("Signed in as {}", result.session.email);
    }

    match cli.command {
        Command::List => {
            for project in projects.list().await? {
                println!(
                    "{}  {:<7}  {}  {}",
                    project.id,
                    project.role,
                    project.created_at.format("%Y-%m-%d"),
                    project.name
                );
            }
        }
        Command::Show { id } => match projects.find_by_id(&id).await? {
            Some(project) => {
                println!("{}  {}  {}", project.id, project.created_at, project.name)
            }
            None => println!("Project {} not found", id),
        },
        Command::Create { name } => {
            let project = projects.create(CreateProjectInput { name }).await?;
            println!("✅ Created project {} ({})", project.name, project.id);
        }
        Command::Rename { id, name } => {
            let project = projects
                .update(&id, UpdateProjectInput { name: Some(name) })
                .await?;
            println!("✅ Renamed project {} to {}", project.id, project.name);
        }
        Command::Delete { id } => {
            projects.delete(&id).await?;
            println!("✅ Deleted project {}", id);
        }
        Command::Join { project_id, role } => {
            let project = projects
                .add_current_user_as_member(&project_id, role)
                .await?;
            println!("✅ Joined project {} as {}", project.name, role);
        }
        Command::CheckAccess => {
            let has_access = projects.has_project_access().await?;
            println!("{}", has_access);
        }
        Command::SignUp { email, password } => {
            let result = auth.sign_up(SignUpInput { email, password }).await?;
            println!("✅ Signed up as {}", result.session.email);
        }
        Command::Logout => {
            auth.sign_out().await?;
            println!("✅ Signed out");
        }
    }

    Ok(())
}
