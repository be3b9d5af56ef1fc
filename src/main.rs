mod config;
mod dashboard;
mod db;
mod error;
mod filter;
mod models;
mod pages;
mod pagination;
mod server;
mod tui;
mod view;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use db::{Database, ListingStore};
use filter::JobFilter;
use models::{Employer, JobInput};
use pages::{EmployerListState, Flash, JobListState, PageOutcome, Redirect};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use view::{DashboardQuery, RequestContext, View};

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Job board - browse listings and employers, manage postings")]
struct Cli {
    /// Database file (overrides JOBBOARD_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Import jobs and employers from JSON files
    Seed {
        /// Job listings JSON array
        #[arg(long)]
        jobs: Option<PathBuf>,

        /// Employers JSON array
        #[arg(long)]
        employers: Option<PathBuf>,
    },

    /// Export all jobs and employers as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the dashboard model as JSON
    Dashboard(DashboardArgs),

    /// Manage job listings
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Manage employers
    Employer {
        #[command(subcommand)]
        command: EmployerCommands,
    },

    /// Interactive browser
    Browse {
        /// Starting view: Jobs or Employers
        #[arg(long, default_value = "Jobs")]
        view: String,
    },

    /// Serve the dashboard over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

#[derive(Args)]
struct DashboardArgs {
    /// ShowJobs, ShowJobDetails, ShowEmployers or EmployerDetailsJson
    #[arg(long)]
    handler: Option<String>,

    /// Jobs or Employers
    #[arg(long)]
    active_view: Option<String>,

    /// Keyword matched against title, employer and description
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    job_type: Option<String>,

    /// Employer name filter for the job list
    #[arg(long)]
    employer_name: Option<String>,

    /// Search term for the employer list
    #[arg(long)]
    employer_search: Option<String>,

    #[arg(long)]
    employer_id: Option<String>,

    #[arg(short, long)]
    page: Option<String>,

    /// Job id for ShowJobDetails
    #[arg(long)]
    id: Option<String>,
}

impl DashboardArgs {
    fn into_query(self) -> DashboardQuery {
        DashboardQuery {
            handler: self.handler,
            active_view: self.active_view,
            search_term: self.search,
            location_filter: self.location,
            job_type_filter: self.job_type,
            employer_name_filter: self.employer_name,
            employer_search_term: self.employer_search,
            employer_id: self.employer_id,
            current_page: self.page,
            id: self.id,
        }
    }
}

#[derive(Args)]
struct JobFields {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    employer: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// "City, ST" or "Remote"
    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    apply_url: Option<String>,

    /// Full-time, Part-time, Internship, Contract
    #[arg(long)]
    job_type: Option<String>,
}

impl JobFields {
    /// Fields given on the command line replace those in `base`.
    fn merge_into(self, mut base: JobInput) -> JobInput {
        base.title = self.title.or(base.title);
        base.employer_name = self.employer.or(base.employer_name);
        base.description = self.description.or(base.description);
        base.location = self.location.or(base.location);
        base.apply_url = self.apply_url.or(base.apply_url);
        base.job_type = self.job_type.or(base.job_type);
        base
    }
}

#[derive(Subcommand)]
enum JobCommands {
    /// Post a new job
    Add {
        #[command(flatten)]
        fields: JobFields,
    },

    /// Edit an existing job
    Edit {
        id: String,

        #[command(flatten)]
        fields: JobFields,
    },

    /// Delete a job
    Delete { id: String },

    /// Show job details
    Show { id: String },
}

#[derive(Subcommand)]
enum EmployerCommands {
    /// List employers
    List {
        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Add an employer
    Add {
        name: String,

        #[arg(long)]
        vision: String,

        #[arg(long)]
        stack: String,
    },

    /// Edit an employer's vision or tech stack
    Edit {
        name: String,

        #[arg(long)]
        vision: Option<String>,

        #[arg(long)]
        stack: Option<String>,
    },

    /// Delete an employer
    Delete { name: String },

    /// Show employer details
    Show { name: String },
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if quiet {
        "off"
    } else if verbose {
        "info,jobboard=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Turns a form outcome into the redirect it produced, or an error.
fn settle<T>(outcome: PageOutcome<T>) -> Result<Option<Redirect>> {
    match outcome {
        PageOutcome::Redirect(redirect) => match &redirect.flash {
            Some(Flash::Error(message)) => bail!("{}", message),
            _ => Ok(Some(redirect)),
        },
        PageOutcome::Render { errors, .. } => {
            let details: Vec<String> = errors
                .iter()
                .map(|e| {
                    if e.field.is_empty() {
                        e.message.clone()
                    } else {
                        format!("{}: {}", e.field, e.message)
                    }
                })
                .collect();
            bail!("{}", details.join("\n"))
        }
        PageOutcome::NotFound { message } => bail!("{}", message),
        PageOutcome::Show { .. } => Ok(None),
    }
}

fn print_flash(redirect: Option<Redirect>, fallback: &str) {
    match redirect.and_then(|r| r.flash) {
        Some(Flash::Message(message)) => println!("{}", message),
        _ => println!("{}", fallback),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Browse { .. }));

    let config = Config::resolve(cli.db)?;
    let db = Database::open(&config.db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Seed { jobs, employers } => {
            db.ensure_initialized()?;
            if jobs.is_none() && employers.is_none() {
                bail!("Nothing to import. Use --jobs and/or --employers");
            }
            let (job_count, employer_count) =
                db.import_json(jobs.as_deref(), employers.as_deref())?;
            println!("Imported {} job(s) and {} employer(s).", job_count, employer_count);
        }

        Commands::Export { output } => {
            db.ensure_initialized()?;
            let json = serde_json::to_string_pretty(&db.export_json()?)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write to {}", path.display()))?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Dashboard(args) => {
            db.ensure_initialized()?;
            let query = args.into_query();
            let ctx = RequestContext::from_query(&query);
            let op = dashboard::Operation::from_query(&query);
            let json = match dashboard::dispatch(&db, &ctx, op) {
                dashboard::Response::Page(model) => serde_json::to_string_pretty(&model)?,
                dashboard::Response::Json(reply) => {
                    if reply.status != 200 {
                        bail!("{} {}", reply.status, reply.body["error"].as_str().unwrap_or(""));
                    }
                    serde_json::to_string_pretty(&reply.body)?
                }
            };
            println!("{}", json);
        }

        Commands::Job { command } => {
            db.ensure_initialized()?;
            let list = JobListState::default();
            match command {
                JobCommands::Add { fields } => {
                    let input = fields.merge_into(JobInput::default());
                    let redirect = settle(pages::create_job(&db, input, &list))?;
                    if let Some(id) = redirect.as_ref().and_then(|r| r.get("id")) {
                        println!("Job id: {}", id);
                    }
                    print_flash(redirect, "Job created.");
                }

                JobCommands::Edit { id, fields } => {
                    let existing = match pages::edit_job_form(&db, Some(&id)) {
                        PageOutcome::Show { form } => form,
                        other => {
                            settle(other)?;
                            bail!("Job with ID '{}' not found.", id);
                        }
                    };
                    let input = fields.merge_into(existing);
                    let redirect = settle(pages::update_job(&db, input, &list))?;
                    print_flash(redirect, &format!("Job '{}' updated.", id));
                }

                JobCommands::Delete { id } => {
                    let redirect = settle(pages::delete_job(&db, Some(&id), &list))?;
                    print_flash(redirect, "Job deleted.");
                }

                JobCommands::Show { id } => {
                    let job = db
                        .get_job_by_id(&id)?
                        .ok_or_else(|| anyhow!("Job with ID '{}' not found.", id))?;
                    println!("Job {}", job.id());
                    println!("Title: {}", job.title());
                    if let Some(employer) = &job.employer_name {
                        println!("Employer: {}", employer);
                    }
                    if let Some(job_type) = &job.job_type {
                        println!("Type: {}", job_type);
                    }
                    if let Some(location) = &job.location {
                        println!("Location: {}", location);
                    }
                    if let Some(url) = &job.apply_url {
                        println!("Apply: {}", url);
                    }
                    println!("Posted: {}", job.date_posted.format("%Y-%m-%d %H:%M"));
                    if let Some(description) = &job.description {
                        println!("\n--- Description ---\n{}", textwrap::fill(description, 80));
                    }
                }
            }
        }

        Commands::Employer { command } => {
            db.ensure_initialized()?;
            let list = EmployerListState::default();
            match command {
                EmployerCommands::List { search } => {
                    let employers = db.list_employers()?;
                    let selection =
                        dashboard::select_employers(&employers, search.as_deref(), None);
                    if selection.distinct_names.is_empty() {
                        println!("No employers found.");
                    } else {
                        println!("{:<30} {:<40}", "NAME", "TECH STACK");
                        println!("{}", "-".repeat(70));
                        for name in &selection.distinct_names {
                            let stack = employers
                                .iter()
                                .find(|e| e.name() == name.as_str())
                                .and_then(|e| e.tech_stack.clone())
                                .unwrap_or_default();
                            println!("{:<30} {:<40}", truncate(name, 28), truncate(&stack, 38));
                        }
                    }
                }

                EmployerCommands::Add { name, vision, stack } => {
                    let redirect = settle(pages::create_employer(
                        &db,
                        Employer::new(&name, &vision, &stack),
                    ))?;
                    print_flash(redirect, "Employer created.");
                }

                EmployerCommands::Edit { name, vision, stack } => {
                    let mut employer = match pages::edit_employer_form(&db, Some(&name)) {
                        PageOutcome::Show { form } => form,
                        other => {
                            settle(other)?;
                            bail!("Employer '{}' not found.", name);
                        }
                    };
                    employer.company_vision = vision.or(employer.company_vision);
                    employer.tech_stack = stack.or(employer.tech_stack);
                    let redirect = settle(pages::update_employer(&db, employer, &list))?;
                    print_flash(redirect, "Employer updated.");
                }

                EmployerCommands::Delete { name } => {
                    if let PageOutcome::NotFound { message } =
                        pages::delete_employer_form(&db, Some(&name))
                    {
                        bail!("{}", message);
                    }
                    let redirect = settle(pages::delete_employer(&db, Some(&name), &list))?;
                    print_flash(redirect, "Employer deleted.");
                }

                EmployerCommands::Show { name } => {
                    let employer = db
                        .get_employer_by_name(&name)?
                        .ok_or_else(|| anyhow!("Employer '{}' not found.", name))?;
                    println!("Employer: {}", employer.name());
                    if let Some(vision) = &employer.company_vision {
                        println!("Vision: {}", vision);
                    }
                    if let Some(stack) = &employer.tech_stack {
                        println!("Tech stack: {}", stack);
                    }
                    let jobs = db.list_jobs(&JobFilter {
                        employer_name: Some(employer.name().to_string()),
                        ..Default::default()
                    })?;
                    if !jobs.is_empty() {
                        println!("\nJobs ({}):", jobs.len());
                        for job in jobs {
                            println!(
                                "  {} - {} ({})",
                                job.id(),
                                job.title(),
                                job.location.as_deref().unwrap_or("?")
                            );
                        }
                    }
                }
            }
        }

        Commands::Browse { view } => {
            db.ensure_initialized()?;
            let view = View::parse(&view)
                .ok_or_else(|| anyhow!("Unknown view '{}'. Use Jobs or Employers", view))?;
            tui::run_browse(&db, view)?;
        }

        Commands::Serve { addr } => {
            db.ensure_initialized()?;
            let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
            runtime.block_on(server::serve(db, &addr))?;
        }
    }

    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
