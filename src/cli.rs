//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use jira_api::JiraClient;
use log::{debug, error, info, warn};

use crate::config::{ConfigManager, Settings};
use crate::error::{AppError, Result};
use crate::executor::ActionResponse;
use crate::manifest::ReleaseRenderer;
use crate::model::{is_issue_key, Issue};
use crate::planner::{apply_plan, plan_epics, PlanEntry};
use crate::secrets::TokenStore;
use crate::tracker::{IssueTracker, JiraTracker};

#[derive(Parser, Debug)]
#[command(
    name = "jira-manager",
    version,
    about = "Assigns Jira issues to upcoming fix versions and renders release manifests"
)]
pub struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List epics in a project carrying a label
    ListEpics { project: String, label: String },
    /// Recommend fix versions for labelled epics and their stories
    Plan {
        project: String,
        label: String,
        #[command(flatten)]
        options: PlanOptions,
    },
    /// Recommend fix versions for one epic and its stories
    PlanEpic {
        epic_key: String,
        #[command(flatten)]
        options: PlanOptions,
    },
    /// Render the release manifest CSV
    Manifest {
        /// Project key; repeat for several. Defaults to the configured projects
        #[arg(long = "project", value_name = "KEY")]
        projects: Vec<String>,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Write to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Manage the API token stored in the OS keyring
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
    /// Verify the connection and print the authenticated account
    Whoami,
    /// Inspect the settings file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlanOptions {
    /// Apply the recommended assignments
    #[arg(long)]
    pub apply: bool,
    /// Label added to issues that were assigned successfully
    #[arg(long, value_name = "LABEL", requires = "apply")]
    pub mark_label: Option<String>,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    Set { token: String },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the settings file location
    Path,
    /// Print effective settings with the token redacted
    Show,
    /// Write a default settings file if none exists
    Init,
}

/// Parses arguments, runs the command and maps failures to exit code 1.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let env_file = dotenvy::dotenv();
    init_logging(cli.verbose);
    if let Ok(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_configuration() {
                eprintln!("Configuration error: {err}");
            } else {
                eprintln!("Error: {err}");
            }
            error!("Command failed: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}

fn config_manager(path: Option<PathBuf>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let manager = config_manager(cli.config)?;

    match cli.command {
        Command::Config { action } => run_config(&manager, action),
        Command::Token { action } => run_token(&load_settings(&manager)?, action),
        Command::Whoami => {
            let (_, tracker) = open_session(&manager)?;
            let me = tracker.client().get_myself().await?;
            match me.email_address {
                Some(email) => println!("{} <{}>", me.display_name, email),
                None => println!("{}", me.display_name),
            }
            Ok(())
        }
        Command::ListEpics { project, label } => {
            let (_, tracker) = open_session(&manager)?;
            list_epics(&tracker, &project, &label).await
        }
        Command::Plan {
            project,
            label,
            options,
        } => {
            let (settings, tracker) = open_session(&manager)?;
            let epics = tracker.fetch_epics_by_label(&project, &label).await?;
            if epics.is_empty() {
                println!("No epics found in {project} with label {label}");
                return Ok(());
            }
            run_plan(&tracker, &settings, epics, &options).await
        }
        Command::PlanEpic { epic_key, options } => {
            let (settings, tracker) = open_session(&manager)?;
            plan_epic(&tracker, &settings, &epic_key, &options).await
        }
        Command::Manifest {
            projects,
            date,
            output,
        } => {
            let (settings, tracker) = open_session(&manager)?;
            let projects = manifest_projects(projects, &settings)?;
            let today = match date {
                Some(value) => parse_date(&value)?,
                None => Local::now().date_naive(),
            };
            write_manifest(&tracker, &settings, &projects, today, output).await
        }
    }
}

fn open_session(manager: &ConfigManager) -> Result<(Settings, JiraTracker)> {
    let settings = load_settings(manager)?;
    let tracker = connect(&settings)?;
    Ok((settings, tracker))
}

fn load_settings(manager: &ConfigManager) -> Result<Settings> {
    let settings = manager.load()?;
    debug!("Settings loaded from {}", manager.path().display());
    Ok(settings.with_env_overrides(|name| std::env::var(name).ok()))
}

fn connect(settings: &Settings) -> Result<JiraTracker> {
    let stored_token = match (&settings.jira.api_token, &settings.jira.username) {
        (None, Some(username)) => TokenStore::default()
            .load_token(username)
            .unwrap_or_else(|err| {
                warn!("Keyring unavailable: {err}");
                None
            }),
        _ => None,
    };
    let config = settings.tracker_config(stored_token)?;
    info!("Connecting to {} as {}", config.server_url(), config.username);
    Ok(JiraTracker::new(JiraClient::new(config)?))
}

fn run_config(manager: &ConfigManager, action: ConfigCommand) -> Result<()> {
    match action {
        ConfigCommand::Path => println!("{}", manager.path().display()),
        ConfigCommand::Show => {
            let settings = load_settings(manager)?.redacted();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommand::Init => {
            if manager.path().exists() {
                println!("Settings already exist at {}", manager.path().display());
            } else {
                manager.save(&Settings::default())?;
                println!("Wrote default settings to {}", manager.path().display());
            }
        }
    }
    Ok(())
}

fn run_token(settings: &Settings, action: TokenCommand) -> Result<()> {
    let username = settings.jira.username.as_deref().ok_or_else(|| {
        AppError::Configuration("Set the Jira username before managing its token".into())
    })?;
    let store = TokenStore::default();
    match action {
        TokenCommand::Set { token } => {
            store.save_token(username, &token)?;
            println!("Token stored for {username}");
        }
        TokenCommand::Clear => {
            store.clear_token(username)?;
            println!("Token cleared for {username}");
        }
    }
    Ok(())
}

async fn list_epics(tracker: &dyn IssueTracker, project: &str, label: &str) -> Result<()> {
    let epics = tracker.fetch_epics_by_label(project, label).await?;
    if epics.is_empty() {
        println!("No epics found in {project} with label {label}");
    }
    for epic in epics {
        println!("{}: {}", epic.key, epic.summary);
    }
    Ok(())
}

async fn plan_epic(
    tracker: &dyn IssueTracker,
    settings: &Settings,
    epic_key: &str,
    options: &PlanOptions,
) -> Result<()> {
    if !is_issue_key(epic_key) {
        return Err(AppError::Configuration(format!(
            "'{epic_key}' is not a valid issue key"
        )));
    }
    let epic = tracker.fetch_epic(epic_key).await?;
    run_plan(tracker, settings, vec![epic], options).await
}

/// Explicit `--project` keys win over the configured list; one of them must be non-empty.
fn manifest_projects(given: Vec<String>, settings: &Settings) -> Result<Vec<String>> {
    let projects = if given.is_empty() {
        settings.projects.clone()
    } else {
        given
    };
    if projects.is_empty() {
        return Err(AppError::Configuration(
            "No projects given and none configured".into(),
        ));
    }
    Ok(projects)
}

async fn write_manifest(
    tracker: &dyn IssueTracker,
    settings: &Settings,
    projects: &[String],
    today: NaiveDate,
    output: Option<PathBuf>,
) -> Result<()> {
    let directory = settings.project_directory();
    let csv = ReleaseRenderer::new(tracker, &directory)
        .render_release_manifest(projects, today)
        .await?;
    match output {
        Some(path) => {
            tokio::fs::write(&path, csv).await?;
            info!("Manifest written to {}", path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

async fn run_plan(
    tracker: &dyn IssueTracker,
    settings: &Settings,
    epics: Vec<Issue>,
    options: &PlanOptions,
) -> Result<()> {
    let plan = plan_epics(tracker, epics, &settings.policy).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        for entry in &plan {
            println!("{}", entry.describe());
        }
    }

    if options.apply {
        let responses = apply_plan(tracker, &plan, options.mark_label.as_deref()).await;
        report_failures(&plan, &responses);
    }
    Ok(())
}

fn report_failures(plan: &[PlanEntry], responses: &[ActionResponse]) {
    let failures: Vec<&ActionResponse> = responses.iter().filter(|r| !r.success).collect();
    if failures.is_empty() {
        info!("Applied {} actions", plan.len());
        return;
    }
    for failure in &failures {
        let message = failure.error_message.as_deref().unwrap_or("unknown error");
        warn!("{}: {}", failure.action.issue_key, message);
        eprintln!("Failed {}: {}", failure.action.issue_key, message);
    }
    eprintln!("{} of {} actions failed", failures.len(), responses.len());
}

/// Parses a `YYYY-MM-DD` reference date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{
        manifest_projects, parse_date, plan_epic, write_manifest, Cli, Command, ConfigCommand,
        PlanOptions,
    };
    use crate::config::Settings;
    use crate::error::AppError;
    use crate::fake_tracker::FakeTracker;
    use crate::model::{Issue, Release};
    use chrono::NaiveDate;
    use clap::Parser;
    use std::env;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn reference_date_parsing() {
        assert_eq!(
            parse_date("2024-05-01").expect("date"),
            NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date")
        );
        assert!(matches!(parse_date("05/01/2024"), Err(AppError::InvalidDate(_))));
    }

    #[test]
    fn plan_flags_parse() {
        let cli = Cli::try_parse_from([
            "jira-manager",
            "plan",
            "PROJ",
            "q2",
            "--apply",
            "--mark-label",
            "planned",
            "-v",
        ])
        .expect("parse");

        assert!(cli.verbose);
        match cli.command {
            Command::Plan {
                project,
                label,
                options,
            } => {
                assert_eq!(project, "PROJ");
                assert_eq!(label, "q2");
                assert!(options.apply);
                assert_eq!(options.mark_label.as_deref(), Some("planned"));
                assert!(!options.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn mark_label_requires_apply() {
        let result = Cli::try_parse_from([
            "jira-manager",
            "plan-epic",
            "PROJ-1",
            "--mark-label",
            "planned",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn manifest_accepts_repeated_projects() {
        let cli = Cli::try_parse_from([
            "jira-manager",
            "--config",
            "/tmp/settings.json",
            "manifest",
            "--project",
            "PROJ",
            "--project",
            "WEB",
            "--date",
            "2024-05-01",
        ])
        .expect("parse");

        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/tmp/settings.json"))
        );
        match cli.command {
            Command::Manifest {
                projects,
                date,
                output,
            } => {
                assert_eq!(projects, vec!["PROJ", "WEB"]);
                assert_eq!(date.as_deref(), Some("2024-05-01"));
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_subcommands_parse() {
        let cli = Cli::try_parse_from(["jira-manager", "config", "show"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigCommand::Show
            }
        ));
    }

    #[test]
    fn manifest_projects_fall_back_to_settings() {
        let mut settings = Settings::default();
        assert!(manifest_projects(Vec::new(), &settings)
            .unwrap_err()
            .is_configuration());

        settings.projects = vec!["PROJ".into()];
        assert_eq!(
            manifest_projects(Vec::new(), &settings).expect("configured"),
            vec!["PROJ"]
        );
        assert_eq!(
            manifest_projects(vec!["WEB".into()], &settings).expect("explicit"),
            vec!["WEB"]
        );
    }

    #[tokio::test]
    async fn plan_epic_rejects_malformed_key_before_fetching() {
        let tracker = FakeTracker::default();

        let err = plan_epic(&tracker, &Settings::default(), "proj 1", &PlanOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        assert!(tracker.release_fetches().is_empty());
    }

    #[tokio::test]
    async fn plan_epic_surfaces_unknown_epic() {
        let tracker = FakeTracker::default();

        let err = plan_epic(&tracker, &Settings::default(), "PROJ-404", &PlanOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Tracker(_)));
    }

    #[tokio::test]
    async fn manifest_is_written_to_output_file() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
        let release_day = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date");
        let tracker = FakeTracker::default()
            .with_releases("PROJ", vec![Release::new("20", "v2.0", Some(release_day))])
            .with_release_issues("20", vec![Issue::story("PROJ-1", "Build login flow")]);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        let path = env::temp_dir().join(format!("jira-manager-manifest-{nanos}.csv"));

        write_manifest(
            &tracker,
            &Settings::default(),
            &["PROJ".to_string()],
            day,
            Some(path.clone()),
        )
        .await
        .expect("manifest written");

        let written = fs::read_to_string(&path).expect("read manifest");
        assert!(written.contains(",PROJ-1,Build login flow,https://acme.atlassian.net/browse/PROJ-1,v2.0,2024-06-30,"));
        let _ = fs::remove_file(path);
    }
}
