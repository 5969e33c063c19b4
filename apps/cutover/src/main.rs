use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cutover_core::{
    CutoverSession, DataSource, FileDataSource, HttpDataSource, Step, StepStatus, Transition,
    WorkflowOptions,
};
use shared::domain::{CutoverType, PointType};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod report;

use config::{load_settings, parse_data_url, DataLocation, Settings};
use report::{render_json, render_table, ReportDocument};

#[derive(Parser, Debug)]
#[command(about = "Walk a controller cutover through its selection steps")]
struct Cli {
    #[arg(long, default_value = config::CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long, conflicts_with = "data_dir")]
    data_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the workflow steps.
    Steps,
    /// List the controllers offered on the first step.
    Controllers,
    /// Show one page of TPS candidates for a controller.
    Points {
        #[arg(long)]
        controller: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Run every step with the given selections and print the report.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, value_enum, default_value_t = CutoverKind::Single)]
    cutover_type: CutoverKind,
    #[arg(long = "controller")]
    controllers: Vec<String>,
    #[arg(long)]
    active: Option<String>,
    #[arg(long, value_enum)]
    point_type: Option<PointKind>,
    #[arg(long = "point")]
    points: Vec<String>,
    #[arg(long = "module")]
    modules: Vec<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CutoverKind {
    Single,
    Multiple,
}

impl From<CutoverKind> for CutoverType {
    fn from(value: CutoverKind) -> Self {
        match value {
            CutoverKind::Single => CutoverType::Single,
            CutoverKind::Multiple => CutoverType::Multiple,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PointKind {
    All,
    Point1,
    Point2,
}

impl From<PointKind> for PointType {
    fn from(value: PointKind) -> Self {
        match value {
            PointKind::All => PointType::All,
            PointKind::Point1 => PointType::Point1,
            PointKind::Point2 => PointType::Point2,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(dir) = cli.data_dir {
        settings.data = DataLocation::Directory(dir);
    }
    if let Some(url) = cli.data_url {
        settings.data = DataLocation::Remote(parse_data_url(&url)?);
    }

    let source = build_source(&settings)?;
    let options = WorkflowOptions {
        clear_points_on_controller_change: settings.clear_points_on_controller_change,
    };
    let mut session = CutoverSession::new(source, options);

    match cli.command {
        Command::Steps => print_steps(),
        Command::Controllers => list_controllers(&mut session).await,
        Command::Points { controller, page } => {
            show_points(&mut session, controller.as_deref(), page).await?
        }
        Command::Run(args) => run(&mut session, args).await?,
    }

    Ok(())
}

fn build_source(settings: &Settings) -> Result<Arc<dyn DataSource>> {
    match &settings.data {
        DataLocation::Directory(dir) => {
            info!(dir = %dir.display(), "reading datasets from directory");
            Ok(Arc::new(FileDataSource::new(dir.clone())))
        }
        DataLocation::Remote(url) => {
            info!(%url, "fetching datasets over http");
            let http = reqwest::Client::builder()
                .timeout(settings.request_timeout())
                .build()
                .context("failed to build http client")?;
            Ok(Arc::new(HttpDataSource::with_client(http, url.clone())))
        }
    }
}

fn print_steps() {
    let progress = cutover_core::StepProgress::at(Step::Select);
    for badge in progress.badges {
        println!("{}. {}", badge.number, badge.label);
    }
}

async fn list_controllers(session: &mut CutoverSession) {
    session.start();
    session.settle().await;

    let controllers = session.workflow().state().controllers().available();
    if controllers.is_empty() {
        warn!("no controllers loaded");
    }
    for controller in controllers {
        println!("{}\t{}", controller.id, controller.name);
    }
}

async fn show_points(
    session: &mut CutoverSession,
    controller: Option<&str>,
    page: usize,
) -> Result<()> {
    session.start();
    session.settle().await;

    let name = match controller {
        Some(name) => name.to_owned(),
        None => session
            .workflow()
            .state()
            .controllers()
            .available()
            .first()
            .map(|controller| controller.name.clone())
            .context("no controllers available")?,
    };
    session.workflow_mut().add_controller(&name)?;
    advance(session).await?;

    let workflow = session.workflow_mut();
    workflow.go_to_page(page);
    let state = workflow.state();
    for point in state.point_page() {
        println!("{}", point.name);
    }
    println!(
        "page {} of {} ({} points for {name})",
        state.current_page(),
        state.total_pages(),
        state.points().available().len()
    );
    Ok(())
}

async fn run(session: &mut CutoverSession, args: RunArgs) -> Result<()> {
    session.start();
    session.settle().await;

    let workflow = session.workflow_mut();
    workflow.set_cutover_type(args.cutover_type.into());
    for name in &args.controllers {
        workflow.add_controller(name)?;
    }
    advance(session).await?;

    let workflow = session.workflow_mut();
    if let Some(active) = &args.active {
        workflow.select_active_controller(active)?;
    }
    if let Some(point_type) = args.point_type {
        workflow.set_point_type(point_type.into());
    }
    for name in &args.points {
        workflow.add_point(name)?;
    }
    advance(session).await?;

    let workflow = session.workflow_mut();
    for name in &args.modules {
        workflow.add_module(name)?;
    }
    advance(session).await?;

    let workflow = session.workflow();
    let rows = workflow.report().context("report step was not reached")?;
    if args.json {
        let state = workflow.state();
        let document = ReportDocument {
            generated_at: Utc::now(),
            cutover_type: state.cutover_type(),
            controllers: state.controllers().selected_keys().collect(),
            rows: &rows,
        };
        println!("{}", render_json(&document)?);
    } else {
        print_progress(session);
        print!("{}", render_table(&rows));
    }
    Ok(())
}

async fn advance(session: &mut CutoverSession) -> Result<Step> {
    match session.next() {
        Transition::Moved { to, .. } => {
            session.settle().await;
            Ok(to)
        }
        Transition::Blocked(failure) => bail!("{} step: {}", failure.step, failure.message),
        Transition::Unchanged => bail!(
            "workflow is already on the {} step",
            session.workflow().step()
        ),
    }
}

fn print_progress(session: &CutoverSession) {
    let line: Vec<String> = session
        .workflow()
        .progress()
        .badges
        .iter()
        .map(|badge| match badge.status {
            StepStatus::Completed => format!("[x] {}", badge.label),
            StepStatus::Active => format!("[>] {}", badge.label),
            StepStatus::Pending => format!("[ ] {}", badge.label),
        })
        .collect();
    println!("{}\n", line.join("  "));
}
