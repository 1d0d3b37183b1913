use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use metro_fleet::add_train::{AddTrainError, AddTrainForm, FitStatus, FormError, submit_raw};
use metro_fleet::ingest::{IngestError, upload_csv};
use metro_fleet::model::TrainSubmission;
use metro_fleet::reports::{JsonDirReports, ReportError, ReportSource};
use metro_fleet::stabling::StablingState;
use metro_fleet::{ErrorCode, FleetApi, FleetConfig, FleetError, HttpFleetApi, Reconciler, TrainStatus, render};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Fleet(#[from] FleetError),
    #[error("{0}")]
    Form(#[from] FormError),
    #[error("{0}")]
    AddTrain(#[from] AddTrainError),
    #[error("{0}")]
    Ingest(#[from] IngestError),
    #[error("{0}")]
    Report(#[from] ReportError),
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },
    #[error("failed to load trains: {0}")]
    RosterUnavailable(String),
    #[error("train {0} is not in the roster")]
    UnknownTrain(i64),
    #[error("{0}")]
    SaveFailed(String),
    #[error("{0}")]
    UploadAborted(String),
    #[error("{0}")]
    Stabling(String),
    #[error("status reset task failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

#[derive(Parser, Debug)]
#[command(name = "metro-fleet", about = "Metro fleet roster and intake CLI")]
struct Cli {
    #[arg(long, env = "FLEET_BASE_URL")]
    base_url: Option<String>,

    /// Defaults to the base URL.
    #[arg(long, env = "FLEET_STABLING_BASE_URL")]
    stabling_base_url: Option<String>,

    #[arg(long, default_value_t = false)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current train roster.
    Roster,
    /// Change statuses locally, e.g. `edit 101=SERVICE 102=STANDBY --save`.
    Edit {
        #[arg(required = true, value_parser = parse_edit)]
        edits: Vec<(i64, TrainStatus)>,
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Replace the roster with the model's current assignment.
    Assign {
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Mark every train UNASSIGNED and reset the backend.
    UnassignAll,
    AddTrain(AddTrainArgs),
    /// Send loosely typed train data to the ingest endpoint.
    Submit(SubmitArgs),
    /// Upload a CSV of trains row by row.
    Upload { csv: PathBuf },
    /// Show which train occupies each stabling slot.
    Stabling,
    Report {
        kind: ReportKind,
        #[arg(long, default_value = "reports")]
        dir: PathBuf,
        /// Dashboard only: match train id, route or conflict details.
        #[arg(long, default_value = "")]
        search: String,
    },
}

#[derive(Args, Debug)]
struct AddTrainArgs {
    #[arg(long)]
    train_id: String,

    #[arg(long, default_value = "fit")]
    fit_status: FitStatus,

    #[arg(long)]
    mileage: String,

    #[arg(long, default_value_t = false)]
    branding: bool,

    #[arg(long, default_value = "")]
    days_completed: String,

    #[arg(long, default_value = "")]
    days_required: String,

    #[arg(long, default_value = "", help = "YYYY-MM-DD")]
    expiry: String,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long)]
    train_id: String,

    #[arg(long, default_value = "")]
    model: String,

    #[arg(long, default_value = "")]
    mileage: String,

    #[arg(long, default_value_t = false)]
    fit: bool,

    #[arg(long, default_value_t = false)]
    branding: bool,

    #[arg(long, default_value = "")]
    days_completed: String,

    #[arg(long, default_value = "")]
    days_required: String,

    #[arg(long, default_value = "")]
    expiry: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportKind {
    Alerts,
    Maintenance,
    Performance,
    Dashboard,
}

struct CliContext {
    api: Arc<dyn FleetApi>,
    color: bool,
}

fn parse_edit(raw: &str) -> Result<(i64, TrainStatus), String> {
    let (id, status) = raw.split_once('=').ok_or_else(|| format!("expected ID=STATUS, got `{raw}`"))?;
    let id = id.trim().parse::<i64>().map_err(|_| format!("invalid train id `{id}`"))?;
    let status = status.parse::<TrainStatus>().map_err(|e| e.to_string())?;
    Ok((id, status))
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = FleetConfig::from_lookup(|key| match key {
        "FLEET_BASE_URL" => cli.base_url.clone(),
        "FLEET_STABLING_BASE_URL" => cli.stabling_base_url.clone(),
        _ => std::env::var(key).ok(),
    })?;
    tracing::debug!(base_url = %config.base_url, "fleet backend configured");

    let ctx = CliContext {
        api: Arc::new(HttpFleetApi::new(&config)?),
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    let result = run(&ctx, cli.command).await;
    if let Err(CliError::Fleet(e)) = &result {
        tracing::error!(code = e.error_code(), "request failed");
    }
    result
}

async fn run(ctx: &CliContext, command: Command) -> Result<(), CliError> {
    match command {
        Command::Roster => run_roster(ctx).await,
        Command::Edit { edits, save } => run_edit(ctx, edits, save).await,
        Command::Assign { save } => run_assign(ctx, save).await,
        Command::UnassignAll => run_unassign_all(ctx).await,
        Command::AddTrain(args) => run_add_train(ctx, args).await,
        Command::Submit(args) => run_submit(ctx, args).await,
        Command::Upload { csv } => run_upload(ctx, csv).await,
        Command::Stabling => run_stabling(ctx).await,
        Command::Report { kind, dir, search } => run_report(ctx, kind, dir, &search).await,
    }
}

async fn loaded_reconciler(ctx: &CliContext) -> Result<Reconciler, CliError> {
    let mut reconciler = Reconciler::new(Arc::clone(&ctx.api));
    reconciler.load_roster().await;
    if let Some(error) = &reconciler.state().load_error {
        return Err(CliError::RosterUnavailable(error.clone()));
    }
    Ok(reconciler)
}

async fn save_and_report(ctx: &CliContext, reconciler: &mut Reconciler) -> Result<(), CliError> {
    let outcome = reconciler.save_all().await;
    for notice in reconciler.state_mut().take_notices() {
        print!("{}", render::notice(&notice, ctx.color));
    }
    match outcome.first_error {
        None => Ok(()),
        Some(message) => Err(CliError::SaveFailed(message)),
    }
}

async fn run_roster(ctx: &CliContext) -> Result<(), CliError> {
    let reconciler = loaded_reconciler(ctx).await?;
    print!("{}", render::roster_table(reconciler.state(), ctx.color));
    Ok(())
}

async fn run_edit(ctx: &CliContext, edits: Vec<(i64, TrainStatus)>, save: bool) -> Result<(), CliError> {
    let mut reconciler = loaded_reconciler(ctx).await?;
    for (train_id, status) in edits {
        if reconciler.state().train(train_id).is_none() {
            return Err(CliError::UnknownTrain(train_id));
        }
        reconciler.begin_edit(train_id);
        reconciler.select_status(status);
        if let Some(commit) = reconciler.state().commit_draft() {
            reconciler.dispatch(commit);
        }
    }
    print!("{}", render::roster_table(reconciler.state(), ctx.color));
    if save {
        save_and_report(ctx, &mut reconciler).await?;
    }
    Ok(())
}

async fn run_assign(ctx: &CliContext, save: bool) -> Result<(), CliError> {
    let mut reconciler = Reconciler::new(Arc::clone(&ctx.api));
    reconciler.assign_via_model().await?;
    print!("{}", render::roster_table(reconciler.state(), ctx.color));
    if save {
        save_and_report(ctx, &mut reconciler).await?;
    }
    Ok(())
}

async fn run_unassign_all(ctx: &CliContext) -> Result<(), CliError> {
    let mut reconciler = loaded_reconciler(ctx).await?;
    let reset = reconciler.unassign_all();
    print!("{}", render::roster_table(reconciler.state(), ctx.color));
    // The process would otherwise exit before the request is sent.
    reset.await?;
    Ok(())
}

async fn run_add_train(ctx: &CliContext, args: AddTrainArgs) -> Result<(), CliError> {
    let mut form = AddTrainForm::default();
    if !form.set_train_id(args.train_id.trim()) {
        return Err(FormError::InvalidTrainId.into());
    }
    form.fit_status = args.fit_status;
    form.mileage_kms_this_month = args.mileage;
    form.has_branding = args.branding;
    form.branding_days_completed = args.days_completed;
    form.branding_days_required = args.days_required;
    form.branding_expiry_date = args.expiry;
    let added = form.submit(ctx.api.as_ref()).await?;
    println!("Train {} added", added.train_id);
    Ok(())
}

async fn run_submit(ctx: &CliContext, args: SubmitArgs) -> Result<(), CliError> {
    let submission = TrainSubmission {
        train_id: args.train_id,
        model: args.model,
        mileage_kms_this_month: args.mileage,
        is_fit_for_service: args.fit,
        has_branding: args.branding,
        branding_days_completed: args.days_completed,
        branding_days_required: args.days_required,
        branding_expiry_date: args.expiry,
    };
    let message = submit_raw(ctx.api.as_ref(), &submission).await?;
    println!("{message}");
    Ok(())
}

async fn run_upload(ctx: &CliContext, csv: PathBuf) -> Result<(), CliError> {
    let file = std::fs::File::open(&csv).map_err(|source| CliError::Open { path: csv.clone(), source })?;
    let report = upload_csv(ctx.api.as_ref(), file).await?;
    if report.failure.is_some() {
        return Err(CliError::UploadAborted(report.message()));
    }
    println!("{}", report.message());
    Ok(())
}

async fn run_stabling(ctx: &CliContext) -> Result<(), CliError> {
    let mut state = StablingState::default();
    state.refresh(ctx.api.as_ref()).await;
    print!("{}", render::stabling_view(&state));
    match state.error {
        None => Ok(()),
        Some(error) => Err(CliError::Stabling(error)),
    }
}

async fn run_report(ctx: &CliContext, kind: ReportKind, dir: PathBuf, search: &str) -> Result<(), CliError> {
    let source = JsonDirReports::new(dir);
    let rendered = match kind {
        ReportKind::Alerts => render::alerts_view(&source.alerts().await?, ctx.color),
        ReportKind::Maintenance => render::maintenance_view(&source.maintenance().await?, ctx.color),
        ReportKind::Performance => render::performance_view(&source.performance().await?),
        ReportKind::Dashboard => render::dashboard_view(&source.dashboard().await?, search, ctx.color),
    };
    print!("{rendered}");
    Ok(())
}
