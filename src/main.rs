//! CLI entry point for the SafeMiles plan dashboard client.
//!
//! Provides subcommands for listing, inspecting, publishing and deleting
//! route-optimization runs, summarizing rider feedback, submitting feedback
//! and tracking a bus live.

use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use safemiles_plans::{
    analyzers::{FeedbackSummary, group_by_bus},
    config::Config,
    infra::{
        safemiles::HttpPlanApi,
        session::{Role, Session},
    },
    model::{Crowdedness, Rating, RunId, Vocabulary},
    normalize::{MapResolver, MapSelector},
    output::{append_summary, print_json, print_pretty},
    registry::{Confirm, DeleteOutcome, DetailRequest, PlanRegistry, PublishedPlan},
    services::plan_api::PlanApi,
    submission::{FeedbackDraft, submit},
    tracking::BusTracker,
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "safemiles_plans")]
#[command(about = "Manage bus-route plans and review rider feedback", long_about = None)]
struct Cli {
    /// Backend base URL (overrides SAFEMILES_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Admin,
    Student,
}

#[derive(Subcommand)]
enum Commands {
    /// List all saved runs, newest first
    Runs,
    /// Show one run's routes and map
    Show {
        run_id: i64,

        /// Map to resolve: "all" or a bus number
        #[arg(short, long, default_value = "all")]
        map: String,
    },
    /// Publish a run as the active plan
    Publish { run_id: i64 },
    /// Delete a run
    Delete {
        run_id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },
    /// Show the currently published plan
    Published,
    /// Summarize published rider feedback
    Feedback {
        /// How many top options to list per vocabulary
        #[arg(short, long, default_value_t = FeedbackSummary::DEFAULT_TOP_N)]
        top: usize,

        /// CSV file to append the summary row to
        #[arg(long)]
        csv: Option<String>,
    },
    /// Submit feedback for the signed-in student's current trip
    SubmitFeedback {
        #[arg(short, long)]
        rating: String,

        /// Positive tag (repeatable)
        #[arg(long = "positive")]
        positives: Vec<String>,

        /// Issue tag (repeatable)
        #[arg(long = "issue")]
        issues: Vec<String>,

        #[arg(short, long)]
        comment: Option<String>,

        #[arg(long)]
        boarding_time: Option<String>,

        /// Minutes waited at the stop
        #[arg(long)]
        wait_time: Option<f64>,

        /// Low, Moderate or High
        #[arg(long)]
        crowdedness: Option<String>,
    },
    /// Show the signed-in student's assigned trip
    Trip,
    /// Poll a bus's live location
    Track {
        bus_number: u32,

        /// Number of updates to wait for (0 = until Ctrl+C)
        #[arg(short = 'n', long, default_value_t = 3)]
        samples: usize,
    },
    /// Store a session for later commands
    Login {
        #[arg(long, value_enum)]
        role: RoleArg,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        student_id: Option<String>,
    },
    /// Forget the stored session
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url.clone() {
        config.api_url = url;
    }

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("safemiles_plans.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let session = Session::load(&config.session_file)?;
    let api = Arc::new(HttpPlanApi::from_config(&config)?);
    let mut registry = PlanRegistry::new(MapResolver::new(&config.api_url));
    let vocabulary = Vocabulary::default();

    match cli.command {
        Commands::Runs => {
            // Failures are already logged; show the empty list.
            let _ = registry.load_all(&*api).await;
            info!(total = registry.runs().len(), "Run list fetched");
            for run in registry.runs() {
                info!(
                    run_id = %run.run_id,
                    name = %run.name,
                    timestamp = %run.timestamp,
                    buses_needed = run.buses_needed,
                    published = run.is_published,
                    "Run"
                );
            }
            if let Err(e) = registry.published() {
                warn!(error = %e, "Published state is ambiguous");
            }
        }
        Commands::Show { run_id, map } => {
            let _ = registry.load_all(&*api).await;
            let request = registry.select_detail(RunId(run_id), &*api).await?;
            if request == DetailRequest::Closed {
                return Ok(());
            }

            let detail = registry.detail();
            info!(
                run_id,
                name = detail.name.as_deref().unwrap_or(""),
                routes = detail.routes.len(),
                "Run detail"
            );
            for metric in &detail.overview {
                info!(metric = %metric.metric, value = metric.value, "Overview");
            }
            for route in &detail.routes {
                info!(
                    bus_number = route.bus_number,
                    stops = route.stops.len(),
                    students = route.total_students,
                    distance_km = route.total_distance_km,
                    duration_hr = route.estimated_duration_hr,
                    "Route"
                );
            }
            print_pretty(detail);

            let map_url = map
                .parse::<MapSelector>()
                .ok()
                .and_then(|selector| registry.detail_map_url(selector));
            match map_url {
                Some(url) => info!(%url, "Map"),
                None => info!("No map available"),
            }
        }
        Commands::Publish { run_id } => {
            registry.load_all(&*api).await?;
            registry
                .publish(RunId(run_id), &*api)
                .await
                .with_context(|| format!("publishing run {run_id}"))?;
            if let Ok(Some(run)) = registry.published() {
                info!(run_id = %run.run_id, name = %run.name, "Active plan");
            }
        }
        Commands::Delete { run_id, yes } => {
            registry.load_all(&*api).await?;
            let confirm: &dyn Confirm = if yes { &assume_yes } else { &prompt_yes_no };
            let outcome = registry
                .delete(RunId(run_id), &*api, confirm)
                .await
                .with_context(|| format!("deleting run {run_id}"))?;
            if outcome == DeleteOutcome::Cancelled {
                info!("Nothing deleted");
            }
        }
        Commands::Published => match registry.load_published(&*api).await {
            PublishedPlan::Active {
                run_id,
                name,
                detail,
            } => {
                info!(
                    run_id = ?run_id,
                    name = name.as_deref().unwrap_or(""),
                    routes = detail.routes.len(),
                    map = detail.map_url.as_deref().unwrap_or("none"),
                    "Published plan"
                );
                print_pretty(&detail);
            }
            PublishedPlan::NoneActive => info!("No plan is currently published"),
            PublishedPlan::Unavailable(notice) => warn!(%notice, "Published plan unavailable"),
        },
        Commands::Feedback { top, csv } => {
            let records = match api.all_feedback().await {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "Could not load feedback, showing empty summary");
                    Vec::new()
                }
            };
            let summary = FeedbackSummary::from_records(&records, &vocabulary, top);
            print_json(&summary)?;

            for group in group_by_bus(&records) {
                info!(
                    group = %group.key,
                    count = group.len(),
                    average_rating = group.average_rating(),
                    "Feedback group"
                );
            }

            if let Some(path) = csv {
                append_summary(&path, &summary.to_row())?;
                info!(%path, "Summary appended");
            }
        }
        Commands::SubmitFeedback {
            rating,
            positives,
            issues,
            comment,
            boarding_time,
            wait_time,
            crowdedness,
        } => {
            let student_id = require_student(session.as_ref())?;
            let trip = api
                .current_trip(student_id)
                .await
                .context("loading current trip")?;

            let crowdedness = match crowdedness {
                Some(c) => Some(
                    Crowdedness::parse(&c)
                        .with_context(|| format!("unknown crowdedness {c:?}"))?,
                ),
                None => None,
            };
            let draft = FeedbackDraft {
                rating: Some(
                    Rating::parse(&rating).with_context(|| format!("unknown rating {rating:?}"))?,
                ),
                positives,
                issues,
                comment,
                boarding_time,
                wait_time,
                crowdedness,
                ..FeedbackDraft::for_trip(&trip)
            };
            submit(&draft, &vocabulary, &*api).await?;
        }
        Commands::Trip => {
            let student_id = require_student(session.as_ref())?;
            let trip = api.current_trip(student_id).await?;
            let map_url = registry
                .resolver()
                .resolve(trip.route_map_path.as_deref());
            info!(
                student_id = %trip.student_id,
                walker = trip.is_walker,
                bus_number = ?trip.bus_number,
                pickup_time = trip.pickup_time.as_deref().unwrap_or(""),
                map = map_url.as_deref().unwrap_or("none"),
                "Current trip"
            );
            print_json(&trip)?;
        }
        Commands::Track {
            bus_number,
            samples,
        } => {
            let mut tracker = BusTracker::new(Arc::clone(&api), config.poll_interval);
            let mut updates = tracker.subscribe();
            tracker.track(bus_number);

            let mut seen = 0;
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if let Some(tracked) = *updates.borrow_and_update() {
                            seen += 1;
                            info!(
                                bus_number = tracked.bus_number,
                                latitude = tracked.position.latitude,
                                longitude = tracked.position.longitude,
                                "Bus position"
                            );
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
                if samples > 0 && seen >= samples {
                    break;
                }
            }
            tracker.stop();
        }
        Commands::Login {
            role,
            email,
            student_id,
        } => {
            let session = match role {
                RoleArg::Admin => Session::admin(email),
                RoleArg::Student => {
                    let Some(student_id) = student_id else {
                        bail!("--student-id is required for a student session");
                    };
                    Session::student(student_id, email)
                }
            };
            session.save(&config.session_file)?;
            info!(path = %config.session_file, "Session saved");
        }
        Commands::Logout => {
            Session::clear(&config.session_file)?;
            info!("Signed out");
        }
    }

    Ok(())
}

fn require_student(session: Option<&Session>) -> Result<&str> {
    match session {
        Some(s) if s.role == Role::Student => s
            .student_id()
            .context("student session has no student id"),
        Some(_) => bail!("this command needs a student session"),
        None => bail!("not signed in; run `login --role student --student-id ...` first"),
    }
}

fn assume_yes(_: &str) -> bool {
    true
}

/// Interactive y/N prompt on stderr.
fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes" | "YES")
}
