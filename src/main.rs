use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod attendance;
mod committee;
mod error;
mod members;
mod models;
mod questions;
mod report;
mod rollup;
mod rounding;
mod selection;
mod store;

use attendance::AggregationOptions;
use members::party_label;
use models::{AttendanceStatus, Scope};
use questions::QuestionGrouping;
use selection::{DashboardView, Selection};

#[derive(Parser)]
#[command(name = "vp-attendance")]
#[command(about = "Committee attendance of Flemish Parliament members", long_about = None)]
struct Cli {
    /// Directory holding the scraped tables (defaults to $VP_DATA_DIR or ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    /// First meeting date to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last meeting date to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Committee title
    #[arg(long)]
    committee: Option<String>,
    /// Party name, or "unknown" for members without a party
    #[arg(long)]
    party: Option<String>,
    /// Leave meetings without recorded attendance out of the averages
    #[arg(long)]
    exclude_unrecorded: bool,
}

impl SelectionArgs {
    fn selection(&self) -> Selection {
        Selection {
            from: self.from,
            to: self.to,
            committee: self.committee.clone(),
            party: self.party.clone(),
        }
    }

    fn options(&self) -> AggregationOptions {
        AggregationOptions {
            exclude_unrecorded_meetings: self.exclude_unrecorded,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Average attendance per committee
    Committees {
        #[command(flatten)]
        select: SelectionArgs,
        #[arg(long, value_enum, default_value_t = Scope::Permanent)]
        scope: Scope,
    },
    /// Attendance per member
    Members {
        #[command(flatten)]
        select: SelectionArgs,
        /// Show attendance outside permanent seats instead
        #[arg(long)]
        guests: bool,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Attendance shares per party
    Parties {
        #[command(flatten)]
        select: SelectionArgs,
    },
    /// Written questions per member, party or minister
    Questions {
        #[arg(long, value_enum, default_value_t = QuestionGrouping::Member)]
        by: QuestionGrouping,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        select: SelectionArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the derived tables as CSV files
    Export {
        #[command(flatten)]
        select: SelectionArgs,
        #[arg(long, default_value = "export")]
        out_dir: PathBuf,
    },
    /// Convert a raw committee composition dump into committees.json
    ImportCompositions {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("VP_ATTENDANCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "vp_attendance=debug,info"
        } else {
            "vp_attendance=info,warn"
        })
    });

    let format = env::var("VP_ATTENDANCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os("VP_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn compute_view(
    data_dir: &Path,
    select: &SelectionArgs,
) -> anyhow::Result<(DashboardView, Selection)> {
    let dataset = store::load_dataset(data_dir)
        .with_context(|| format!("failed to load tables from {}", data_dir.display()))?;
    let selection = select.selection();
    let view = DashboardView::compute(&dataset, &selection, &select.options());
    Ok((view, selection))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let data_dir = data_dir(cli.data_dir);

    match cli.command {
        Commands::Committees { select, scope } => {
            let (view, selection) = compute_view(&data_dir, &select)?;
            if view.overview.is_empty() {
                println!("No committees match {}.", selection.describe());
                return Ok(());
            }

            println!(
                "Attendance per meeting ({:?} members, {}):",
                scope,
                selection.describe()
            );
            for row in view.overview.iter() {
                let Some(stats) = row.current_stats() else {
                    println!("- {}: insufficient data", row.committee.title);
                    continue;
                };
                let stats = stats.scope(scope);
                let triple: Vec<String> = AttendanceStatus::ALL
                    .iter()
                    .map(|&status| {
                        format!(
                            "{} {} (avg {:.2})",
                            stats.rounded.get(status),
                            status.label(),
                            stats.averages.get(status)
                        )
                    })
                    .collect();
                let attendees = if stats.counts.present.is_empty() {
                    "nobody present".to_string()
                } else {
                    format!(
                        "{} members present {} times",
                        stats.counts.present.len(),
                        stats.counts.present.total()
                    )
                };
                println!(
                    "- {}: {} over {} meetings; {}",
                    row.committee.title,
                    triple.join(", "),
                    row.meeting_count,
                    attendees
                );
            }
        }
        Commands::Members {
            select,
            guests,
            limit,
        } => {
            let (view, selection) = compute_view(&data_dir, &select)?;
            if guests {
                if view.non_permanent_members.is_empty() {
                    println!(
                        "No attendance outside permanent seats for {}.",
                        selection.describe()
                    );
                    return Ok(());
                }
                println!("Attendance outside permanent seats:");
                for row in view.non_permanent_members.iter().take(limit) {
                    println!(
                        "- {} ({}) present {} times in {} extra committees",
                        row.name,
                        party_label(row.party.as_deref()),
                        row.present,
                        row.extra_committees()
                    );
                }
            } else {
                if view.permanent_members.is_empty() {
                    println!("No permanent members for {}.", selection.describe());
                    return Ok(());
                }
                println!("Permanent members by attendance rate:");
                for row in view.permanent_members.iter().take(limit) {
                    println!(
                        "- {} ({}) {:.0}%: {} present, {} absent, {} excused of {} meetings",
                        row.name,
                        party_label(row.party.as_deref()),
                        row.attendance_rate * 100.0,
                        row.present,
                        row.absent,
                        row.excused,
                        row.relevant_meetings
                    );
                }
            }
        }
        Commands::Parties { select } => {
            let (view, selection) = compute_view(&data_dir, &select)?;
            println!("Attendance shares per party ({}):", selection.describe());
            for row in view.parties.iter() {
                println!(
                    "- {}: {:.1}% present, {:.1}% absent, {:.1}% excused",
                    party_label(row.party.as_deref()),
                    row.share(AttendanceStatus::Present),
                    row.share(AttendanceStatus::Absent),
                    row.share(AttendanceStatus::Excused)
                );
            }
        }
        Commands::Questions { by, limit } => {
            let parties = store::load_parties(&data_dir.join(store::PARTIES_FILE))
                .with_context(|| format!("failed to load parties from {}", data_dir.display()))?;
            let written = store::load_questions(&data_dir.join(store::QUESTIONS_FILE))
                .with_context(|| format!("failed to load questions from {}", data_dir.display()))?;
            let tallies = questions::tally_questions(&written, &parties, by);

            if tallies.is_empty() {
                println!("No written questions loaded.");
                return Ok(());
            }

            println!("Written questions by {:?}:", by);
            for tally in tallies.iter().take(limit) {
                let delay = tally
                    .avg_answer_days
                    .map(|days| format!("{days:.1} days"))
                    .unwrap_or_else(|| "n/a".to_string());
                println!(
                    "- {}: {} questions, {} answered, average delay {}",
                    party_label(tally.label.as_deref()),
                    tally.questions,
                    tally.answered,
                    delay
                );
            }
        }
        Commands::Report { select, out } => {
            let (view, selection) = compute_view(&data_dir, &select)?;
            let report = report::build_report(&view, &selection);
            fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { select, out_dir } => {
            let (view, _) = compute_view(&data_dir, &select)?;
            let written = store::export_view(&view, &out_dir)?;
            for path in written {
                println!("Wrote {}.", path.display());
            }
        }
        Commands::ImportCompositions { input, out } => {
            let committees = store::load_compositions(&input)
                .with_context(|| format!("failed to read compositions from {}", input.display()))?;
            let out = out.unwrap_or_else(|| data_dir.join(store::COMMITTEES_FILE));
            let count = committees.len();
            store::write_committees(&out, committees)?;
            println!("Converted {count} committees into {}.", out.display());
        }
    }

    Ok(())
}
