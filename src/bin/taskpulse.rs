use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use taskpulse::metrics::{EfficiencyTrend, GroupField, GroupHealth, GroupMetrics};
use taskpulse::{Dashboard, DashboardConfig, DashboardMode, Period, Priority, TaskFilter};

#[derive(Parser)]
#[command(name = "taskpulse", about = "Delivery metrics for task snapshots")]
struct Cli {
    /// Tasks JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    tasks: PathBuf,

    /// Config file (default: ~/.taskpulse/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluate as of this instant (RFC 3339 or YYYY-MM-DD, default: now)
    #[arg(long)]
    now: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Created-date window (e.g. 30d, 2025-Q1, 2025-03, ytd). Defaults to the configured
    /// period, which also hides older open tasks; use --all to keep them
    #[arg(long)]
    period: Option<String>,
    /// Ignore any period and keep every task
    #[arg(long, conflicts_with = "period")]
    all: bool,
    #[arg(long, value_enum)]
    priority: Option<Priority>,
    #[arg(long)]
    project: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    assignee: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TrendTarget {
    Org,
    Department,
    Assignee,
}

#[derive(Subcommand)]
enum Commands {
    /// Indicators per project, department or assignee
    Groups {
        #[arg(long, value_enum, default_value = "project")]
        by: GroupField,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open tasks ranked by risk
    Risk {
        /// Maximum results (default: configured early-warning limit)
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Monthly efficiency trend (months before the period start stay empty; see --all)
    Trend {
        #[arg(long, value_enum, default_value = "org")]
        by: TrendTarget,
        /// Number of calendar months (default: configured)
        #[arg(long)]
        months: Option<usize>,
        /// Number of keys to chart (default: configured)
        #[arg(long)]
        top: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Flow distribution, completion segmentation and top blockers
    Overview {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Full dashboard report
    Dashboard {
        /// Group cards by projects or departments (default: configured)
        #[arg(long, value_enum)]
        mode: Option<DashboardMode>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = DashboardConfig::load(cli.config.as_deref())?;
    let now = match &cli.now {
        Some(s) => taskpulse::date_util::parse_instant(s)?,
        None => Utc::now(),
    };
    let tasks = taskpulse::input::load_tasks(&cli.tasks)?;
    let dashboard = Dashboard::new(tasks, config);

    match cli.command {
        Commands::Groups { by, filter, json } => {
            let dashboard = apply_filter(dashboard, &filter, now)?;
            handle_groups(&dashboard, by, now, json)?;
        }
        Commands::Risk { limit, filter, json } => {
            let dashboard = apply_filter(dashboard, &filter, now)?;
            handle_risk(&dashboard, limit, now, json)?;
        }
        Commands::Trend {
            by,
            months,
            top,
            filter,
            json,
        } => {
            let dashboard = apply_filter(dashboard, &filter, now)?;
            handle_trend(&dashboard, by, months, top, now, json)?;
        }
        Commands::Overview { filter, json } => {
            let dashboard = apply_filter(dashboard, &filter, now)?;
            handle_overview(&dashboard, json)?;
        }
        Commands::Dashboard { mode, filter, json } => {
            let dashboard = apply_filter(dashboard, &filter, now)?;
            let mode = mode.unwrap_or(dashboard.config().mode);
            handle_dashboard(&dashboard, mode, now, json)?;
        }
    }
    Ok(())
}

/// Narrow the dashboard's tasks. The period comes from the flag, else the
/// config, and resolves against the evaluation date.
fn apply_filter(
    mut dashboard: Dashboard,
    args: &FilterArgs,
    now: DateTime<Utc>,
) -> anyhow::Result<Dashboard> {
    let (period, from_config) = if args.all {
        (None, false)
    } else {
        match &args.period {
            Some(p) => (Some(Period::parse(p)?), false),
            None => (dashboard.config().period()?, true),
        }
    };

    if let Some(period) = &period {
        let filter = TaskFilter::new().period(period, now.date_naive())?;
        log::info!("Filtering to tasks created in {period}");
        dashboard = dashboard.filtered(&filter);
        if from_config && dashboard.excluded() > 0 {
            log::warn!(
                "Configured period {period} excluded {} tasks; pass --all or --period to widen",
                dashboard.excluded()
            );
        }
    }

    let mut filter = TaskFilter::new();
    if let Some(priority) = args.priority {
        filter = filter.priority(priority);
    }
    if let Some(project) = &args.project {
        filter = filter.project(project);
    }
    if let Some(department) = &args.department {
        filter = filter.department(department);
    }
    if let Some(assignee) = &args.assignee {
        filter = filter.assignee(assignee);
    }
    Ok(dashboard.filtered(&filter))
}

fn handle_groups(
    dashboard: &Dashboard,
    by: GroupField,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let reports = dashboard.group_reports_at(by, now);
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    if reports.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for report in &reports {
        print_group(&report.metrics, &report.health);
    }
    Ok(())
}

fn handle_risk(
    dashboard: &Dashboard,
    limit: Option<usize>,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let limit = limit.unwrap_or(dashboard.config().early_warning_limit);
    let risks: Vec<_> = taskpulse::metrics::compute_task_risk_at(dashboard.tasks(), now)
        .into_iter()
        .take(limit)
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&risks)?);
        return Ok(());
    }
    if risks.is_empty() {
        println!("No open tasks.");
        return Ok(());
    }
    println!("{:<12} {:>6}  {:<20} {:<16} Reasons", "ID", "Risk", "Project", "Assignee");
    println!("{}", "-".repeat(80));
    for r in &risks {
        println!(
            "{:<12} {:>6.1}  {:<20} {:<16} {}",
            r.id,
            r.risk_score,
            truncate(&r.project, 20),
            truncate(&r.assignee, 16),
            r.reasons.join(", ")
        );
    }
    Ok(())
}

fn handle_trend(
    dashboard: &Dashboard,
    by: TrendTarget,
    months: Option<usize>,
    top: Option<usize>,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let config = dashboard.config();
    let months = months.unwrap_or(config.trend_months);
    let top = top.unwrap_or(config.trend_top_keys);
    let tasks = dashboard.tasks();

    let trend = match by {
        TrendTarget::Org => taskpulse::metrics::compute_org_efficiency_at(tasks, months, now),
        TrendTarget::Department => taskpulse::metrics::compute_efficiency_trend_at(
            tasks,
            GroupField::Department,
            months,
            top,
            now,
        ),
        TrendTarget::Assignee => taskpulse::metrics::compute_efficiency_trend_at(
            tasks,
            GroupField::Assignee,
            months,
            top,
            now,
        ),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&trend)?);
    } else {
        print_trend(&trend);
    }
    Ok(())
}

fn handle_overview(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    let flow = dashboard.flow();
    let segmentation = dashboard.segmentation();
    let blockers = dashboard.top_blockers();
    if json {
        let value = serde_json::json!({
            "flow": flow,
            "segmentation": segmentation,
            "top_blockers": blockers,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Flow:");
    println!("  Avg overdue: {:.2} days", flow.avg_overdue_days);
    println!("  Avg pickup:  {:.2} days", flow.avg_pickup_days);
    println!(
        "  Overdue histogram: {}",
        histogram_line(flow.overdue_histogram.iter().map(|b| (b.bucket, b.count)))
    );
    println!(
        "  Pickup histogram:  {}",
        histogram_line(flow.pickup_histogram.iter().map(|b| (b.bucket, b.count)))
    );
    println!("Completion:");
    for segment in &segmentation {
        println!("  {:<18} {}", segment.label, segment.count);
    }
    println!("Top blockers:");
    if blockers.is_empty() {
        println!("  None");
    }
    for blocker in &blockers {
        println!("  {:<12} blocks {}", blocker.id, blocker.dependents);
    }
    Ok(())
}

fn handle_dashboard(
    dashboard: &Dashboard,
    mode: DashboardMode,
    now: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let report = dashboard.report_at(mode, now);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Dashboard ({:?}) as of {}: {} tasks",
        report.mode,
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.task_count
    );
    println!();
    for group in &report.groups {
        print_group(&group.metrics, &group.health);
    }
    println!("Early warnings:");
    if report.early_warnings.is_empty() {
        println!("  None");
    }
    for w in &report.early_warnings {
        println!(
            "  [{}] {} {} ({:.1}): {}",
            w.health,
            w.risk.id,
            truncate(&w.risk.title, 40),
            w.risk.risk_score,
            w.risk.reasons.join(", ")
        );
    }
    println!();
    println!("Organization efficiency:");
    print_trend(&report.trends.organization);
    println!("Department efficiency:");
    print_trend(&report.trends.departments);
    println!("People efficiency:");
    print_trend(&report.trends.people);
    Ok(())
}

fn print_group(m: &GroupMetrics, h: &GroupHealth) {
    println!("{} [{}]", m.name, h.worst());
    println!("  Flow:");
    println!("    Lead time:     {:.1} days", m.lead_time_days);
    println!("    Cycle time:    {:.1} days", m.cycle_time_days);
    println!("    Wait/work:     {:.2}", m.wait_to_work_ratio);
    println!("  Load:");
    println!("    WIP:           {} ({})", m.wip, h.wip);
    println!("    Aging (>7d):   {} ({})", m.aging_count, h.aging);
    println!("    Balance index: {:.2}", m.load_balancing_index);
    println!("  Outcome:");
    println!("    Throughput:    {}", m.throughput);
    println!(
        "    Overdue:       {:.1} days ({})",
        m.overdue_severity_days, h.overdue_severity
    );
    println!("    Reopen rate:   {:.1}%", m.reopen_rate_pct);
    println!("    Changes/task:  {:.2}", m.change_frequency);
    println!("  Scores:");
    println!("    Risk:          {:.1} ({})", m.risk_score, h.risk);
    println!("    Efficiency:    {:.1} ({})", m.efficiency_score, h.efficiency);
    let weekly: Vec<String> = m.trend.iter().map(|p| p.throughput.to_string()).collect();
    println!("  Weekly throughput: {}", weekly.join(" "));
    println!();
}

fn print_trend(trend: &EfficiencyTrend) {
    if trend.keys.is_empty() {
        println!("  No data");
        return;
    }
    print!("  {:<9}", "Month");
    for key in &trend.keys {
        print!(" {:>14}", truncate(key, 14));
    }
    println!();
    for month in &trend.months {
        print!("  {month:<9}");
        for key in &trend.keys {
            match trend.score(month, key) {
                Some(score) => print!(" {score:>14.1}"),
                None => print!(" {:>14}", "-"),
            }
        }
        println!();
    }
}

fn histogram_line(buckets: impl Iterator<Item = (u32, u64)>) -> String {
    buckets
        .map(|(bucket, count)| format!("{bucket}:{count}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
