use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sommeil_engine::time::parse_hhmm;
use sommeil_engine::{
    calculate_employee_fatigue_with, check_employee_compliance_in_range,
    check_employee_compliance_with, generate_transition_plan, ComplianceThresholds,
    EmployeeSleepProfile, FatigueConfig, PlanningInput, ShiftInput, TeamOverview,
};

#[derive(Parser)]
#[command(name = "sommeil", version, about = "Shift-work fatigue, compliance and transition planning")]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate sleep deficit and fatigue risk for one employee
    Fatigue {
        /// JSON array of shifts, or - for stdin
        shifts: PathBuf,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Length of the analysed window in days
        #[arg(long, default_value_t = 7)]
        window_days: u32,
        /// JSON fatigue model overrides (partial allowed)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check one employee's shifts against the labor-code rules
    Compliance {
        /// JSON array of shifts, or - for stdin
        shifts: PathBuf,
        /// Employee identifier echoed in the result
        #[arg(long, default_value = "employee")]
        employee: String,
        /// JSON threshold overrides (partial allowed)
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// First date to report violations for (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        /// Last date to report violations for (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Generate a sleep-transition plan between two shift blocks
    Plan {
        /// JSON planning request, or - for stdin
        input: PathBuf,
    },
    /// Rank a team by fatigue risk
    Overview {
        /// JSON array of {employeeId, shifts, profile?}, or - for stdin
        team: PathBuf,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Length of the analysed window in days
        #[arg(long, default_value_t = 7)]
        window_days: u32,
    },
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Habitual bedtime (HH:MM)
    #[arg(long, default_value = "23:00", value_parser = parse_time)]
    sleep: NaiveTime,
    /// Habitual wake time (HH:MM)
    #[arg(long, default_value = "07:00", value_parser = parse_time)]
    wake: NaiveTime,
}

impl ProfileArgs {
    fn profile(&self) -> EmployeeSleepProfile {
        EmployeeSleepProfile {
            habitual_sleep_time: self.sleep,
            habitual_wake_time: self.wake,
            ..EmployeeSleepProfile::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamEntry {
    employee_id: String,
    shifts: Vec<ShiftInput>,
    #[serde(default)]
    profile: Option<EmployeeSleepProfile>,
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    parse_hhmm(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fatigue {
            shifts,
            profile,
            window_days,
            config,
        } => {
            let shifts: Vec<ShiftInput> = read_json(&shifts)?;
            let config: FatigueConfig = read_optional_json(config.as_deref())?;
            info!(shifts = shifts.len(), window_days, "computing fatigue");
            let result =
                calculate_employee_fatigue_with(&shifts, &profile.profile(), window_days, &config);
            print_json(&result)
        }
        Commands::Compliance {
            shifts,
            employee,
            thresholds,
            from,
            to,
        } => {
            let shifts: Vec<ShiftInput> = read_json(&shifts)?;
            let thresholds: ComplianceThresholds = read_optional_json(thresholds.as_deref())?;
            info!(shifts = shifts.len(), employee = %employee, "checking compliance");
            let result = match (from, to) {
                (Some(from), Some(to)) => {
                    check_employee_compliance_in_range(&employee, &shifts, from, to, &thresholds)
                }
                _ => check_employee_compliance_with(&employee, &shifts, &thresholds),
            };
            print_json(&result)
        }
        Commands::Plan { input } => {
            let input: PlanningInput = read_json(&input)?;
            let plan = generate_transition_plan(&input).context("cannot build transition plan")?;
            info!(days = plan.actual_days_count, "transition plan ready");
            print_json(&plan)
        }
        Commands::Overview {
            team,
            profile,
            window_days,
        } => {
            let team: Vec<TeamEntry> = read_json(&team)?;
            let fallback = profile.profile();
            info!(members = team.len(), window_days, "building team overview");
            let config = FatigueConfig::default();
            let overview = TeamOverview::build(team.into_iter().map(|entry| {
                let profile = entry.profile.as_ref().unwrap_or(&fallback);
                let fatigue =
                    calculate_employee_fatigue_with(&entry.shifts, profile, window_days, &config);
                (entry.employee_id, fatigue)
            }));
            print_json(&overview)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "sommeil=debug,sommeil_engine=debug"
    } else {
        "sommeil=info,sommeil_engine=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Read and decode a JSON document from `path`, or stdin for `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Like [`read_json`], falling back to the type's defaults without a path.
fn read_optional_json<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    path.map_or_else(|| Ok(T::default()), |p| read_json(p))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode result")?;
    println!("{text}");
    Ok(())
}
