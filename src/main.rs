use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use dojo_tools::config::Settings;
use dojo_tools::dashboard::{self, Dashboard};
use dojo_tools::model::{NewPayment, NewStudent, PaymentStatus, StudentSelector};
use dojo_tools::store::CachePolicy;
use dojo_tools::summary::MonthMatching;
use dojo_tools::{Result, ToolError};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so that listings and exports on stdout stay clean.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let settings = cli.resolve_settings()?;
    let reference = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let mut store = settings.record_store();

    match cli.command {
        Command::Students {
            command: StudentsCommand::Add(args),
        } => {
            let new = args.into_new_student(reference);
            let student = dashboard::register_student(&mut store, &settings, new, reference)?;
            println!("registered student {} ({})", student.name, student.id);
            Ok(())
        }
        Command::Students {
            command: StudentsCommand::List,
        } => {
            let dashboard = dashboard::load_dashboard(&mut store, &settings, reference)?;
            print_students(&dashboard);
            Ok(())
        }
        Command::Payments {
            command: PaymentsCommand::Add(args),
        } => {
            let new = args.into_new_payment(reference)?;
            let payment = dashboard::register_payment(&mut store, &settings, new, reference)?;
            println!(
                "registered payment of {:.2} for {} ({})",
                payment.amount, payment.student_id, payment.reference_period
            );
            Ok(())
        }
        Command::Payments {
            command: PaymentsCommand::List,
        } => {
            let dashboard = dashboard::load_dashboard(&mut store, &settings, reference)?;
            print_payments(&dashboard);
            Ok(())
        }
        Command::Summary(args) => {
            let dashboard = dashboard::load_dashboard(&mut store, &settings, reference)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&dashboard.summary)?);
            } else {
                print_summary(&dashboard);
            }
            Ok(())
        }
        Command::Export(args) => {
            let dashboard = dashboard::load_dashboard(&mut store, &settings, reference)?;
            dashboard::export_students_csv_file(&dashboard, &args.output)?;
            println!(
                "exported {} students to {}",
                dashboard.students.len(),
                args.output.display()
            );
            Ok(())
        }
    }
}

fn print_students(dashboard: &Dashboard) {
    println!(
        "{:<28} {:<16} {:<16} {:<10} {:>10}  {}",
        "NAME", "ID", "PHONE", "ENROLLED", "TUITION", "STATUS"
    );
    for student in &dashboard.students {
        println!(
            "{:<28} {:<16} {:<16} {:<10} {:>10.2}  {}",
            student.name,
            student.id,
            student.phone,
            student.enrolled_on.format("%Y-%m-%d"),
            student.monthly_tuition,
            student.status
        );
    }
}

fn print_payments(dashboard: &Dashboard) {
    println!(
        "{:<16} {:<10} {:>10}  {}",
        "STUDENT", "DATE", "AMOUNT", "PERIOD"
    );
    for payment in &dashboard.payments {
        println!(
            "{:<16} {:<10} {:>10.2}  {}",
            payment.student_id,
            payment.paid_on.format("%Y-%m-%d"),
            payment.amount,
            payment.reference_period
        );
    }
}

fn print_summary(dashboard: &Dashboard) {
    let summary = &dashboard.summary;
    println!("Reference date:            {}", dashboard.reference);
    println!("Total students:            {}", summary.total_students);
    println!("Potential monthly revenue: {:.2}", summary.potential_monthly_revenue);
    println!("Current month revenue:     {:.2}", summary.current_month_revenue);
    println!("Overdue value:             {:.2}", summary.overdue_value);
    println!("Overdue students:          {}", summary.overdue_count);
    println!("Revenue all time:          {:.2}", summary.total_revenue_all_time);
    if summary.orphan_payments > 0 {
        println!("Orphan payments:           {}", summary.orphan_payments);
    }

    println!();
    println!("Students by status:");
    for status in PaymentStatus::ALL {
        if let Some(count) = summary.status_counts.get(&status) {
            println!("  {:<10} {count}", status.label());
        }
    }

    println!();
    println!("Revenue by month:");
    if summary.monthly_revenue_series.is_empty() {
        println!("  no payments recorded");
    }
    for entry in &summary.monthly_revenue_series {
        println!("  {:<16} {:>10.2}", entry.period, entry.total);
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Track gym students, tuition payments and revenue."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Workbook holding the Students and Payments sheets.
    #[arg(long, global = true)]
    workbook: Option<PathBuf>,

    /// Optional JSON settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference date to use instead of today (YYYY-MM-DD).
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// How payments are matched to the current month.
    #[arg(long, global = true, value_enum)]
    month_matching: Option<MonthMatchingKind>,

    /// Months a student without payments stays new after enrolling.
    #[arg(long, global = true)]
    grace_months: Option<u32>,

    /// Whether the workbook is re-read for every snapshot.
    #[arg(long, global = true, value_enum)]
    cache_policy: Option<CachePolicyKind>,
}

impl Cli {
    /// Settings file values, overridden by explicit flags.
    fn resolve_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(workbook) = &self.workbook {
            settings.workbook = workbook.clone();
        }
        if let Some(matching) = self.month_matching {
            settings.month_matching = matching.into();
        }
        if let Some(grace_months) = self.grace_months {
            settings.grace_months = grace_months;
        }
        if let Some(policy) = self.cache_policy {
            settings.cache_policy = policy.into();
        }
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Register or list students.
    Students {
        #[command(subcommand)]
        command: StudentsCommand,
    },
    /// Register or list tuition payments.
    Payments {
        #[command(subcommand)]
        command: PaymentsCommand,
    },
    /// Show the dashboard metrics.
    Summary(SummaryArgs),
    /// Export the students, with their payment status, as CSV.
    Export(ExportArgs),
}

#[derive(Subcommand)]
enum StudentsCommand {
    /// Register a new student.
    Add(AddStudentArgs),
    /// List students with their current payment status.
    List,
}

#[derive(Subcommand)]
enum PaymentsCommand {
    /// Record a tuition payment.
    Add(AddPaymentArgs),
    /// List every recorded payment.
    List,
}

#[derive(clap::Args)]
struct AddStudentArgs {
    /// Student name.
    #[arg(long)]
    name: String,

    /// Identity key (national ID number).
    #[arg(long)]
    id: String,

    /// Contact phone number.
    #[arg(long, default_value = "")]
    phone: String,

    /// Enrollment date; defaults to the reference date.
    #[arg(long)]
    enrolled: Option<NaiveDate>,

    /// Monthly tuition.
    #[arg(long, default_value = "0")]
    tuition: Decimal,
}

impl AddStudentArgs {
    fn into_new_student(self, reference: NaiveDate) -> NewStudent {
        NewStudent {
            id: self.id,
            name: self.name,
            phone: self.phone,
            enrolled_on: self.enrolled.unwrap_or(reference),
            monthly_tuition: self.tuition,
        }
    }
}

#[derive(clap::Args)]
struct AddPaymentArgs {
    /// Identity key of the paying student.
    #[arg(long, conflicts_with = "student_name")]
    student: Option<String>,

    /// Name of the paying student; the first registered match is used.
    #[arg(long)]
    student_name: Option<String>,

    /// Payment date; defaults to the reference date.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Amount paid.
    #[arg(long)]
    amount: Decimal,
}

impl AddPaymentArgs {
    fn into_new_payment(self, reference: NaiveDate) -> Result<NewPayment> {
        let student = match (self.student, self.student_name) {
            (Some(id), _) => StudentSelector::Id(id),
            (None, Some(name)) => StudentSelector::Name(name),
            (None, None) => {
                return Err(ToolError::Validation(
                    "select a student with --student or --student-name".into(),
                ));
            }
        };
        Ok(NewPayment {
            student,
            paid_on: self.date.unwrap_or(reference),
            amount: self.amount,
        })
    }
}

#[derive(clap::Args)]
struct SummaryArgs {
    /// Print the metrics as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Destination CSV file.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MonthMatchingKind {
    MonthOnly,
    MonthAndYear,
}

impl From<MonthMatchingKind> for MonthMatching {
    fn from(kind: MonthMatchingKind) -> Self {
        match kind {
            MonthMatchingKind::MonthOnly => MonthMatching::MonthOnly,
            MonthMatchingKind::MonthAndYear => MonthMatching::MonthAndYear,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CachePolicyKind {
    Fresh,
    Cached,
}

impl From<CachePolicyKind> for CachePolicy {
    fn from(kind: CachePolicyKind) -> Self {
        match kind {
            CachePolicyKind::Fresh => CachePolicy::Fresh,
            CachePolicyKind::Cached => CachePolicy::Cached,
        }
    }
}
