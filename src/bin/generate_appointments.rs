use anyhow::Context;
use chrono::{Local, NaiveDateTime, Timelike};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scheduler_check::core::generator::{
    validate_start, write_csv, AppointmentGenerator, DEFAULT_ERROR_RATE, DEFAULT_OUTPUT_FILE,
    DEFAULT_PATIENTS,
};
use scheduler_check::domain::datetime;
use scheduler_check::utils::logger;
use std::fs::File;
use std::io::BufWriter;

#[derive(Parser)]
#[command(name = "generate-appointments")]
#[command(about = "Generates synthetic longitudinal oncology appointment schedules as CSV")]
struct Args {
    /// Number of patients to simulate
    #[arg(short, long, default_value_t = DEFAULT_PATIENTS)]
    patients: usize,

    /// Output CSV path
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: String,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Start the simulation from this time instead of now
    #[arg(long, value_parser = parse_start)]
    start: Option<NaiveDateTime>,

    /// Chance that the forgetful scheduler botches a multi-step phase
    #[arg(long, default_value_t = DEFAULT_ERROR_RATE)]
    error_rate: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_start(value: &str) -> Result<NaiveDateTime, String> {
    let start = datetime::parse(value)
        .ok_or_else(|| format!("expected YYYY-MM-DD[ HH:MM[:SS]], got '{}'", value))?;
    validate_start(start).map_err(|e| e.user_friendly_message())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let start = args.start.unwrap_or_else(|| {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    });
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    tracing::info!(patients = args.patients, %start, "Starting longitudinal patient journey simulation");

    let appointments = AppointmentGenerator::new(rng, start)
        .with_error_rate(args.error_rate)
        .generate(args.patients);

    let file = File::create(&args.output)
        .with_context(|| format!("cannot create output file '{}'", args.output))?;
    write_csv(&appointments, BufWriter::new(file))
        .with_context(|| format!("cannot write appointments to '{}'", args.output))?;

    println!(
        "Successfully generated {} longitudinal appointments for {} patients.",
        appointments.len(),
        args.patients
    );
    println!("Output saved to '{}'", args.output);

    // 顯示第一位病人的行程
    if let Some(first) = appointments.first() {
        println!("\n--- Data Preview ---");
        for appt in appointments
            .iter()
            .take_while(|a| a.patient_mrn == first.patient_mrn)
        {
            println!(
                "{}  {}  {:<18} {}  {}",
                appt.appt_id,
                appt.patient_mrn,
                appt.appt_type,
                appt.appt_dttm.format(datetime::WRITE_FORMAT),
                appt.scheduler_id
            );
        }
    }

    Ok(())
}
