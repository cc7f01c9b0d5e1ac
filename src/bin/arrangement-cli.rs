#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use arrangement::{
    io,
    model::{parse_day, ArrangementTable, DayMode},
    scheduler::{
        apply_override, detect_conflicts, substitute_load, ArrangeOptions, ArrangementRequest,
        Arranger,
    },
    storage::{ArrangementLog, JsonStorage, LogEntry, Source, Storage},
};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI d'arrangement des remplacements (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON d'historique des arrangements
    #[arg(long, global = true, default_value = "arrangements.json")]
    history: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Périodes 1 à 8
    Full,
    /// Périodes 1 à 4
    Half,
    /// Périodes de `--periods`
    Custom,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Générer l'arrangement du jour
    Generate {
        /// CSV `teacher,day,p1..p8,tpod`
        #[arg(long)]
        timetable: String,
        /// CSV `teacher,scope,reason`
        #[arg(long)]
        absences: String,
        /// Jour de l'emploi du temps (par défaut : jour de `--date`)
        #[arg(long)]
        day: Option<String>,
        /// Date d'archivage (YYYY-MM-DD, par défaut aujourd'hui UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Mode::Full)]
        mode: Mode,
        /// liste "1,3,5" (mode custom)
        #[arg(long)]
        periods: Option<String>,
        /// Graine du départage aléatoire
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 7)]
        max_tpod: u32,
        #[arg(long, default_value_t = 5)]
        max_suggestions: usize,
        #[arg(long)]
        out_csv: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        suggestions_csv: Option<String>,
        /// N'écrit pas l'historique
        #[arg(long)]
        dry_run: bool,
    },

    /// Remplacer (ou vider) un remplaçant par un nom suggéré
    Override {
        /// Par défaut : dernière entrée archivée
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        teacher: String,
        #[arg(long)]
        period: u8,
        /// Absent : vide la cellule
        #[arg(long)]
        with: Option<String>,
    },

    /// Vérifier les doubles affectations
    Check {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Charge par remplaçant
    Load {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Lister l'historique
    History,

    /// Lister les enseignants et leur domaine
    Teachers {
        #[arg(long)]
        timetable: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.history)?;

    let code = match cli.cmd {
        Commands::Generate {
            timetable,
            absences,
            day,
            date,
            mode,
            periods,
            seed,
            max_tpod,
            max_suggestions,
            out_csv,
            out_json,
            suggestions_csv,
            dry_run,
        } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let day = match day {
                Some(raw) => parse_day(&raw)?,
                None => date.weekday(),
            };
            let mode = match mode {
                Mode::Full => DayMode::FullDay,
                Mode::Half => DayMode::HalfDay,
                Mode::Custom => {
                    let list = periods.context("--periods is required with --mode custom")?;
                    DayMode::Custom(parse_periods(&list)?)
                }
            };
            let opts = ArrangeOptions {
                max_tpod,
                max_suggestions,
            };

            let arranger = Arranger::new(io::import_timetable_csv(&timetable)?);
            let absences = io::import_absences_csv(&absences)?;
            let request = ArrangementRequest::with_mode(day, &mode, absences);
            let arrangement = match seed {
                Some(seed) => arranger.generate_seeded(&request, opts, seed)?,
                None => arranger.generate(&request, opts, &mut rand::thread_rng())?,
            };

            print_table(&arrangement.table);
            if let Some(path) = out_csv {
                io::export_table_csv(path, &arrangement.table)?;
            }
            if let Some(path) = out_json {
                io::export_table_json(path, &arrangement.table)?;
            }
            if let Some(path) = suggestions_csv {
                io::export_suggestions_csv(path, &arrangement.suggestions)?;
            }

            if !dry_run {
                let mut log = storage.load_or_default()?;
                log.upsert(LogEntry::new(
                    date,
                    mode,
                    request.absences.clone(),
                    arrangement.table.clone(),
                    arrangement.suggestions.clone(),
                    Utc::now(),
                ));
                storage.save(&log)?;
            }

            let gaps: Vec<_> = arrangement.gaps().collect();
            if gaps.is_empty() {
                0
            } else {
                eprintln!("{} period(s) left unassigned", gaps.len());
                for g in gaps {
                    eprintln!("  {} period {} ({})", g.absent_teacher, g.period, g.class_assigned);
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Override {
            date,
            teacher,
            period,
            with,
        } => {
            let mut log = storage.load()?;
            let entry = select_entry(&mut log, date)?;
            apply_override(
                &mut entry.table,
                &entry.suggestions,
                &teacher,
                period,
                with.as_deref(),
            )?;
            entry.source = Source::Manual;
            print_table(&entry.table);
            storage.save(&log)?;
            0
        }
        Commands::Check { date, report } => {
            let mut log = storage.load()?;
            let entry = select_entry(&mut log, date)?;
            let conflicts = detect_conflicts(&entry.table);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                for c in &conflicts {
                    eprintln!(
                        "  period {}: {} covers {} and {}",
                        c.period, c.substitute, c.first_absent, c.also_absent
                    );
                }
                if let Some(path) = report {
                    io::export_conflicts_csv(path, &conflicts)?;
                }
                2
            }
        }
        Commands::Load { date } => {
            let mut log = storage.load()?;
            let entry = select_entry(&mut log, date)?;
            for (teacher, count) in substitute_load(&entry.table) {
                println!("{teacher} | {count}");
            }
            0
        }
        Commands::History => {
            let log = storage.load_or_default()?;
            for e in &log.entries {
                println!(
                    "{} | {} | {:?} | {} absent(s) | {} unassigned",
                    e.date,
                    e.day,
                    e.source,
                    e.absences.len(),
                    e.unassigned()
                );
            }
            0
        }
        Commands::Teachers { timetable } => {
            let timetable = io::import_timetable_csv(&timetable)?;
            for (teacher, domain) in timetable.teachers() {
                println!("{teacher} | {domain}");
            }
            0
        }
    };

    std::process::exit(code);
}

fn parse_periods(raw: &str) -> Result<Vec<u8>> {
    let periods: Vec<u8> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>().with_context(|| format!("invalid period: {s}")))
        .collect::<Result<_>>()?;
    if periods.is_empty() {
        bail!("no period selected");
    }
    Ok(periods)
}

fn select_entry(log: &mut ArrangementLog, date: Option<NaiveDate>) -> Result<&mut LogEntry> {
    let date = match date {
        Some(d) => d,
        None => log.latest().map(|e| e.date).context("no arrangement stored yet")?,
    };
    log.for_date_mut(date)
        .with_context(|| format!("no arrangement stored for {date}"))
}

fn print_table(table: &ArrangementTable) {
    println!("{}", table.header().join(" | "));
    for rec in table.records() {
        println!("{}", rec.join(" | "));
    }
}
