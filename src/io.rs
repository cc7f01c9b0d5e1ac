use crate::model::{
    parse_day, AbsenceDeclaration, AbsenceScope, ArrangementTable, Suggestion, Timetable,
    TimetableEntry, PERIODS_PER_DAY,
};
use crate::scheduler::Conflict;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Import de l'emploi du temps, une ligne par enseignant et par jour :
/// header `teacher,day,p1,p2,p3,p4,p5,p6,p7,p8,tpod`.
///
/// Une cellule de période vide est une période libre ; un `tpod` vide reste
/// inconnu.
pub fn import_timetable_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Timetable> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening timetable {}", path.display()))?;
    let expected = timetable_header();
    let header: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    if header != expected {
        bail!(
            "invalid timetable header: expected `{}`, got `{}`",
            expected.join(","),
            header.join(",")
        );
    }
    let mut entries = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let row = line + 2;
        // une ligne tronquée ne doit pas produire de périodes libres
        if rec.len() != expected.len() {
            bail!("row {row}: expected {} columns, got {}", expected.len(), rec.len());
        }
        let teacher = rec.get(0).context("missing teacher")?.trim();
        if teacher.is_empty() {
            bail!("row {row}: empty teacher");
        }
        let day_raw = rec.get(1).with_context(|| format!("row {row}: missing day"))?;
        let day = parse_day(day_raw).with_context(|| format!("row {row}"))?;
        let tpod_col = usize::from(PERIODS_PER_DAY) + 2;
        let tpod = match rec.get(tpod_col).map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .with_context(|| format!("row {row}: invalid tpod {raw:?}"))?,
            ),
        };
        for period in 1..=PERIODS_PER_DAY {
            let class = rec
                .get(usize::from(period) + 1)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            entries.push(TimetableEntry::new(teacher, day, period, class, tpod));
        }
    }
    let timetable = Timetable::new(entries)?;
    Ok(timetable)
}

fn timetable_header() -> Vec<String> {
    let mut cols = vec!["teacher".to_string(), "day".to_string()];
    cols.extend((1..=PERIODS_PER_DAY).map(|p| format!("p{p}")));
    cols.push("tpod".to_string());
    cols
}

/// Import des absences: header `teacher,scope[,reason]`
pub fn import_absences_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<AbsenceDeclaration>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening absences {}", path.display()))?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let teacher = rec.get(0).context("missing teacher")?.trim();
        let scope_raw = rec.get(1).context("missing scope")?;
        if teacher.is_empty() {
            bail!("invalid absence row (empty teacher)");
        }
        let scope: AbsenceScope = scope_raw
            .parse()
            .with_context(|| format!("invalid scope for {teacher}"))?;
        let reason = rec.get(2).map(str::trim).unwrap_or("");
        out.push(AbsenceDeclaration::new(teacher, scope, reason));
    }
    Ok(out)
}

/// Tableau pivoté en CSV: `Absent Teacher,Reason,Period N...`
pub fn write_table_csv<W: Write>(writer: W, table: &ArrangementTable) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(table.header())?;
    for rec in table.records() {
        w.write_record(rec)?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_table_csv<P: AsRef<Path>>(path: P, table: &ArrangementTable) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_table_csv(file, table)
}

/// Suggestions en CSV: `Absent Teacher,Period,Class,Suggested Teachers`
pub fn write_suggestions_csv<W: Write>(
    writer: W,
    suggestions: &[Suggestion],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(["Absent Teacher", "Period", "Class", "Suggested Teachers"])?;
    for s in suggestions {
        let period = s.period.to_string();
        let names = s.candidates.join(", ");
        w.write_record([
            s.absent_teacher.as_str(),
            period.as_str(),
            s.class_assigned.as_str(),
            names.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn export_suggestions_csv<P: AsRef<Path>>(
    path: P,
    suggestions: &[Suggestion],
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_suggestions_csv(file, suggestions)
}

/// Rapport de conflits: `Period,Teacher,Conflicting With,Also Assigned To`
pub fn export_conflicts_csv<P: AsRef<Path>>(path: P, conflicts: &[Conflict]) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(false).from_path(path)?;
    w.write_record(["Period", "Teacher", "Conflicting With", "Also Assigned To"])?;
    for c in conflicts {
        let period = format!("Period {}", c.period);
        w.write_record([
            period.as_str(),
            c.substitute.as_str(),
            c.first_absent.as_str(),
            c.also_absent.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export JSON du tableau (jolie mise en forme)
pub fn export_table_json<P: AsRef<Path>>(path: P, table: &ArrangementTable) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(table)?;
    fs::write(path, s)?;
    Ok(())
}
