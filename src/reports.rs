// ===== molswarm/src/reports.rs =====
use crate::error::{MolSwarmError, MsResult};
use crate::optimizer::tracker::{BestSolution, FitnessSummary, HistoryRow};
use crate::scoring::ScoreCache;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const BEST_SOLUTIONS_CSV: &str = "best_solutions.csv";
pub const HISTORY_CSV: &str = "best_fitness_history.csv";
pub const BEST_SOLUTIONS_HTML: &str = "best_solutions.html";
pub const CACHE_JSON: &str = "unscaled_scores.json";
pub const EPOCH_STATS: &str = "epoch_stats.txt";

fn tmp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.tmp", name))
}

/// Writes through a sibling temp file and renames, so a reader polling the
/// output directory never observes a half-written artifact.
fn write_atomic(path: &Path, bytes: &[u8]) -> MsResult<()> {
    let tmp = tmp_sibling(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn write_best_solutions_csv(solutions: &[BestSolution], path: &Path) -> MsResult<()> {
    let tmp = tmp_sibling(path);
    let mut wtr = csv::Writer::from_path(&tmp)?;
    wtr.write_record(["smiles", "fitness", "residue"])?;
    for row in solutions {
        wtr.write_record([
            row.smiles.as_str(),
            &row.fitness.to_string(),
            row.residue.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    drop(wtr);
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn write_history_csv(history: &[HistoryRow], path: &Path) -> MsResult<()> {
    let tmp = tmp_sibling(path);
    let mut wtr = csv::Writer::from_path(&tmp)?;
    wtr.write_record(["step", "swarm", "fitness", "smiles", "residue"])?;
    for row in history {
        wtr.write_record([
            row.step.to_string().as_str(),
            &row.swarm.to_string(),
            &row.fitness.to_string(),
            &row.smiles,
            row.residue.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    drop(wtr);
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn write_cache_snapshot(
    cache: &ScoreCache,
    fingerprint: &str,
    path: &Path,
) -> MsResult<()> {
    let snapshot = cache.snapshot(fingerprint);
    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    write_atomic(path, &bytes)
}

pub fn append_epoch_stats(path: &Path, step: usize, summary: &FitnessSummary) -> MsResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "step {} max: {:.3} min: {:.3} mean: {:.3}",
        step, summary.max, summary.min, summary.mean
    )?;
    Ok(())
}

pub fn write_best_solutions_html(solutions: &[BestSolution], path: &Path) -> MsResult<()> {
    write_atomic(path, render_best_solutions_html(solutions).as_bytes())
}

/// Self-contained card grid of the tracked molecules. No external assets,
/// so the file opens straight from the output directory.
pub fn render_best_solutions_html(solutions: &[BestSolution]) -> String {
    let mut html = String::new();
    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Best Solutions</title>
<style>
  body { font-family: sans-serif; background: #f5f6f8; margin: 2em; }
  h1 { font-size: 1.3em; }
  .grid { display: flex; flex-wrap: wrap; gap: 12px; }
  .card { background: #fff; border: 1px solid #d8dbe0; border-radius: 6px;
          padding: 10px 14px; min-width: 220px; }
  .rank { color: #888; font-size: 0.8em; }
  .smiles { font-family: monospace; word-break: break-all; margin: 6px 0; }
  .fitness { font-weight: bold; color: #1a6b3c; }
  .residue { color: #555; font-size: 0.85em; }
</style>
</head>
<body>
"#,
    );
    html.push_str(&format!(
        "<h1>Best Solutions ({} tracked)</h1>\n<div class=\"grid\">\n",
        solutions.len()
    ));
    for (rank, row) in solutions.iter().enumerate() {
        html.push_str(&format!(
            r#"  <div class="card">
    <div class="rank">#{rank}</div>
    <div class="smiles">{smiles}</div>
    <div class="fitness">fitness {fitness:.4}</div>
"#,
            rank = rank + 1,
            smiles = escape_html(&row.smiles),
            fitness = row.fitness,
        ));
        if let Some(residue) = &row.residue {
            html.push_str(&format!(
                "    <div class=\"residue\">{}</div>\n",
                escape_html(residue)
            ));
        }
        html.push_str("  </div>\n");
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Console rendering of the ranked table, truncated to `limit` rows.
pub fn best_solutions_table(solutions: &[BestSolution], limit: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Molecule").add_attribute(Attribute::Bold),
        Cell::new("Fitness").fg(Color::Cyan),
        Cell::new("Residue"),
    ]);
    for (i, row) in solutions.iter().take(limit).enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&row.smiles),
            Cell::new(format!("{:.4}", row.fitness)),
            Cell::new(row.residue.as_deref().unwrap_or("-")),
        ]);
    }
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }
    table
}

/// Loads a previously written best-solutions CSV back into rows.
pub fn read_best_solutions_csv(path: &Path) -> MsResult<Vec<BestSolution>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() < 2 {
            return Err(MolSwarmError::Validation(format!(
                "malformed best-solutions row: {:?}",
                record
            )));
        }
        let fitness: f32 = record[1].parse().map_err(|_| {
            MolSwarmError::Validation(format!("bad fitness value '{}'", &record[1]))
        })?;
        let residue = record.get(2).filter(|s| !s.is_empty()).map(String::from);
        rows.push(BestSolution {
            smiles: record[0].to_string(),
            fitness,
            residue,
        });
    }
    Ok(rows)
}
