//! Neighbouring-base analysis over effect orders 1 through 4.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use linked_hash_map::LinkedHashMap;
use log::{debug, info, log_enabled, Level};
use prettytable::{row, Table};
use serde::Serialize;

use crate::config::{OutputFormat, PlotConfig};
use crate::constants::*;
use crate::effect::{max_rel_entropy, EffectEvaluator, EffectResult, EffectResults};
use crate::entropy;
use crate::error::{Error, Result};
use crate::io::counts::CountsTable;
use crate::io::GroupedTable;
use crate::loglin::LogLinearModel;
use crate::logo::draw::{self, LogoFigure};
use crate::logo::{est_ylim, HeightAssembler, Selection};
use crate::motif::{self, counts, Combination};
use crate::runlog::RunLog;
use crate::trellis::TrellisLayout;

pub const COMBINED_COUNTS_FILE: &str = "group_counts_table.txt";
pub const SUMMARY_FILE: &str = "summary.txt";

#[derive(Debug, Clone)]
pub struct NbrOptions {
    pub outpath: PathBuf,
    pub first_order: bool,
    pub dry_run: bool,
    pub format: OutputFormat,
    pub plot: PlotConfig,
}

/// One line of the run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub position: String,
    pub rel_entropy: f64,
    pub deviance: f64,
    pub df: usize,
    pub prob: f64,
    pub formula: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub rows: Vec<SummaryRow>,
    /// Largest relative entropy of each order, starting at order 1
    pub max_rel_entropy: Vec<f64>,
}

/// Combine the inputs into one table and settle the grouping.
///
/// With strand symmetry the `strand` column is the group. With a second
/// table, records are tagged `1` and `2` in the group column.
pub fn prepare_groups<T: GroupedTable>(table: T, second: Option<T>, strand_symmetry: bool,
                                       selection: Selection) -> Result<(T, Selection)> {
    let mut selection = selection;
    let mut table = table;

    if strand_symmetry && second.is_some() {
        return Err(Error::config("strand symmetry analysis takes a single counts file"));
    }

    if strand_symmetry {
        if !table.has_column(STRAND_COLUMN) {
            return Err(Error::config(format!("no column named '{}'", STRAND_COLUMN)));
        }
        selection.group_label = Some(STRAND_COLUMN.to_owned());
        selection.group_ref = selection.group_ref.or_else(|| Some("+".to_owned()));
    }

    if let Some(second) = second {
        info!("Performing 2 group analysis");
        let label = selection.group_label.clone().unwrap_or_else(|| DEFAULT_GROUP_COLUMN.to_owned());
        table = table.with_constant_column(&label, "1")?
            .concat(second.with_constant_column(&label, "2")?)?;
        selection.group_label = Some(label);
        selection.group_ref = selection.group_ref.or_else(|| Some("1".to_owned()));
    }

    Ok((table, selection))
}

/// Relative entropy of mutated against control bases at each position,
/// without a model.
pub fn positional_entropy(table: &CountsTable) -> Result<Vec<f64>> {
    let flags = counts::mut_levels(table)?;
    let control = flags.iter()
        .find(|f| f.as_str() != MUTATED)
        .ok_or_else(|| Error::config("no control flag in the mut column"))?;
    let mutated = table.observation_matrix(MUTATED);
    let control = table.observation_matrix(control);
    entropy::positional_relative_entropy(mutated.view(), control.view())
}

fn summary_rows(results: &EffectResults) -> Vec<SummaryRow> {
    results.iter()
        .map(|(c, r)| SummaryRow {
            position: c.label(),
            rel_entropy: r.rel_entropy,
            deviance: r.deviance,
            df: r.df,
            prob: r.prob,
            formula: r.formula.clone(),
        })
        .collect()
}

/// Logo figure of one order: trellis panels for k >= 2, a single
/// overlaid panel for k == 1.
pub fn logo_figure(positions: &[String], order: usize, combinations: &[Combination],
                   results: &EffectResults, selection: &Selection) -> Result<LogoFigure> {
    let layout = TrellisLayout::for_order(order, positions, combinations)?;
    let rel_entropies: Vec<f64> = results.values().map(|r| r.rel_entropy).collect();

    let mut assembler = HeightAssembler::new(positions.len(), order);
    let mut panels = Vec::with_capacity(results.len());
    for (combination, result) in results.iter() {
        let panel = assembler.add(positions, combination, result, selection)?;
        if order > 1 {
            let coord = layout.coord(combination)
                .ok_or_else(|| Error::UnsupportedLayout(format!("{} has no panel", combination)))?;
            panels.push((coord, panel));
        }
    }
    if order == 1 {
        panels.push(((0, 0), assembler.overview()));
    }

    Ok(LogoFigure {
        nrows: layout.nrows(),
        ncols: layout.ncols(),
        n_positions: positions.len(),
        ylim: est_ylim(&rel_entropies),
        panels: panels,
    })
}

/// Dump results as JSON keyed by combination label.
pub fn write_results<P: AsRef<Path>>(path: P, results: &EffectResults) -> Result<()> {
    let dump: LinkedHashMap<String, &EffectResult> = results.iter()
        .map(|(c, r)| (c.label(), r))
        .collect();
    let out = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(out, &dump)?;
    Ok(())
}

const SUMMARY_HEADER: [&str; 6] = ["Position", "RE", "Deviance", "df", "prob", "formula"];

fn summary_fields(row: &SummaryRow) -> [String; 6] {
    [
        row.position.clone(),
        format!("{:.3e}", row.rel_entropy),
        format!("{:.2}", row.deviance),
        row.df.to_string(),
        format!("{:.3e}", row.prob),
        row.formula.clone(),
    ]
}

/// Write the summary as a tab-delimited table.
pub fn write_summary<P: AsRef<Path>>(path: P, rows: &[SummaryRow]) -> Result<()> {
    let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    out.write_record(&SUMMARY_HEADER)?;
    for row in rows {
        out.write_record(&summary_fields(row))?;
    }
    out.flush()?;
    Ok(())
}

pub fn summary_table(rows: &[SummaryRow]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Position", "RE", "Deviance", "df", "prob", "formula"]);
    for r in rows {
        let f = summary_fields(r);
        table.add_row(row![f[0], f[1], f[2], f[3], f[4], f[5]]);
    }
    table
}

/// Run the analysis of every order, writing outputs unless this is a dry run.
/// Every output written is recorded in `runlog`.
pub fn run(table: &CountsTable, selection: &Selection, opts: &NbrOptions, runlog: &mut RunLog) -> Result<RunSummary> {
    let positions = table.positions().to_vec();
    if !opts.first_order && positions.len() != N_FULL_POSITIONS {
        return Err(Error::config(format!(
            "requires {} positions for analysis, found {}", N_FULL_POSITIONS, positions.len())));
    }

    if opts.dry_run || log_enabled!(Level::Debug) {
        info!("Loaded {} records over positions {:?}", table.len(), positions);
        for (p, re) in positions.iter().zip(positional_entropy(table)?) {
            info!("{}: model-free RE = {:.6}", p, re);
        }
    }
    if !opts.dry_run {
        fs::create_dir_all(&opts.outpath)?;
    }

    let model = LogLinearModel;
    let evaluator = EffectEvaluator::new(&model, selection.group_label.as_deref());
    let max_order = if opts.first_order { 1 } else { MAX_ORDER };

    let mut summary = RunSummary::default();
    for k in 1 ..= max_order {
        info!("Doing {} position analysis", k);
        let combinations = motif::combinations(&positions, k);
        let results = evaluator.position_effects(table, &combinations)?;
        summary.rows.extend(summary_rows(&results));
        summary.max_rel_entropy.push(max_rel_entropy(&results));

        let figure = logo_figure(&positions, k, &combinations, &results, selection)?;
        if opts.dry_run {
            continue;
        }

        let path = opts.outpath.join(format!("{}.json", k));
        write_results(&path, &results)?;
        runlog.output_file(&format!("analysis{}", k), &path)?;

        let path = opts.outpath.join(format!("{}.{}", k, opts.format.extension()));
        draw::draw_logo_figure(&path, &figure, opts.plot.for_order(k))?;
        runlog.output_file(&format!("figure{}", k), &path)?;
    }
    debug!("Maximum RE per order: {:?}", summary.max_rel_entropy);

    if !opts.dry_run {
        if !opts.first_order {
            let path = opts.outpath.join(format!("summary.{}", opts.format.extension()));
            draw::draw_summary(&path, &summary.max_rel_entropy, &opts.plot.summary)?;
            runlog.output_file("summary_figure", &path)?;
        }
        let path = opts.outpath.join(SUMMARY_FILE);
        write_summary(&path, &summary.rows)?;
        runlog.output_file("summary", &path)?;
    }

    summary_table(&summary.rows).printstd();
    Ok(summary)
}
