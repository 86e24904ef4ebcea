//! Comparison of mutation-direction spectra between two groups.
//!
//! The direction x group table is tested against independence with the same
//! fitting engine as the neighbouring-base analysis.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;
use prettytable::{row, Table};
use serde::Serialize;

use crate::effect::effect_prob;
use crate::error::{Error, Result};
use crate::io::spectra::SpectraTable;
use crate::loglin::{self, Contingency};
use crate::runlog::RunLog;
use crate::stats;

pub const ANALYSIS_FILE: &str = "spectra_analysis.json";
pub const SUMMARY_FILE: &str = "spectra_summary.txt";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionStat {
    pub group: String,
    pub direction: String,
    pub count: f64,
    pub fitted: f64,
    pub ret: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectraResult {
    pub group_label: String,
    pub groups: Vec<String>,
    pub directions: Vec<String>,
    pub rel_entropy: f64,
    pub deviance: f64,
    pub df: usize,
    pub prob: f64,
    /// Jensen-Shannon divergence between the two group spectra
    pub js_divergence: f64,
    pub formula: String,
    pub stats: Vec<DirectionStat>,
}

impl SpectraResult {
    /// Proportions of each direction within a group.
    pub fn spectrum(&self, group: &str) -> Vec<f64> {
        let counts: Vec<f64> = self.stats.iter()
            .filter(|s| s.group == group)
            .map(|s| s.count)
            .collect();
        stats::scale(&counts)
    }
}

#[derive(Debug, Clone)]
pub struct SpectraOptions {
    pub outpath: PathBuf,
    pub force_overwrite: bool,
    pub dry_run: bool,
}

/// Counts of every group x direction cell, group-major, zero-filled.
fn cell_counts(table: &SpectraTable, group_label: &str, groups: &[String], directions: &[String]) -> Result<Vec<f64>> {
    let j = table.extra_index(group_label)?;
    let mut counts = vec![0.0; groups.len() * directions.len()];
    for r in table.records() {
        let g = groups.iter().position(|g| *g == r.extra[j]);
        let d = directions.iter().position(|d| *d == r.direction);
        if let (Some(g), Some(d)) = (g, d) {
            counts[g * directions.len() + d] += r.count as f64;
        }
    }
    Ok(counts)
}

/// Test whether the direction spectrum differs between the two groups.
pub fn analyse(table: &SpectraTable, group_label: &str) -> Result<SpectraResult> {
    let groups = table.distinct_values(group_label)?;
    if groups.len() != 2 {
        return Err(Error::config(format!(
            "group column '{}' must have exactly two values, found {:?}", group_label, groups)));
    }
    let directions = table.directions();
    if directions.len() < 2 {
        return Err(Error::config(format!("need at least two mutation directions, found {:?}", directions)));
    }

    let counts = cell_counts(table, group_label, &groups, &directions)?;
    let contingency = Contingency::new(vec![groups.len(), directions.len()], counts)?;
    let fitted = contingency.fit_without_highest_interaction();

    let deviance = stats::g_statistic(contingency.counts(), &fitted);
    let df = (groups.len() - 1) * (directions.len() - 1);
    let prob = effect_prob(deviance, df, stats::chisq_sf);
    let ret = loglin::relative_entropy_terms(contingency.counts(), &fitted);

    let n_dir = directions.len();
    let observed = contingency.counts();
    let js = stats::js_divergence(&observed[.. n_dir], &observed[n_dir ..]);

    let mut cells = Vec::with_capacity(observed.len());
    for (g, group) in groups.iter().enumerate() {
        for (d, direction) in directions.iter().enumerate() {
            let i = g * n_dir + d;
            cells.push(DirectionStat {
                group: group.clone(),
                direction: direction.clone(),
                count: observed[i],
                fitted: fitted[i],
                ret: ret[i],
            });
        }
    }

    Ok(SpectraResult {
        group_label: group_label.to_owned(),
        rel_entropy: ret.iter().sum(),
        deviance: deviance,
        df: df,
        prob: prob,
        js_divergence: js,
        formula: loglin::formula(&[group_label.to_owned(), "direction".to_owned()]),
        groups: groups,
        directions: directions,
        stats: cells,
    })
}

pub fn summary_table(result: &SpectraResult) -> Table {
    let mut table = Table::new();
    table.add_row(row!["direction", result.group_label.as_str(), "count", "fitted", "ret"]);
    for s in result.stats.iter() {
        table.add_row(row![s.direction, s.group, s.count, format!("{:.2}", s.fitted), format!("{:.3e}", s.ret)]);
    }
    table
}

fn write_summary(path: &Path, result: &SpectraResult) -> Result<()> {
    let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    out.write_record(&["direction", result.group_label.as_str(), "count", "fitted", "ret"])?;
    for s in result.stats.iter() {
        out.write_record(&[
            s.direction.clone(),
            s.group.clone(),
            s.count.to_string(),
            format!("{:.4}", s.fitted),
            format!("{:.6e}", s.ret),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// Analyse spectra and write the outputs unless this is a dry run.
/// Existing outputs are kept unless overwriting is forced.
pub fn run(table: &SpectraTable, group_label: &str, opts: &SpectraOptions, runlog: &mut RunLog) -> Result<SpectraResult> {
    let json_path = opts.outpath.join(ANALYSIS_FILE);
    let summary_path = opts.outpath.join(SUMMARY_FILE);
    if !opts.dry_run && !opts.force_overwrite {
        if let Some(p) = [&json_path, &summary_path].iter().find(|p| p.exists()) {
            return Err(Error::config(format!(
                "{} exists, use --force-overwrite to replace it", p.display())));
        }
    }

    let result = analyse(table, group_label)?;
    info!("{}: RE={:.6} deviance={:.4} df={} p={:.4e} JSD={:.6}",
          result.formula, result.rel_entropy, result.deviance, result.df, result.prob, result.js_divergence);

    if !opts.dry_run {
        fs::create_dir_all(&opts.outpath)?;
        let out = BufWriter::new(fs::File::create(&json_path)?);
        serde_json::to_writer_pretty(out, &result)?;
        runlog.output_file("spectra_analysis", &json_path)?;
        write_summary(&summary_path, &result)?;
        runlog.output_file("spectra_summary", &summary_path)?;
    }

    summary_table(&result).printstd();
    Ok(result)
}
