use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mutmotif::analysis::{self, NbrOptions};
use mutmotif::config::{OutputFormat, PlotConfig};
use mutmotif::io::counts;
use mutmotif::logo::Selection;
use mutmotif::runlog::{RunLog, RUN_LOG_FILE};
use mutmotif::seq;

/// Counts for every 4-mer context, mutated and control, with mutated
/// contexts enriched for C at the first position.
fn counts_file(dir: &Path, seed: u64, strand: bool) -> std::path::PathBuf {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::from(if strand { "count\tpos0\tpos1\tpos2\tpos3\tstrand\tmut\n" } else { "count\tpos0\tpos1\tpos2\tpos3\tmut\n" });
    for i in 0 .. seq::n_tuples(4) {
        let bases: Vec<char> = seq::base_tuple(i, 4).chars().collect();
        for &flag in ["M", "R"].iter() {
            for &s in ["+", "-"].iter().take(if strand { 2 } else { 1 }) {
                let mut count: u32 = rng.gen_range(1 .. 20);
                if flag == "M" && bases[0] == 'C' {
                    count *= 3;
                }
                let strand_field = if strand { format!("{}\t", s) } else { String::new() };
                writeln!(text, "{}\t{}\t{}\t{}\t{}\t{}{}", count, bases[0], bases[1], bases[2], bases[3], strand_field, flag).unwrap();
            }
        }
    }
    let path = dir.join(format!("counts_{}.txt", seed));
    fs::write(&path, text).unwrap();
    path
}

fn options(outpath: &Path, dry_run: bool) -> NbrOptions {
    NbrOptions {
        outpath: outpath.to_path_buf(),
        first_order: false,
        dry_run: dry_run,
        format: OutputFormat::Svg,
        plot: PlotConfig::default(),
    }
}

#[test]
fn dry_run_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let table = counts::load(counts_file(input.path(), 1, false)).unwrap();
    let outdir = input.path().join("out");

    let mut runlog = RunLog::for_run(&outdir, true).unwrap();
    let summary = analysis::run(&table, &Selection::default(), &options(&outdir, true), &mut runlog).unwrap();
    assert_eq!(summary.rows.len(), 4 + 6 + 4 + 1);
    assert_eq!(summary.max_rel_entropy.len(), 4);
    assert!(!outdir.exists());
}

#[test]
fn full_run_writes_outputs() {
    let input = tempfile::tempdir().unwrap();
    let path = counts_file(input.path(), 2, false);
    let table = counts::load(&path).unwrap();
    let outdir = input.path().join("out");

    let mut runlog = RunLog::for_run(&outdir, false).unwrap();
    runlog.input_file("countsfile1_path", &path).unwrap();
    let summary = analysis::run(&table, &Selection::default(), &options(&outdir, false), &mut runlog).unwrap();

    for name in ["1.json", "2.json", "3.json", "4.json", "1.svg", "2.svg", "3.svg", "4.svg",
                 "summary.svg", "summary.txt"].iter() {
        assert!(outdir.join(name).exists(), "missing {}", name);
    }

    // the enriched first position carries the strongest single-position effect
    let first = &summary.rows[0];
    assert_eq!(first.position, "pos0");
    assert!(summary.rows[1 .. 4].iter().all(|r| r.rel_entropy < first.rel_entropy));
    assert!(first.prob < 1.0e-3);

    let dump: serde_json::Value = serde_json::from_str(&fs::read_to_string(outdir.join("2.json")).unwrap()).unwrap();
    let keys: Vec<&String> = dump.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 6);
    assert_eq!(dump["pos0:pos1"]["df"], 9);
    assert_eq!(dump["pos0:pos1"]["stats"].as_array().unwrap().len(), 32);

    let text = fs::read_to_string(outdir.join("summary.txt")).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Position\tRE\tDeviance\tdf\tprob\tformula"));
    assert_eq!(lines.count(), 15);

    let log = fs::read_to_string(outdir.join(RUN_LOG_FILE)).unwrap();
    assert!(log.lines().next().unwrap().contains("countsfile1_path"));
    assert!(log.lines().any(|l| l.contains("\tsummary\t") && l.ends_with("summary.txt")));
    assert_eq!(log.lines().filter(|l| l.ends_with(".json")).count(), 4);
}

#[test]
fn two_group_run() {
    let input = tempfile::tempdir().unwrap();
    let first = counts::load(counts_file(input.path(), 3, false)).unwrap();
    let second = counts::load(counts_file(input.path(), 4, false)).unwrap();
    let (table, selection) = analysis::prepare_groups(first, Some(second), false, Selection::default()).unwrap();
    let outdir = input.path().join("out");

    let opts = NbrOptions { first_order: true, ..options(&outdir, false) };
    let summary = analysis::run(&table, &selection, &opts, &mut RunLog::disabled()).unwrap();

    assert_eq!(summary.rows.len(), 4);
    assert_eq!(summary.rows[0].formula, "count ~ group*mut*pos0 - group:mut:pos0");
    assert!(outdir.join("1.json").exists());
    assert!(outdir.join("summary.txt").exists());
    assert!(!outdir.join("summary.svg").exists());
}

#[test]
fn strand_symmetry_run() {
    let input = tempfile::tempdir().unwrap();
    let table = counts::load(counts_file(input.path(), 5, true)).unwrap();
    let (table, selection) = analysis::prepare_groups(table, None, true, Selection::default()).unwrap();
    assert_eq!(selection.reference(), Some("+"));

    let outdir = input.path().join("out");
    let summary = analysis::run(&table, &selection, &options(&outdir, true), &mut RunLog::disabled()).unwrap();
    assert_eq!(summary.rows[14].df, 81);
}
