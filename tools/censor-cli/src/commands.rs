use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tr_censor::audit::audit_dir;
use tr_censor::io::{read_censor_1d, read_censor_npy, write_censor_1d, write_censor_npy};
use tr_censor::outlier::{outlier_reasons, record_outlier, run_name};
use tr_censor::run::{check_preproc_length, CensorRun, RunSummary};
use tr_censor::{expand, ExpansionConfig, InclusionSequence};

use crate::cli::{AuditArgs, Commands, EnhanceArgs, FdArgs};

const CONFOUNDS_SUFFIXES: [&str; 2] = [
    "_desc-confounds_timeseries.tsv",
    "_desc-confounds_regressors.tsv",
];

pub(crate) fn run<W: Write>(command: Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Enhance(args) => handle_enhance(args),
        Commands::Fd(args) => handle_fd(args, out),
        Commands::Audit(args) => handle_audit(args, out),
    }
}

fn is_npy(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("npy"))
}

fn read_input(path: &Path) -> Result<InclusionSequence> {
    let seq = if is_npy(path) {
        read_censor_npy(path)
    } else {
        read_censor_1d(path)
    };
    seq.with_context(|| format!("failed to read censor file {}", path.display()))
}

fn handle_enhance(args: EnhanceArgs) -> Result<()> {
    let config = args.expansion.resolve(ExpansionConfig::enhance_default())?;
    let seq = read_input(&args.in_file)?;
    let refined = expand(seq.view(), config)?;

    if is_npy(&args.out_file) {
        write_censor_npy(&args.out_file, refined.view())?;
    } else {
        write_censor_1d(&args.out_file, refined.view())?;
    }

    let before = RunSummary::from_sequence(seq.view());
    let after = RunSummary::from_sequence(refined.view());
    log::info!(
        "{}: excluded {} -> {} of {} volumes",
        args.out_file.display(),
        before.excluded,
        after.excluded,
        after.total
    );
    Ok(())
}

/// `sub-01_task-rest_desc-confounds_timeseries.tsv` -> `sub-01_task-rest`.
fn default_prefix(confounds: &Path) -> Result<String> {
    let name = confounds
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid confounds path {}", confounds.display()))?;
    for suffix in CONFOUNDS_SUFFIXES {
        if let Some(prefix) = name.strip_suffix(suffix) {
            return Ok(prefix.to_string());
        }
    }
    Ok(name.split('.').next().unwrap_or(name).to_string())
}

fn handle_fd<W: Write>(args: FdArgs, out: &mut W) -> Result<()> {
    let config = args.expansion.resolve(args.preset.config())?;
    let prefix = match args.prefix {
        Some(p) => p,
        None => default_prefix(&args.confounds)?,
    };

    let mut run = CensorRun::new(&args.confounds)
        .fd_threshold(args.fd_thresh)
        .dummy_scans(args.dummy_scans)
        .config(config);
    if let Some(bold) = args.bold.as_ref() {
        run = run.bold(bold);
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let censored = run
        .load_or_compute(&args.out_dir, &prefix, args.force)
        .with_context(|| format!("failed to censor {}", args.confounds.display()))?;

    let summary = censored.summary();
    let preproc_volumes = match args.bold.as_ref() {
        Some(bold) => Some(check_preproc_length(bold)?.0),
        None => None,
    };
    if !summary.is_usable(args.min_retained) {
        log::warn!(
            "{prefix}: {} volumes retained, fewer than {}",
            summary.retained,
            args.min_retained
        );
    }
    let reasons = outlier_reasons(&summary, args.min_retained, preproc_volumes);
    if let Some(table) = args.outliers.as_ref() {
        if !reasons.is_empty() {
            record_outlier(table, run_name(&prefix))
                .with_context(|| format!("failed to update {}", table.display()))?;
        }
    }

    let mean_fd = run
        .mean_fd()?
        .map_or_else(|| "n/a".to_string(), |m| format!("{m:.4}"));
    writeln!(
        out,
        "{}\t{}\t{}\t{mean_fd}\t{}",
        censored.path.display(),
        summary.total,
        summary.retained,
        if censored.reused { "reused" } else { "written" }
    )?;
    Ok(())
}

fn handle_audit<W: Write>(args: AuditArgs, out: &mut W) -> Result<()> {
    let entries = audit_dir(&args.root, &args.pattern, args.min_retained)
        .with_context(|| format!("failed to audit {}", args.root.display()))?;

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "path\ttotal\tretained\texcluded\tusable")?;
    for e in entries.iter() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            e.path.display(),
            e.summary.total,
            e.summary.retained,
            e.summary.excluded,
            e.usable
        )?;
    }
    let unusable = entries.iter().filter(|e| !e.usable).count();
    writeln!(out, "# {} runs, {unusable} below {} volumes", entries.len(), args.min_retained)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::fs;

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut out = Vec::new();
        run(cli.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn enhance_writes_expanded_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.1D");
        let output = dir.path().join("out.1D");
        fs::write(&input, "1\n1\n1\n0\n1\n1\n1\n1\n1\n1\n").unwrap();

        run_args(&[
            "trcensor",
            "enhance",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "1\n1\n0\n0\n0\n0\n1\n1\n1\n1\n"
        );
    }

    #[test]
    fn enhance_accepts_indicator_matrix_and_npy_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("outliers.1D");
        let output = dir.path().join("out.npy");
        fs::write(&input, "0 0\n0 0\n1 0\n0 0\n0 0\n0 1\n").unwrap();

        run_args(&[
            "trcensor",
            "enhance",
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--pre=0",
            "--post=0",
            "--between=4",
        ])
        .unwrap();
        let seq = read_censor_npy(&output).unwrap();
        assert_eq!(seq.to_vec(), vec![1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn enhance_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.1D");
        fs::write(&input, "1\n3\n").unwrap();
        let out = dir.path().join("out.1D");
        let err = run_args(&[
            "trcensor",
            "enhance",
            input.to_str().unwrap(),
            out.to_str().unwrap(),
        ]);
        assert!(err.is_err());
        assert!(!out.exists());
    }

    #[test]
    fn fd_writes_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let confounds = dir.path().join("sub-01_task-rest_desc-confounds_timeseries.tsv");
        fs::write(
            &confounds,
            "framewise_displacement\nn/a\n0.1\n0.1\n0.9\n0.1\n0.1\n",
        )
        .unwrap();
        let out_dir = dir.path().join("clean");
        let argv = [
            "trcensor",
            "fd",
            confounds.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--min-retained",
            "1",
        ];

        let first = run_args(&argv).unwrap();
        assert!(first.contains("sub-01_task-rest_censoring0.35.1D"));
        assert!(first.trim_end().ends_with("6\t3\t0.2600\twritten"));
        assert_eq!(
            fs::read_to_string(out_dir.join("sub-01_task-rest_censoring0.35.1D")).unwrap(),
            "1\n1\n0\n0\n0\n1\n"
        );

        let second = run_args(&argv).unwrap();
        assert!(second.trim_end().ends_with("reused"));
    }

    /// 只包含文件头的 4 维 nifti-1 单文件.
    fn write_bold_header(path: &Path, volumes: i16) {
        let mut buf = vec![0u8; 352];
        buf[0..4].copy_from_slice(&348i32.to_le_bytes());
        for (i, d) in [4i16, 2, 2, 2, volumes, 1, 1, 1].iter().enumerate() {
            buf[40 + 2 * i..42 + 2 * i].copy_from_slice(&d.to_le_bytes());
        }
        buf[70..72].copy_from_slice(&2i16.to_le_bytes());
        buf[72..74].copy_from_slice(&8i16.to_le_bytes());
        for i in 0..8 {
            buf[76 + 4 * i..80 + 4 * i].copy_from_slice(&1f32.to_le_bytes());
        }
        buf[108..112].copy_from_slice(&352f32.to_le_bytes());
        buf[344..348].copy_from_slice(b"n+1\0");
        fs::write(path, buf).unwrap();
    }

    fn write_confounds(dir: &Path) -> std::path::PathBuf {
        let confounds = dir.join("sub-01_task-rest_desc-confounds_timeseries.tsv");
        fs::write(
            &confounds,
            "framewise_displacement\nn/a\n0.1\n0.1\n0.9\n0.1\n0.1\n",
        )
        .unwrap();
        confounds
    }

    #[test]
    fn fd_records_few_retained_once() {
        let dir = tempfile::tempdir().unwrap();
        let confounds = write_confounds(dir.path());
        let out_dir = dir.path().join("clean");
        let table = dir.path().join("runs_to_exclude.tsv");
        let argv = [
            "trcensor",
            "fd",
            confounds.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--outliers",
            table.to_str().unwrap(),
        ];

        // 默认至少保留 100 个 TR.
        run_args(&argv).unwrap();
        run_args(&argv).unwrap();
        assert_eq!(
            fs::read_to_string(&table).unwrap(),
            "bids_name\nsub-01_task-rest\n"
        );
    }

    #[test]
    fn fd_records_short_preproc() {
        let dir = tempfile::tempdir().unwrap();
        let confounds = write_confounds(dir.path());
        let out_dir = dir.path().join("clean");
        let table = dir.path().join("runs_to_exclude.tsv");
        let bold = dir.path().join("sub-01_task-rest_space-MNI_desc-preproc_bold.nii");
        write_bold_header(&bold, 6);

        let mut argv = vec![
            "trcensor",
            "fd",
            confounds.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--outliers",
            table.to_str().unwrap(),
            "--min-retained",
            "1",
        ];
        run_args(&argv).unwrap();
        assert!(!table.exists());

        argv.extend(["--bold", bold.to_str().unwrap(), "--force"]);
        run_args(&argv).unwrap();
        assert_eq!(
            fs::read_to_string(&table).unwrap(),
            "bids_name\nsub-01_task-rest\n"
        );
    }

    #[test]
    fn audit_prints_table_and_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_censoring0.35.1D"), "1\n1\n0\n").unwrap();
        let root = dir.path().to_str().unwrap();

        let table = run_args(&["trcensor", "audit", root, "--min-retained", "3"]).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("3\t2\t1\tfalse"));
        assert_eq!(lines[2], "# 1 runs, 1 below 3 volumes");

        let json = run_args(&["trcensor", "audit", root, "--json"]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["summary"]["retained"], 2);
        assert_eq!(v[0]["usable"], false);
    }

    #[test]
    fn default_prefix_strips_fmriprep_suffix() {
        let p = Path::new("/d/sub-01_ses-1_task-rest_desc-confounds_timeseries.tsv");
        assert_eq!(default_prefix(p).unwrap(), "sub-01_ses-1_task-rest");
        assert_eq!(default_prefix(Path::new("motion.tsv")).unwrap(), "motion");
    }
}
