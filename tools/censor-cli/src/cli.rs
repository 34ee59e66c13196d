use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tr_censor::consts::{CENSOR_FILE_PATTERN, DEFAULT_FD_THRESHOLD, MIN_RETAINED_VOLUMES};
use tr_censor::{CensorResult, ExpansionConfig};

#[derive(Debug, Parser)]
#[command(name = "trcensor")]
#[command(about = "Expand fMRI volume censoring masks", version)]
pub struct Cli {
    /// Print debug logs (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Censor volumes before, after and between outliers of an existing censor file.
    Enhance(EnhanceArgs),
    /// Build a censor file from the framewise displacement of a confounds table.
    Fd(FdArgs),
    /// Count retained volumes of every censor file under a directory.
    Audit(AuditArgs),
}

/// Overrides of the expansion preset. Flags win over `TR_CENSOR_*` variables.
#[derive(Debug, Args, Default)]
pub struct ExpansionArgs {
    /// Number of volumes before outliers to censor
    #[arg(long = "pre", allow_negative_numbers = true)]
    pub before: Option<i64>,

    /// Number of volumes after outliers to censor
    #[arg(long = "post", allow_negative_numbers = true)]
    pub after: Option<i64>,

    /// Censored volumes closer than this are joined
    #[arg(long = "between", allow_negative_numbers = true)]
    pub min_gap: Option<i64>,
}

impl ExpansionArgs {
    pub fn resolve(&self, preset: ExpansionConfig) -> CensorResult<ExpansionConfig> {
        let base = ExpansionConfig::from_env_or(preset)?;
        ExpansionConfig::new(
            self.before.unwrap_or(base.before() as i64),
            self.after.unwrap_or(base.after() as i64),
            self.min_gap.unwrap_or(base.min_gap() as i64),
        )
    }
}

#[derive(Debug, Args)]
pub struct EnhanceArgs {
    /// 1D, txt or npy file containing the censoring index
    pub in_file: PathBuf,

    /// Output file (`.npy` or one integer per line)
    pub out_file: PathBuf,

    #[command(flatten)]
    pub expansion: ExpansionArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// before 1, after 1, between 0
    Rest,
    /// before 1, after 2, between 2
    Enhance,
}

impl Preset {
    pub fn config(self) -> ExpansionConfig {
        match self {
            Preset::Rest => ExpansionConfig::rest_denoise(),
            Preset::Enhance => ExpansionConfig::enhance_default(),
        }
    }
}

#[derive(Debug, Args)]
pub struct FdArgs {
    /// fMRIPrep confounds table (tab separated, with header)
    pub confounds: PathBuf,

    #[arg(long)]
    pub out_dir: PathBuf,

    /// Censor file prefix; derived from the confounds file name when omitted
    #[arg(long)]
    pub prefix: Option<String>,

    #[arg(long, default_value_t = DEFAULT_FD_THRESHOLD)]
    pub fd_thresh: f64,

    #[arg(long, default_value_t = 0)]
    pub dummy_scans: usize,

    #[arg(long, value_enum, default_value_t = Preset::Rest)]
    pub preset: Preset,

    #[command(flatten)]
    pub expansion: ExpansionArgs,

    /// Preprocessed BOLD image; its volume count must match the confounds rows
    #[arg(long)]
    pub bold: Option<PathBuf>,

    #[arg(long, default_value_t = MIN_RETAINED_VOLUMES)]
    pub min_retained: usize,

    /// Outlier table (e.g. runs_to_exclude.tsv); outlier runs are added to it once
    #[arg(long)]
    pub outliers: Option<PathBuf>,

    /// Recompute even if the censor file already exists
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    pub root: PathBuf,

    #[arg(long, default_value = CENSOR_FILE_PATTERN)]
    pub pattern: String,

    #[arg(long, default_value_t = MIN_RETAINED_VOLUMES)]
    pub min_retained: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
