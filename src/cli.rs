use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "naac-cgpa",
    version,
    about = "Self-study report segmentation, metric extraction and CGPA scoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the text layer of a report PDF with pdftotext.
    PdfText(PdfTextArgs),
    /// Split raw report text into the seven criterion sections.
    Segment(SegmentArgs),
    /// Extract quantitative metrics from segmented sections.
    Extract(ExtractArgs),
    /// Classify segmented sections with the built-in lexical classifier.
    Classify(ClassifyArgs),
    /// Extract rule-based entities from segmented sections.
    Entities(EntitiesArgs),
    /// Validate survey responses and compute the weighted survey score.
    Survey(SurveyArgs),
    /// Combine QnM, QlM and SSS artifacts into the final CGPA.
    Score(ScoreArgs),
    /// Run the whole pipeline into a run-scoped directory.
    Run(RunArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PdfTextArgs {
    #[arg(long)]
    pub pdf_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,

    #[arg(long)]
    pub max_pages: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SegmentArgs {
    #[arg(long)]
    pub input_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,

    #[arg(long)]
    pub profile_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub keep_page_markers: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub segmented_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,

    #[arg(long)]
    pub profile_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(long)]
    pub segmented_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct EntitiesArgs {
    #[arg(long)]
    pub segmented_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SurveyArgs {
    #[arg(long)]
    pub csv_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,

    #[arg(long)]
    pub profile_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub qnm_path: PathBuf,

    #[arg(long)]
    pub qlm_path: PathBuf,

    #[arg(long)]
    pub sss_path: PathBuf,

    #[arg(long)]
    pub output_path: PathBuf,

    #[arg(long)]
    pub profile_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = ".cache/naac")]
    pub cache_root: PathBuf,

    /// Raw text JSON (`{"raw_text": ...}`), or a PDF when `--from-pdf` is set.
    #[arg(long)]
    pub input_path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub from_pdf: bool,

    #[arg(long)]
    pub survey_csv_path: PathBuf,

    /// Predictions from an external classifier; the lexical classifier is used when absent.
    #[arg(long)]
    pub qlm_path: Option<PathBuf>,

    #[arg(long)]
    pub profile_path: Option<PathBuf>,

    #[arg(long)]
    pub ledger_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub keep_page_markers: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/naac")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub ledger_path: Option<PathBuf>,

    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}
