// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quire_core::{
    ExportSpec, ImageFormat, LayoutMode, PageNumbering, PaperSize, QuireConfig, VerticalAlign,
};

#[derive(Parser, Debug)]
#[command(name = "quire", version, about = "Render, adjust, and impose PDF pages for booklet printing")]
pub struct Cli {
    /// JSON configuration file. Missing files fall back to defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print page count and page sizes of a PDF as JSON.
    Info { input: PathBuf },
    /// Print the sheet plan for a page count as JSON.
    Plan(PlanArgs),
    /// Suggest filter settings for an image, as JSON.
    AutoEnhance { input: PathBuf },
    /// Render a PDF through the page pipeline into a new PDF.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Sequential,
    CutAndStack,
}

impl From<ModeArg> for LayoutMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => LayoutMode::Sequential,
            ModeArg::CutAndStack => LayoutMode::CutAndStack,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlignArg {
    Top,
    Center,
}

impl From<AlignArg> for VerticalAlign {
    fn from(align: AlignArg) -> Self {
        match align {
            AlignArg::Top => VerticalAlign::Top,
            AlignArg::Center => VerticalAlign::Center,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Number of pages in the document.
    #[arg(long)]
    pub pages: usize,
    #[arg(long, value_enum, default_value_t = ModeArg::CutAndStack)]
    pub mode: ModeArg,
    /// First page (1-based) to include.
    #[arg(long, default_value_t = 1)]
    pub start_page: usize,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    pub input: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
    /// Base resolution. Defaults to the configured export DPI.
    #[arg(long)]
    pub dpi: Option<u32>,
    /// Target paper (a3, a4, a5, letter, legal, tabloid). 2-up and padding
    /// fall back to the configured paper when omitted.
    #[arg(long, value_parser = parse_paper)]
    pub paper: Option<PaperSize>,
    /// Impose two pages per landscape sheet side.
    #[arg(long)]
    pub two_up: bool,
    #[arg(long, value_enum, default_value_t = ModeArg::CutAndStack)]
    pub mode: ModeArg,
    #[arg(long, value_enum, default_value_t = AlignArg::Top)]
    pub align: AlignArg,
    #[arg(long, default_value_t = 1)]
    pub start_page: usize,
    /// Pad every page with white to exactly the paper size.
    #[arg(long)]
    pub pad: bool,
    /// Page number treated as the first recto when padding.
    #[arg(long, default_value_t = 1)]
    pub first_odd_page: usize,
    /// Stamp page numbers in the bottom-right corner.
    #[arg(long)]
    pub page_numbers: bool,
    /// Label template; `{n}` is the page number, `{total}` the page count.
    #[arg(long, default_value = "Page {n}")]
    pub page_number_format: String,
    #[arg(long, default_value_t = 11)]
    pub page_number_size: u32,
    #[arg(long, default_value_t = 30)]
    pub page_number_margin: u32,
    /// Output image encoding inside the PDF (jpeg, png, webp).
    #[arg(long, value_parser = parse_format, default_value = "jpeg")]
    pub format: ImageFormat,
    #[arg(long, default_value_t = 95)]
    pub quality: u8,
    /// JSON object mapping 0-based page indices to filter settings.
    #[arg(long)]
    pub filters: Option<PathBuf>,
}

impl ExportArgs {
    /// The export described by these flags. Not validated here; the
    /// orchestrator rejects bad combinations before rendering.
    pub fn to_spec(&self, config: &QuireConfig) -> ExportSpec {
        let needs_paper = self.two_up || self.pad;
        let target_page_size = self
            .paper
            .or_else(|| needs_paper.then_some(config.default_paper_size));
        ExportSpec {
            dpi: self.dpi.unwrap_or(config.default_export_dpi),
            image_format: self.format,
            quality: self.quality,
            target_page_size,
            pad_to_exact_size: self.pad,
            first_odd_page: self.first_odd_page,
            two_up: self.two_up,
            layout_mode: self.mode.into(),
            vertical_align: self.align.into(),
            start_page: self.start_page,
            page_numbers: self.page_numbers.then(|| PageNumbering {
                format: self.page_number_format.clone(),
                size_pt: self.page_number_size,
                margin: self.page_number_margin,
            }),
        }
    }
}

fn parse_paper(name: &str) -> Result<PaperSize, String> {
    PaperSize::from_name(name).ok_or_else(|| format!("unknown paper size '{name}'"))
}

fn parse_format(name: &str) -> Result<ImageFormat, String> {
    ImageFormat::from_name(name).ok_or_else(|| format!("unknown image format '{name}'"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn export_args(args: &[&str]) -> ExportArgs {
        let mut argv = vec!["quire", "export", "in.pdf", "-o", "out.pdf"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Export(args) => args,
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_come_from_config() {
        let config = QuireConfig {
            default_export_dpi: 150,
            ..QuireConfig::default()
        };
        let spec = export_args(&[]).to_spec(&config);
        assert_eq!(spec.dpi, 150);
        assert_eq!(spec.target_page_size, None);
        assert_eq!(spec.image_format, ImageFormat::Jpeg);
        assert!(spec.page_numbers.is_none());
        spec.validate().unwrap();
    }

    #[test]
    fn two_up_falls_back_to_configured_paper() {
        let config = QuireConfig {
            default_paper_size: PaperSize::A4,
            ..QuireConfig::default()
        };
        let spec = export_args(&["--two-up", "--align", "center"]).to_spec(&config);
        assert_eq!(spec.target_page_size, Some(PaperSize::A4));
        assert_eq!(spec.layout_mode, LayoutMode::CutAndStack);
        assert_eq!(spec.vertical_align, VerticalAlign::Center);
        spec.validate().unwrap();
    }

    #[test]
    fn explicit_flags_map_onto_the_spec() {
        let spec = export_args(&[
            "--paper",
            "letter",
            "--mode",
            "sequential",
            "--dpi",
            "200",
            "--format",
            "png",
            "--page-numbers",
            "--page-number-format",
            "{n} of {total}",
            "--start-page",
            "3",
        ])
        .to_spec(&QuireConfig::default());
        assert_eq!(spec.target_page_size, Some(PaperSize::Letter));
        assert_eq!(spec.layout_mode, LayoutMode::Sequential);
        assert_eq!(spec.dpi, 200);
        assert_eq!(spec.image_format, ImageFormat::Png);
        assert_eq!(spec.start_page, 3);
        assert_eq!(spec.page_numbers.unwrap().format, "{n} of {total}");
    }

    #[test]
    fn unknown_paper_is_a_parse_error() {
        let result = Cli::try_parse_from(["quire", "export", "a.pdf", "-o", "b.pdf", "--paper", "b9"]);
        assert!(result.is_err());
    }

    #[test]
    fn plan_defaults_to_cut_and_stack() {
        let cli = Cli::try_parse_from(["quire", "plan", "--pages", "8"]).unwrap();
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.pages, 8);
                assert_eq!(args.mode, ModeArg::CutAndStack);
                assert_eq!(args.start_page, 1);
            }
            other => panic!("parsed {other:?}"),
        }
    }
}
