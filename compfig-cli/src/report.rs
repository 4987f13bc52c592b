//! Terminal and JSON output for metric results.

use std::path::Path;

use compfig::flip::FlipOutput;
use compfig::metrics::{CandidateMetrics, Similarity};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MetricsRow {
    pub file: String,
    pub mse: f64,
    /// `None` for identical images (infinite PSNR has no JSON form).
    pub psnr: Option<f64>,
    pub ssim: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip: Option<FlipRow>,
}

#[derive(Debug, Serialize)]
pub struct FlipRow {
    pub image: String,
    pub mean: Option<f64>,
    pub weighted_median: Option<f64>,
    pub first_quartile: Option<f64>,
    pub third_quartile: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MetricsRow {
    pub fn new(path: &Path, s: &Similarity, flip: Option<&FlipOutput>) -> Self {
        Self {
            file: path.display().to_string(),
            mse: s.mse,
            psnr: s.psnr.is_finite().then_some(s.psnr),
            ssim: s.ssim,
            flip: flip.map(|f| FlipRow {
                image: f.image.display().to_string(),
                mean: f.stats.mean,
                weighted_median: f.stats.weighted_median,
                first_quartile: f.stats.first_quartile,
                third_quartile: f.stats.third_quartile,
                min: f.stats.min,
                max: f.stats.max,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricsReport<'a> {
    reference: String,
    candidates: &'a [MetricsRow],
}

pub fn to_json(reference: &Path, rows: &[MetricsRow], pretty: bool) -> serde_json::Result<String> {
    let report = MetricsReport {
        reference: reference.display().to_string(),
        candidates: rows,
    };
    if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
}

/// Print a table of metrics, one line per candidate.
pub fn print_terminal(rows: &[MetricsRow]) {
    println!(
        "{:<40} {:>10} {:>8} {:>8} {:>8}",
        "Candidate", "MSE", "PSNR", "SSIM", "FLIP"
    );
    println!("{}", "-".repeat(78));
    for r in rows {
        println!(
            "{:<40} {:>10.3} {:>8} {:>8.4} {:>8}",
            truncate(&r.file, 40),
            r.mse,
            r.psnr.map_or_else(|| "inf".to_string(), |p| format!("{p:.2}")),
            r.ssim,
            r.flip
                .as_ref()
                .and_then(|f| f.mean)
                .map_or_else(|| "-".to_string(), |m| format!("{m:.4}")),
        );
    }
}

/// Print the metrics computed while building a figure.
pub fn print_metrics(rows: &[(String, CandidateMetrics)]) {
    for (label, m) in rows {
        let s = &m.similarity;
        let flip = m
            .flip_mean
            .map_or_else(String::new, |v| format!("  FLIP {v:.4}"));
        println!(
            "  {:<20} MSE {:>10.3}  PSNR {:>7.2}  SSIM {:.4}{}",
            truncate(label, 20),
            s.mse,
            s.psnr,
            s.ssim,
            flip
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len - 1)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("…{tail}")
    }
}
