//! Report rendering and panel export.
//!
//! - **JSON**: the full `EstimateReport`, tagged with `schema_version`
//! - **Text**: a fixed-width summary for the terminal
//! - **CSV**: long-format `id,time,y,x` panels, as read back by `estimate`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ivxj_core::{
    DatasetHash, EstimationResult, Inference, Panel, PanelFrame, MIN_JACKKNIFE_LENGTH,
};

pub const SCHEMA_VERSION: u32 = 1;

/// Confidence level of the reported interval.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Shape of the panel that entered an estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSummary {
    pub units: usize,
    pub observations: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Units long enough to enter the jackknife.
    pub jackknife_units: usize,
}

impl PanelSummary {
    pub fn of(panel: &Panel) -> Self {
        let lengths = panel.lengths();
        Self {
            units: lengths.units(),
            observations: lengths.total(),
            min_length: lengths.iter().min().unwrap_or(0),
            max_length: lengths.iter().max().unwrap_or(0),
            jackknife_units: lengths.iter().filter(|&t| t > MIN_JACKKNIFE_LENGTH).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    pub schema_version: u32,
    pub input: String,
    pub dataset_hash: DatasetHash,
    pub rhoz: f64,
    pub panel: PanelSummary,
    pub result: EstimationResult,
    pub inference: Inference,
}

pub fn export_json(report: &EstimateReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize EstimateReport to JSON")
}

pub fn export_text(report: &EstimateReport) -> String {
    let r = &report.result;
    let inf = &report.inference;
    let p = &report.panel;
    let mut out = String::new();
    out.push_str("=== IVXJ Estimate ===\n");
    out.push_str(&format!("Input:          {}\n", report.input));
    out.push_str(&format!("Dataset:        {}\n", report.dataset_hash.short(16)));
    out.push_str(&format!(
        "Panel:          {} units, {} observations (T {}..{})\n",
        p.units, p.observations, p.min_length, p.max_length
    ));
    out.push_str(&format!(
        "Jackknife:      {} units with T > {}\n",
        p.jackknife_units, MIN_JACKKNIFE_LENGTH
    ));
    out.push_str(&format!("rhoz:           {}\n", report.rhoz));
    out.push('\n');
    out.push_str("--- Coefficients ---\n");
    out.push_str(&format!("rho_hat:        {:.6}\n", r.rho_hat));
    out.push_str(&format!("beta_hat:       {:.6}\n", r.beta_hat));
    out.push_str(&format!("beta_debiased:  {:.6}\n", r.beta_hat_debias));
    out.push_str(&format!("std. error:     {:.6}\n", r.se));
    out.push_str(&format!("t-statistic:    {:.3}\n", inf.t_stat));
    out.push_str(&format!("p-value:        {:.4}\n", inf.p_value));
    out.push_str(&format!(
        "{:.0}% CI:         [{:.6}, {:.6}]\n",
        inf.level * 100.0,
        inf.ci_lower,
        inf.ci_upper
    ));
    out
}

/// Long-format CSV of a panel; `ids` label the units in stacking order.
pub fn export_panel_csv(panel: &Panel, ids: &[String]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["id", "time", "y", "x"])?;

    let mut row = 0;
    for (unit, t) in panel.lengths().iter().enumerate() {
        let id = ids
            .get(unit)
            .with_context(|| format!("no identifier for unit {unit}"))?;
        for period in 0..t {
            wtr.write_record([
                id.as_str(),
                &(period + 1).to_string(),
                &panel.y()[row].to_string(),
                &panel.x()[row].to_string(),
            ])?;
            row += 1;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Zero-padded unit identifiers that sort in stacking order.
pub fn unit_labels(units: usize) -> Vec<String> {
    let width = units.to_string().len();
    (1..=units).map(|i| format!("u{i:0width$}")).collect()
}

/// Report for a loaded frame.
pub fn build_report(
    input: &str,
    frame: &PanelFrame,
    hash: DatasetHash,
    rhoz: f64,
    result: EstimationResult,
) -> Result<EstimateReport> {
    let inference = result
        .inference(CONFIDENCE_LEVEL)
        .context("failed to compute inference")?;
    Ok(EstimateReport {
        schema_version: SCHEMA_VERSION,
        input: input.to_string(),
        dataset_hash: hash,
        rhoz,
        panel: PanelSummary::of(frame.panel()),
        result,
        inference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivxj_core::PanelLengths;

    fn small_panel() -> Panel {
        Panel::new(
            vec![0.5, -1.25, 3.0],
            vec![1.0, 2.0, 0.1],
            PanelLengths::new(vec![2, 1]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn panel_csv_has_header_and_periods() {
        let csv = export_panel_csv(&small_panel(), &unit_labels(2)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,time,y,x");
        assert_eq!(lines[1], "u1,1,0.5,1");
        assert_eq!(lines[2], "u1,2,-1.25,2");
        assert_eq!(lines[3], "u2,1,3,0.1");
    }

    #[test]
    fn panel_csv_needs_an_id_per_unit() {
        assert!(export_panel_csv(&small_panel(), &unit_labels(1)).is_err());
    }

    #[test]
    fn labels_sort_in_unit_order() {
        let labels = unit_labels(120);
        assert_eq!(labels[0], "u001");
        assert_eq!(labels[119], "u120");
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(sorted, labels);
    }

    #[test]
    fn summary_counts_jackknife_units() {
        let lengths = PanelLengths::new(vec![25, 20, 21]).unwrap();
        let n = lengths.total();
        let panel = Panel::new(vec![0.0; n], vec![0.0; n], lengths).unwrap();
        let summary = PanelSummary::of(&panel);
        assert_eq!(summary.jackknife_units, 2);
        assert_eq!(summary.min_length, 20);
        assert_eq!(summary.max_length, 25);
    }

    #[test]
    fn json_roundtrip() {
        let result = EstimationResult {
            beta_hat: 0.6,
            beta_hat_debias: 0.55,
            se: 0.1,
            rho_hat: 0.9,
        };
        let report = EstimateReport {
            schema_version: SCHEMA_VERSION,
            input: "panel.csv".into(),
            dataset_hash: DatasetHash("ab".repeat(32)),
            rhoz: 0.95,
            panel: PanelSummary::of(&small_panel()),
            result,
            inference: result.inference(CONFIDENCE_LEVEL).unwrap(),
        };
        let json = export_json(&report).unwrap();
        let back: EstimateReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.dataset_hash, report.dataset_hash);
        assert_eq!(back.panel, report.panel);
        assert_eq!(back.result, report.result);

        let text = export_text(&report);
        assert!(text.contains("beta_debiased:  0.550000"));
        assert!(text.contains("95% CI"));
    }
}
