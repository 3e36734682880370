//! rfscene CLI library
//!
//! Request file loading, response writing and the human-readable summary
//! printed by `rfscene run --summary`.

use anyhow::{Context, Result};
use rfscene_core::{run_scenario, ScenarioRequest, ScenarioResponse};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Overrides applied on top of the request file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    pub frames: Option<u32>,
    pub seed: Option<u64>,
}

pub fn load_request(path: &Path) -> Result<ScenarioRequest> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    let request: ScenarioRequest = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse scenario request: {}", path.display()))?;
    Ok(request)
}

pub fn run_request(mut request: ScenarioRequest, overrides: RunOverrides) -> Result<ScenarioResponse> {
    if let Some(frames) = overrides.frames {
        request.num_frames = Some(frames);
    }
    if let Some(seed) = overrides.seed {
        request.seed = Some(seed);
    }
    run_scenario(request).context("Scenario run failed")
}

pub fn write_response(path: &Path, response: &ScenarioResponse) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    let json = serde_json::to_string_pretty(response)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write output file: {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransmitterSummary {
    pub id: String,
    pub scheme: String,
    pub carrier_frequency: f64,
    pub bandwidth: f64,
    pub transmit_power: f64,
    pub pattern: String,
    pub active_frames: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScenarioSummary {
    pub seed: u64,
    pub frames: usize,
    pub receivers: usize,
    pub transmitters: Vec<TransmitterSummary>,
    pub degraded: bool,
    pub issues: Vec<String>,
}

pub fn summarize(response: &ScenarioResponse) -> ScenarioSummary {
    let Some(first) = response.frames.first() else {
        return ScenarioSummary {
            seed: response.seed,
            frames: 0,
            receivers: 0,
            transmitters: Vec::new(),
            degraded: response.degraded,
            issues: Vec::new(),
        };
    };

    let transmitters = first
        .tx_configs
        .iter()
        .map(|tx| TransmitterSummary {
            id: tx.id.clone(),
            scheme: tx.modulation_config.scheme.to_string(),
            carrier_frequency: tx.carrier_frequency,
            bandwidth: tx.bandwidth,
            transmit_power: tx.transmit_power,
            pattern: tx.transmission_state.pattern.type_name().to_string(),
            active_frames: response
                .frames
                .iter()
                .filter(|frame| frame.tx(&tx.id).is_some_and(|t| t.transmission_state.active))
                .count(),
        })
        .collect();

    ScenarioSummary {
        seed: response.seed,
        frames: response.frames.len(),
        receivers: first.rx_configs.len(),
        transmitters,
        degraded: response.degraded,
        issues: first
            .layout
            .issues
            .iter()
            .map(|issue| format!("{:?} [{}]: {}", issue.kind, issue.tx_ids.join(", "), issue.detail))
            .collect(),
    }
}

impl fmt::Display for ScenarioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario seed {} | {} frames | {} receivers", self.seed, self.frames, self.receivers)?;
        for tx in &self.transmitters {
            writeln!(
                f,
                "  {:<12} {:>8}  fc {:>12.1} Hz  bw {:>10.1} Hz  {:>6.1} dBm  {:<9} active {}/{}",
                tx.id,
                tx.scheme,
                tx.carrier_frequency,
                tx.bandwidth,
                tx.transmit_power,
                tx.pattern,
                tx.active_frames,
                self.frames
            )?;
        }
        if self.degraded {
            writeln!(f, "Allocation issues:")?;
            for issue in &self.issues {
                writeln!(f, "  - {issue}")?;
            }
        }
        Ok(())
    }
}
