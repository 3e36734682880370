use serde::{Deserialize, Serialize};

use crate::config::{FactoryConfig, ScenarioConfig};
use crate::engine::ScenarioOrchestrator;
use crate::error::{Result, ScenarioError};
use crate::models::{EnvironmentEntity, FrameOutput};
use tracing::{error, info};

/// Request/response schema version understood by this build.
pub const SCHEMA_VERSION: u8 = 1;

fn default_schema_version() -> u8 {
    SCHEMA_VERSION
}

/// One scenario to run: configuration, factory catalog, the environment's
/// entities and how many frames to produce.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScenarioRequest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
    /// Overrides `Config.Seed` when present.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub config: ScenarioConfig,
    #[serde(default)]
    pub factory: FactoryConfig,
    pub entities: Vec<EnvironmentEntity>,
    /// Overrides `Config.NumFramesPerScenario` when present.
    #[serde(default)]
    pub num_frames: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ScenarioResponse {
    pub schema_version: u8,
    pub seed: u64,
    /// Frames 1..=N in order.
    pub frames: Vec<FrameOutput>,
    /// Whether the layout carries any allocation issue.
    pub degraded: bool,
}

/// Runs a whole scenario. Frame ids start at 1.
pub fn run_scenario(request: ScenarioRequest) -> Result<ScenarioResponse> {
    if request.schema_version != SCHEMA_VERSION {
        return Err(ScenarioError::UnsupportedSchema {
            found: request.schema_version,
            expected: SCHEMA_VERSION,
        });
    }

    let ScenarioRequest { seed, mut config, factory, entities, num_frames, .. } = request;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    let num_frames = num_frames.unwrap_or(config.num_frames_per_scenario);
    let seed = config.seed;

    let mut orchestrator = ScenarioOrchestrator::new(config)?;
    let mut frames = Vec::new();
    for frame_id in 1..=num_frames {
        frames.push(orchestrator.step(frame_id, &entities, &factory)?);
    }
    let degraded = orchestrator.layout().is_some_and(|layout| layout.is_degraded());

    info!(seed, frames = frames.len(), degraded, "scenario run complete");
    Ok(ScenarioResponse { schema_version: SCHEMA_VERSION, seed, frames, degraded })
}

/// JSON in, JSON out. Errors come back as `Err(message)`.
pub fn run_scenario_json(request_json: &str) -> std::result::Result<String, String> {
    let outcome = serde_json::from_str::<ScenarioRequest>(request_json)
        .map_err(ScenarioError::from)
        .and_then(run_scenario)
        .and_then(|response| serde_json::to_string(&response).map_err(ScenarioError::from));
    outcome.map_err(|err| {
        error!(%err, "scenario request failed");
        err.to_string()
    })
}

/// JSON schema of [`ScenarioConfig`].
pub fn config_schema_json() -> Result<String> {
    let schema = schemars::schema_for!(ScenarioConfig);
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "SchemaVersion": 1,
        "Seed": 42,
        "Config": {
            "FrequencyAllocation": { "MinSeparation": 50000 },
            "TransmissionPattern": { "DefaultType": "Burst" }
        },
        "Entities": [
            { "Id": "tx-a", "Type": "Transmitter", "Site": { "Position": [10, 0, 0] } },
            { "Id": "tx-b", "Type": "Tx", "Site": { "Position": [0, 25, 0], "NumAntennas": 2 } },
            { "Id": "tree", "Type": "Vegetation" },
            { "Id": "rx-1", "Type": "Receiver", "SampleRate": 5e6 }
        ],
        "NumFrames": 6
    }"#;

    #[test]
    fn test_request_produces_frames() {
        let response: ScenarioResponse =
            serde_json::from_str(&run_scenario_json(REQUEST).unwrap()).unwrap();
        assert_eq!(response.schema_version, SCHEMA_VERSION);
        assert_eq!(response.seed, 42);
        assert_eq!(response.frames.len(), 6);
        let first = &response.frames[0];
        assert_eq!(first.frame_id, 1);
        assert_eq!(first.tx_configs.len(), 2);
        assert_eq!(first.rx_configs[0].sample_rate, 5e6);
        for tx in &first.tx_configs {
            assert_eq!(tx.transmission_state.pattern.type_name(), "Burst");
            assert!(first.rx_configs[0].observable_range.contains_band(
                tx.carrier_frequency,
                tx.bandwidth,
                1e-6
            ));
        }
    }

    #[test]
    fn test_json_is_deterministic() {
        assert_eq!(run_scenario_json(REQUEST).unwrap(), run_scenario_json(REQUEST).unwrap());
    }

    #[test]
    fn test_schema_version_is_checked() {
        let request = REQUEST.replace("\"SchemaVersion\": 1", "\"SchemaVersion\": 9");
        let err = run_scenario_json(&request).unwrap_err();
        assert!(err.contains("Unsupported schema version"), "{err}");
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let request = REQUEST.replace("\"MinSeparation\": 50000", "\"MinSeparation\": -1");
        let err = run_scenario_json(&request).unwrap_err();
        assert!(err.contains("FrequencyAllocation.MinSeparation"), "{err}");
    }

    #[test]
    fn test_huge_frame_count_fails_on_first_frame_error() {
        use crate::config::ModulationStrategy;
        use crate::models::{ModulationFamily, SchemeId, Site};

        let mut config = ScenarioConfig::default();
        config.modulation_selection.strategy = ModulationStrategy::Fixed;
        config.modulation_selection.fixed_scheme = Some(SchemeId::new(ModulationFamily::Psk, 3));
        let request = ScenarioRequest {
            schema_version: SCHEMA_VERSION,
            seed: None,
            config,
            factory: FactoryConfig::default(),
            entities: vec![EnvironmentEntity::transmitter("tx", Site::at(0.0, 0.0, 0.0))],
            num_frames: Some(u32::MAX),
        };
        let err = run_scenario(request).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_schema_names_sections() {
        let schema = config_schema_json().unwrap();
        assert!(schema.contains("FrequencyAllocation"));
        assert!(schema.contains("PowerControl"));
    }
}
