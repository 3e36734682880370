pub mod json_api;

pub use json_api::{
    config_schema_json, run_scenario, run_scenario_json, ScenarioRequest, ScenarioResponse,
    SCHEMA_VERSION,
};
