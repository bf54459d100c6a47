//! The three operating modes selected per invocation.

pub mod eco;
pub mod sport;
pub mod turbo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Eco,
    #[default]
    Sport,
    Turbo,
}

impl std::str::FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eco" => Ok(ProcessingMode::Eco),
            "sport" => Ok(ProcessingMode::Sport),
            "turbo" => Ok(ProcessingMode::Turbo),
            other => Err(format!("unknown mode {other:?}, expected eco|sport|turbo")),
        }
    }
}
