//! Per-conversation mission settings shared with every tool call

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MISSION_ID: &str = "MISSION_001";
pub const DEFAULT_CLEARANCE: u8 = 5;
pub const MAX_CLEARANCE: u8 = 10;

/// Fixed instructions for the mission assistant
pub const FRIDAY_INSTRUCTIONS: &str = "You are FRIDAY, the advanced AI assistant for the Avengers. \
You help with mission planning by analyzing intelligence reports and superhero capabilities. \
Use your tools to:
1. Retrieve mission intel and threat data from classified documents
2. Look up superhero team member capabilities and availability
3. Provide strategic recommendations for team composition and tactics

Always be tactical, professional, and consider both the mission requirements and hero safety.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionContext {
    pub mission_id: String,
    /// 1 through 10
    pub clearance_level: u8,
}

impl MissionContext {
    pub fn new(mission_id: impl Into<String>, clearance_level: u8) -> Result<Self> {
        if !(1..=MAX_CLEARANCE).contains(&clearance_level) {
            return Err(Error::InvalidInput(format!(
                "Clearance level must be between 1 and {}, got {}",
                MAX_CLEARANCE, clearance_level
            )));
        }
        Ok(Self {
            mission_id: mission_id.into(),
            clearance_level,
        })
    }

    pub fn mission_line(&self) -> String {
        format!(
            "Current mission: {} | Clearance Level: {}/{}",
            self.mission_id, self.clearance_level, MAX_CLEARANCE
        )
    }

    /// Instructions followed by the mission line
    pub fn system_prompt(&self) -> String {
        format!("{}\n\n{}", FRIDAY_INSTRUCTIONS, self.mission_line())
    }
}

impl Default for MissionContext {
    fn default() -> Self {
        Self {
            mission_id: DEFAULT_MISSION_ID.to_string(),
            clearance_level: DEFAULT_CLEARANCE,
        }
    }
}
