//! In-memory hero roster used by the mission tools

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Operational status of a hero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroStatus {
    Active,
    Injured,
    Unavailable,
    OnMission,
}

impl HeroStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Injured => "injured",
            Self::Unavailable => "unavailable",
            Self::OnMission => "on_mission",
        }
    }
}

impl fmt::Display for HeroStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superhero {
    pub id: u32,
    pub name: String,
    /// Power levels from 0 to 100
    pub powers: BTreeMap<String, u8>,
    pub status: HeroStatus,
    pub location: String,
    pub specialties: Vec<String>,
}

/// What the tools hand back about a hero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperheroInfo {
    pub name: String,
    pub powers: BTreeMap<String, u8>,
    pub status: HeroStatus,
    pub location: String,
    pub specialties: Vec<String>,
}

impl From<&Superhero> for SuperheroInfo {
    fn from(hero: &Superhero) -> Self {
        Self {
            name: hero.name.clone(),
            powers: hero.powers.clone(),
            status: hero.status,
            location: hero.location.clone(),
            specialties: hero.specialties.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeroDirectory {
    heroes: BTreeMap<u32, Superhero>,
}

impl HeroDirectory {
    pub fn new(heroes: impl IntoIterator<Item = Superhero>) -> Self {
        Self {
            heroes: heroes.into_iter().map(|h| (h.id, h)).collect(),
        }
    }

    /// The five-hero Avengers roster
    pub fn avengers() -> Self {
        Self::new([
            hero(
                1,
                "Iron Man",
                &[("intelligence", 100), ("technology", 95), ("flight", 90), ("energy_projection", 85)],
                HeroStatus::Active,
                "New York",
                &["technology", "aerial_combat", "strategy"],
            ),
            hero(
                2,
                "Captain America",
                &[("strength", 90), ("leadership", 100), ("shield_mastery", 95), ("tactical_analysis", 88)],
                HeroStatus::Active,
                "Washington DC",
                &["leadership", "ground_combat", "infiltration"],
            ),
            hero(
                3,
                "Thor",
                &[("strength", 98), ("lightning", 100), ("flight", 85), ("durability", 95)],
                HeroStatus::OnMission,
                "Asgard",
                &["heavy_combat", "weather_control", "divine_magic"],
            ),
            hero(
                4,
                "Black Widow",
                &[("agility", 88), ("stealth", 95), ("combat_skills", 90), ("intelligence", 85)],
                HeroStatus::Active,
                "Europe",
                &["espionage", "infiltration", "assassination", "stealth"],
            ),
            hero(
                5,
                "Hulk",
                &[("strength", 100), ("durability", 98), ("rage_power", 100), ("healing", 85)],
                HeroStatus::Injured,
                "Somewhere in hiding",
                &["heavy_combat", "destruction", "intimidation", "containment"],
            ),
        ])
    }

    pub fn get(&self, id: u32) -> Option<&Superhero> {
        self.heroes.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Superhero> {
        self.heroes.values()
    }

    /// Heroes whose status is active
    pub fn available(&self) -> Vec<&Superhero> {
        self.heroes
            .values()
            .filter(|h| h.status == HeroStatus::Active)
            .collect()
    }

    /// Heroes listing `specialty`, compared case-insensitively
    pub fn by_specialty(&self, specialty: &str) -> Vec<&Superhero> {
        let wanted = specialty.to_lowercase();
        self.heroes
            .values()
            .filter(|h| h.specialties.iter().any(|s| s.to_lowercase() == wanted))
            .collect()
    }
}

impl Default for HeroDirectory {
    fn default() -> Self {
        Self::avengers()
    }
}

fn hero(
    id: u32,
    name: &str,
    powers: &[(&str, u8)],
    status: HeroStatus,
    location: &str,
    specialties: &[&str],
) -> Superhero {
    Superhero {
        id,
        name: name.to_string(),
        powers: powers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        status,
        location: location.to_string(),
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(heroes: &[&Superhero]) -> Vec<String> {
        heroes.iter().map(|h| h.name.clone()).collect()
    }

    #[test]
    fn test_roster() {
        let dir = HeroDirectory::avengers();
        assert_eq!(dir.all().count(), 5);
        assert_eq!(dir.get(3).unwrap().name, "Thor");
        assert_eq!(dir.get(1).unwrap().powers["technology"], 95);
        assert!(dir.get(6).is_none());
    }

    #[test]
    fn test_available_only_active() {
        let dir = HeroDirectory::avengers();
        assert_eq!(
            names(&dir.available()),
            vec!["Iron Man", "Captain America", "Black Widow"]
        );
    }

    #[test]
    fn test_by_specialty_is_case_insensitive() {
        let dir = HeroDirectory::avengers();
        assert_eq!(
            names(&dir.by_specialty("INFILTRATION")),
            vec!["Captain America", "Black Widow"]
        );
        assert_eq!(names(&dir.by_specialty("heavy_combat")), vec!["Thor", "Hulk"]);
        assert!(dir.by_specialty("time_travel").is_empty());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&HeroStatus::OnMission).unwrap();
        assert_eq!(json, "\"on_mission\"");
        assert_eq!(HeroStatus::OnMission.to_string(), "on_mission");
    }
}
