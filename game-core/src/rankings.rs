use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::ScoringEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub icon: &'static str,
    pub display_name: &'static str,
}

pub const CATEGORIES: [Category; 8] = [
    Category {
        name: "tornados",
        icon: "🌪️",
        display_name: "Tornados (Yearly Avg)",
    },
    Category {
        name: "rainfall",
        icon: "🌧️",
        display_name: "Rainfall (Yearly Avg)",
    },
    Category {
        name: "highestTemp",
        icon: "🔥",
        display_name: "Highest Temp (Historic)",
    },
    Category {
        name: "lowestTemp",
        icon: "❄️",
        display_name: "Lowest Temp (Historic)",
    },
    Category {
        name: "sunshine",
        icon: "☀️",
        display_name: "Sunshine (Yearly Avg)",
    },
    Category {
        name: "wind",
        icon: "💨",
        display_name: "Wind (Yearly Avg)",
    },
    Category {
        name: "snowfall",
        icon: "🌨️",
        display_name: "Snowfall (Yearly Avg)",
    },
    Category {
        name: "lightning",
        icon: "⚡",
        display_name: "Lightning (Yearly Avg)",
    },
];

pub fn find_category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.name == name)
}

#[derive(Debug, Deserialize)]
struct RankingFile {
    states: BTreeMap<String, String>,
    rankings: HashMap<String, HashMap<String, u32>>,
}

/// Per-category national rankings for every playable state.
#[derive(Debug, Clone)]
pub struct RankingTable {
    flags: BTreeMap<String, String>,
    rankings: HashMap<String, HashMap<String, u32>>,
}

impl RankingTable {
    /// Parse a rankings document of the form
    /// `{"states": {name: flag}, "rankings": {category: {name: rank}}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: RankingFile =
            serde_json::from_str(json).context("Failed to parse rankings document")?;

        for category in file.rankings.keys() {
            if find_category(category).is_none() {
                return Err(anyhow!("Unknown category in rankings: {}", category));
            }
        }

        for category in &CATEGORIES {
            let ranked = file.rankings.get(category.name);
            let missing = file
                .states
                .keys()
                .filter(|state| ranked.is_none_or(|r| !r.contains_key(*state)))
                .count();
            if missing > 0 {
                tracing::warn!(
                    "{} states have no {} ranking; selecting it for them will be refused",
                    missing,
                    category.name
                );
            }
        }

        Ok(Self {
            flags: file.states,
            rankings: file.rankings,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rankings file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// State names in a stable (alphabetical) order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    pub fn state_count(&self) -> usize {
        self.flags.len()
    }

    pub fn flag(&self, state: &str) -> Option<&str> {
        self.flags.get(state).map(String::as_str)
    }

    pub fn ranking(&self, category: &str, state: &str) -> Option<u32> {
        self.rankings.get(category)?.get(state).copied()
    }

    pub fn category_score(&self, category: &str, state: &str) -> Option<u32> {
        self.ranking(category, state)
            .map(ScoringEngine::category_score)
    }
}
