//! Activity classification types
//!
//! A resolved process or a browser domain maps to a human-facing category
//! label plus a coarse context type that carries a productivity weight.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CATEGORY, PRODUCTIVE_WEIGHT_THRESHOLD};
use crate::impl_domain_status_conversions;

/// Coarse classification of an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Development,
    Research,
    Documentation,
    Design,
    Communication,
    Meeting,
    Utilities,
    News,
    Shopping,
    SocialMedia,
    Entertainment,
    #[default]
    Other,
}

impl_domain_status_conversions!(ContextType {
    Development => "development",
    Research => "research",
    Documentation => "documentation",
    Design => "design",
    Communication => "communication",
    Meeting => "meeting",
    Utilities => "utilities",
    News => "news",
    Shopping => "shopping",
    SocialMedia => "social_media",
    Entertainment => "entertainment",
    Other => "other",
});

impl ContextType {
    /// Productivity weight in `[0, 1]`.
    pub fn productivity_weight(self) -> f64 {
        match self {
            Self::Development => 1.0,
            Self::Documentation | Self::Design => 0.9,
            Self::Research => 0.8,
            Self::Meeting => 0.7,
            Self::Communication => 0.6,
            Self::Utilities | Self::Other => 0.5,
            Self::News => 0.3,
            Self::Shopping | Self::SocialMedia => 0.1,
            Self::Entertainment => 0.0,
        }
    }

    /// Whether time in this context counts toward task completion.
    pub fn is_productive(self) -> bool {
        self.productivity_weight() >= PRODUCTIVE_WEIGHT_THRESHOLD
    }
}

/// Result of classifying a process or a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub context: ContextType,
    pub productivity_weight: f64,
}

impl Classification {
    pub fn new(category: impl Into<String>, context: ContextType) -> Self {
        Self { category: category.into(), context, productivity_weight: context.productivity_weight() }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY, ContextType::Other)
    }
}

/// One row of a classification table: lowercase substring → classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub pattern: String,
    pub category: String,
    pub context: ContextType,
}

impl CategoryRule {
    pub fn new(pattern: &str, category: &str, context: ContextType) -> Self {
        Self { pattern: pattern.to_lowercase(), category: category.to_string(), context }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_productive_contexts() {
        assert!(ContextType::Development.is_productive());
        assert!(ContextType::Meeting.is_productive());
        assert!(!ContextType::Communication.is_productive());
        assert!(!ContextType::Entertainment.is_productive());
    }

    #[test]
    fn test_context_labels() {
        assert_eq!(ContextType::SocialMedia.to_string(), "social_media");
        assert_eq!(ContextType::from_str("Research").unwrap(), ContextType::Research);
    }

    #[test]
    fn test_default_classification_is_other() {
        let classification = Classification::default();
        assert_eq!(classification.category, "Other");
        assert_eq!(classification.context, ContextType::Other);
        assert!((classification.productivity_weight - 0.5).abs() < f64::EPSILON);
    }
}
