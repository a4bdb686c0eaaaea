//! Brand profile domain type
//!
//! The profile is the single record describing who the creator is and how
//! often they post. It is created by onboarding, replaced wholesale by
//! settings, and only ever removed by a full reset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use super::week::{DAYS_PER_WEEK, weekday_name};

/// Whether the brand is a person or an organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BrandType {
    #[default]
    Personal,
    Company,
}

impl std::fmt::Display for BrandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal => write!(f, "Personal"),
            Self::Company => write!(f, "Company"),
        }
    }
}

impl FromStr for BrandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "company" => Ok(Self::Company),
            other => Err(format!("Unknown brand type '{}'. Expected: personal, company", other)),
        }
    }
}

/// Publishing platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Platform {
    #[default]
    YouTube,
    Instagram,
}

impl Platform {
    /// Script structure the assistant should use for this platform
    pub fn script_format(&self) -> &'static str {
        match self {
            Self::YouTube => "Hook, Intro, Value Props, CTA",
            Self::Instagram => "Visual Hook, Audio cue, Caption",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YouTube => write!(f, "YouTube"),
            Self::Instagram => write!(f, "Instagram"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" | "yt" => Ok(Self::YouTube),
            "instagram" | "ig" => Ok(Self::Instagram),
            other => Err(format!("Unknown platform '{}'. Expected: youtube, instagram", other)),
        }
    }
}

/// A named recurring content format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPillar {
    pub name: String,

    /// Optional execution-style note (empty when not given)
    #[serde(default)]
    pub description: String,
}

impl ContentPillar {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl FromStr for ContentPillar {
    type Err = String;

    /// Parse `Name` or `Name:description`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, description) = match s.split_once(':') {
            Some((name, description)) => (name.trim(), description.trim()),
            None => (s.trim(), ""),
        };
        if name.is_empty() {
            return Err("Pillar name must not be empty".to_string());
        }
        Ok(Self::new(name, description))
    }
}

/// A single onboarding requirement that the profile does not meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileIssue {
    MissingName,
    MissingPersona,
    MissingVisualStyle,
    NoPostingDays,
    NoPillars,
}

impl std::fmt::Display for ProfileIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "name is empty"),
            Self::MissingPersona => write!(f, "persona is empty"),
            Self::MissingVisualStyle => write!(f, "visual style is empty"),
            Self::NoPostingDays => write!(f, "no posting days selected"),
            Self::NoPillars => write!(f, "no content pillars defined"),
        }
    }
}

/// Profile validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Profile incomplete: {}", join_issues(.issues))]
    Incomplete { issues: Vec<ProfileIssue> },

    #[error("Invalid weekday index {0} (expected 0=Sunday..6=Saturday)")]
    InvalidWeekday(u8),
}

fn join_issues(issues: &[ProfileIssue]) -> String {
    issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

/// The creator's brand profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub brand_type: BrandType,
    pub platform: Platform,

    /// Active weekday indices, unique and sorted (0 = Sunday)
    pub posting_days: Vec<u8>,

    /// Ordered pillar list; names are unique
    pub content_pillars: Vec<ContentPillar>,

    /// Voice and personality
    pub persona: String,

    /// Colour grading, editing style, aesthetic
    pub visual_style: String,

    /// Free-text context: ongoing series, sponsors, life updates
    #[serde(default)]
    pub additional_info: String,

    #[serde(default)]
    pub is_onboarded: bool,
}

impl Profile {
    /// Create an empty, not-yet-onboarded profile
    pub fn new(name: impl Into<String>, brand_type: BrandType, platform: Platform) -> Self {
        Self {
            name: name.into(),
            brand_type,
            platform,
            posting_days: Vec::new(),
            content_pillars: Vec::new(),
            persona: String::new(),
            visual_style: String::new(),
            additional_info: String::new(),
            is_onboarded: false,
        }
    }

    /// Replace the posting days, deduplicating and sorting them
    pub fn set_posting_days(&mut self, days: impl IntoIterator<Item = u8>) -> Result<(), ProfileError> {
        let mut set = BTreeSet::new();
        for day in days {
            if day as usize >= DAYS_PER_WEEK {
                debug!(day, "set_posting_days: out of range");
                return Err(ProfileError::InvalidWeekday(day));
            }
            set.insert(day);
        }
        self.posting_days = set.into_iter().collect();
        Ok(())
    }

    /// Whether the given weekday index is an active posting day
    pub fn posts_on(&self, weekday: u8) -> bool {
        self.posting_days.contains(&weekday)
    }

    /// Names of the active weekdays, in week order
    pub fn active_weekday_names(&self) -> Vec<&'static str> {
        let set: BTreeSet<u8> = self.posting_days.iter().copied().collect();
        set.into_iter().filter_map(weekday_name).collect()
    }

    /// Add a pillar; duplicates (exact, case-sensitive) and blank names are ignored
    ///
    /// Returns `true` when the pillar was inserted.
    pub fn add_pillar(&mut self, name: impl Into<String>, description: impl Into<String>) -> bool {
        let name = name.into().trim().to_string();
        if name.is_empty() || self.pillar(&name).is_some() {
            debug!(%name, "add_pillar: rejected");
            return false;
        }
        self.content_pillars.push(ContentPillar::new(name, description.into().trim()));
        true
    }

    /// Replace the pillar at `index`; rejected if the new name is blank or used by another pillar
    pub fn edit_pillar(&mut self, index: usize, name: impl Into<String>, description: impl Into<String>) -> bool {
        let name = name.into().trim().to_string();
        if index >= self.content_pillars.len() || name.is_empty() {
            return false;
        }
        let clash = self
            .content_pillars
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.name == name);
        if clash {
            debug!(%name, index, "edit_pillar: name already used");
            return false;
        }
        self.content_pillars[index] = ContentPillar::new(name, description.into().trim());
        true
    }

    /// Remove a pillar by exact name
    pub fn remove_pillar(&mut self, name: &str) -> bool {
        let before = self.content_pillars.len();
        self.content_pillars.retain(|p| p.name != name);
        self.content_pillars.len() != before
    }

    /// Look up a pillar by exact name
    pub fn pillar(&self, name: &str) -> Option<&ContentPillar> {
        self.content_pillars.iter().find(|p| p.name == name)
    }

    /// Check every onboarding requirement
    pub fn validate(&self) -> Result<(), ProfileError> {
        if let Some(day) = self.posting_days.iter().find(|d| **d as usize >= DAYS_PER_WEEK) {
            return Err(ProfileError::InvalidWeekday(*day));
        }

        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ProfileIssue::MissingName);
        }
        if self.persona.trim().is_empty() {
            issues.push(ProfileIssue::MissingPersona);
        }
        if self.visual_style.trim().is_empty() {
            issues.push(ProfileIssue::MissingVisualStyle);
        }
        if self.posting_days.is_empty() {
            issues.push(ProfileIssue::NoPostingDays);
        }
        if self.content_pillars.is_empty() {
            issues.push(ProfileIssue::NoPillars);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ProfileError::Incomplete { issues })
        }
    }

    /// Mark onboarding complete once the profile is valid
    pub fn complete_onboarding(&mut self) -> Result<(), ProfileError> {
        self.validate()?;
        self.is_onboarded = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> Profile {
        let mut profile = Profile::new("Ada Creates", BrandType::Personal, Platform::YouTube);
        profile.set_posting_days([5, 1, 3, 1]).unwrap();
        profile.add_pillar("Tutorials", "step-by-step");
        profile.persona = "Calm, nerdy teacher".to_string();
        profile.visual_style = "Warm tones, jump cuts".to_string();
        profile
    }

    #[test]
    fn test_posting_days_sorted_and_unique() {
        let profile = complete_profile();
        assert_eq!(profile.posting_days, vec![1, 3, 5]);
        assert_eq!(profile.active_weekday_names(), vec!["Monday", "Wednesday", "Friday"]);
        assert!(profile.posts_on(3));
        assert!(!profile.posts_on(0));
    }

    #[test]
    fn test_posting_day_out_of_range() {
        let mut profile = complete_profile();
        assert_eq!(profile.set_posting_days([2, 7]), Err(ProfileError::InvalidWeekday(7)));
        // Unchanged on error
        assert_eq!(profile.posting_days, vec![1, 3, 5]);
    }

    #[test]
    fn test_duplicate_pillar_silently_rejected() {
        let mut profile = complete_profile();
        assert!(!profile.add_pillar("Tutorials", "other"));
        assert!(profile.add_pillar("tutorials", "case differs"));
        assert!(!profile.add_pillar("  ", "blank"));
        assert_eq!(profile.content_pillars.len(), 2);
        assert_eq!(profile.pillar("Tutorials").unwrap().description, "step-by-step");
    }

    #[test]
    fn test_edit_and_remove_pillar() {
        let mut profile = complete_profile();
        profile.add_pillar("Vlogs", "");

        assert!(!profile.edit_pillar(1, "Tutorials", "clash"));
        assert!(profile.edit_pillar(1, "Day in the Life", "handheld"));
        assert_eq!(profile.content_pillars[1].name, "Day in the Life");
        assert!(!profile.edit_pillar(9, "Nope", ""));

        assert!(profile.remove_pillar("Tutorials"));
        assert!(!profile.remove_pillar("Tutorials"));
        assert_eq!(profile.content_pillars.len(), 1);
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let profile = Profile::new("", BrandType::Company, Platform::Instagram);
        let err = profile.validate().unwrap_err();
        assert_eq!(
            err,
            ProfileError::Incomplete {
                issues: vec![
                    ProfileIssue::MissingName,
                    ProfileIssue::MissingPersona,
                    ProfileIssue::MissingVisualStyle,
                    ProfileIssue::NoPostingDays,
                    ProfileIssue::NoPillars,
                ]
            }
        );
        assert!(err.to_string().contains("no content pillars defined"));
    }

    #[test]
    fn test_complete_onboarding() {
        let mut incomplete = Profile::new("Ada", BrandType::Personal, Platform::YouTube);
        assert!(incomplete.complete_onboarding().is_err());
        assert!(!incomplete.is_onboarded);

        let mut profile = complete_profile();
        profile.complete_onboarding().unwrap();
        assert!(profile.is_onboarded);
    }

    #[test]
    fn test_serializes_with_camel_case_keys() {
        let profile = complete_profile();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["brandType"], "Personal");
        assert_eq!(json["platform"], "YouTube");
        assert_eq!(json["postingDays"], serde_json::json!([1, 3, 5]));
        assert_eq!(json["contentPillars"][0]["name"], "Tutorials");
        assert_eq!(json["visualStyle"], "Warm tones, jump cuts");
        assert_eq!(json["isOnboarded"], false);
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "name": "Shop",
            "brandType": "Company",
            "platform": "Instagram",
            "postingDays": [2],
            "contentPillars": [{"name": "Drops"}],
            "persona": "Playful",
            "visualStyle": "Pastel"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.brand_type, BrandType::Company);
        assert_eq!(profile.additional_info, "");
        assert_eq!(profile.content_pillars[0].description, "");
        assert!(!profile.is_onboarded);
    }

    #[test]
    fn test_parse_enums_and_pillars() {
        assert_eq!("YouTube".parse::<Platform>(), Ok(Platform::YouTube));
        assert_eq!("ig".parse::<Platform>(), Ok(Platform::Instagram));
        assert!("tiktok".parse::<Platform>().is_err());
        assert_eq!("company".parse::<BrandType>(), Ok(BrandType::Company));

        let pillar: ContentPillar = "Tutorials: step-by-step".parse().unwrap();
        assert_eq!(pillar, ContentPillar::new("Tutorials", "step-by-step"));
        let bare: ContentPillar = "Vlogs".parse().unwrap();
        assert_eq!(bare.description, "");
        assert!(":oops".parse::<ContentPillar>().is_err());
    }
}
