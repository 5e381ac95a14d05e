use std::collections::BTreeMap;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usermodel::{Profile, ProfileDetails};

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, PartialEq)]
pub struct PortfolioItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patch for a portfolio item. The optional columns take a nested option so
/// they can be cleared.
#[derive(Debug, Clone, Default)]
pub struct PortfolioChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub url: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl PortfolioChanges {
    pub fn apply_to(self, item: &mut PortfolioItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(url) = self.url {
            item.url = url;
        }
        if let Some(image_url) = self.image_url {
            item.image_url = image_url;
        }
    }
}

/// Criteria of the freelancer directory. Only active FREELANCE accounts
/// holding a freelance profile are ever listed.
#[derive(Debug, Clone, Default)]
pub struct FreelancerFilter {
    /// Lowercased; a profile matches when it has any of them.
    pub skills: Vec<String>,
    pub min_rate: Option<f64>,
    pub max_rate: Option<f64>,
    pub min_rating: Option<f64>,
    pub min_experience: Option<i32>,
    pub availability: Option<String>,
    pub text: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl FreelancerFilter {
    /// Whether `profile` satisfies the criteria. Account state is checked by
    /// the store.
    pub fn matches(&self, profile: &Profile) -> bool {
        let ProfileDetails::Freelance {
            full_name,
            title,
            skills,
            hourly_rate,
            experience_years,
            availability,
            rating,
            ..
        } = &profile.details
        else {
            return false;
        };

        if !self.skills.is_empty()
            && !skills
                .iter()
                .any(|s| self.skills.contains(&s.to_lowercase()))
        {
            return false;
        }
        if let Some(min) = self.min_rate {
            if !hourly_rate.is_some_and(|r| r >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_rate {
            if !hourly_rate.is_some_and(|r| r <= max) {
                return false;
            }
        }
        if self.min_rating.is_some_and(|min| *rating < min) {
            return false;
        }
        if let Some(min) = self.min_experience {
            if !experience_years.is_some_and(|y| y >= min) {
                return false;
            }
        }
        if let Some(wanted) = &self.availability {
            let wanted = wanted.to_lowercase();
            if !availability
                .as_ref()
                .is_some_and(|a| a.to_lowercase().contains(&wanted))
            {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let hit = |value: Option<&String>| value.is_some_and(|v| v.to_lowercase().contains(&needle));
            if !hit(Some(full_name)) && !hit(title.as_ref()) && !hit(profile.common.bio.as_ref()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkillCount {
    pub skill: String,
    pub count: i64,
}

/// Aggregates over the listed freelancers.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FreelancerStats {
    pub total_freelancers: i64,
    pub total_completed_projects: i64,
    pub average_rating: f64,
    /// Over the freelancers that set a rate.
    pub average_hourly_rate: f64,
    pub average_experience_years: f64,
    pub availability_distribution: BTreeMap<String, i64>,
    pub top_skills: Vec<SkillCount>,
}

impl FreelancerStats {
    pub fn rounded(mut self) -> Self {
        fn round_to(value: f64, places: i32) -> f64 {
            let factor = 10f64.powi(places);
            (value * factor).round() / factor
        }
        self.average_rating = round_to(self.average_rating, 1);
        self.average_hourly_rate = round_to(self.average_hourly_rate, 2);
        self.average_experience_years = round_to(self.average_experience_years, 1);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FreelancerDetail {
    pub profile: Profile,
    pub portfolio: Vec<PortfolioItem>,
    pub total_applications: i64,
    pub accepted_missions: i64,
    /// Accepted applications over all applications, in percent.
    pub success_rate: f64,
}
