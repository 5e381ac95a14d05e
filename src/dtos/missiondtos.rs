use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    dtos::commondtos::{double_option, RequestQueryDto},
    models::missionmodel::*,
};

/// Skills arrive either as a JSON list or a comma separated string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

impl SkillsInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            SkillsInput::List(skills) => skills,
            SkillsInput::Csv(raw) => raw.split(',').map(str::to_string).collect(),
        }
    }
}

fn csv_skills(raw: &Option<String>) -> Vec<String> {
    raw.clone()
        .map(|s| SkillsInput::Csv(s).into_vec())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMissionDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(range(min = 0.0, message = "Budget must be positive"))]
    pub budget: Option<f64>,

    pub deadline: Option<DateTime<Utc>>,

    pub required_skills: Option<SkillsInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMissionDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub budget: Option<Option<f64>>,

    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<DateTime<Utc>>>,

    pub required_skills: Option<SkillsInput>,
}

impl From<UpdateMissionDto> for MissionChanges {
    fn from(dto: UpdateMissionDto) -> Self {
        MissionChanges {
            title: dto.title,
            description: dto.description,
            budget: dto.budget,
            deadline: dto.deadline,
            required_skills: dto.required_skills.map(SkillsInput::into_vec),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusDto {
    pub status: MissionStatus,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompleteMissionDto {
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,

    #[validate(length(max = 2000, message = "Feedback is too long"))]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MissionListQuery {
    pub status: Option<MissionStatus>,
    #[validate(range(min = 0.0))]
    pub max_budget: Option<f64>,
    pub skills: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MissionListQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }

    pub fn skills(&self) -> Vec<String> {
        csv_skills(&self.skills)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MyMissionsQuery {
    pub status: Option<MissionStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MyMissionsQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AvailableMissionsQuery {
    #[validate(range(min = 0.0))]
    pub min_budget: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_budget: Option<f64>,
    pub skills: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AvailableMissionsQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }

    pub fn skills(&self) -> Vec<String> {
        csv_skills(&self.skills)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchMissionsQuery {
    #[validate(length(max = 200))]
    pub q: Option<String>,
    #[validate(range(min = 0.0))]
    pub min_budget: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_budget: Option<f64>,
    pub deadline_before: Option<DateTime<Utc>>,
    pub sort_by: Option<MissionSort>,
    pub order: Option<SortOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchMissionsQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionDto {
    pub decision: Decision,
}
