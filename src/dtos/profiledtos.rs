use serde::Deserialize;
use validator::Validate;

use crate::{
    dtos::commondtos::{double_option, RequestQueryDto},
    models::portfoliomodel::PortfolioChanges,
};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePortfolioItemDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: Option<String>,

    #[validate(url(message = "Url is invalid"))]
    pub url: Option<String>,

    #[validate(url(message = "Image url is invalid"))]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePortfolioItemDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 500, message = "Description is too long"))]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(url(message = "Url is invalid"))]
    pub url: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(url(message = "Image url is invalid"))]
    pub image_url: Option<Option<String>>,
}

impl From<UpdatePortfolioItemDto> for PortfolioChanges {
    fn from(dto: UpdatePortfolioItemDto) -> Self {
        PortfolioChanges {
            title: dto.title,
            description: dto.description,
            url: dto.url,
            image_url: dto.image_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FreelancerSearchQuery {
    /// Comma separated; any of them matches.
    pub skills: Option<String>,
    #[validate(range(min = 0.0))]
    pub min_rate: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_rate: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
    #[validate(range(min = 0))]
    pub min_experience: Option<i32>,
    #[validate(length(max = 100))]
    pub availability: Option<String>,
    #[validate(length(max = 200))]
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl FreelancerSearchQuery {
    pub fn pagination(&self) -> RequestQueryDto {
        RequestQueryDto::new(self.page, self.per_page)
    }

    pub fn skills(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
