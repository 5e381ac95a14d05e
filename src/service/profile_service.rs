// service/profile_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{applicationdb::ApplicationExt, profiledb::ProfileExt, userdb::UserExt, MarketStore},
    dtos::{
        commondtos::{PageDto, RequestQueryDto},
        profiledtos::{CreatePortfolioItemDto, FreelancerSearchQuery},
    },
    models::{
        missionmodel::ApplicationStatus,
        portfoliomodel::*,
        usermodel::{Actor, Profile, ProfileDetails, UserRole},
    },
    service::{
        error::ServiceError,
        guard::{authorize, ensure_owner},
    },
};

const TITLE_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 500;

fn clean_title(title: &str) -> Result<String, ServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::validation("Title is required"));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(ServiceError::validation("Title is too long"));
    }
    Ok(title.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_description(description: &Option<String>) -> Result<(), ServiceError> {
    match description {
        Some(d) if d.chars().count() > DESCRIPTION_MAX => {
            Err(ServiceError::validation("Description is too long"))
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct NewPortfolioItem {
    pub title: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl From<CreatePortfolioItemDto> for NewPortfolioItem {
    fn from(dto: CreatePortfolioItemDto) -> Self {
        NewPortfolioItem {
            title: dto.title,
            description: dto.description,
            url: dto.url,
            image_url: dto.image_url,
        }
    }
}

/// Portfolios and the public freelancer directory.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn MarketStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    async fn load_item(&self, item_id: Uuid) -> Result<PortfolioItem, ServiceError> {
        self.store
            .get_portfolio_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Portfolio item {} not found", item_id)))
    }

    pub async fn add_portfolio_item(
        &self,
        actor: &Actor,
        input: NewPortfolioItem,
    ) -> Result<PortfolioItem, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;

        let title = clean_title(&input.title)?;
        let description = clean_optional(input.description);
        check_description(&description)?;

        let has_profile = matches!(
            self.store.get_profile(actor.id).await?,
            Some(Profile {
                details: ProfileDetails::Freelance { .. },
                ..
            })
        );
        if !has_profile {
            return Err(ServiceError::Precondition(
                "Create your freelance profile before adding portfolio items".to_string(),
            ));
        }

        let item = self
            .store
            .add_portfolio_item(
                actor.id,
                title,
                description,
                clean_optional(input.url),
                clean_optional(input.image_url),
            )
            .await?;

        tracing::info!("Portfolio item {} added by {}", item.id, actor.id);
        Ok(item)
    }

    pub async fn my_portfolio(&self, actor: &Actor) -> Result<Vec<PortfolioItem>, ServiceError> {
        authorize(actor, &[UserRole::Freelance])?;
        Ok(self.store.list_portfolio(actor.id).await?)
    }

    pub async fn portfolio_of(&self, user_id: Uuid) -> Result<Vec<PortfolioItem>, ServiceError> {
        Ok(self.store.list_portfolio(user_id).await?)
    }

    pub async fn get_portfolio_item(&self, item_id: Uuid) -> Result<PortfolioItem, ServiceError> {
        self.load_item(item_id).await
    }

    pub async fn update_portfolio_item(
        &self,
        item_id: Uuid,
        actor: &Actor,
        mut changes: PortfolioChanges,
    ) -> Result<PortfolioItem, ServiceError> {
        let mut item = self.load_item(item_id).await?;
        ensure_owner(actor, item.user_id, "portfolio item")?;

        if let Some(title) = &changes.title {
            changes.title = Some(clean_title(title)?);
        }
        changes.description = changes.description.map(clean_optional);
        changes.url = changes.url.map(clean_optional);
        changes.image_url = changes.image_url.map(clean_optional);
        if let Some(description) = &changes.description {
            check_description(description)?;
        }

        changes.apply_to(&mut item);
        self.store
            .save_portfolio_item(&item)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Portfolio item {} not found", item_id)))
    }

    pub async fn delete_portfolio_item(&self, item_id: Uuid, actor: &Actor) -> Result<(), ServiceError> {
        let item = self.load_item(item_id).await?;
        if !actor.is_admin() {
            ensure_owner(actor, item.user_id, "portfolio item")?;
        }

        if !self.store.delete_portfolio_item(item_id).await? {
            return Err(ServiceError::not_found(format!(
                "Portfolio item {} not found",
                item_id
            )));
        }
        tracing::info!("Portfolio item {} deleted by {}", item_id, actor.id);
        Ok(())
    }

    async fn page(
        &self,
        mut filter: FreelancerFilter,
        query: &RequestQueryDto,
    ) -> Result<PageDto<Profile>, ServiceError> {
        let (limit, offset) = query.limit_offset();
        filter.limit = limit;
        filter.offset = offset;

        let total = self.store.count_freelancers(&filter).await?;
        let items = self.store.search_freelancers(&filter).await?;
        Ok(PageDto::new(items, total, query))
    }

    pub async fn list_freelancers(&self, query: RequestQueryDto) -> Result<PageDto<Profile>, ServiceError> {
        self.page(FreelancerFilter::default(), &query).await
    }

    pub async fn search_freelancers(
        &self,
        query: FreelancerSearchQuery,
    ) -> Result<PageDto<Profile>, ServiceError> {
        if let (Some(min), Some(max)) = (query.min_rate, query.max_rate) {
            if min > max {
                return Err(ServiceError::validation("min_rate cannot exceed max_rate"));
            }
        }

        let filter = FreelancerFilter {
            skills: query.skills(),
            min_rate: query.min_rate,
            max_rate: query.max_rate,
            min_rating: query.min_rating,
            min_experience: query.min_experience,
            availability: non_blank(query.availability.clone()),
            text: non_blank(query.q.clone()),
            ..Default::default()
        };
        self.page(filter, &query.pagination()).await
    }

    /// Profile, portfolio and track record of a listed freelancer.
    pub async fn freelancer(&self, user_id: Uuid) -> Result<FreelancerDetail, ServiceError> {
        let listed = self
            .store
            .get_user(Some(user_id), None)
            .await?
            .is_some_and(|u| u.is_active && u.role == UserRole::Freelance);
        let profile = match self.store.get_profile(user_id).await? {
            Some(profile) if listed && matches!(profile.details, ProfileDetails::Freelance { .. }) => {
                profile
            }
            _ => {
                return Err(ServiceError::not_found(format!(
                    "Freelancer {} not found",
                    user_id
                )))
            }
        };

        let portfolio = self.store.list_portfolio(user_id).await?;
        let applications = self.store.list_applications_for_freelancer(user_id).await?;
        let total = applications.len() as i64;
        let accepted = applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Accepted)
            .count() as i64;
        let success_rate = if total == 0 {
            0.0
        } else {
            (accepted as f64 / total as f64 * 1000.0).round() / 10.0
        };

        Ok(FreelancerDetail {
            profile,
            portfolio,
            total_applications: total,
            accepted_missions: accepted,
            success_rate,
        })
    }

    pub async fn stats(&self) -> Result<FreelancerStats, ServiceError> {
        Ok(self.store.freelancer_stats().await?.rounded())
    }
}
