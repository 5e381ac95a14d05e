use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Validate)]
pub struct RequestQueryDto {
    #[validate(range(min = 1, message = "page starts at 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "per_page must be between 1 and 100"))]
    pub per_page: Option<u32>,
}

impl RequestQueryDto {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        RequestQueryDto { page, per_page }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page() as i64;
        (per_page, (self.page() as i64 - 1) * per_page)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub pages: i64,
}

impl<T> PageDto<T> {
    pub fn new(items: Vec<T>, total: i64, query: &RequestQueryDto) -> Self {
        let per_page = query.per_page();
        PageDto {
            items,
            total,
            page: query.page(),
            per_page,
            pages: (total + per_page as i64 - 1) / per_page as i64,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in patch bodies.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
