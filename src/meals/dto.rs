use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Meal, MealPatch, NewMeal};
use crate::error::AppError;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
pub struct MealResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub is_on_diet: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Meal> for MealResponse {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            occurred_at: m.occurred_at,
            is_on_diet: m.is_on_diet,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMealRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub is_on_diet: bool,
}

impl TryFrom<CreateMealRequest> for NewMeal {
    type Error = AppError;

    fn try_from(req: CreateMealRequest) -> Result<Self, Self::Error> {
        Ok(NewMeal {
            name: required_name(req.name)?,
            description: req.description.trim().to_string(),
            occurred_at: req.occurred_at,
            is_on_diet: req.is_on_diet,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub occurred_at: Option<OffsetDateTime>,
    pub is_on_diet: Option<bool>,
}

impl TryFrom<UpdateMealRequest> for MealPatch {
    type Error = AppError;

    fn try_from(req: UpdateMealRequest) -> Result<Self, Self::Error> {
        let patch = MealPatch {
            name: req.name.map(required_name).transpose()?,
            description: req.description.map(|d| d.trim().to_string()),
            occurred_at: req.occurred_at,
            is_on_diet: req.is_on_diet,
        };
        if patch.is_empty() {
            return Err(AppError::ValidationFailed(
                "At least one field must be provided".into(),
            ));
        }
        Ok(patch)
    }
}

fn required_name(name: String) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationFailed("Meal name is required".into()));
    }
    Ok(name.to_string())
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    /// Clamps `limit` into `1..=MAX_PAGE_SIZE` and `offset` to non-negative.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}
