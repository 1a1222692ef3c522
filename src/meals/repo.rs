use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{PgStore, StoreError};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub occurred_at: OffsetDateTime,
    pub is_on_diet: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub description: String,
    pub occurred_at: OffsetDateTime,
    pub is_on_diet: bool,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct MealPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<OffsetDateTime>,
    pub is_on_diet: Option<bool>,
}

impl MealPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.occurred_at.is_none()
            && self.is_on_diet.is_none()
    }

    pub fn apply(self, meal: &mut Meal) {
        if let Some(name) = self.name {
            meal.name = name;
        }
        if let Some(description) = self.description {
            meal.description = description;
        }
        if let Some(occurred_at) = self.occurred_at {
            meal.occurred_at = occurred_at;
        }
        if let Some(is_on_diet) = self.is_on_diet {
            meal.is_on_diet = is_on_diet;
        }
    }
}

/// Meal persistence. Every lookup by id is scoped to `user_id`, so a meal
/// owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait MealStore: Send + Sync {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Meal>, StoreError>;

    async fn all_by_user(&self, user_id: Uuid) -> Result<Vec<Meal>, StoreError>;

    async fn find(&self, user_id: Uuid, meal_id: Uuid) -> Result<Option<Meal>, StoreError>;

    async fn insert(&self, user_id: Uuid, meal: NewMeal) -> Result<Meal, StoreError>;

    /// Returns `None` when no meal matches `(meal_id, user_id)`.
    async fn update(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        patch: MealPatch,
    ) -> Result<Option<Meal>, StoreError>;

    /// Returns whether a row matching `(meal_id, user_id)` was removed.
    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> Result<bool, StoreError>;
}

const MEAL_COLUMNS: &str = "id, user_id, name, description, occurred_at, is_on_diet, created_at";

#[async_trait]
impl MealStore for PgStore {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Meal>, StoreError> {
        let rows = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE user_id = $1
            ORDER BY occurred_at DESC, created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn all_by_user(&self, user_id: Uuid) -> Result<Vec<Meal>, StoreError> {
        let rows = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE user_id = $1
            ORDER BY created_at ASC, seq ASC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, meal_id: Uuid) -> Result<Option<Meal>, StoreError> {
        let meal = sqlx::query_as::<_, Meal>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
            FROM meals
            WHERE id = $1 AND user_id = $2
            "#
        ))
        .bind(meal_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(meal)
    }

    async fn insert(&self, user_id: Uuid, meal: NewMeal) -> Result<Meal, StoreError> {
        let row = sqlx::query_as::<_, Meal>(&format!(
            r#"
            INSERT INTO meals (id, user_id, name, description, occurred_at, is_on_diet)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&meal.name)
        .bind(&meal.description)
        .bind(meal.occurred_at)
        .bind(meal.is_on_diet)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        patch: MealPatch,
    ) -> Result<Option<Meal>, StoreError> {
        let row = sqlx::query_as::<_, Meal>(&format!(
            r#"
            UPDATE meals
               SET name        = COALESCE($3, name),
                   description = COALESCE($4, description),
                   occurred_at = COALESCE($5, occurred_at),
                   is_on_diet  = COALESCE($6, is_on_diet)
             WHERE id = $1 AND user_id = $2
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(meal_id)
        .bind(user_id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.occurred_at)
        .bind(patch.is_on_diet)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
            .bind(meal_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn meal() -> Meal {
        Meal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Lunch".into(),
            description: "Rice and beans".into(),
            occurred_at: datetime!(2024-01-01 12:00 UTC),
            is_on_diet: true,
            created_at: datetime!(2024-01-01 12:05 UTC),
        }
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(MealPatch::default().is_empty());
        let patch = MealPatch {
            is_on_diet: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut m = meal();
        let before = m.clone();
        MealPatch {
            description: Some("Salad".into()),
            is_on_diet: Some(false),
            ..Default::default()
        }
        .apply(&mut m);
        assert_eq!(m.description, "Salad");
        assert!(!m.is_on_diet);
        assert_eq!(m.name, before.name);
        assert_eq!(m.occurred_at, before.occurred_at);
        assert_eq!(m.id, before.id);
    }
}
