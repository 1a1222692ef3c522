use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::StoreError;
use crate::auth::repo::{NewUser, User, UserStore, EMAIL_TAKEN};
use crate::meals::repo::{Meal, MealPatch, MealStore, NewMeal};

/// Store kept in process memory, with the same filtering rules as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    meals: Mutex<Vec<Meal>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// Number of store operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn meal_snapshot(&self, meal_id: Uuid) -> Option<Meal> {
        self.meals
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == meal_id)
            .cloned()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.touch();
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.touch();
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(EMAIL_TAKEN));
        }
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl MealStore for MemoryStore {
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Meal>, StoreError> {
        self.touch();
        let meals = self.meals.lock().unwrap();
        // vec position stands in for the insert sequence
        let mut rows: Vec<(usize, &Meal)> = meals
            .iter()
            .enumerate()
            .filter(|(_, m)| m.user_id == user_id)
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| seq_b.cmp(seq_a))
        });
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn all_by_user(&self, user_id: Uuid) -> Result<Vec<Meal>, StoreError> {
        self.touch();
        let meals = self.meals.lock().unwrap();
        let mut rows: Vec<Meal> = meals.iter().filter(|m| m.user_id == user_id).cloned().collect();
        rows.sort_by_key(|m| m.created_at);
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, meal_id: Uuid) -> Result<Option<Meal>, StoreError> {
        self.touch();
        let meals = self.meals.lock().unwrap();
        Ok(meals
            .iter()
            .find(|m| m.id == meal_id && m.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, user_id: Uuid, meal: NewMeal) -> Result<Meal, StoreError> {
        self.touch();
        let row = Meal {
            id: Uuid::new_v4(),
            user_id,
            name: meal.name,
            description: meal.description,
            occurred_at: meal.occurred_at,
            is_on_diet: meal.is_on_diet,
            created_at: OffsetDateTime::now_utc(),
        };
        self.meals.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        user_id: Uuid,
        meal_id: Uuid,
        patch: MealPatch,
    ) -> Result<Option<Meal>, StoreError> {
        self.touch();
        let mut meals = self.meals.lock().unwrap();
        let Some(meal) = meals
            .iter_mut()
            .find(|m| m.id == meal_id && m.user_id == user_id)
        else {
            return Ok(None);
        };
        patch.apply(meal);
        Ok(Some(meal.clone()))
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> Result<bool, StoreError> {
        self.touch();
        let mut meals = self.meals.lock().unwrap();
        let before = meals.len();
        meals.retain(|m| !(m.id == meal_id && m.user_id == user_id));
        Ok(meals.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn meal_at(name: &str, occurred_at: OffsetDateTime) -> NewMeal {
        NewMeal {
            name: name.into(),
            description: String::new(),
            occurred_at,
            is_on_diet: true,
        }
    }

    fn names(meals: &[Meal]) -> Vec<&str> {
        meals.iter().map(|m| m.name.as_str()).collect()
    }

    #[tokio::test]
    async fn list_orders_equal_timestamps_newest_insert_first() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let t = datetime!(2024-02-01 12:00 UTC);
        for name in ["first", "second", "third"] {
            MealStore::insert(&store, user, meal_at(name, t)).await.unwrap();
        }
        MealStore::insert(&store, user, meal_at("earlier", t - time::Duration::hours(1)))
            .await
            .unwrap();

        let listed = store.list_by_user(user, 10, 0).await.unwrap();
        assert_eq!(names(&listed), ["third", "second", "first", "earlier"]);

        let page = store.list_by_user(user, 2, 1).await.unwrap();
        assert_eq!(names(&page), ["second", "first"]);
    }

    #[tokio::test]
    async fn all_by_user_keeps_insert_order_and_owner() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let t = datetime!(2024-02-01 12:00 UTC);
        MealStore::insert(&store, user, meal_at("a", t)).await.unwrap();
        MealStore::insert(&store, other, meal_at("x", t)).await.unwrap();
        MealStore::insert(&store, user, meal_at("b", t - time::Duration::days(1)))
            .await
            .unwrap();

        let all = store.all_by_user(user).await.unwrap();
        assert_eq!(names(&all), ["a", "b"]);
    }
}
