use serde::Serialize;

use super::repo::Meal;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub total: usize,
    pub on_diet: usize,
    pub not_on_diet: usize,
    pub longest_on_diet_streak: usize,
}

/// Summarizes a user's meals. Meals are ordered by `occurred_at` (stable, so
/// equal timestamps keep their input order) before looking for the longest
/// run of consecutive on-diet meals.
///
/// An empty history is `AppError::EmptyInput`, not a zeroed report.
pub fn compute_metrics(meals: &[Meal]) -> Result<Metrics, AppError> {
    if meals.is_empty() {
        return Err(AppError::EmptyInput);
    }

    let mut ordered: Vec<&Meal> = meals.iter().collect();
    ordered.sort_by_key(|m| m.occurred_at);

    let mut on_diet = 0usize;
    let mut streak = 0usize;
    let mut longest = 0usize;
    for meal in ordered {
        if meal.is_on_diet {
            on_diet += 1;
            streak += 1;
            longest = longest.max(streak);
        } else {
            streak = 0;
        }
    }

    let total = meals.len();
    Ok(Metrics {
        total,
        on_diet,
        not_on_diet: total - on_diet,
        longest_on_diet_streak: longest,
    })
}
