use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateMealRequest, MealResponse, Pagination, UpdateMealRequest},
    metrics::{compute_metrics, Metrics},
    repo::{MealPatch, NewMeal},
};
use crate::{
    auth::{gate::require_session, session::AuthenticatedIdentity},
    error::{AppError, AppResult},
    state::AppState,
};

const MEAL: &str = "Meal";

/// Every route here sits behind the session gate.
pub fn meal_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/metrics", get(get_metrics))
        .route(
            "/meals/:id",
            get(get_meal).put(update_meal).delete(delete_meal),
        )
        .route_layer(middleware::from_fn_with_state(
            state.keys.clone(),
            require_session,
        ))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_meals(
    State(state): State<AppState>,
    user: AuthenticatedIdentity,
    page: Result<Query<Pagination>, QueryRejection>,
) -> AppResult<Json<Vec<MealResponse>>> {
    let Query(page) = page?;
    let (limit, offset) = page.clamped();
    let meals = state.meals.list_by_user(user.id, limit, offset).await?;
    Ok(Json(meals.into_iter().map(MealResponse::from).collect()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_meal(
    State(state): State<AppState>,
    user: AuthenticatedIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<MealResponse>> {
    let Path(id) = id?;
    let meal = state
        .meals
        .find(user.id, id)
        .await?
        .ok_or(AppError::NotFound(MEAL))?;
    Ok(Json(meal.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_meal(
    State(state): State<AppState>,
    user: AuthenticatedIdentity,
    body: Result<Json<CreateMealRequest>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<MealResponse>)> {
    let Json(body) = body?;
    let new_meal = NewMeal::try_from(body)?;
    let meal = state.meals.insert(user.id, new_meal).await?;
    info!(meal_id = %meal.id, "meal created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/meals/{}", meal.id)) {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(meal.into())))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_meal(
    State(state): State<AppState>,
    user: AuthenticatedIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateMealRequest>, JsonRejection>,
) -> AppResult<Json<MealResponse>> {
    let Path(id) = id?;
    let Json(body) = body?;
    let patch = MealPatch::try_from(body)?;
    let meal = state
        .meals
        .update(user.id, id, patch)
        .await?
        .ok_or(AppError::NotFound(MEAL))?;
    info!(meal_id = %meal.id, "meal updated");
    Ok(Json(meal.into()))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_meal(
    State(state): State<AppState>,
    user: AuthenticatedIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = id?;
    if !state.meals.delete(user.id, id).await? {
        return Err(AppError::NotFound(MEAL));
    }
    info!(meal_id = %id, "meal deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_metrics(
    State(state): State<AppState>,
    user: AuthenticatedIdentity,
) -> AppResult<Json<Metrics>> {
    let meals = state.meals.all_by_user(user.id).await?;
    let metrics = compute_metrics(&meals)?;
    Ok(Json(metrics))
}
