//! Axum route handlers for the Review Dashboard.

use askama::Template;
use axum::{extract::State, response::Html, Json};

use crate::dashboard::{load_dashboard, DashboardView};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage<'a> {
    pub view: &'a DashboardView,
}

/// GET /api/v1/evaluations
pub async fn handle_list_evaluations(State(state): State<AppState>) -> Json<DashboardView> {
    Json(load_dashboard(state.store.as_ref()).await)
}

/// GET /dashboard
pub async fn handle_dashboard_page(
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let view = load_dashboard(state.store.as_ref()).await;
    let page = DashboardPage { view: &view };
    Ok(Html(page.render()?))
}
