use axum::{extract::State, response::IntoResponse};

use crate::web::state::AppState;

use super::templates::DashboardTemplate;

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let station = state.config.station.name.as_deref().unwrap_or("SRT");
    DashboardTemplate::new(
        station,
        &state.sidebar.view(),
        &state.schedule.view(),
        &state.history.view(),
        &state.monitor.view(),
    )
}
