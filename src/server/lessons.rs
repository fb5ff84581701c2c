// src/server/lessons.rs

//! Lesson listing and step command routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::content::Lesson;
use crate::exec::StepAction;
use crate::server::AppState;

pub async fn list_lessons(State(state): State<AppState>) -> Json<Vec<Lesson>> {
    Json(state.steps.content().lessons().to_vec())
}

pub async fn get_lesson(
    State(state): State<AppState>,
    Path(lesson_id): Path<String>,
) -> Result<Json<Lesson>, StatusCode> {
    state
        .steps
        .content()
        .lesson(&lesson_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn verify_step(
    State(state): State<AppState>,
    Path((lesson_id, step_id)): Path<(String, String)>,
) -> Json<bool> {
    Json(run(&state, StepAction::Verify, &lesson_id, &step_id).await)
}

pub async fn run_before_step(
    State(state): State<AppState>,
    Path((lesson_id, step_id)): Path<(String, String)>,
) -> Json<bool> {
    Json(run(&state, StepAction::Before, &lesson_id, &step_id).await)
}

pub async fn run_after_step(
    State(state): State<AppState>,
    Path((lesson_id, step_id)): Path<(String, String)>,
) -> Json<bool> {
    Json(run(&state, StepAction::After, &lesson_id, &step_id).await)
}

async fn run(state: &AppState, action: StepAction, lesson_id: &str, step_id: &str) -> bool {
    let ok = state.steps.run(action, lesson_id, step_id).await;
    tracing::info!(lesson = %lesson_id, step = %step_id, ?action, success = ok, "step command finished");
    ok
}
