use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::{
    dtos::{CreateGroupRequest, UpdateGroupRequest},
    models::Ticket,
    utils::ValidatedJson,
    AppState,
};

pub async fn list_groups(
    State(state): State<AppState>,
    ticket: Ticket,
) -> Result<impl IntoResponse, AppError> {
    let groups = state.directory.list_groups(&ticket).await?;
    Ok(Json(json!({ "groups": groups })))
}

pub async fn create_group(
    State(state): State<AppState>,
    ticket: Ticket,
    ValidatedJson(req): ValidatedJson<CreateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ack = state
        .directory
        .create_group(&req.name, &req.description, &ticket)
        .await?;
    Ok(Json(ack))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ticket: Ticket,
) -> Result<impl IntoResponse, AppError> {
    let group = state.directory.get_group(&name, &ticket).await?;
    Ok(Json(group))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ticket: Ticket,
    ValidatedJson(req): ValidatedJson<UpdateGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ack = state
        .directory
        .update_group(&name, &req.description, &ticket)
        .await?;
    Ok(Json(ack))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ticket: Ticket,
) -> Result<impl IntoResponse, AppError> {
    let ack = state.directory.delete_group(&name, &ticket).await?;
    Ok(Json(ack))
}

pub async fn add_user_to_group(
    State(state): State<AppState>,
    Path((name, user_id)): Path<(String, String)>,
    ticket: Ticket,
) -> Result<impl IntoResponse, AppError> {
    let ack = state
        .directory
        .add_user_to_group(&user_id, &name, &ticket)
        .await?;
    Ok(Json(ack))
}

pub async fn remove_user_from_group(
    State(state): State<AppState>,
    Path((name, user_id)): Path<(String, String)>,
    ticket: Ticket,
) -> Result<impl IntoResponse, AppError> {
    let ack = state
        .directory
        .remove_user_from_group(&user_id, &name, &ticket)
        .await?;
    Ok(Json(ack))
}
