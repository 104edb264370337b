use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::{
    dtos::UpdateMembershipRequest, models::MembershipSet, models::Ticket, utils::ValidatedJson,
    AppState,
};

pub async fn get_user_groups(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ticket: Ticket,
) -> Result<impl IntoResponse, AppError> {
    let groups = state.directory.get_user_groups(&user_id, &ticket).await?;
    Ok(Json(json!({ "groups": groups })))
}

pub async fn update_membership(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ticket: Ticket,
    ValidatedJson(req): ValidatedJson<UpdateMembershipRequest>,
) -> Result<impl IntoResponse, AppError> {
    let desired: MembershipSet = req.groups.into_iter().collect();
    let ack = state
        .reconciler
        .update_membership(&user_id, desired, &ticket)
        .await?;
    Ok(Json(ack))
}
