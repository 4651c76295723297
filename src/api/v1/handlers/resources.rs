/*
 * Responsibility
 * - Role-protected demo resources
 * - The access gate has already run; handlers only read the granted roles
 */
use axum::Json;

use crate::api::v1::dto::resources::ResourceResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn user_resource(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<ResourceResponse> {
    Json(ResourceResponse {
        message: "token is valid and has role USER or ADMIN",
        roles: ctx.roles,
    })
}

pub async fn admin_resource(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<ResourceResponse> {
    Json(ResourceResponse {
        message: "token is valid and has role ADMIN",
        roles: ctx.roles,
    })
}
