/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "health"
)]
pub async fn health_check() -> &'static str {
    "OK"
}
