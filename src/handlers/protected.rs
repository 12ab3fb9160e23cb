use crate::guard::Authenticated;
use crate::utils::responses::ResponseBuilder;
use actix_web::HttpResponse;

pub const SECRET_MESSAGE: &str = "Your personal secret value is 42!";

/// Protected resource, only reachable through the access guard
pub async fn secret(user: Authenticated) -> HttpResponse {
    log::debug!("Serving secret to subject {}", user.user_id());
    ResponseBuilder::text(SECRET_MESSAGE)
}
