use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, challenge, events, match_setting, peer_review, reward, submission};
use crate::state::AppState;

/// Everything under `/api`: session endpoints at the top, the REST surface under `/rest`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .nest("/rest", rest_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::userinfo))
}

fn rest_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(challenge_routes())
        .merge(match_setting_routes())
        .routes(routes!(submission::submit_code))
        .routes(routes!(submission::get_submission))
        .routes(routes!(peer_review::submit_vote))
        .routes(routes!(peer_review::finalize_challenge))
        .routes(routes!(events::subscribe))
        .routes(routes!(reward::rules))
        .routes(routes!(reward::my_profile))
}

fn challenge_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(challenge::list_challenges, challenge::create_challenge))
        .routes(routes!(challenge::get_challenge))
        .routes(routes!(challenge::join_challenge))
        .routes(routes!(
            challenge::list_participants,
            challenge::add_participant
        ))
        .routes(routes!(challenge::link_match_setting))
        .routes(routes!(challenge::assign))
        .routes(routes!(challenge::start_coding))
        .routes(routes!(challenge::end_coding))
        .routes(routes!(challenge::start_peer_review))
        .routes(routes!(challenge::end_peer_review))
        .routes(routes!(challenge::my_match))
        .routes(routes!(challenge::my_peer_reviews))
}

fn match_setting_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            match_setting::list_match_settings,
            match_setting::create_match_setting
        ))
        .routes(routes!(match_setting::get_match_setting))
        .routes(routes!(match_setting::publish_match_setting))
}
