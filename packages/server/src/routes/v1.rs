use axum::middleware::from_fn_with_state;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::rate_limit;
use crate::state::AppState;

pub fn routes(state: &AppState) -> OpenApiRouter<AppState> {
    let limited = OpenApiRouter::new()
        .nest("/files", file_routes(state))
        .nest("/logs", log_routes())
        .nest("/admin", admin_routes())
        .layer(from_fn_with_state(state.clone(), rate_limit::enforce));

    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .routes(routes!(handlers::public::download_public_file))
        .merge(limited)
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn file_routes(state: &AppState) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::file::upload_files))
        .layer(handlers::file::upload_body_limit(
            state.config.storage.max_upload_bytes,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::file::search_files))
        .routes(routes!(handlers::file::shared_by_me))
        .routes(routes!(handlers::file::get_analytics))
        .routes(routes!(handlers::file::delete_file))
        .routes(routes!(handlers::file::download_file))
        .routes(routes!(
            handlers::file::make_public,
            handlers::file::make_private
        ))
        .routes(routes!(handlers::file::share_with_user))
        .routes(routes!(handlers::file::unshare_self))
        .merge(upload)
}

fn log_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::audit::list_logs))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::list_all_files))
}
