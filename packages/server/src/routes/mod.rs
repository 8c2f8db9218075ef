use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::files::upload_file))
        .layer(handlers::files::upload_body_limit(
            config.storage.max_upload_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::files::list_files))
        .routes(routes!(handlers::files::download_file))
        .routes(routes!(handlers::files::delete_file))
        .routes(routes!(handlers::files::rename_file))
        .routes(routes!(handlers::files::reconcile))
        .routes(routes!(handlers::health::health))
        .merge(upload)
}
