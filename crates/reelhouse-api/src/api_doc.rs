//! OpenAPI documentation, served at `/api/openapi.json` and browsable at `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use reelhouse_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelhouse API",
        version = "0.1.0",
        description = "Video ingestion API. Uploaded MP4s are probed, remuxed for fast start and stored under their orientation; thumbnails are served from the asset root."
    ),
    paths(
        handlers::videos::upload_video,
        handlers::videos::get_video,
        handlers::thumbnails::upload_thumbnail,
    ),
    components(
        schemas(
            models::VideoResponse,
            models::Orientation,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "videos", description = "Video upload and retrieval"),
        (name = "thumbnails", description = "Thumbnail upload")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
