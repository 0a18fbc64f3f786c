//! OpenAPI documentation for the gateway's API surface.
//!
//! The `/chat` path is documented even for deployments that run with the chat
//! relay disabled, where the route itself is absent.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pokegate",
        description = "Image forwarding gateway and chat relay for the Pokémon battle assistant"
    ),
    paths(api::handlers::images::relay_image, api::handlers::chat::ask),
    components(schemas(
        crate::api::models::chat::ChatRequest,
        crate::api::models::chat::ChatResponse,
        crate::errors::ErrorBody
    )),
    tags(
        (name = "image", description = "Image forwarding"),
        (name = "chat", description = "Strategy chat relay")
    )
)]
pub struct ApiDoc;
