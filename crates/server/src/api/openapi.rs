//! OpenAPI/Utoipa configuration.

use crate::api::{health::MISC_TAG, resource::RESOURCE_TAG};
use crate::oauth2::OAUTH2_TAG;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{
        AuthorizationCode, Flow, HttpAuthScheme, HttpBuilder, OAuth2, Password, Scopes,
        SecurityScheme,
    },
};

/// Security addon for OpenAPI documentation.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    #[tracing::instrument(skip(self, openapi))]
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .description(Some(
                    "Opaque access token obtained from `/oauth/token`.",
                ))
                .build();
            components.add_security_scheme("bearer_auth", SecurityScheme::Http(bearer));

            let basic = HttpBuilder::new()
                .scheme(HttpAuthScheme::Basic)
                .description(Some(
                    "Client credentials on the token, check_token and revoke endpoints; \
                     resource owner credentials on the authorize endpoint.",
                ))
                .build();
            components.add_security_scheme("basic_auth", SecurityScheme::Http(basic));

            let scopes = || Scopes::from_iter([("read", "Read access to protected resources")]);
            let oauth2 = OAuth2::new([
                Flow::Password(Password::new("/oauth/token", scopes())),
                Flow::AuthorizationCode(AuthorizationCode::new(
                    "/oauth/authorize",
                    "/oauth/token",
                    scopes(),
                )),
            ]);
            components.add_security_scheme("oauth2", SecurityScheme::OAuth2(oauth2));
        }
    }
}

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "OAuth2 Authorization Server API",
        version = "1.0.0",
        description = "Issues, validates and revokes OAuth2 bearer tokens."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = OAUTH2_TAG, description = "OAuth2 authorization server endpoints"),
        (name = RESOURCE_TAG, description = "Sample protected resource")
    )
)]
pub struct ApiDoc;
