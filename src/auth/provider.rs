use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl,
    Scope, TokenUrl,
};
use serde_json::Value;

use crate::{config::Config, session::SessionUser, AppResult, GetField};

type OidcClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// The OpenID Connect identity provider (Auth0 tenant) and its HTTP client.
#[derive(Clone)]
pub struct Provider {
    client: OidcClient,
    issuer_base_url: String,
    pub(crate) audience: Option<String>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) http_client: reqwest::Client,
}

impl Provider {
    pub fn from_config(config: &Config) -> AppResult<Provider> {
        let identity = &config.identity;
        let issuer = identity.issuer_base_url.clone();

        let client = BasicClient::new(ClientId::new(identity.client_id.clone()))
            .set_client_secret(ClientSecret::new(identity.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(format!("{issuer}/authorize"))?)
            .set_token_uri(TokenUrl::new(format!("{issuer}/oauth/token"))?)
            .set_redirect_uri(RedirectUrl::new(format!("{}/api/auth/callback", config.base_url))?);

        // token exchange must not follow redirects
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.api_timeout)
            .build()?;

        Ok(Provider {
            client,
            issuer_base_url: issuer,
            audience: identity.audience.clone(),
            scopes: identity.scope.split_whitespace().map(|s| Scope::new(s.to_owned())).collect(),
            http_client,
        })
    }

    pub(crate) fn client(&self) -> &OidcClient {
        &self.client
    }

    pub(crate) async fn user_info(&self, access_token: &str) -> AppResult<SessionUser> {
        let body: Value = self.http_client.get(format!("{}/userinfo", self.issuer_base_url))
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        session_user(&body, access_token)
    }
}

fn session_user(body: &Value, access_token: &str) -> AppResult<SessionUser> {
    let sub = body.get_str_field("sub")?;
    let email = body.get_str_field("email").unwrap_or_default();
    let name = body.get_str_field("name")
        .or_else(|_| body.get_str_field("nickname"))
        .unwrap_or_else(|_| email.clone());

    Ok(SessionUser { sub, name, email, access_token: access_token.to_owned() })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::test_config;

    #[test]
    fn endpoints_come_from_the_issuer() {
        let provider = Provider::from_config(&test_config()).unwrap();
        assert_eq!(provider.issuer_base_url, "https://tenant.example.auth0.com");
        assert_eq!(provider.client().auth_uri().as_str(), "https://tenant.example.auth0.com/authorize");
        assert_eq!(
            provider.client().redirect_uri().map(|u| u.as_str()),
            Some("http://localhost:8080/api/auth/callback")
        );
        assert_eq!(provider.scopes.len(), 3);
    }

    #[test]
    fn user_info_name_falls_back_to_nickname() {
        let user = session_user(&json!({"sub": "auth0|1", "nickname": "al", "email": "a@x"}), "t").unwrap();
        assert_eq!(user.name, "al");
        assert_eq!(user.email, "a@x");

        let user = session_user(&json!({"sub": "auth0|1", "name": "Alice", "nickname": "al"}), "t").unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "");
    }

    #[test]
    fn user_info_without_sub_is_an_error() {
        assert!(session_user(&json!({"name": "Alice"}), "t").is_err());
    }
}
