use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::Deserialize;
use tracing::info;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";

/// Identity as reported by the provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub id: String,
    pub login: String,
}

/// The OAuth provider seam. Production uses [`GitHubOAuth`]; tests plug in a
/// canned implementation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<String>;

    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<ExternalIdentity>;
}

pub struct GitHubOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
}

impl GitHubOAuth {
    pub fn new(client_id: String, client_secret: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("remark/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
}

#[async_trait]
impl IdentityProvider for GitHubOAuth {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<ExternalIdentity> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
                "redirect_uri": redirect_uri,
            }))
            .send()
            .await
            .context("token exchange request failed")?
            .error_for_status()?
            .json()
            .await
            .context("malformed token response")?;

        let access_token = match token.access_token {
            Some(t) => t,
            None => {
                return Err(anyhow!(
                    "token exchange rejected: {} ({})",
                    token.error.unwrap_or_default(),
                    token.error_description.unwrap_or_default()
                ));
            }
        };

        let user: GitHubUser = self
            .client
            .get(USER_URL)
            .bearer_auth(&access_token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .context("user lookup failed")?
            .error_for_status()?
            .json()
            .await
            .context("malformed user response")?;

        info!("GitHub sign-in for {} ({})", user.login, user.id);
        Ok(ExternalIdentity {
            id: user.id.to_string(),
            login: user.login,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_encodes_redirect() {
        let github = GitHubOAuth::new("abc".into(), "secret".into()).unwrap();
        let url = github
            .authorize_url("xyz", "https://remark.test/api/auth/callback?current=/alice")
            .unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=abc"));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fremark.test%2Fapi%2Fauth%2Fcallback%3Fcurrent%3D%2Falice"));
        assert!(!url.contains("secret"));
    }
}
