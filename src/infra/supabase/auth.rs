use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, StatusError, send_json};
use crate::services::{AuthApi, AuthUser, Role, Session};

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    data: UserMetadata,
}

#[derive(Serialize, Deserialize, Default)]
struct UserMetadata {
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl From<RemoteUser> for AuthUser {
    fn from(user: RemoteUser) -> Self {
        AuthUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            role: user.user_metadata.role.unwrap_or_default(),
        }
    }
}

/// Sign-up answers with a bare user, or with a session wrapping the user
/// when email confirmation is disabled.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: RemoteUser },
    User(RemoteUser),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: RemoteUser,
}

/// Pulls the human-readable message out of an auth error body, falling back
/// to the error itself.
fn provider_message(err: anyhow::Error) -> anyhow::Error {
    let Some(status) = err.downcast_ref::<StatusError>() else {
        return err;
    };
    let body: serde_json::Value = serde_json::from_str(&status.body).unwrap_or_default();
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
        .map(|msg| anyhow!("{msg}"))
        .unwrap_or(err)
}

/// [`AuthApi`] backed by a GoTrue-style REST service (`<url>/auth/v1`).
pub struct RestAuth<C> {
    base_url: Url,
    client: C,
}

impl RestAuth<ApiKey<BasicClient>> {
    pub fn connect(config: &BackendConfig) -> Result<Self> {
        let client = ApiKey::header(BasicClient::new(config.timeout)?, "apikey", &config.key)?;
        Self::with_client(&config.url, client)
    }
}

impl<C: HttpClient> RestAuth<C> {
    pub fn with_client(base_url: &str, client: C) -> Result<Self> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).with_context(|| format!("invalid auth URL '{base_url}'"))?;
        Ok(Self { base_url, client })
    }

    fn request(&self, method: Method, path: &str) -> Result<Request> {
        Ok(Request::new(method, self.base_url.join(&format!("auth/v1/{path}"))?))
    }

    fn post_json(&self, path: &str, body: &impl Serialize) -> Result<Request> {
        let mut req = self.request(Method::POST, path)?;
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(serde_json::to_vec(body)?.into());
        Ok(req)
    }
}

#[async_trait]
impl<C: HttpClient> AuthApi for RestAuth<C> {
    async fn sign_up(&self, email: &str, password: &str, role: Role) -> Result<AuthUser> {
        let req = self.post_json("signup", &SignUpRequest {
            credentials: Credentials { email, password },
            data: UserMetadata { role: Some(role) },
        })?;

        let resp: SignUpResponse = send_json(&self.client, req).await.map_err(provider_message)?;
        let user = match resp {
            SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
        };
        Ok(user.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut req = self.post_json("token", &Credentials { email, password })?;
        req.url_mut()
            .query_pairs_mut()
            .append_pair("grant_type", "password");

        let resp: TokenResponse = send_json(&self.client, req).await.map_err(provider_message)?;
        Ok(Session {
            access_token: resp.access_token,
            user: resp.user.into(),
        })
    }

    async fn user_for_token(&self, access_token: &str) -> Result<AuthUser> {
        let mut req = self.request(Method::GET, "user")?;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))?;
        bearer.set_sensitive(true);
        req.headers_mut().insert(AUTHORIZATION, bearer);

        let user: RemoteUser = send_json(&self.client, req).await.map_err(provider_message)?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Reply {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for Reply {
        async fn execute(&self, _req: Request) -> reqwest::Result<reqwest::Response> {
            let resp = axum::http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    fn auth(status: u16, body: &'static str) -> RestAuth<Reply> {
        RestAuth::with_client("https://auth.test", Reply { status, body }).unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_accepts_bare_user_or_session() {
        let bare = r#"{"id":"u1","email":"a@b.test","user_metadata":{"role":"student"}}"#;
        let user = auth(200, bare).sign_up("a@b.test", "pw1234", Role::Student).await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, Role::Student);

        let session = r#"{"access_token":"t","user":{"id":"u2","email":"c@d.test"}}"#;
        let user = auth(200, session).sign_up("c@d.test", "pw1234", Role::Instructor).await.unwrap();
        assert_eq!(user.id, "u2");
        assert_eq!(user.role, Role::Instructor);
    }

    #[tokio::test]
    async fn test_sign_in_returns_token() {
        let body = r#"{"access_token":"abc","token_type":"bearer","user":{"id":"u1","email":"a@b.test","user_metadata":{"role":"instructor"}}}"#;
        let session = auth(200, body).sign_in("a@b.test", "pw").await.unwrap();
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.user.email, "a@b.test");
    }

    #[tokio::test]
    async fn test_error_message_is_surfaced() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let err = auth(400, body).sign_in("a@b.test", "bad").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = auth(422, r#"{"code":422,"msg":"User already registered"}"#)
            .sign_up("a@b.test", "pw1234", Role::Instructor)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
    }
}
