//! Reddit listing source: hot posts of a subreddit, filtered to SFW images.
//!
//! With client credentials the app-only OAuth API is used; otherwise the
//! public `.json` listing.

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use memefeed_core::config::RedditConfig;
use memefeed_core::fetch::{ContentSource, FetchQuery};
use memefeed_core::item::Item;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use tokio::sync::Mutex;

pub const PUBLIC_BASE_URL: &str = "https://www.reddit.com";
pub const OAUTH_BASE_URL: &str = "https://oauth.reddit.com";
pub const AUTH_BASE_URL: &str = "https://www.reddit.com";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];
/// Refresh tokens this long before Reddit says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct OAuthToken {
    access_token: String,
    expires_at: Instant,
}

enum Access {
    Public {
        base_url: String,
    },
    OAuth {
        api_base_url: String,
        auth_base_url: String,
        client_id: String,
        client_secret: String,
        token: Mutex<Option<OAuthToken>>,
    },
}

pub struct RedditSource {
    http: reqwest::Client,
    access: Access,
    user_agent: String,
    max_title_len: usize,
}

impl RedditSource {
    pub fn from_config(config: &RedditConfig, max_title_len: usize) -> Result<Self> {
        let source = match config.credentials() {
            Some((client_id, client_secret)) => Self::oauth(
                OAUTH_BASE_URL,
                AUTH_BASE_URL,
                client_id,
                client_secret,
                &config.user_agent,
                max_title_len,
            ),
            None => Self::public(PUBLIC_BASE_URL, &config.user_agent, max_title_len),
        };
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("build reddit http client")?;
        Ok(Self { http, ..source })
    }

    /// Unauthenticated `.json` listing under `base_url`.
    pub fn public(base_url: &str, user_agent: &str, max_title_len: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            access: Access::Public {
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            user_agent: user_agent.to_string(),
            max_title_len,
        }
    }

    /// App-only OAuth listing; tokens are requested from `auth_base_url`.
    pub fn oauth(
        api_base_url: &str,
        auth_base_url: &str,
        client_id: String,
        client_secret: String,
        user_agent: &str,
        max_title_len: usize,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            access: Access::OAuth {
                api_base_url: api_base_url.trim_end_matches('/').to_string(),
                auth_base_url: auth_base_url.trim_end_matches('/').to_string(),
                client_id,
                client_secret,
                token: Mutex::new(None),
            },
            user_agent: user_agent.to_string(),
            max_title_len,
        }
    }

    async fn listing_request(&self, query: &FetchQuery) -> Result<RequestBuilder> {
        let subreddit = query.topic.trim().trim_start_matches("r/");
        let request = match &self.access {
            Access::Public { base_url } => self.http.get(format!(
                "{base_url}/r/{subreddit}/hot.json?limit={}&raw_json=1",
                query.limit
            )),
            Access::OAuth { api_base_url, .. } => {
                let token = self.access_token().await?;
                self.http
                    .get(format!(
                        "{api_base_url}/r/{subreddit}/hot?limit={}&raw_json=1",
                        query.limit
                    ))
                    .header(AUTHORIZATION, format!("Bearer {token}"))
            }
        };
        Ok(request.header(USER_AGENT, &self.user_agent))
    }

    async fn access_token(&self) -> Result<String> {
        let Access::OAuth {
            auth_base_url,
            client_id,
            client_secret,
            token,
            ..
        } = &self.access
        else {
            return Err(anyhow!("reddit: public access has no token"));
        };

        let mut cached = token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now()
        {
            return Ok(token.access_token.clone());
        }

        let response = self
            .http
            .post(format!("{auth_base_url}/api/v1/access_token"))
            .basic_auth(client_id, Some(client_secret))
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .context("reddit: token request failed")?;
        let grant: TokenResponse = check_status(response)
            .await?
            .json()
            .await
            .context("reddit: decode token response")?;

        let lifetime = Duration::from_secs(grant.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::debug!(expires_in = grant.expires_in, "reddit token refreshed");
        *cached = Some(OAuthToken {
            access_token: grant.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(grant.access_token)
    }

    fn to_item(&self, post: Post) -> Option<Item> {
        if post.over_18 || !is_image_url(&post.url) {
            return None;
        }
        Some(Item::new(
            post.id.as_str(),
            post.url,
            &post.title,
            u64::try_from(post.score).unwrap_or(0),
            format!("r/{}", post.subreddit),
            format!("https://redd.it/{}", post.id),
            self.max_title_len,
        ))
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn fetch_batch(&self, query: &FetchQuery) -> Result<Vec<Item>> {
        let response = self
            .listing_request(query)
            .await?
            .send()
            .await
            .with_context(|| format!("reddit: listing r/{} failed", query.topic))?;
        let listing: ListingEnvelope = check_status(response)
            .await?
            .json()
            .await
            .context("reddit: decode listing")?;

        let items: Vec<Item> = listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| self.to_item(thing.data))
            .collect();
        tracing::debug!(topic = %query.topic, items = items.len(), "reddit listing");
        Ok(items)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 => Err(anyhow!("reddit: unauthorized")),
        403 => Err(anyhow!("reddit: forbidden")),
        429 => Err(anyhow!("reddit: rate limited: {body}")),
        _ => Err(anyhow!("reddit: api error {status}: {body}")),
    }
}

/// Whether `url` points directly at a still image or gif.
pub fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit_once('.').is_some_and(|(_, extension)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| extension.eq_ignore_ascii_case(known))
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    data: Listing,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    over_18: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_urls_match_known_extensions() {
        assert!(is_image_url("https://i.redd.it/abc.jpg"));
        assert!(is_image_url("https://i.redd.it/abc.JPEG"));
        assert!(is_image_url("https://i.imgur.com/abc.gif?width=640"));
        assert!(!is_image_url("https://v.redd.it/abc"));
        assert!(!is_image_url("https://i.imgur.com/abc.gifv"));
        assert!(!is_image_url(""));
    }

    #[test]
    fn posts_become_items() {
        let source = RedditSource::public(PUBLIC_BASE_URL, "test", 5);
        let post = Post {
            id: "x1".to_string(),
            title: "a long title".to_string(),
            subreddit: "memes".to_string(),
            url: "https://i.redd.it/x1.png".to_string(),
            score: 7000,
            over_18: false,
        };
        let item = source.to_item(post).unwrap();
        assert_eq!(item.origin(), "r/memes");
        assert_eq!(item.source_url(), "https://redd.it/x1");
        assert_eq!(item.score(), 7000);
        assert!(item.title().ends_with("..."));
    }

    #[test]
    fn nsfw_posts_are_dropped() {
        let source = RedditSource::public(PUBLIC_BASE_URL, "test", 250);
        let post = Post {
            id: "x2".to_string(),
            title: String::new(),
            subreddit: "memes".to_string(),
            url: "https://i.redd.it/x2.png".to_string(),
            score: 1,
            over_18: true,
        };
        assert!(source.to_item(post).is_none());
    }
}
