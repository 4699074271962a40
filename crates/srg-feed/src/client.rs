// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP client for the job-report server.

use async_trait::async_trait;
use srg_config::{ConnectionInfo, Credentials, RunConfig};
use srg_debug::LevelLogger;
use std::time::Duration;
use tracing::{debug, warn};

use crate::driver::JobPageSource;
use crate::page::FetchedPage;
use crate::FeedError;

const LOGIN_PATH: &str = "master/UIController/services/User/actions/login/invoke";
const JOBS_PATH: &str = "master/ReportHandler/objects/JobReports/0/collections/entries";

/// Transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Skip TLS certificate verification.
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(srg_config::DEFAULT_REQUEST_TIMEOUT_SECS),
            accept_invalid_certs: true,
        }
    }
}

impl From<&RunConfig> for ClientOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs()),
            accept_invalid_certs: config.accept_invalid_certs(),
        }
    }
}

/// Session-holding client for one reporting server.
///
/// The session cookie set by [`FeedClient::login`] is kept in the client's
/// cookie store and sent with every page request.
pub struct FeedClient {
    http: reqwest::Client,
    root: String,
    credentials: Credentials,
}

impl FeedClient {
    /// Build a client for the server described by `conn`.
    pub fn new(conn: &ConnectionInfo, options: ClientOptions) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .cookie_store(true)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(FeedError::Client)?;
        Ok(Self {
            http,
            root: conn.api_root(),
            credentials: conn.credentials.clone(),
        })
    }

    /// API root ending in `/`.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// URL of the page at `offset`.
    #[must_use]
    pub fn page_url(&self, offset: u64, count: u32) -> String {
        format!(
            "{}{JOBS_PATH}?count={count}&offset={offset}&order-by=timeStarted+DESC",
            self.root
        )
    }

    /// Open a session.
    ///
    /// Any status above 200 is a [`FeedError::LoginRejected`].
    pub async fn login(&self, logger: &mut LevelLogger) -> Result<(), FeedError> {
        let url = format!("{}{LOGIN_PATH}", self.root);
        logger.log(0, 2, &format!("URL for login is {url}"));

        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("space", self.credentials.space.as_str()),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|source| FeedError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status().as_u16();
        logger.log(0, 5, &format!("Got {status} for response status code"));
        let cookies: Vec<String> = response.cookies().map(|c| c.name().to_string()).collect();

        if status > 200 {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    logger.log(0, 5, &format!("Could not read response text: {e}"));
                    warn!(target: "srg.feed", %url, status, error = %e, "login response body unreadable");
                    String::new()
                }
            };
            logger.log(0, 5, &format!("Got {body} for response text"));
            return Err(FeedError::LoginRejected { status, body });
        }

        logger.log(0, 3, &format!("session cookies: {cookies:?}"));
        debug!(target: "srg.feed", %url, ?cookies, "logged in");
        Ok(())
    }
}

#[async_trait]
impl JobPageSource for FeedClient {
    async fn fetch_page(&mut self, offset: u64, count: u32) -> Result<FetchedPage, FeedError> {
        let url = self.page_url(offset, count);
        debug!(target: "srg.feed", %url, "fetching page");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| FeedError::Http {
                url: url.clone(),
                source,
            })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| FeedError::Http { url, source })?;
        Ok(FetchedPage { status, body })
    }

    fn describe(&self, offset: u64, count: u32) -> String {
        self.page_url(offset, count)
    }
}
