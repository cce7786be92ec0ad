use crate::auth::basic_auth_value;
use crate::config::{JiraConfig, SearchApi};
use crate::error::{JiraError, Result};
use crate::models::{IssuePayload, SearchResponse, UserPayload, VersionPayload};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Fields requested for every issue read.
pub const ISSUE_FIELDS: &str =
    "summary,description,status,issuetype,project,parent,assignee,fixVersions,duedate,labels";

#[derive(Clone)]
pub struct JiraClient {
    http: HttpClient,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub fn server_url(&self) -> &str {
        self.config.server_url()
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(path);
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    pub async fn send_expect_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path);
        debug!(%method, %url, "request");
        let mut request = self.http.request(method, url);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        let response = request.send().await?;
        Self::ensure_success(response).await
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.config.api_root();
        base.push_str(path.trim_start_matches('/'));
        base
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(JiraError::from)
        } else {
            Err(Self::failure(status, response).await)
        }
    }

    async fn ensure_success(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::failure(status, response).await)
        }
    }

    async fn failure(status: StatusCode, response: Response) -> JiraError {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "jira request failed");
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            JiraError::Authentication(format!("Access denied ({}) - {}", status, body.trim()))
        } else {
            JiraError::from_response_body(status, &body)
        }
    }

    pub async fn get_myself(&self) -> Result<UserPayload> {
        self.get("myself").await
    }

    pub async fn get_issue(&self, issue_key: &str) -> Result<IssuePayload> {
        let path = format!("issue/{}", issue_key);
        self.get_with_query(&path, &[("fields", self.issue_fields())])
            .await
    }

    /// Runs a JQL search and follows pagination until every match is collected.
    pub async fn search_issues(&self, jql: &str) -> Result<Vec<IssuePayload>> {
        match self.config.search_api {
            SearchApi::Offset => self.search_by_offset(jql).await,
            SearchApi::Token => self.search_by_token(jql).await,
        }
    }

    async fn search_by_offset(&self, jql: &str) -> Result<Vec<IssuePayload>> {
        let fields = self.issue_fields();
        let page_size = self.config.page_size.to_string();
        let mut start_at = 0u32;
        let mut issues = Vec::new();

        loop {
            let query = [
                ("jql", jql.to_string()),
                ("fields", fields.clone()),
                ("startAt", start_at.to_string()),
                ("maxResults", page_size.clone()),
            ];
            let page: SearchResponse = self.get_with_query("search", &query).await?;
            let next = page.next_start();
            debug!(jql, start_at, total = page.total, "search page");
            issues.extend(page.issues);
            match next {
                Some(offset) => start_at = offset,
                None => break,
            }
        }

        Ok(issues)
    }

    async fn search_by_token(&self, jql: &str) -> Result<Vec<IssuePayload>> {
        let fields = self.issue_fields();
        let page_size = self.config.page_size.to_string();
        let mut page_token: Option<String> = None;
        let mut issues = Vec::new();

        loop {
            let mut query = vec![
                ("jql", jql.to_string()),
                ("fields", fields.clone()),
                ("maxResults", page_size.clone()),
            ];
            if let Some(token) = &page_token {
                query.push(("nextPageToken", token.clone()));
            }
            let page: SearchResponse = self.get_with_query("search/jql", &query).await?;
            let next = page.next_token().map(str::to_string);
            debug!(jql, fetched = page.issues.len(), "search page");
            issues.extend(page.issues);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(issues)
    }

    pub async fn get_project_versions(&self, project_key: &str) -> Result<Vec<VersionPayload>> {
        let path = format!("project/{}/versions", project_key);
        self.get(&path).await
    }

    /// Replaces the issue's fix versions with exactly the given version ids.
    pub async fn set_fix_versions(&self, issue_key: &str, version_ids: &[&str]) -> Result<()> {
        let path = format!("issue/{}", issue_key);
        let payload = FixVersionsUpdateRequest {
            fields: FixVersionsFields {
                fix_versions: version_ids.iter().map(|id| IdRef { id }).collect(),
            },
        };
        self.send_expect_empty(Method::PUT, &path, Some(&payload))
            .await
    }

    pub async fn add_comment(&self, issue_key: &str, text: &str) -> Result<()> {
        let path = format!("issue/{}/comment", issue_key);
        let payload = CommentCreateRequest { body: text };
        self.send_expect_empty(Method::POST, &path, Some(&payload))
            .await
    }

    /// Adds a label; Jira ignores the operation when the label is already present.
    pub async fn add_label(&self, issue_key: &str, label: &str) -> Result<()> {
        let path = format!("issue/{}", issue_key);
        let payload = LabelUpdateRequest {
            update: LabelOperations {
                labels: vec![LabelOperation { add: label }],
            },
        };
        self.send_expect_empty(Method::PUT, &path, Some(&payload))
            .await
    }

    fn issue_fields(&self) -> String {
        format!("{},{}", ISSUE_FIELDS, self.config.start_date_field)
    }
}

fn build_http_client(config: &JiraConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    let mut auth_value = header_value(basic_auth_value(&config.username, &config.api_token))?;
    auth_value.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth_value);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| JiraError::Other(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&value).map_err(|err| JiraError::Configuration(err.to_string()))
}

#[derive(Debug, Serialize)]
struct CommentCreateRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct FixVersionsUpdateRequest<'a> {
    fields: FixVersionsFields<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FixVersionsFields<'a> {
    fix_versions: Vec<IdRef<'a>>,
}

#[derive(Debug, Serialize)]
struct LabelUpdateRequest<'a> {
    update: LabelOperations<'a>,
}

#[derive(Debug, Serialize)]
struct LabelOperations<'a> {
    labels: Vec<LabelOperation<'a>>,
}

#[derive(Debug, Serialize)]
struct LabelOperation<'a> {
    add: &'a str,
}
