use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ContentError, Result};
use crate::gateway::{draft_to_fields, normalize_list, normalize_record, ContentGateway};
use crate::models::{Article, ArticleDraft};

const USER_AGENT: &str = concat!("insights-reader/", env!("CARGO_PKG_VERSION"));

/// REST client for the hosted table that backs the article catalog.
pub struct AirtableGateway {
    client: Client,
    table_url: String,
    api_key: String,
}

impl AirtableGateway {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        // validate() guarantees both are present
        let base_id = config.base_id.clone().unwrap_or_default();
        let api_key = config.api_key.clone().unwrap_or_default();

        let table_url = format!(
            "{}/{}/{}",
            config.api_url.trim_end_matches('/'),
            urlencoding::encode(&base_id),
            urlencoding::encode(&config.articles_table)
        );

        Ok(Self {
            client,
            table_url,
            api_key,
        })
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.table_url, urlencoding::encode(id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder, id: Option<&str>) -> Result<Value> {
        let response = self.authorized(request).send().await?;
        let response = check_status(response, id).await?;
        Ok(response.json::<Value>().await?)
    }
}

/// Turn a non-success response into the matching error.
async fn check_status(response: Response, id: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(ContentError::NotFound { id: id.to_string() });
        }
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    Err(ContentError::gateway(Some(status.as_u16()), message))
}

#[async_trait]
impl ContentGateway for AirtableGateway {
    async fn list_articles(&self) -> Result<Vec<Article>> {
        let mut articles = Vec::new();
        let mut offset: Option<String> = None;

        // The table pages its records; keep following the cursor
        loop {
            let mut request = self.client.get(&self.table_url);
            if let Some(cursor) = &offset {
                request = request.query(&[("offset", cursor)]);
            }

            let page = self.send(request, None).await?;
            articles.extend(normalize_list(&page));

            offset = page
                .get("offset")
                .and_then(Value::as_str)
                .map(str::to_string);
            if offset.is_none() {
                break;
            }
        }

        log::debug!("Listed {} articles from the content store", articles.len());
        Ok(articles)
    }

    async fn get_article(&self, id: &str) -> Result<Article> {
        let request = self.client.get(self.record_url(id));
        let record = self.send(request, Some(id)).await?;
        normalize_record(&record)
    }

    async fn create_article(&self, draft: &ArticleDraft) -> Result<Article> {
        let body = json!({ "fields": draft_to_fields(draft), "typecast": true });
        let request = self.client.post(&self.table_url).json(&body);
        let record = self.send(request, None).await?;
        normalize_record(&record)
    }

    async fn update_article(&self, id: &str, draft: &ArticleDraft) -> Result<Article> {
        let body = json!({ "fields": draft_to_fields(draft), "typecast": true });
        let request = self.client.patch(self.record_url(id)).json(&body);
        let record = self.send(request, Some(id)).await?;
        normalize_record(&record)
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        let request = self.client.delete(self.record_url(id));
        self.send(request, Some(id)).await?;
        Ok(())
    }
}
