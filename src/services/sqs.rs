//! SQS queues
//!
//! JSON-protocol DAO over ListQueues with page-by-page retrieval.
//! DeleteQueue is idempotent: a QueueDoesNotExist on a repeat delete is
//! treated as already satisfied.

use crate::aws::client::AwsClient;
use crate::framework::action::{Action, ActionResult, ConfirmLevel};
use crate::framework::dao::{list_all, Dao, Op, Page};
use crate::framework::error::{Error, Result};
use crate::framework::registry::{Executor, RegistryBuilder, ViewScope};
use crate::framework::render::{Column, Renderer};
use crate::framework::resource::{JsonResource, Resource};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const SERVICE: &str = "sqs";
const TARGET_PREFIX: &str = "AmazonSQS";

/// ListQueues caps MaxResults at 1000.
const MAX_PAGE_SIZE: usize = 1000;

pub fn register(builder: &mut RegistryBuilder) {
    builder.register_view(SERVICE, "queues", "SQS Queues");
    builder.register_dao(
        SERVICE,
        "queues",
        Box::new(|client, _scope: &ViewScope| Ok(Box::new(QueueDao { client }) as Box<dyn Dao>)),
    );
    builder.register_renderer(SERVICE, "queues", Box::new(|| Box::new(QueueRenderer)));
    builder.register_actions(
        SERVICE,
        "queues",
        vec![
            Action::api("Attributes", 'a', "GetQueueAttributes"),
            Action::api("Purge", 'P', "PurgeQueue").confirm(ConfirmLevel::Dangerous),
            Action::api("Delete", 'X', "DeleteQueue").confirm(ConfirmLevel::Dangerous),
        ],
    );
    builder.register_executor(SERVICE, "queues", Arc::new(QueueExecutor));
}

fn target(operation: &str) -> String {
    format!("{}.{}", TARGET_PREFIX, operation)
}

/// Queue name is the last path segment of the URL.
fn queue_name(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}

#[derive(Debug)]
struct QueueResource {
    base: JsonResource,
    name: String,
}

impl QueueResource {
    fn new(url: String) -> Self {
        let name = queue_name(&url).to_string();
        Self {
            base: JsonResource::new(json!({ "QueueUrl": url }), "QueueUrl", "", ""),
            name,
        }
    }
}

impl Resource for QueueResource {
    /// The queue URL: it is what every SQS API keys on.
    fn id(&self) -> &str {
        self.base.id()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn raw(&self) -> &Value {
        self.base.raw()
    }

    fn template_var(&self, name: &str) -> Option<String> {
        match name {
            "QUEUE_URL" => Some(self.id().to_string()),
            _ => None,
        }
    }
}

struct QueueDao {
    client: Arc<AwsClient>,
}

async fn delete_queue(client: &AwsClient, url: &str) -> Result<()> {
    let body = json!({ "QueueUrl": url });
    match client.json(SERVICE, &target("DeleteQueue"), &body).await {
        Ok(_) => Ok(()),
        Err(Error::NotFound { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl Dao for QueueDao {
    fn supports(&self, op: Op) -> bool {
        matches!(op, Op::List | Op::ListPage | Op::Get | Op::Delete)
    }

    async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
        list_all(self, MAX_PAGE_SIZE).await
    }

    async fn list_page(&self, page_size: usize, token: Option<&str>) -> Result<Page> {
        let mut body = json!({ "MaxResults": page_size.min(MAX_PAGE_SIZE) });
        if let Some(token) = token {
            body["NextToken"] = Value::String(token.to_string());
        }

        let response = self.client.json(SERVICE, &target("ListQueues"), &body).await?;

        let resources = response
            .get("QueueUrls")
            .and_then(|v| v.as_array())
            .map(|urls| {
                urls.iter()
                    .filter_map(|v| v.as_str())
                    .map(|url| Box::new(QueueResource::new(url.to_string())) as Box<dyn Resource>)
                    .collect()
            })
            .unwrap_or_default();

        let next_token = response
            .get("NextToken")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Page {
            resources,
            next_token,
        })
    }

    async fn get(&self, id: &str) -> Result<Box<dyn Resource>> {
        let body = json!({ "QueueUrl": id, "AttributeNames": ["All"] });
        let response = self
            .client
            .json(SERVICE, &target("GetQueueAttributes"), &body)
            .await?;

        // Keep the attributes in the raw value for the detail view.
        let mut raw = json!({ "QueueUrl": id });
        if let Some(attributes) = response.get("Attributes") {
            raw["Attributes"] = attributes.clone();
        }

        let name = queue_name(id).to_string();
        Ok(Box::new(QueueResource {
            base: JsonResource::new(raw, "QueueUrl", "", ""),
            name,
        }))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        delete_queue(&self.client, id).await
    }
}

struct QueueRenderer;

impl Renderer for QueueRenderer {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("Name", 32, 0, |r| r.name().to_string()),
            Column::new("URL", 64, 1, |r| r.id().to_string()),
        ]
    }
}

struct QueueExecutor;

#[async_trait]
impl Executor for QueueExecutor {
    async fn execute(
        &self,
        client: &AwsClient,
        action: &Action,
        resource: &dyn Resource,
    ) -> ActionResult {
        let url = resource.id();

        match action.operation() {
            Some("DeleteQueue") => match delete_queue(client, url).await {
                Ok(()) => ActionResult::success(format!("deleted queue {}", resource.name())),
                Err(e) => ActionResult::failure(e),
            },
            Some("PurgeQueue") => {
                let body = json!({ "QueueUrl": url });
                match client.json(SERVICE, &target("PurgeQueue"), &body).await {
                    Ok(_) => ActionResult::success(format!("purged queue {}", resource.name())),
                    Err(e) => ActionResult::failure(e),
                }
            }
            Some("GetQueueAttributes") => {
                let body = json!({ "QueueUrl": url, "AttributeNames": ["All"] });
                match client
                    .json(SERVICE, &target("GetQueueAttributes"), &body)
                    .await
                {
                    Ok(response) => {
                        let count = response
                            .get("Attributes")
                            .and_then(|v| v.as_object())
                            .map(|m| m.len())
                            .unwrap_or(0);
                        ActionResult::success(format!(
                            "{}: {} attributes",
                            resource.name(),
                            count
                        ))
                        .with_refresh(false)
                    }
                    Err(e) => ActionResult::failure(e),
                }
            }
            Some(other) => ActionResult::failure(Error::Misconfigured(format!(
                "unknown SQS operation {}",
                other
            ))),
            None => ActionResult::failure(Error::Misconfigured(format!(
                "exec action '{}' reached the SQS executor",
                action.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_name_is_the_last_url_segment() {
        let r = QueueResource::new("https://sqs.us-east-1.amazonaws.com/123456789012/jobs".into());
        assert_eq!(r.name(), "jobs");
        assert_eq!(r.id(), "https://sqs.us-east-1.amazonaws.com/123456789012/jobs");
        assert_eq!(
            r.template_var("QUEUE_URL").as_deref(),
            Some("https://sqs.us-east-1.amazonaws.com/123456789012/jobs")
        );
    }

    #[test]
    fn row_is_name_then_url() {
        let r = QueueResource::new("https://sqs.us-east-1.amazonaws.com/123456789012/jobs".into());
        let row = QueueRenderer.render_row(&r);
        assert_eq!(row[0], "jobs");
        assert!(row[1].ends_with("/jobs"));
    }
}
