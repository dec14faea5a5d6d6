//! S3 buckets
//!
//! REST-XML DAO over ListAllMyBuckets. Deleting a bucket that still
//! holds objects surfaces as a distinct in-use error so the UI can say
//! why the delete was refused.

use crate::aws::client::AwsClient;
use crate::framework::action::{Action, ActionResult, ConfirmLevel};
use crate::framework::dao::{Dao, Op};
use crate::framework::error::{Error, Result};
use crate::framework::registry::{Executor, RegistryBuilder, ViewScope};
use crate::framework::render::{or_dash, Column, Renderer};
use crate::framework::resource::{field, items_at, JsonResource, Resource};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const SERVICE: &str = "s3";
const RESOURCE: &str = "buckets";

pub fn register(builder: &mut RegistryBuilder) {
    builder.register_view(SERVICE, RESOURCE, "S3 Buckets");
    builder.register_dao(
        SERVICE,
        RESOURCE,
        Box::new(|client, _scope: &ViewScope| Ok(Box::new(BucketDao { client }) as Box<dyn Dao>)),
    );
    builder.register_renderer(SERVICE, RESOURCE, Box::new(|| Box::new(BucketRenderer)));
    builder.register_actions(
        SERVICE,
        RESOURCE,
        vec![
            Action::api("Delete", 'X', "DeleteBucket").confirm(ConfirmLevel::Dangerous),
            Action::exec(
                "Open Console",
                'o',
                "xdg-open 'https://s3.console.aws.amazon.com/s3/buckets/${BUCKET}'",
            ),
        ],
    );
    builder.register_executor(SERVICE, RESOURCE, Arc::new(BucketExecutor));
}

#[derive(Debug)]
struct BucketResource {
    base: JsonResource,
}

impl BucketResource {
    fn new(item: Value) -> Self {
        let name = field(&item, "Name");
        let arn = format!("arn:aws:s3:::{}", name);
        Self {
            base: JsonResource::new(item, "Name", "", "").with_arn(arn),
        }
    }
}

impl Resource for BucketResource {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn arn(&self) -> &str {
        self.base.arn()
    }

    fn raw(&self) -> &Value {
        self.base.raw()
    }

    fn template_var(&self, name: &str) -> Option<String> {
        match name {
            "BUCKET" => Some(self.id().to_string()),
            _ => None,
        }
    }
}

struct BucketDao {
    client: Arc<AwsClient>,
}

async fn delete_bucket(client: &AwsClient, bucket: &str) -> Result<()> {
    let path = format!("/{}", bucket);
    match client.rest(SERVICE, "DeleteBucket", "DELETE", &path).await {
        Ok(_) => Ok(()),
        Err(Error::NotFound { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl Dao for BucketDao {
    fn supports(&self, op: Op) -> bool {
        matches!(op, Op::List | Op::Delete)
    }

    async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
        let response = self.client.rest(SERVICE, "ListBuckets", "GET", "/").await?;
        Ok(
            items_at(&response, "ListAllMyBucketsResult.Buckets.Bucket")
                .into_iter()
                .map(|item| Box::new(BucketResource::new(item)) as Box<dyn Resource>)
                .collect(),
        )
    }

    async fn delete(&self, id: &str) -> Result<()> {
        delete_bucket(&self.client, id).await
    }
}

struct BucketRenderer;

impl Renderer for BucketRenderer {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("Name", 40, 0, |r| r.id().to_string()),
            Column::new("Created", 22, 1, |r| {
                or_dash(field(r.raw(), "CreationDate"))
            }),
            Column::new("ARN", 40, 2, |r| or_dash(r.arn().to_string())),
        ]
    }
}

struct BucketExecutor;

#[async_trait]
impl Executor for BucketExecutor {
    async fn execute(
        &self,
        client: &AwsClient,
        action: &Action,
        resource: &dyn Resource,
    ) -> ActionResult {
        match action.operation() {
            Some("DeleteBucket") => match delete_bucket(client, resource.id()).await {
                Ok(()) => ActionResult::success(format!("deleted bucket {}", resource.id())),
                Err(e) => ActionResult::failure(e),
            },
            Some(other) => ActionResult::failure(Error::Misconfigured(format!(
                "unknown S3 operation {}",
                other
            ))),
            None => ActionResult::failure(Error::Misconfigured(format!(
                "exec action '{}' reached the S3 executor",
                action.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bucket_arn_is_derived_from_the_name() {
        let r = BucketResource::new(json!({"Name": "logs", "CreationDate": "2024-02-01T00:00:00Z"}));
        assert_eq!(r.id(), "logs");
        assert_eq!(r.arn(), "arn:aws:s3:::logs");
        assert_eq!(r.template_var("BUCKET").as_deref(), Some("logs"));
    }

    #[test]
    fn row_shows_creation_date() {
        let r = BucketResource::new(json!({"Name": "logs", "CreationDate": "2024-02-01T00:00:00Z"}));
        let row = BucketRenderer.render_row(&r);
        assert_eq!(row, vec![
            "logs".to_string(),
            "2024-02-01T00:00:00Z".to_string(),
            "arn:aws:s3:::logs".to_string(),
        ]);
    }
}
