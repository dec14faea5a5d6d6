//! CloudFormation stacks and stack resources
//!
//! Stacks drill into their resources, and each stack resource can jump
//! to the view of the concrete thing it models. Stack resources are a
//! read-only summary API: no Get, no Delete.

use crate::aws::client::AwsClient;
use crate::framework::action::{Action, ActionResult, ConfirmLevel};
use crate::framework::dao::{Dao, Op};
use crate::framework::error::{Error, Result};
use crate::framework::navigate::{cloudformation_target, NavTarget};
use crate::framework::registry::{Executor, RegistryBuilder, ViewScope};
use crate::framework::render::{or_dash, Column, Renderer};
use crate::framework::resource::{field, items_at, JsonResource, Resource};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const SERVICE: &str = "cloudformation";
const API_VERSION: &str = "2010-05-15";

pub fn register(builder: &mut RegistryBuilder) {
    builder.register_view(SERVICE, "stacks", "CloudFormation Stacks");
    builder.register_dao(
        SERVICE,
        "stacks",
        Box::new(|client, _scope: &ViewScope| Ok(Box::new(StackDao { client }) as Box<dyn Dao>)),
    );
    builder.register_renderer(SERVICE, "stacks", Box::new(|| Box::new(StackRenderer)));
    builder.register_actions(
        SERVICE,
        "stacks",
        vec![Action::api("Delete", 'X', "DeleteStack").confirm(ConfirmLevel::Dangerous)],
    );
    builder.register_executor(SERVICE, "stacks", Arc::new(StackExecutor));

    builder.register_view(SERVICE, "stack-resources", "Stack Resources");
    builder.register_dao(
        SERVICE,
        "stack-resources",
        Box::new(|client, scope: &ViewScope| {
            let Some(stack) = scope.parent_id.clone() else {
                return Err(Error::Misconfigured(
                    "stack-resources view requires a parent stack".into(),
                ));
            };
            Ok(Box::new(StackResourceDao { client, stack }) as Box<dyn Dao>)
        }),
    );
    builder.register_renderer(
        SERVICE,
        "stack-resources",
        Box::new(|| Box::new(StackResourceRenderer)),
    );
}

fn stack_resource(item: Value) -> JsonResource {
    JsonResource::new(item, "StackName", "StackName", "StackId")
}

struct StackDao {
    client: Arc<AwsClient>,
}

#[async_trait]
impl Dao for StackDao {
    fn supports(&self, op: Op) -> bool {
        matches!(op, Op::List | Op::Get | Op::Delete)
    }

    /// Non-paginated list: the token loop is consumed internally.
    async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
        let mut resources: Vec<Box<dyn Resource>> = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut params: Vec<(String, String)> = Vec::new();
            if let Some(token) = &token {
                params.push(("NextToken".to_string(), token.clone()));
            }

            let response = self
                .client
                .query(SERVICE, "DescribeStacks", API_VERSION, &params)
                .await?;

            for item in items_at(
                &response,
                "DescribeStacksResponse.DescribeStacksResult.Stacks.member",
            ) {
                resources.push(Box::new(stack_resource(item)));
            }

            let next = field(
                &response,
                "DescribeStacksResponse.DescribeStacksResult.NextToken",
            );
            if next.is_empty() {
                break;
            }
            token = Some(next);
        }

        Ok(resources)
    }

    async fn get(&self, id: &str) -> Result<Box<dyn Resource>> {
        let params = vec![("StackName".to_string(), id.to_string())];
        let response = match self
            .client
            .query(SERVICE, "DescribeStacks", API_VERSION, &params)
            .await
        {
            Ok(response) => response,
            // DescribeStacks reports a missing stack as a ValidationError.
            Err(Error::Api { message, .. }) if message.contains("does not exist") => {
                return Err(Error::NotFound {
                    what: format!("stack {}", id),
                });
            }
            Err(e) => return Err(e),
        };

        items_at(
            &response,
            "DescribeStacksResponse.DescribeStacksResult.Stacks.member",
        )
        .into_iter()
        .next()
        .map(|item| Box::new(stack_resource(item)) as Box<dyn Resource>)
        .ok_or_else(|| Error::NotFound {
            what: format!("stack {}", id),
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let params = vec![("StackName".to_string(), id.to_string())];
        match self
            .client
            .query(SERVICE, "DeleteStack", API_VERSION, &params)
            .await
        {
            Ok(_) => Ok(()),
            Err(Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

struct StackRenderer;

impl Renderer for StackRenderer {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("Stack", 32, 0, |r| r.id().to_string()),
            Column::new("Status", 24, 1, |r| or_dash(field(r.raw(), "StackStatus"))),
            Column::new("Created", 22, 2, |r| {
                or_dash(field(r.raw(), "CreationTime"))
            }),
        ]
    }

    fn drill(&self, resource: &dyn Resource) -> Option<NavTarget> {
        Some(NavTarget::new(
            SERVICE,
            "stack-resources",
            resource.id(),
        ))
    }
}

struct StackExecutor;

#[async_trait]
impl Executor for StackExecutor {
    async fn execute(
        &self,
        client: &AwsClient,
        action: &Action,
        resource: &dyn Resource,
    ) -> ActionResult {
        match action.operation() {
            Some("DeleteStack") => {
                let params = vec![("StackName".to_string(), resource.id().to_string())];
                match client
                    .query(SERVICE, "DeleteStack", API_VERSION, &params)
                    .await
                {
                    Ok(_) => {
                        ActionResult::success(format!("delete requested for {}", resource.id()))
                    }
                    Err(e) => ActionResult::failure(e),
                }
            }
            Some(other) => ActionResult::failure(Error::Misconfigured(format!(
                "unknown CloudFormation operation {}",
                other
            ))),
            None => ActionResult::failure(Error::Misconfigured(format!(
                "exec action '{}' reached the CloudFormation executor",
                action.name
            ))),
        }
    }
}

struct StackResourceDao {
    client: Arc<AwsClient>,
    stack: String,
}

#[async_trait]
impl Dao for StackResourceDao {
    // List only: stack resources are a summary API with no Get/Delete.

    async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
        let params = vec![("StackName".to_string(), self.stack.clone())];
        let response = self
            .client
            .query(SERVICE, "ListStackResources", API_VERSION, &params)
            .await?;

        Ok(items_at(
            &response,
            "ListStackResourcesResponse.ListStackResourcesResult.StackResourceSummaries.member",
        )
        .into_iter()
        .map(|item| {
            Box::new(JsonResource::new(
                item,
                "LogicalResourceId",
                "LogicalResourceId",
                "",
            )) as Box<dyn Resource>
        })
        .collect())
    }
}

struct StackResourceRenderer;

impl Renderer for StackResourceRenderer {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("Logical ID", 28, 0, |r| r.id().to_string()),
            Column::new("Type", 32, 1, |r| or_dash(field(r.raw(), "ResourceType"))),
            Column::new("Status", 22, 2, |r| {
                or_dash(field(r.raw(), "ResourceStatus"))
            }),
            Column::new("Physical ID", 40, 3, |r| {
                or_dash(field(r.raw(), "PhysicalResourceId"))
            }),
        ]
    }

    fn navigate(&self, resource: &dyn Resource) -> Option<NavTarget> {
        cloudformation_target(
            &field(resource.raw(), "ResourceType"),
            &field(resource.raw(), "PhysicalResourceId"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stack_arn_is_the_stack_id() {
        let r = stack_resource(json!({
            "StackName": "app",
            "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/app/uuid",
            "StackStatus": "CREATE_COMPLETE"
        }));
        assert_eq!(r.id(), "app");
        assert!(r.arn().starts_with("arn:aws:cloudformation"));
    }

    #[test]
    fn stack_resources_navigate_to_what_they_model() {
        let renderer = StackResourceRenderer;
        let instance = JsonResource::new(
            json!({
                "LogicalResourceId": "WebServer",
                "ResourceType": "AWS::EC2::Instance",
                "PhysicalResourceId": "i-0abc"
            }),
            "LogicalResourceId",
            "LogicalResourceId",
            "",
        );
        assert_eq!(
            renderer.navigate(&instance),
            Some(NavTarget::new("ec2", "instances", "i-0abc"))
        );

        let role = JsonResource::new(
            json!({
                "LogicalResourceId": "AppRole",
                "ResourceType": "AWS::IAM::Role",
                "PhysicalResourceId": "app-role"
            }),
            "LogicalResourceId",
            "LogicalResourceId",
            "",
        );
        assert_eq!(renderer.navigate(&role), None);
    }

    #[test]
    fn stacks_drill_into_their_resources() {
        let renderer = StackRenderer;
        let stack = stack_resource(json!({"StackName": "app"}));
        assert_eq!(
            renderer.drill(&stack),
            Some(NavTarget::new("cloudformation", "stack-resources", "app"))
        );
    }
}
