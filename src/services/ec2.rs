//! EC2 instances
//!
//! Query-protocol DAO over DescribeInstances with page-by-page
//! retrieval, lifecycle actions (start/stop/terminate), and shell
//! actions for SSM sessions and the console.

use crate::aws::client::AwsClient;
use crate::framework::action::{Action, ActionResult, ConfirmLevel};
use crate::framework::dao::{list_all, Dao, Op, Page};
use crate::framework::error::{Error, Result};
use crate::framework::registry::{Executor, RegistryBuilder, ViewScope};
use crate::framework::render::{detail_section, format_tags, or_dash, Column, Renderer};
use crate::framework::resource::{field, items_at, JsonResource, Resource, Tags};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const SERVICE: &str = "ec2";
const RESOURCE: &str = "instances";
const API_VERSION: &str = "2016-11-15";

/// DescribeInstances accepts MaxResults between 5 and 1000.
const MIN_PAGE_SIZE: usize = 5;
const MAX_PAGE_SIZE: usize = 1000;

pub fn register(builder: &mut RegistryBuilder) {
    builder.register_view(SERVICE, RESOURCE, "EC2 Instances");
    builder.register_dao(
        SERVICE,
        RESOURCE,
        Box::new(|client, _scope: &ViewScope| Ok(Box::new(InstanceDao { client }) as Box<dyn Dao>)),
    );
    builder.register_renderer(SERVICE, RESOURCE, Box::new(|| Box::new(InstanceRenderer)));
    builder.register_actions(
        SERVICE,
        RESOURCE,
        vec![
            Action::api("Start", 'S', "StartInstances").confirm(ConfirmLevel::Simple),
            Action::api("Stop", 'P', "StopInstances").confirm(ConfirmLevel::Simple),
            Action::api("Terminate", 'X', "TerminateInstances").confirm(ConfirmLevel::Dangerous),
            Action::exec("Shell", 's', "aws ssm start-session --target ${ID}"),
            Action::exec(
                "Open Console",
                'o',
                "xdg-open 'https://${REGION}.console.aws.amazon.com/ec2/home?region=${REGION}#InstanceDetails:instanceId=${ID}'",
            ),
        ],
    );
    builder.register_executor(SERVICE, RESOURCE, Arc::new(InstanceExecutor));
}

#[derive(Debug)]
struct InstanceResource {
    base: JsonResource,
    region: String,
}

impl InstanceResource {
    fn new(item: Value, region: &str) -> Self {
        Self {
            base: JsonResource::new(item, "instanceId", "", ""),
            region: region.to_string(),
        }
    }
}

impl Resource for InstanceResource {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn name(&self) -> &str {
        self.base.name()
    }

    fn tags(&self) -> Tags {
        self.base.tags()
    }

    fn raw(&self) -> &Value {
        self.base.raw()
    }

    fn template_var(&self, name: &str) -> Option<String> {
        let value = match name {
            "PRIVATE_IP" => field(self.raw(), "privateIpAddress"),
            "PUBLIC_IP" => field(self.raw(), "ipAddress"),
            "REGION" => self.region.clone(),
            _ => return None,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

struct InstanceDao {
    client: Arc<AwsClient>,
}

impl InstanceDao {
    /// DescribeInstances nests instances inside reservations.
    fn collect(&self, response: &Value) -> Vec<Box<dyn Resource>> {
        let mut resources: Vec<Box<dyn Resource>> = Vec::new();
        for reservation in items_at(response, "DescribeInstancesResponse.reservationSet.item") {
            for instance in items_at(&reservation, "instancesSet.item") {
                resources.push(Box::new(InstanceResource::new(
                    instance,
                    self.client.region(),
                )));
            }
        }
        resources
    }
}

#[async_trait]
impl Dao for InstanceDao {
    fn supports(&self, op: Op) -> bool {
        matches!(op, Op::List | Op::ListPage | Op::Get | Op::Delete)
    }

    async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
        list_all(self, MAX_PAGE_SIZE).await
    }

    async fn list_page(&self, page_size: usize, token: Option<&str>) -> Result<Page> {
        let mut params = vec![(
            "MaxResults".to_string(),
            page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE).to_string(),
        )];
        if let Some(token) = token {
            params.push(("NextToken".to_string(), token.to_string()));
        }

        let response = self
            .client
            .query(SERVICE, "DescribeInstances", API_VERSION, &params)
            .await?;

        let next = field(&response, "DescribeInstancesResponse.nextToken");
        Ok(Page {
            resources: self.collect(&response),
            next_token: if next.is_empty() { None } else { Some(next) },
        })
    }

    async fn get(&self, id: &str) -> Result<Box<dyn Resource>> {
        let params = vec![("InstanceId.1".to_string(), id.to_string())];
        let response = self
            .client
            .query(SERVICE, "DescribeInstances", API_VERSION, &params)
            .await?;

        self.collect(&response)
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                what: format!("instance {}", id),
            })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let params = vec![("InstanceId.1".to_string(), id.to_string())];
        match self
            .client
            .query(SERVICE, "TerminateInstances", API_VERSION, &params)
            .await
        {
            Ok(_) => Ok(()),
            // Terminating an already-gone instance is already done.
            Err(Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

struct InstanceRenderer;

impl Renderer for InstanceRenderer {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("Instance ID", 20, 0, |r| r.id().to_string()),
            Column::new("Name", 24, 1, |r| or_dash(r.name().to_string())),
            Column::new("State", 11, 2, |r| {
                or_dash(field(r.raw(), "instanceState.name"))
            }),
            Column::new("Type", 12, 3, |r| or_dash(field(r.raw(), "instanceType"))),
            Column::new("Private IP", 15, 4, |r| {
                or_dash(field(r.raw(), "privateIpAddress"))
            }),
            Column::new("AZ", 15, 5, |r| {
                or_dash(field(r.raw(), "placement.availabilityZone"))
            }),
            Column::new("Public IP", 15, 6, |r| or_dash(field(r.raw(), "ipAddress"))),
        ]
    }

    fn render_detail(&self, resource: &dyn Resource) -> String {
        let raw = resource.raw();
        let mut out = detail_section(
            "Instance",
            &[
                ("ID", resource.id().to_string()),
                ("Name", resource.name().to_string()),
                ("State", field(raw, "instanceState.name")),
                ("Type", field(raw, "instanceType")),
                ("Launched", field(raw, "launchTime")),
            ],
        );
        out.push('\n');
        out.push_str(&detail_section(
            "Network",
            &[
                ("AZ", field(raw, "placement.availabilityZone")),
                ("VPC", field(raw, "vpcId")),
                ("Subnet", field(raw, "subnetId")),
                ("Private IP", field(raw, "privateIpAddress")),
                ("Public IP", field(raw, "ipAddress")),
            ],
        ));

        let tags = resource.tags();
        if !tags.is_empty() {
            out.push('\n');
            out.push_str("Tags\n");
            out.push_str(&format!("  {}\n", format_tags(&tags)));
        }
        out
    }
}

struct InstanceExecutor;

#[async_trait]
impl Executor for InstanceExecutor {
    async fn execute(
        &self,
        client: &AwsClient,
        action: &Action,
        resource: &dyn Resource,
    ) -> ActionResult {
        let Some(operation) = action.operation() else {
            return ActionResult::failure(Error::Misconfigured(format!(
                "exec action '{}' reached the EC2 executor",
                action.name
            )));
        };

        match operation {
            "StartInstances" | "StopInstances" | "TerminateInstances" => {
                let params = vec![("InstanceId.1".to_string(), resource.id().to_string())];
                match client.query(SERVICE, operation, API_VERSION, &params).await {
                    Ok(_) => ActionResult::success(format!(
                        "{} requested for {}",
                        action.name, resource.id()
                    )),
                    Err(e) => ActionResult::failure(e),
                }
            }
            other => ActionResult::failure(Error::Misconfigured(format!(
                "unknown EC2 operation {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(value: Value) -> InstanceResource {
        InstanceResource::new(value, "us-east-1")
    }

    #[test]
    fn name_comes_from_the_name_tag() {
        let r = instance(json!({
            "instanceId": "i-0abc",
            "tagSet": {"item": [{"Key": "Name", "Value": "api-1"}]}
        }));
        assert_eq!(r.id(), "i-0abc");
        assert_eq!(r.name(), "api-1");
    }

    #[test]
    fn template_vars_cover_addresses_and_region() {
        let r = instance(json!({
            "instanceId": "i-0abc",
            "privateIpAddress": "10.0.0.5",
        }));
        assert_eq!(r.template_var("PRIVATE_IP").as_deref(), Some("10.0.0.5"));
        assert_eq!(r.template_var("PUBLIC_IP"), None);
        assert_eq!(r.template_var("REGION").as_deref(), Some("us-east-1"));
        assert_eq!(r.template_var("CLUSTER"), None);
    }

    #[test]
    fn row_renders_state_and_placement() {
        let r = instance(json!({
            "instanceId": "i-0abc",
            "instanceState": {"code": "16", "name": "running"},
            "instanceType": "t3.micro",
            "placement": {"availabilityZone": "us-east-1a"}
        }));
        let row = InstanceRenderer.render_row(&r);
        assert_eq!(row[0], "i-0abc");
        assert_eq!(row[2], "running");
        assert_eq!(row[3], "t3.micro");
        assert_eq!(row[6], "-");
    }
}
