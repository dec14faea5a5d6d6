//! Compute Optimizer recommendations
//!
//! One aggregated view over the recommendation families. The fetches
//! run concurrently and tolerate partial failure; the merged rows get a
//! deterministic type-then-savings order so the table is stable
//! regardless of which family answered first.

use crate::aws::client::AwsClient;
use crate::framework::aggregate::merge_partial;
use crate::framework::dao::Dao;
use crate::framework::error::Result;
use crate::framework::registry::{RegistryBuilder, ViewScope};
use crate::framework::render::{or_dash, Column, Renderer};
use crate::framework::resource::{field, JsonResource, Resource};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const SERVICE: &str = "compute-optimizer";
const TARGET_PREFIX: &str = "ComputeOptimizerService";

/// One recommendation family: API target, the response list key, and
/// where the subject ARN lives in each item.
struct Family {
    label: &'static str,
    operation: &'static str,
    items_key: &'static str,
    arn_key: &'static str,
}

const FAMILIES: &[Family] = &[
    Family {
        label: "ec2-instance",
        operation: "GetEC2InstanceRecommendations",
        items_key: "instanceRecommendations",
        arn_key: "instanceArn",
    },
    Family {
        label: "auto-scaling-group",
        operation: "GetAutoScalingGroupRecommendations",
        items_key: "autoScalingGroupRecommendations",
        arn_key: "autoScalingGroupArn",
    },
    Family {
        label: "ebs-volume",
        operation: "GetEBSVolumeRecommendations",
        items_key: "volumeRecommendations",
        arn_key: "volumeArn",
    },
    Family {
        label: "lambda-function",
        operation: "GetLambdaFunctionRecommendations",
        items_key: "lambdaFunctionRecommendations",
        arn_key: "functionArn",
    },
    Family {
        label: "ecs-service",
        operation: "GetECSServiceRecommendations",
        items_key: "ecsServiceRecommendations",
        arn_key: "serviceArn",
    },
];

pub fn register(builder: &mut RegistryBuilder) {
    builder.register_view(SERVICE, "recommendations", "Compute Optimizer");
    builder.register_dao(
        SERVICE,
        "recommendations",
        Box::new(|client, _scope: &ViewScope| {
            Ok(Box::new(RecommendationDao { client }) as Box<dyn Dao>)
        }),
    );
    builder.register_renderer(
        SERVICE,
        "recommendations",
        Box::new(|| Box::new(RecommendationRenderer)),
    );
}

fn arn_name(arn: &str) -> &str {
    arn.rsplit(|c| c == '/' || c == ':').next().unwrap_or(arn)
}

fn estimated_savings(item: &Value) -> f64 {
    field(
        item,
        "recommendationOptions.0.savingsOpportunity.estimatedMonthlySavings.value",
    )
    .parse()
    .unwrap_or(0.0)
}

#[derive(Debug)]
struct RecommendationResource {
    base: JsonResource,
    name: String,
    savings: f64,
}

impl RecommendationResource {
    fn new(family: &Family, mut item: Value) -> Self {
        let arn = field(&item, family.arn_key);
        let savings = estimated_savings(&item);
        let name = arn_name(&arn).to_string();

        // Computed display fields, like the enriched billing rows.
        if let Some(map) = item.as_object_mut() {
            map.insert("family".to_string(), Value::String(family.label.to_string()));
            map.insert(
                "savingsDisplay".to_string(),
                Value::String(format!("${:.2}/mo", savings)),
            );
        }

        let arn_key = family.arn_key;
        Self {
            base: JsonResource::new(item, arn_key, "", arn_key),
            name,
            savings,
        }
    }
}

impl Resource for RecommendationResource {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arn(&self) -> &str {
        self.base.arn()
    }

    fn raw(&self) -> &Value {
        self.base.raw()
    }
}

struct RecommendationDao {
    client: Arc<AwsClient>,
}

impl RecommendationDao {
    async fn fetch_family(&self, family: &Family) -> Result<Vec<RecommendationResource>> {
        let target = format!("{}.{}", TARGET_PREFIX, family.operation);
        let response = self.client.json(SERVICE, &target, &json!({})).await?;

        Ok(response
            .get(family.items_key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| RecommendationResource::new(family, item.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl Dao for RecommendationDao {
    // List only; recommendations have no Get/Delete.

    async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
        let tasks: Vec<_> = FAMILIES
            .iter()
            .map(|family| self.fetch_family(family))
            .collect();

        let mut merged = merge_partial("GetRecommendations", tasks).await?;

        // Completion order is nondeterministic; pin the display order.
        merged.sort_by(|a, b| {
            let family_a = field(a.raw(), "family");
            let family_b = field(b.raw(), "family");
            family_a
                .cmp(&family_b)
                .then_with(|| {
                    b.savings
                        .partial_cmp(&a.savings)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id().cmp(b.id()))
        });

        Ok(merged
            .into_iter()
            .map(|r| Box::new(r) as Box<dyn Resource>)
            .collect())
    }
}

struct RecommendationRenderer;

impl Renderer for RecommendationRenderer {
    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("Type", 20, 0, |r| or_dash(field(r.raw(), "family"))),
            Column::new("Resource", 32, 1, |r| r.name().to_string()),
            Column::new("Finding", 18, 2, |r| or_dash(field(r.raw(), "finding"))),
            Column::new("Est. Savings", 14, 3, |r| {
                or_dash(field(r.raw(), "savingsDisplay"))
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_come_from_the_top_recommendation_option() {
        let item = json!({
            "instanceArn": "arn:aws:ec2:us-east-1:123456789012:instance/i-0abc",
            "finding": "OVER_PROVISIONED",
            "recommendationOptions": [
                {"savingsOpportunity": {"estimatedMonthlySavings": {"value": 42.5}}},
                {"savingsOpportunity": {"estimatedMonthlySavings": {"value": 10.0}}}
            ]
        });
        assert_eq!(estimated_savings(&item), 42.5);
        assert_eq!(estimated_savings(&json!({"instanceArn": "x"})), 0.0);
    }

    #[test]
    fn resource_carries_family_and_display_fields() {
        let item = json!({
            "instanceArn": "arn:aws:ec2:us-east-1:123456789012:instance/i-0abc",
            "finding": "OVER_PROVISIONED",
            "recommendationOptions": [
                {"savingsOpportunity": {"estimatedMonthlySavings": {"value": 12.0}}}
            ]
        });
        let r = RecommendationResource::new(&FAMILIES[0], item);
        assert_eq!(r.name(), "i-0abc");
        assert_eq!(field(r.raw(), "family"), "ec2-instance");
        assert_eq!(field(r.raw(), "savingsDisplay"), "$12.00/mo");
        let row = RecommendationRenderer.render_row(&r);
        assert_eq!(row[0], "ec2-instance");
        assert_eq!(row[2], "OVER_PROVISIONED");
    }

    #[test]
    fn arn_name_strips_both_separators() {
        assert_eq!(arn_name("arn:aws:lambda:us-east-1:1:function:thumbs"), "thumbs");
        assert_eq!(arn_name("arn:aws:ec2:us-east-1:1:instance/i-0abc"), "i-0abc");
    }
}
