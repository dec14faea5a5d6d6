//! Cross-resource navigation
//!
//! CloudFormation stack resources name the thing they model with a type
//! string (`AWS::EC2::Instance`) and a physical id. Mapping that pair
//! onto one of our views is a pure, total function: unknown types fall
//! back to no navigation rather than an error.

/// A registered view plus the id to select in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub service: String,
    pub resource: String,
    pub id: String,
}

impl NavTarget {
    pub fn new(service: &str, resource: &str, id: &str) -> Self {
        Self {
            service: service.to_string(),
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

/// Resolve a CloudFormation resource type to the view it models.
///
/// The physical id is the view's native id for every mapped type (the
/// SQS physical id is already the queue URL our queue view keys on).
pub fn cloudformation_target(resource_type: &str, physical_id: &str) -> Option<NavTarget> {
    if physical_id.is_empty() {
        return None;
    }

    let mut parts = resource_type.split("::");
    if parts.next() != Some("AWS") {
        return None;
    }
    let service = parts.next()?;
    let kind = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let (service, resource) = match (service, kind) {
        ("EC2", "Instance") => ("ec2", "instances"),
        ("S3", "Bucket") => ("s3", "buckets"),
        ("SQS", "Queue") => ("sqs", "queues"),
        ("CloudFormation", "Stack") => ("cloudformation", "stacks"),
        _ => return None,
    };

    Some(NavTarget::new(service, resource, physical_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_resolve() {
        assert_eq!(
            cloudformation_target("AWS::EC2::Instance", "i-0abc"),
            Some(NavTarget::new("ec2", "instances", "i-0abc"))
        );
        assert_eq!(
            cloudformation_target("AWS::SQS::Queue", "https://sqs.us-east-1.amazonaws.com/1/q"),
            Some(NavTarget::new(
                "sqs",
                "queues",
                "https://sqs.us-east-1.amazonaws.com/1/q"
            ))
        );
    }

    #[test]
    fn unknown_types_fall_back_to_no_navigation() {
        assert_eq!(cloudformation_target("AWS::IAM::Role", "my-role"), None);
        assert_eq!(cloudformation_target("Custom::Thing", "x"), None);
        assert_eq!(cloudformation_target("AWS::EC2", "x"), None);
        assert_eq!(cloudformation_target("", "x"), None);
    }

    #[test]
    fn empty_physical_id_never_navigates() {
        assert_eq!(cloudformation_target("AWS::EC2::Instance", ""), None);
    }
}
