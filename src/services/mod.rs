//! Per-service packages
//!
//! Each module is one plugin into the framework registry: a DAO, a
//! resource wrapper, a renderer, and the actions with their executor.
//! Adding a service means adding a module here and calling its
//! `register` from [`register_all`].

pub mod cloudformation;
pub mod compute_optimizer;
pub mod ec2;
pub mod s3;
pub mod sqs;

use crate::framework::registry::{Registry, RegistryBuilder};

/// View shown at startup
pub const DEFAULT_VIEW: (&str, &str) = ("ec2", "instances");

/// Build the registry with every service registered. This is the only
/// write phase the registry ever sees.
pub fn build_registry() -> Registry {
    let mut builder = Registry::builder();
    cloudformation::register(&mut builder);
    compute_optimizer::register(&mut builder);
    ec2::register(&mut builder);
    s3::register(&mut builder);
    sqs::register(&mut builder);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_view_has_a_renderer() {
        let registry = build_registry();
        for key in registry.view_keys() {
            let (service, resource) = key.split_once('/').expect("keys are service/resource");
            assert!(
                registry.renderer(service, resource).is_some(),
                "view {} has no renderer",
                key
            );
        }
    }

    #[test]
    fn default_view_is_registered() {
        let registry = build_registry();
        assert!(registry.has_view(DEFAULT_VIEW.0, DEFAULT_VIEW.1));
    }

    #[test]
    fn every_registered_action_is_well_formed() {
        let registry = build_registry();
        for key in registry.view_keys() {
            let (service, resource) = key.split_once('/').unwrap();
            for action in registry.actions(service, resource).unwrap_or(&[]) {
                assert!(
                    registry.authorize(action).is_ok(),
                    "action '{}' on {} failed validation",
                    action.name,
                    key
                );
            }
        }
    }
}
