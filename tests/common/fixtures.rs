use std::collections::BTreeMap;

use helmscan::{
  classify::Classifier,
  config::ClassifierConfig,
  fleet::{ClusterSpec, FleetSpec, ZoneSpec},
};

/// A CRD served only from `apiextensions.k8s.io/v1beta1`, removed in 1.22
pub fn removed_crd(name: &str) -> String {
  format!(
    r#"---
# Source: {name}/templates/crd.yaml
apiVersion: apiextensions.k8s.io/v1beta1
kind: CustomResourceDefinition
metadata:
  name: {name}
spec:
  group: example.com
  scope: Namespaced
"#
  )
}

/// Resources on current APIs only
pub const CURRENT_MANIFESTS: &str = r#"---
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  ports:
    - port: 80
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 2
---
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: gadgets.example.com
"#;

/// A removed Ingress and a deprecated CronJob, but no CRDs
pub const REMOVED_WORKLOADS: &str = r#"---
apiVersion: networking.k8s.io/v1beta1
kind: Ingress
metadata:
  name: public
---
apiVersion: batch/v1beta1
kind: CronJob
metadata:
  name: nightly
"#;

/// The default classifier: Kubernetes v1.23.0, removed APIs only
pub fn classifier() -> Classifier {
  Classifier::from_config(&ClassifierConfig::default()).unwrap()
}

pub fn cluster(chart: &str) -> ClusterSpec {
  ClusterSpec {
    chart: chart.to_string(),
    name: chart.to_string(),
    ..Default::default()
  }
}

/// Builds a fleet from `(zone, [(cluster name, spec)])` pairs
pub fn fleet(zones: Vec<(&str, Vec<(&str, ClusterSpec)>)>) -> FleetSpec {
  FleetSpec {
    zones: zones
      .into_iter()
      .map(|(zone, clusters)| {
        (
          zone.to_string(),
          ZoneSpec {
            clusters: clusters
              .into_iter()
              .map(|(name, spec)| (name.to_string(), spec))
              .collect::<BTreeMap<_, _>>(),
            ..Default::default()
          },
        )
      })
      .collect(),
  }
}
