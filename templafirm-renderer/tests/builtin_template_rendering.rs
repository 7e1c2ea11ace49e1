//! Bundled provider templates must render to the expected Terraform.

use std::path::Path;

use rstest::rstest;
use serde_json::json;
use templafirm_core::{BuiltinKind, BuiltinProvider, Provider};
use templafirm_renderer::{RenderError, TemplateEngine, TemplateInputs};

const GKE_NODE_POOL_EXPECTED: &str = r#"module "mrdma_node_pool" {
  source = "../../modules/mrdma_node_pool/"

  account_id                        = "test-project"
  autoscaling                       = {
    total_min_node_count = "0"
    total_max_node_count = "4"
  }
  cluster_name                      = "test_cluster"
  disk_size                         = "100"
  disk_type                         = "fast"
  ephemeral_storage_local_ssd_count = "0"
  gpu_accelerator                   = {
    count = "1"
    type  = "h200"
  }
  image_type                        = "image_type"
  labels                            = {"label":"label"}
  machine_type                      = "a3-ultragpu-8g"
  node_pool_name                    = "test-node-pool"
  node_region                       = "us-central1"
  node_sa_email                     = "somebody@email.com"
  node_zone                         = "b"
  placement_policy                  = {
    type = "COMPACT"
  }
  reservation_affinity              = {
    type         = "SPECIFIC_RESERVATION"
    reservations = ["test_id"]
  }
}"#;

fn gke_node_pool_inputs() -> TemplateInputs {
    let value = json!({
        "cluster_name": "test_cluster",
        "disk_size": "100",
        "dist_type": "fast",
        "ephemeral_storage_local_ssd_count": "0",
        "gcp_project_id": "test-project",
        "gpu_accelerator_count": "1",
        "gpu_accelerator_type": "h200",
        "image_type": "image_type",
        "labels": {"label": "label"},
        "machine_type": "a3-ultragpu-8g",
        "node_pool_name": "test-node-pool",
        "node_region": "us-central1",
        "node_sa_email": "somebody@email.com",
        "node_zone": "b",
        "placement_policy_type": "COMPACT",
        "reservation_ids": ["test_id"],
        "reservation_type": "SPECIFIC_RESERVATION",
        "total_max_node_count": "4",
        "total_min_node_count": "0",
    });
    serde_json::from_value(value).expect("inputs")
}

fn engine_for(kind: BuiltinKind) -> (BuiltinProvider, TemplateEngine) {
    let provider = BuiltinProvider::embedded(kind).expect("provider");
    let engine = TemplateEngine::for_provider(&provider);
    (provider, engine)
}

#[test]
fn gke_mrdma_node_pool_renders_terraform_module() {
    let (provider, mut engine) = engine_for(BuiltinKind::Gke);
    let resource = provider.resource("mrdma_node_pool").expect("resource");
    let rendered = engine
        .render_resource(resource, &gke_node_pool_inputs())
        .expect("render");
    assert_eq!(rendered, GKE_NODE_POOL_EXPECTED);
}

#[test]
fn gke_disk_copy_renders_identically() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../templafirm-core/templates");
    let provider = BuiltinProvider::load_from(BuiltinKind::Gke, &root).expect("provider");
    let mut engine = TemplateEngine::for_provider(&provider);
    assert!(!engine.is_embedded());

    let resource = provider.resource("mrdma_node_pool").expect("resource");
    let rendered = engine
        .render_resource(resource, &gke_node_pool_inputs())
        .expect("render");
    assert_eq!(rendered, GKE_NODE_POOL_EXPECTED);
}

#[test]
fn gke_template_only_references_declared_inputs() {
    let (provider, mut engine) = engine_for(BuiltinKind::Gke);
    let resource = provider.resource("mrdma_node_pool").expect("resource");
    let declared: TemplateInputs = gke_node_pool_inputs()
        .into_iter()
        .filter(|(k, _)| resource.template_inputs.contains(k))
        .collect();
    assert_eq!(declared.len(), resource.template_inputs.len());
    engine.render_resource(resource, &declared).expect("render with declared inputs only");
}

#[rstest]
#[case("cluster_name")]
#[case("labels")]
#[case("reservation_ids")]
fn gke_missing_input_fails(#[case] dropped: &str) {
    let (provider, mut engine) = engine_for(BuiltinKind::Gke);
    let resource = provider.resource("mrdma_node_pool").expect("resource");
    let mut inputs = gke_node_pool_inputs();
    inputs.remove(dropped);

    let err = engine.render_resource(resource, &inputs).unwrap_err();
    assert!(matches!(err, RenderError::Tera(_)));
    assert!(err.detail().contains(dropped), "detail: {}", err.detail());
}

#[test]
fn eai_mrdma_node_pool_renders_without_inputs() {
    let (provider, mut engine) = engine_for(BuiltinKind::Eai);
    let resource = provider.resource("mrdma_node_pool").expect("resource");
    let rendered = engine
        .render_resource(resource, &TemplateInputs::new())
        .expect("render");
    assert!(rendered.starts_with("module \"eai_mrdma_node_pool\""));
    assert!(!rendered.contains("{{"));
}
