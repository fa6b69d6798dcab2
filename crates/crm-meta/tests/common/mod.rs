use std::sync::Arc;

use crm_backend_fake::FakeBackend;
use crm_client::{Doc, FailureReporter};
use crm_meta::{DisplayDefaults, MetaCache};

pub fn cache(backend: FakeBackend) -> (Arc<MetaCache<FakeBackend>>, Arc<FakeBackend>, FailureReporter) {
    let backend = Arc::new(backend);
    let reporter = FailureReporter::new();
    let cache = MetaCache::new(Arc::clone(&backend), reporter.clone(), DisplayDefaults::default());
    (Arc::new(cache), backend, reporter)
}

pub fn doc(value: serde_json::Value) -> Doc {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}
