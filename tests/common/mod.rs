//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::Write;
use std::sync::Once;
use tempfile::NamedTempFile;

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Write a config file, optionally routing Discord API calls through `proxy`
pub fn config_file(token: &str, proxy: Option<&str>) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "BibleBot:\n  token: {}\nmeta:\n  version: 9.0.0\n", token).expect("write config");
    if let Some(proxy) = proxy {
        write!(file, "discord:\n  proxy: {}\n", proxy).expect("write config");
    }
    file
}
