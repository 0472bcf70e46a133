use std::path::PathBuf;

use vizeval_core::storage::{BlobStore, FsBlobStore, Namespace};

use super::super::args::CacheTarget;
use crate::exit_codes::EXIT_SUCCESS;

fn namespaces(target: &CacheTarget) -> Vec<Namespace> {
    match (target.artifacts, target.judgments) {
        (true, false) => vec![Namespace::Artifacts],
        (false, true) => vec![Namespace::Judgments],
        _ => vec![Namespace::Artifacts, Namespace::Judgments],
    }
}

fn open(target: &CacheTarget) -> anyhow::Result<FsBlobStore> {
    let root: PathBuf = match &target.cache_dir {
        Some(dir) => dir.clone(),
        None => FsBlobStore::default_root()?,
    };
    Ok(FsBlobStore::new(root))
}

pub async fn cmd_clear(target: CacheTarget) -> anyhow::Result<i32> {
    let store = open(&target)?;
    for ns in namespaces(&target) {
        let n = store.keys(ns).await?.len();
        store.clear(ns).await?;
        eprintln!(
            "cleared {} {} entries in {}",
            n,
            ns.as_str(),
            store.root().display()
        );
    }
    Ok(EXIT_SUCCESS)
}

pub async fn cmd_list(target: CacheTarget) -> anyhow::Result<i32> {
    let store = open(&target)?;
    for ns in namespaces(&target) {
        for test_id in store.keys(ns).await? {
            println!("{}\t{}", ns.as_str(), test_id);
        }
    }
    Ok(EXIT_SUCCESS)
}
