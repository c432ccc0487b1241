use std::path::Path;
use std::sync::Arc;

pub fn run(root: &Path, port: u16, refresh: bool) -> anyhow::Result<()> {
    let catalog = Arc::new(super::open_catalog(root)?);

    if refresh || catalog.is_stale() {
        match catalog.refresh(None) {
            Ok(report) => tracing::info!(indexed = report.indexed, "index built"),
            Err(e) => tracing::warn!("initial refresh failed, serving cached index: {e}"),
        }
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result: anyhow::Result<()> = rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!("Subagent catalog → http://localhost:{actual_port}/api/subagents");

        tokio::select! {
            res = catalog_server::serve_on(catalog.clone(), listener) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    });

    if let Err(e) = catalog.close() {
        tracing::warn!("failed to flush cache: {e}");
    }
    result
}
