use anyhow::Context;
use northfall_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let port = port.unwrap_or(config.server.port);
    let root_buf = root.to_path_buf();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        println!("Northfall job server → ws://localhost:{port}/api/jobs/ws");
        tokio::select! {
            res = northfall_server::serve(root_buf, port, config.executor) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
