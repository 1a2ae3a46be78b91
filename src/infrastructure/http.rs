use crate::services::transfer::HttpTransferService;
use std::sync::Arc;

pub fn setup_http_client() -> anyhow::Result<Arc<HttpTransferService>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()?;

    Ok(Arc::new(HttpTransferService::new(client)))
}
