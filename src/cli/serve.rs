//! Serve command: run the control API until interrupted

use std::path::Path;

use anyhow::{Result, anyhow};

use kidbank::api::{self, ApiState};

pub fn serve_command(config_path: Option<&Path>, port: Option<u16>) -> Result<()> {
    let (config, economy) = super::open_economy(config_path)?;
    let port = port.unwrap_or(config.server.port);
    let token = Some(config.server.auth_token.clone());

    let state = ApiState::new(economy, tokio::runtime::Handle::current());
    let handle = api::start_server(state, port, token)?;
    println!("Listening on http://127.0.0.1:{} (Ctrl-C to stop)", port);

    handle
        .join()
        .map_err(|_| anyhow!("Server thread panicked"))
}
