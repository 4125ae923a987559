//! `cadastro ie <NUMBER>` / `cadastro cnpj <NUMBER>` — single-field lookups.

use crate::cli::output;
use crate::client::CadastroClient;
use crate::config::ClientConfig;
use anyhow::Result;

/// Run a lookup by state registration number.
pub async fn run_ie(ie: &str, config: ClientConfig) -> Result<()> {
    let client = CadastroClient::new(config)?;
    let records = client.find_by_ie(ie).await?;
    output::print_records(&records);
    Ok(())
}

/// Run a lookup by CNPJ.
pub async fn run_cnpj(cnpj: &str, config: ClientConfig) -> Result<()> {
    let client = CadastroClient::new(config)?;
    let records = client.find_by_cnpj(cnpj).await?;
    output::print_records(&records);
    Ok(())
}
