//! `cadastro search` — general filtered query.

use crate::cli::output;
use crate::client::CadastroClient;
use crate::config::ClientConfig;
use crate::types::QueryFilters;
use anyhow::{bail, Result};

/// Run a general search with any combination of filters.
pub async fn run(
    cnpj: Option<String>,
    ie: Option<String>,
    uf: Option<String>,
    situacao: Option<String>,
    config: ClientConfig,
) -> Result<()> {
    if cnpj.is_none() && ie.is_none() && uf.is_none() && situacao.is_none() {
        bail!("provide at least one filter (--cnpj, --ie, --uf, --situacao)");
    }

    let filters = QueryFilters {
        cnpj,
        ie,
        uf,
        situacao,
    };

    let client = CadastroClient::new(config)?;
    let records = client.search(&filters).await?;
    output::print_records(&records);
    Ok(())
}
