//! The postback state machine and pagination engine.
//!
//! ASP.NET WebForms pages have no API: every query and every page of
//! results is a full POST carrying hidden anti-tampering tokens plus the
//! filter fields, and the tokens rotate with every response. This module
//! encodes the registry's postback contract as fixed knowledge:
//!
//! - [`session`] owns the mutable form payload and performs the
//!   bootstrap/submit protocol;
//! - [`page`] parses one response body into records plus pager position;
//! - [`driver`] loops submit → parse → advance until the pager is done.

pub mod driver;
pub mod page;
pub mod session;

/// Fixed form URL of the registry's lookup page.
pub const FORM_URL: &str =
    "http://hnfe.sefaz.ba.gov.br/servicos/nfenc/Modulos/Geral/NFENC_consulta_cadastro_ccc.aspx";

/// Hidden-state tokens embedded in every response and echoed back verbatim.
/// Submitting stale values desynchronizes the remote session.
pub const HIDDEN_FIELDS: [&str; 3] = ["__VIEWSTATE", "__VIEWSTATEGENERATOR", "__EVENTVALIDATION"];

/// Always-empty WebForms control field.
pub const VIEWSTATE_ENCRYPTED: &str = "__VIEWSTATEENCRYPTED";
/// Which server-side control triggered the postback.
pub const EVENT_TARGET: &str = "__EVENTTARGET";
/// Argument for the triggering control (`Page$<N>` for the pager).
pub const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

/// CNPJ filter input.
pub const FIELD_CNPJ: &str = "txtCNPJ";
/// IE filter input.
pub const FIELD_IE: &str = "txtie";
/// State filter dropdown; empty means all states.
pub const FIELD_UF: &str = "CmdUF";
/// Status filter dropdown. Opaque remote code.
pub const FIELD_SITUACAO: &str = "CmdSituacao";
/// Status code meaning "all statuses".
pub const SITUACAO_ALL: &str = "99";

/// One-shot filter trigger. Must appear on the first POST of a query and
/// never again: repeating it re-applies default filters and corrupts
/// subsequent pagination.
pub const APPLY_FILTER: &str = "AplicarFiltro";
/// Submit-button value the form expects for the trigger.
pub const APPLY_FILTER_VALUE: &str = "Aplicar+Filtro";

/// Element id of the results table.
pub const GRID_ID: &str = "Grid";
/// Event target that drives the grid pager.
pub const PAGER_TARGET: &str = "Grid";

/// Event argument selecting a specific grid page.
pub fn page_argument(page: u32) -> String {
    format!("Page${page}")
}
