//! Output helpers shared by the CLI commands.
//!
//! Global flags are stored as environment variables by `main` so every
//! module can check them without threading state around.

use crate::types::Registration;

/// Whether `--json` was passed.
pub fn is_json() -> bool {
    std::env::var("CADASTRO_JSON").is_ok()
}

/// Whether `--quiet` was passed.
pub fn is_quiet() -> bool {
    std::env::var("CADASTRO_QUIET").is_ok()
}

/// Print a result set as JSON or an aligned text table.
pub fn print_records(records: &[Registration]) {
    if is_json() {
        match serde_json::to_string_pretty(records) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("  Error: failed to serialize results: {e}"),
        }
        return;
    }

    if records.is_empty() {
        if !is_quiet() {
            println!("  No registrations found.");
        }
        return;
    }

    let cnpj_w = width(records.iter().map(|r| r.cnpj.len()), 14);
    let ie_w = width(records.iter().map(|r| r.ie.len()), 9);
    let name_w = width(records.iter().map(|r| r.razao_social.len()), 12);

    println!(
        "  {:<cnpj_w$}  {:<ie_w$}  {:<name_w$}  {:<2}  {}",
        "CNPJ", "IE", "RAZAO SOCIAL", "UF", "SITUACAO"
    );
    for r in records {
        println!(
            "  {:<cnpj_w$}  {:<ie_w$}  {:<name_w$}  {:<2}  {}",
            r.cnpj, r.ie, r.razao_social, r.uf, r.situacao
        );
    }
    if !is_quiet() {
        println!("  {} registration(s)", records.len());
    }
}

fn width(lens: impl Iterator<Item = usize>, min: usize) -> usize {
    lens.max().unwrap_or(0).max(min)
}
