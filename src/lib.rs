// Copyright 2026 cadastro-ie contributors
// SPDX-License-Identifier: MIT

//! Client library for the Bahia SEFAZ state-registration (Inscrição
//! Estadual) registry, which is exposed only through a legacy ASP.NET
//! WebForms page.
//!
//! The crate drives the site's implicit postback "API": bootstrap hidden
//! form state with a GET, submit filtered queries as form-encoded POSTs
//! carrying the rotating anti-tampering tokens, parse the rendered grid,
//! and replay the `__EVENTTARGET`/`__EVENTARGUMENT` pager convention until
//! every result page is consumed.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod markup;
pub mod postback;
pub mod transport;
pub mod types;

pub use client::CadastroClient;
pub use config::ClientConfig;
pub use error::ScrapeError;
pub use postback::driver::{CancelFlag, QueryOutcome};
pub use types::{QueryFilters, Registration};
