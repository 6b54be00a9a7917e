//! One module per CLI subcommand
//!
//! Every command takes the pool, whatever clients it needs and an output
//! sink for the operator report, and returns its counters.

pub mod analisar;
pub mod dashboard;
pub mod deputados;
pub mod discursos;
pub mod localidades;
pub mod migrate;
pub mod partidos;
pub mod proposicoes;
pub mod sample_news;
pub mod sexo;
pub mod tipos;
pub mod users;
