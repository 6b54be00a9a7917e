//! Party distribution charts
//!
//! The HTML page draws horizontal bars from the same data served as JSON at
//! `/graficos/partidos.json`.

use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde::Serialize;

use legis_common::db::charts::{deputies_per_party, party_geography, proposals_per_party, PartyCount, PartyGeography};
use legis_common::db::deputies::{count_deputies, DeputyFilter};
use legis_common::db::parties::count_parties;

use crate::html::{escape, page, table};
use crate::{AppState, WebResult};

const TOP_PARTIES: i64 = 10;
const UFS_PER_PARTY: i64 = 5;

/// Bar colours, cycled per label
const PALETTE: [&str; 20] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF", "#4BC0C0", "#FF6384",
    "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6384", "#C9CBCF", "#4BC0C0", "#FF6384", "#36A2EB",
];

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
    pub colors: Vec<String>,
}

impl ChartSeries {
    fn from_counts(counts: &[PartyCount]) -> Self {
        Self {
            labels: counts.iter().map(|c| c.sigla.clone()).collect(),
            data: counts.iter().map(|c| c.total).collect(),
            colors: palette(counts.len()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartySize {
    pub sigla: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartyChartData {
    pub deputados_por_partido: ChartSeries,
    pub proposicoes_por_partido: ChartSeries,
    pub distribuicao_geografica: Vec<PartyGeography>,
    pub total_deputados: i64,
    pub total_partidos: i64,
    pub partidos_com_deputados: i64,
    pub maior_partido: Option<PartySize>,
    pub menor_partido: Option<PartySize>,
}

/// Colours for `count` labels, repeating the palette when there are more
/// labels than colours
pub fn palette(count: usize) -> Vec<String> {
    PALETTE.iter().cycle().take(count).map(|c| c.to_string()).collect()
}

pub fn chart_routes() -> Router<AppState> {
    Router::new()
        .route("/graficos/partidos/", get(party_chart_page))
        .route("/graficos/partidos.json", get(party_chart_json))
}

async fn load_chart_data(state: &AppState) -> WebResult<PartyChartData> {
    let per_party = deputies_per_party(&state.db).await?;
    let by_proposals = proposals_per_party(&state.db, TOP_PARTIES).await?;
    let top: Vec<PartyCount> = per_party.iter().take(TOP_PARTIES as usize).cloned().collect();
    let geography = party_geography(&state.db, &top, UFS_PER_PARTY).await?;

    let total_deputados = count_deputies(&state.db, &DeputyFilter::default()).await?;
    let total_partidos = count_parties(&state.db).await?;

    let size = |c: &PartyCount| PartySize {
        sigla: c.sigla.clone(),
        total: c.total,
    };

    Ok(PartyChartData {
        deputados_por_partido: ChartSeries::from_counts(&per_party),
        proposicoes_por_partido: ChartSeries::from_counts(&by_proposals),
        distribuicao_geografica: geography,
        total_deputados,
        total_partidos,
        partidos_com_deputados: per_party.len() as i64,
        maior_partido: per_party.first().map(size),
        menor_partido: per_party.last().map(size),
    })
}

/// GET /graficos/partidos.json
pub async fn party_chart_json(State(state): State<AppState>) -> WebResult<Json<PartyChartData>> {
    Ok(Json(load_chart_data(&state).await?))
}

fn bars(series: &ChartSeries) -> String {
    let max = series.data.iter().copied().max().unwrap_or(0).max(1);
    let rows: Vec<Vec<String>> = series
        .labels
        .iter()
        .zip(&series.data)
        .zip(&series.colors)
        .map(|((label, value), color)| {
            let width = value * 100 / max;
            vec![
                escape(label),
                format!(
                    r#"<span class="bar" style="width: {}%; background: {}"></span> {}"#,
                    width, color, value
                ),
            ]
        })
        .collect();
    table(&["Partido", "Total"], &rows, "Sem dados.")
}

/// GET /graficos/partidos/
pub async fn party_chart_page(State(state): State<AppState>) -> WebResult<Html<String>> {
    let data = load_chart_data(&state).await?;

    let party_size = |p: &Option<PartySize>| {
        p.as_ref()
            .map(|p| format!("{} ({})", escape(&p.sigla), p.total))
            .unwrap_or_else(|| "-".to_string())
    };

    let geography: Vec<Vec<String>> = data
        .distribuicao_geografica
        .iter()
        .map(|g| {
            let ufs: Vec<String> = g.ufs.iter().map(|u| format!("{} ({})", escape(&u.uf), u.total)).collect();
            vec![escape(&g.partido), ufs.join(", ")]
        })
        .collect();

    let content = format!(
        r#"<div class="stats">
    <div class="stat"><strong>{total_deputados}</strong>Deputados</div>
    <div class="stat"><strong>{total_partidos}</strong>Partidos</div>
    <div class="stat"><strong>{com_deputados}</strong>Partidos com deputados</div>
    <div class="stat"><strong>{maior}</strong>Maior bancada</div>
    <div class="stat"><strong>{menor}</strong>Menor bancada</div>
</div>
<h2>Deputados por partido</h2>
{deputados}
<h2>Proposições por partido</h2>
{proposicoes}
<h2>Distribuição geográfica</h2>
{geografia}
<p class="meta"><a href="/graficos/partidos.json">Dados em JSON</a></p>"#,
        total_deputados = data.total_deputados,
        total_partidos = data.total_partidos,
        com_deputados = data.partidos_com_deputados,
        maior = party_size(&data.maior_partido),
        menor = party_size(&data.menor_partido),
        deputados = bars(&data.deputados_por_partido),
        proposicoes = bars(&data.proposicoes_por_partido),
        geografia = table(&["Partido", "UFs"], &geography, "Sem dados."),
    );
    Ok(Html(page("Deputados por Partido", &content)))
}
