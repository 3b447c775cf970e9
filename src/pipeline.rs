//! Pipeline Module
//! Runs the full load -> normalize -> enrich -> summarize chain once at
//! startup and holds the immutable results the dashboard serves from.

use polars::prelude::DataFrame;
use thiserror::Error;
use tracing::info;

use crate::data::{ProcessorError, RecordProcessor, SourceTables};
use crate::geo::{GeoError, Geocoder};
use crate::stats::{AggregateError, Aggregator, Summaries};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Process(#[from] ProcessorError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// Everything the web layer needs, computed once before serving starts.
pub struct DashboardContext {
    /// The seven summary tables.
    pub summaries: Summaries,
    /// By-department summary with LAT/LON attached for the map.
    pub department_map: DataFrame,
    /// Number of death records after enrichment.
    pub record_count: usize,
}

impl DashboardContext {
    /// Consume the raw source tables and compute every summary the page
    /// renders from.
    pub fn build(tables: SourceTables) -> Result<Self, PipelineError> {
        let normalized = RecordProcessor::normalize(tables.mortality)?;
        let enriched = RecordProcessor::enrich(normalized, &tables.divipola)?;
        let record_count = enriched.height();

        let summaries = Aggregator::summarize(&enriched, &tables.causes)?;
        let department_map = Geocoder::attach_coordinates(&summaries.by_department)?;

        info!(
            "summarized {} death records across {} departments and {} months",
            record_count,
            summaries.by_department.height(),
            summaries.by_month.height()
        );
        Ok(Self {
            summaries,
            department_map,
            record_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{key_totals, label_totals};
    use polars::df;

    fn source_tables() -> SourceTables {
        let mortality = df!(
            "COD_DEPARTAMENTO" => [5i64, 5, 11],
            "COD_MUNICIPIO" => [1i64, 1, 1],
            "SEXO" => [1i64, 2, 1],
            "GRUPO_EDAD1" => [None::<i64>, Some(20), Some(20)],
            "COD_MUERTE" => ["X950", "I21", "X951"],
            "MES" => [3i64, 3, 4],
        )
        .unwrap();
        let causes = df!(
            "COD_MUERTE" => ["X950", "I21"],
            "DESCRIPCION" => ["Agresión con disparo de arma corta", "Infarto agudo del miocardio"],
        )
        .unwrap();
        let divipola = df!(
            "COD_DEPARTAMENTO" => [5i64, 11],
            "COD_MUNICIPIO" => [1i64, 1],
            "DEPARTAMENTO" => ["ANTIOQUIA", "BOGOTÁ, D.C."],
            "MUNICIPIO" => ["MEDELLÍN", "BOGOTÁ, D.C."],
        )
        .unwrap();

        SourceTables {
            mortality,
            causes,
            divipola,
        }
    }

    #[test]
    fn builds_the_full_context_from_raw_tables() {
        let ctx = DashboardContext::build(source_tables()).unwrap();
        assert_eq!(ctx.record_count, 3);

        let months = key_totals(&ctx.summaries.by_month, "MES").unwrap();
        assert_eq!(months, vec![(3, 2), (4, 1)]);

        let departments = label_totals(&ctx.summaries.by_department, "DEPARTAMENTO").unwrap();
        assert_eq!(
            departments,
            vec![
                ("ANTIOQUIA".to_string(), 2),
                ("BOGOTÁ, D.C.".to_string(), 1)
            ]
        );

        let ages = key_totals(&ctx.summaries.by_age_group, "GRUPO_EDAD1").unwrap();
        assert_eq!(ages, vec![(0, 1), (20, 2)]);

        assert_eq!(ctx.summaries.violent_cities.height(), 2);
    }

    #[test]
    fn map_summary_carries_coordinates() {
        let ctx = DashboardContext::build(source_tables()).unwrap();

        let lat = ctx.department_map.column("LAT").unwrap();
        let lat = lat.f64().unwrap();
        // Rows follow the by-department summary: ANTIOQUIA first.
        assert_eq!(lat.get(0), Some(7.1986));

        let bubbles = Geocoder::bubbles(&ctx.department_map).unwrap();
        assert_eq!(bubbles.len(), 2);
    }
}
