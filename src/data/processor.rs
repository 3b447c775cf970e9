//! Data Processor Module
//! Normalizes raw death records and enriches them with DIVIPOLA place names.

use polars::prelude::*;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(
        "geographic join changed the row count ({input} in, {output} out); \
         DIVIPOLA has duplicate department/municipality keys"
    )]
    JoinRowCount { input: usize, output: usize },
}

/// Cleans raw mortality records and joins them against the DIVIPOLA
/// geography reference.
pub struct RecordProcessor;

impl RecordProcessor {
    /// Normalize a raw mortality table.
    ///
    /// SEXO codes 1 and 2 become the labels "Hombre" and "Mujer"; any other
    /// value is kept as its string form so unexpected codes stay visible
    /// downstream. GRUPO_EDAD1 is defaulted to 0 where missing and coerced
    /// to an integer; non-numeric age values are a fatal error.
    pub fn normalize(df: DataFrame) -> Result<DataFrame, ProcessorError> {
        let sexo = col("SEXO").strict_cast(DataType::String);
        let normalized = df
            .lazy()
            .with_columns([
                when(sexo.clone().eq(lit("1")))
                    .then(lit("Hombre"))
                    .when(sexo.clone().eq(lit("2")))
                    .then(lit("Mujer"))
                    .otherwise(sexo)
                    .alias("SEXO"),
                col("GRUPO_EDAD1")
                    .strict_cast(DataType::Int32)
                    .fill_null(lit(0i32))
                    .alias("GRUPO_EDAD1"),
            ])
            .collect()?;

        let unrecognized = normalized
            .clone()
            .lazy()
            .filter(
                col("SEXO")
                    .neq(lit("Hombre"))
                    .and(col("SEXO").neq(lit("Mujer"))),
            )
            .collect()?
            .height();
        if unrecognized > 0 {
            warn!("{unrecognized} records carry a SEXO code outside 1/2");
        }

        Ok(normalized)
    }

    /// Attach DEPARTAMENTO and MUNICIPIO names by left-joining DIVIPOLA on
    /// the compound (department, municipality) code. Codes on both sides are
    /// coerced to integers first so `05` and `5` mean the same place.
    ///
    /// Records without a DIVIPOLA match keep null names; the join is
    /// required to preserve the record count exactly.
    pub fn enrich(mortality: DataFrame, divipola: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let input = mortality.height();

        let geography = divipola
            .clone()
            .lazy()
            .select([
                col("COD_DEPARTAMENTO").strict_cast(DataType::Int64),
                col("COD_MUNICIPIO").strict_cast(DataType::Int64),
                col("DEPARTAMENTO"),
                col("MUNICIPIO"),
            ]);

        let mut args = JoinArgs::new(JoinType::Left);
        args.maintain_order = MaintainOrderJoin::Left;

        let enriched = mortality
            .lazy()
            .with_columns([
                col("COD_DEPARTAMENTO").strict_cast(DataType::Int64),
                col("COD_MUNICIPIO").strict_cast(DataType::Int64),
            ])
            .join(
                geography,
                [col("COD_DEPARTAMENTO"), col("COD_MUNICIPIO")],
                [col("COD_DEPARTAMENTO"), col("COD_MUNICIPIO")],
                args,
            )
            .collect()?;

        let output = enriched.height();
        if output != input {
            return Err(ProcessorError::JoinRowCount { input, output });
        }

        let unmatched = enriched.column("DEPARTAMENTO")?.null_count();
        if unmatched > 0 {
            warn!("{unmatched} records have no DIVIPOLA match and keep null place names");
        }

        Ok(enriched)
    }
}
