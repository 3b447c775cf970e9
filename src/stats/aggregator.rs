//! Summary Aggregator Module
//! Builds the seven summary tables behind the dashboard views.

use polars::prelude::*;
use thiserror::Error;

/// ICD-10 prefix for firearm assault deaths, the "violent" subset.
pub const VIOLENT_CAUSE_PREFIX: &str = "X95";
/// Number of cities in the most-violent ranking.
pub const TOP_VIOLENT_CITIES: u32 = 5;
/// Number of cities in the lowest-mortality ranking.
pub const BOTTOM_CITIES: u32 = 10;
/// Number of causes in the leading-causes table.
pub const TOP_CAUSES: u32 = 10;

/// Placeholder shown when a grouping label is null.
pub const MISSING_LABEL: &str = "Sin información";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// The seven summary tables derived from the enriched death records.
///
/// Every table carries a `TOTAL` count column. Rankings are deterministic:
/// ties on `TOTAL` fall back to the display name and then the department
/// code, both ascending.
pub struct Summaries {
    /// Death counts per department name.
    pub by_department: DataFrame,
    /// Death counts per month number, ascending.
    pub by_month: DataFrame,
    /// Five cities with the most firearm assault deaths.
    pub violent_cities: DataFrame,
    /// Ten cities with the fewest total deaths.
    pub quietest_cities: DataFrame,
    /// Ten most frequent causes of death with their descriptions.
    pub leading_causes: DataFrame,
    /// Death counts per (department, sex) pair.
    pub by_sex_department: DataFrame,
    /// Death counts per age group code, ascending.
    pub by_age_group: DataFrame,
}

/// Computes grouped death counts from the enriched record table.
pub struct Aggregator;

impl Aggregator {
    /// Build every summary table in one pass over the enriched records.
    pub fn summarize(enriched: &DataFrame, causes: &DataFrame) -> Result<Summaries, AggregateError> {
        Ok(Summaries {
            by_department: Self::by_department(enriched)?,
            by_month: Self::by_month(enriched)?,
            violent_cities: Self::violent_cities(enriched)?,
            quietest_cities: Self::quietest_cities(enriched)?,
            leading_causes: Self::leading_causes(enriched, causes)?,
            by_sex_department: Self::by_sex_department(enriched)?,
            by_age_group: Self::by_age_group(enriched)?,
        })
    }

    fn by_department(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let out = df
            .clone()
            .lazy()
            .group_by_stable([col("DEPARTAMENTO")])
            .agg([len().alias("TOTAL")])
            .collect()?;
        Ok(out)
    }

    fn by_month(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let out = df
            .clone()
            .lazy()
            .group_by_stable([col("MES")])
            .agg([len().alias("TOTAL")])
            .sort(["MES"], SortMultipleOptions::default())
            .collect()?;
        Ok(out)
    }

    /// Cities are identified by their compound (department, municipality)
    /// code, so towns sharing a name in different departments are never
    /// merged. Names ride along for display.
    fn city_totals(df: &DataFrame) -> LazyFrame {
        df.clone()
            .lazy()
            .group_by_stable([col("COD_DEPARTAMENTO"), col("COD_MUNICIPIO")])
            .agg([
                col("DEPARTAMENTO").first(),
                col("MUNICIPIO").first(),
                len().alias("TOTAL"),
            ])
    }

    fn violent_cities(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let violent = df
            .clone()
            .lazy()
            .filter(
                col("COD_MUERTE")
                    .strict_cast(DataType::String)
                    .str()
                    .starts_with(lit(VIOLENT_CAUSE_PREFIX)),
            )
            .collect()?;

        let out = Self::city_totals(&violent)
            .sort(
                ["TOTAL", "MUNICIPIO", "COD_DEPARTAMENTO"],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false, false])
                    .with_maintain_order(true),
            )
            .limit(TOP_VIOLENT_CITIES)
            .collect()?;
        Ok(out)
    }

    fn quietest_cities(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let out = Self::city_totals(df)
            .sort(
                ["TOTAL", "MUNICIPIO", "COD_DEPARTAMENTO"],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .limit(BOTTOM_CITIES)
            .collect()?;
        Ok(out)
    }

    fn leading_causes(df: &DataFrame, causes: &DataFrame) -> Result<DataFrame, AggregateError> {
        let top = df
            .clone()
            .lazy()
            .group_by_stable([col("COD_MUERTE").strict_cast(DataType::String)])
            .agg([len().alias("TOTAL")])
            .sort(
                ["TOTAL", "COD_MUERTE"],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_maintain_order(true),
            )
            .limit(TOP_CAUSES);

        // The reference table may repeat codes; keep the first description
        // per code so the left join cannot expand the ranking.
        let descriptions = causes
            .clone()
            .lazy()
            .select([
                col("COD_MUERTE").strict_cast(DataType::String),
                col("DESCRIPCION").strict_cast(DataType::String),
            ])
            .group_by_stable([col("COD_MUERTE")])
            .agg([col("DESCRIPCION").first()]);

        // The join must not disturb the ranking order established above.
        let mut args = JoinArgs::new(JoinType::Left);
        args.maintain_order = MaintainOrderJoin::Left;

        let out = top
            .join(descriptions, [col("COD_MUERTE")], [col("COD_MUERTE")], args)
            .collect()?;
        Ok(out)
    }

    fn by_sex_department(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let out = df
            .clone()
            .lazy()
            .group_by_stable([col("DEPARTAMENTO"), col("SEXO")])
            .agg([len().alias("TOTAL")])
            .collect()?;
        Ok(out)
    }

    fn by_age_group(df: &DataFrame) -> Result<DataFrame, AggregateError> {
        let out = df
            .clone()
            .lazy()
            .group_by_stable([col("GRUPO_EDAD1")])
            .agg([len().alias("TOTAL")])
            .sort(["GRUPO_EDAD1"], SortMultipleOptions::default())
            .collect()?;
        Ok(out)
    }
}

/// Extract (label, TOTAL) pairs from a summary table; null labels become
/// [`MISSING_LABEL`].
pub fn label_totals(df: &DataFrame, label_col: &str) -> Result<Vec<(String, u64)>, AggregateError> {
    let labels = df.column(label_col)?.cast(&DataType::String)?;
    let labels = labels.str()?;
    let totals = df.column("TOTAL")?.cast(&DataType::UInt64)?;
    let totals = totals.u64()?;

    Ok(labels
        .into_iter()
        .zip(totals)
        .map(|(label, total)| {
            (
                label.map_or_else(|| MISSING_LABEL.to_string(), str::to_string),
                total.unwrap_or(0),
            )
        })
        .collect())
}

/// Extract (key, TOTAL) pairs from a summary table keyed by an integer
/// column such as MES or GRUPO_EDAD1.
pub fn key_totals(df: &DataFrame, key_col: &str) -> Result<Vec<(i64, u64)>, AggregateError> {
    let keys = df.column(key_col)?.cast(&DataType::Int64)?;
    let keys = keys.i64()?;
    let totals = df.column("TOTAL")?.cast(&DataType::UInt64)?;
    let totals = totals.u64()?;

    Ok(keys
        .into_iter()
        .zip(totals)
        .map(|(key, total)| (key.unwrap_or(0), total.unwrap_or(0)))
        .collect())
}

/// Extract (department, sex, TOTAL) triples from the sex-by-department
/// summary.
pub fn sex_department_rows(df: &DataFrame) -> Result<Vec<(String, String, u64)>, AggregateError> {
    let departments = df.column("DEPARTAMENTO")?.cast(&DataType::String)?;
    let departments = departments.str()?;
    let sexes = df.column("SEXO")?.cast(&DataType::String)?;
    let sexes = sexes.str()?;
    let totals = df.column("TOTAL")?.cast(&DataType::UInt64)?;
    let totals = totals.u64()?;

    Ok(departments
        .into_iter()
        .zip(sexes)
        .zip(totals)
        .map(|((department, sex), total)| {
            (
                department.map_or_else(|| MISSING_LABEL.to_string(), str::to_string),
                sex.map_or_else(|| MISSING_LABEL.to_string(), str::to_string),
                total.unwrap_or(0),
            )
        })
        .collect())
}
