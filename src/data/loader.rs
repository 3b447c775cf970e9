//! CSV Data Loader Module
//! Reads the three DANE source files and validates their schemas with Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Non-fetal death certificates for 2019, one row per death.
pub const MORTALITY_FILE: &str = "NoFetal2019.csv";
/// Cause-of-death reference: code to human readable description.
pub const CAUSE_FILE: &str = "CodigosDeMuerte.csv";
/// DIVIPOLA geographic reference: department/municipality codes to names.
pub const DIVIPOLA_FILE: &str = "Divipola.csv";

const MORTALITY_COLUMNS: [&str; 6] = [
    "COD_DEPARTAMENTO",
    "COD_MUNICIPIO",
    "SEXO",
    "GRUPO_EDAD1",
    "COD_MUERTE",
    "MES",
];
const CAUSE_COLUMNS: [&str; 2] = ["COD_MUERTE", "DESCRIPCION"];
const DIVIPOLA_COLUMNS: [&str; 4] = [
    "COD_DEPARTAMENTO",
    "COD_MUNICIPIO",
    "DEPARTAMENTO",
    "MUNICIPIO",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("source file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to read {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: PolarsError,
    },
    #[error("{file} is missing required column {column}")]
    MissingColumn { file: String, column: String },
}

/// The three raw source tables, loaded but not yet normalized.
#[derive(Debug)]
pub struct SourceTables {
    pub mortality: DataFrame,
    pub causes: DataFrame,
    pub divipola: DataFrame,
}

impl SourceTables {
    /// Load every source file from `data_dir`, failing on the first
    /// unreadable file or missing column.
    pub fn load(data_dir: &Path) -> Result<Self, LoaderError> {
        let mortality = read_csv(data_dir, MORTALITY_FILE, &MORTALITY_COLUMNS)?;
        let causes = read_csv(data_dir, CAUSE_FILE, &CAUSE_COLUMNS)?;
        let divipola = read_csv(data_dir, DIVIPOLA_FILE, &DIVIPOLA_COLUMNS)?;

        Ok(Self {
            mortality,
            causes,
            divipola,
        })
    }
}

/// Load a single CSV file and check that every required column is present.
fn read_csv(data_dir: &Path, file: &str, required: &[&str]) -> Result<DataFrame, LoaderError> {
    let path = data_dir.join(file);
    if !path.is_file() {
        return Err(LoaderError::MissingFile(path));
    }

    // Lazy scan with a generous schema inference window, collected eagerly;
    // type errors in the body of the file surface here.
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|source| LoaderError::Csv {
            file: file.to_string(),
            source,
        })?;

    let columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for column in required {
        if !columns.iter().any(|c| c == column) {
            return Err(LoaderError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }

    info!(
        "loaded {} ({} rows, {} columns)",
        file,
        df.height(),
        df.width()
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_sources(dir: &TempDir) {
        fs::write(
            dir.path().join(MORTALITY_FILE),
            "COD_DEPARTAMENTO,COD_MUNICIPIO,SEXO,GRUPO_EDAD1,COD_MUERTE,MES\n\
             5,1,1,,X950,3\n\
             5,1,2,20,I21,3\n\
             11,1,1,20,X951,4\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(CAUSE_FILE),
            "COD_MUERTE,DESCRIPCION\n\
             X950,Agresión con disparo de arma corta\n\
             I21,Infarto agudo del miocardio\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(DIVIPOLA_FILE),
            "COD_DEPARTAMENTO,COD_MUNICIPIO,DEPARTAMENTO,MUNICIPIO\n\
             5,1,ANTIOQUIA,MEDELLÍN\n\
             11,1,\"BOGOTÁ, D.C.\",\"BOGOTÁ, D.C.\"\n",
        )
        .unwrap();
    }

    #[test]
    fn loads_all_three_sources() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);

        let tables = SourceTables::load(dir.path()).unwrap();
        assert_eq!(tables.mortality.height(), 3);
        assert_eq!(tables.causes.height(), 2);
        assert_eq!(tables.divipola.height(), 2);

        // Column names are preserved verbatim from the files.
        for column in MORTALITY_COLUMNS {
            assert!(tables.mortality.column(column).is_ok());
        }
        for column in DIVIPOLA_COLUMNS {
            assert!(tables.divipola.column(column).is_ok());
        }
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);
        fs::remove_file(dir.path().join(DIVIPOLA_FILE)).unwrap();

        let err = SourceTables::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoaderError::MissingFile(_)));
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);
        fs::write(
            dir.path().join(MORTALITY_FILE),
            "COD_DEPARTAMENTO,COD_MUNICIPIO,SEXO,GRUPO_EDAD1,COD_MUERTE\n5,1,1,20,X950\n",
        )
        .unwrap();

        let err = SourceTables::load(dir.path()).unwrap_err();
        match err {
            LoaderError::MissingColumn { file, column } => {
                assert_eq!(file, MORTALITY_FILE);
                assert_eq!(column, "MES");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_age_values_become_nulls() {
        let dir = TempDir::new().unwrap();
        write_sources(&dir);

        let tables = SourceTables::load(dir.path()).unwrap();
        assert_eq!(tables.mortality.column("GRUPO_EDAD1").unwrap().null_count(), 1);
    }
}
