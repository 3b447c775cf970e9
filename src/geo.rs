//! Department Geocoder Module
//! Maps department names to map coordinates for the geographic view.

use polars::prelude::*;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Approximate centroid (latitude, longitude) per department, keyed by the
/// uppercase DIVIPOLA department name.
pub const DEPARTMENT_COORDS: [(&str, f64, f64); 32] = [
    ("AMAZONAS", -4.2153, -69.9406),
    ("ANTIOQUIA", 7.1986, -75.3412),
    ("ARAUCA", 6.551, -71.002),
    ("ATLÁNTICO", 10.696, -74.874),
    ("BOLÍVAR", 9.395, -74.736),
    ("BOYACÁ", 5.550, -73.367),
    ("CALDAS", 5.298, -75.247),
    ("CAQUETÁ", 0.870, -73.841),
    ("CASANARE", 5.333, -71.584),
    ("CAUCA", 2.348, -76.51),
    ("CESAR", 9.65, -73.51),
    ("CHOCÓ", 5.694, -76.66),
    ("CÓRDOBA", 8.401, -75.90),
    ("CUNDINAMARCA", 5.00, -74.26),
    ("GUAINÍA", 2.55, -68.90),
    ("GUAVIARE", 1.89, -72.78),
    ("HUILA", 2.80, -75.29),
    ("LA GUAJIRA", 11.54, -72.91),
    ("MAGDALENA", 10.15, -74.19),
    ("META", 3.50, -73.25),
    ("NARIÑO", 1.28, -77.39),
    ("NORTE DE SANTANDER", 7.86, -72.78),
    ("PUTUMAYO", 0.43, -76.05),
    ("QUINDÍO", 4.55, -75.66),
    ("RISARALDA", 5.10, -75.88),
    ("SANTANDER", 6.64, -73.73),
    ("SUCRE", 9.20, -75.14),
    ("TOLIMA", 4.21, -75.17),
    ("VALLE DEL CAUCA", 3.80, -76.52),
    ("VAUPÉS", 0.66, -70.74),
    ("VICHADA", 4.90, -69.78),
    ("BOGOTÁ, D.C.", 4.71, -74.07),
];

/// One plottable department on the mortality map.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentBubble {
    pub name: String,
    pub total: u64,
    pub lat: f64,
    pub lon: f64,
}

/// Resolves department names against the coordinate table.
pub struct Geocoder;

impl Geocoder {
    /// Look up a department centroid; matching is case-insensitive.
    pub fn lookup(department: &str) -> Option<(f64, f64)> {
        let upper = department.to_uppercase();
        DEPARTMENT_COORDS
            .iter()
            .find(|(name, _, _)| *name == upper)
            .map(|(_, lat, lon)| (*lat, *lon))
    }

    /// Attach LAT/LON columns to the by-department summary. Departments
    /// without a table entry keep nulls so the other views still see them.
    pub fn attach_coordinates(by_department: &DataFrame) -> Result<DataFrame, GeoError> {
        let departments = by_department.column("DEPARTAMENTO")?.str()?;

        let mut lat: Vec<Option<f64>> = Vec::with_capacity(departments.len());
        let mut lon: Vec<Option<f64>> = Vec::with_capacity(departments.len());
        let mut missing: Vec<String> = Vec::new();
        for department in departments.into_iter() {
            match department.and_then(Self::lookup) {
                Some((la, lo)) => {
                    lat.push(Some(la));
                    lon.push(Some(lo));
                }
                None => {
                    lat.push(None);
                    lon.push(None);
                    if let Some(name) = department {
                        missing.push(name.to_string());
                    }
                }
            }
        }

        if !missing.is_empty() {
            warn!(
                "{} departments have no coordinates and are left off the map: {}",
                missing.len(),
                missing.join(", ")
            );
        }

        let mut geocoded = by_department.clone();
        geocoded.with_column(Column::new("LAT".into(), lat))?;
        geocoded.with_column(Column::new("LON".into(), lon))?;
        Ok(geocoded)
    }

    /// Extract the plottable rows of a geocoded summary, skipping
    /// departments without coordinates.
    pub fn bubbles(geocoded: &DataFrame) -> Result<Vec<DepartmentBubble>, GeoError> {
        let names = geocoded.column("DEPARTAMENTO")?.str()?;
        let totals = geocoded.column("TOTAL")?.cast(&DataType::UInt64)?;
        let totals = totals.u64()?;
        let lats = geocoded.column("LAT")?.f64()?;
        let lons = geocoded.column("LON")?.f64()?;

        let mut bubbles = Vec::new();
        for i in 0..geocoded.height() {
            let (Some(lat), Some(lon)) = (lats.get(i), lons.get(i)) else {
                continue;
            };
            bubbles.push(DepartmentBubble {
                name: names.get(i).unwrap_or_default().to_string(),
                total: totals.get(i).unwrap_or(0),
                lat,
                lon,
            });
        }
        Ok(bubbles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn table_covers_every_department() {
        assert_eq!(DEPARTMENT_COORDS.len(), 32);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Geocoder::lookup("ANTIOQUIA"), Some((7.1986, -75.3412)));
        assert_eq!(Geocoder::lookup("antioquia"), Some((7.1986, -75.3412)));
        assert_eq!(Geocoder::lookup("atlántico"), Some((10.696, -74.874)));
        assert_eq!(Geocoder::lookup("NARNIA"), None);
    }

    #[test]
    fn attach_keeps_misses_as_nulls() {
        let by_department = df!(
            "DEPARTAMENTO" => ["ANTIOQUIA", "PROVINCIA IGNOTA"],
            "TOTAL" => [2u32, 1],
        )
        .unwrap();

        let geocoded = Geocoder::attach_coordinates(&by_department).unwrap();
        assert_eq!(geocoded.height(), 2);
        assert_eq!(geocoded.column("LAT").unwrap().null_count(), 1);
        assert_eq!(geocoded.column("LON").unwrap().null_count(), 1);

        let lat = geocoded.column("LAT").unwrap().f64().unwrap().get(0);
        assert_eq!(lat, Some(7.1986));
    }

    #[test]
    fn bubbles_skip_unmapped_departments() {
        let by_department = df!(
            "DEPARTAMENTO" => ["ANTIOQUIA", "PROVINCIA IGNOTA"],
            "TOTAL" => [2u32, 1],
        )
        .unwrap();

        let geocoded = Geocoder::attach_coordinates(&by_department).unwrap();
        let bubbles = Geocoder::bubbles(&geocoded).unwrap();
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].name, "ANTIOQUIA");
        assert_eq!(bubbles[0].total, 2);
        assert_eq!(bubbles[0].lon, -75.3412);
    }
}
