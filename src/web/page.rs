//! Dashboard Page Module
//! Assembles the single tabbed HTML page served at `/`. All charts are
//! pre-rendered SVG; the causes grid is the only scripted element.

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::charts::{ChartError, ChartRenderer};
use crate::geo::{GeoError, Geocoder};
use crate::pipeline::DashboardContext;
use crate::stats::{key_totals, label_totals, sex_department_rows, AggregateError};

pub const PAGE_TITLE: &str = "Mortalidad en Colombia 2019";
pub const PAGE_SOURCE: &str = "Fuente: Certificados de Defunción No Fetal - DANE (2019)";

const TAB_LABELS: [&str; 7] = [
    "Mapa de Mortalidad por Departamento",
    "Muertes por Mes",
    "5 Ciudades Más Violentas (X95)",
    "10 Ciudades con Menor Mortalidad",
    "Top 10 Causas de Muerte",
    "Muertes por Sexo y Departamento",
    "Distribución por Grupo de Edad",
];

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("failed to encode grid rows: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct CauseRow {
    #[serde(rename = "COD_MUERTE")]
    code: String,
    #[serde(rename = "TOTAL")]
    total: u64,
    #[serde(rename = "DESCRIPCION")]
    description: Option<String>,
}

const BASE_CSS: &str = r#"body { font-family: "Segoe UI", "Helvetica Neue", Arial, sans-serif; margin: 0; padding: 0 24px 40px; background: #fafafa; color: #222; }
h1 { text-align: center; margin: 24px 0 4px; }
p.source { text-align: center; color: #555; margin: 0 0 24px; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; padding: 10px 18px; margin: 0 2px 0 0; border: 1px solid #d6d6d6; border-bottom: none; border-radius: 6px 6px 0 0; background: #f1f1f1; cursor: pointer; font-size: 14px; }
.tabs > input:checked + label { background: #ffffff; font-weight: 600; }
.panels { border: 1px solid #d6d6d6; background: #ffffff; padding: 16px; }
.panel { display: none; }
.panel svg { max-width: 100%; height: auto; }
#causas-table { border-collapse: collapse; width: 100%; font-size: 14px; }
#causas-table th { background: #f1f1f1; cursor: pointer; user-select: none; }
#causas-table th, #causas-table td { border: 1px solid #d6d6d6; padding: 6px 10px; text-align: left; }
"#;

/// Renders the causes grid client-side: sortable by any column, one page
/// of at most PAGE_SIZE rows.
const GRID_SCRIPT: &str = r#"const PAGE_SIZE = 10;
const COLUMNS = ["COD_MUERTE", "TOTAL", "DESCRIPCION"];
let sortColumn = null;
let sortAsc = true;
function renderCauses() {
  const table = document.getElementById("causas-table");
  const rows = CAUSE_ROWS.slice();
  if (sortColumn !== null) {
    rows.sort((a, b) => {
      const x = a[sortColumn];
      const y = b[sortColumn];
      let cmp;
      if (typeof x === "number" && typeof y === "number") {
        cmp = x - y;
      } else {
        cmp = String(x ?? "").localeCompare(String(y ?? ""));
      }
      return sortAsc ? cmp : -cmp;
    });
  }
  const head = document.createElement("tr");
  for (const column of COLUMNS) {
    const th = document.createElement("th");
    th.textContent = column + (sortColumn === column ? (sortAsc ? " \u25b2" : " \u25bc") : "");
    th.onclick = () => {
      if (sortColumn === column) {
        sortAsc = !sortAsc;
      } else {
        sortColumn = column;
        sortAsc = true;
      }
      renderCauses();
    };
    head.appendChild(th);
  }
  table.replaceChildren(head);
  for (const row of rows.slice(0, PAGE_SIZE)) {
    const tr = document.createElement("tr");
    for (const column of COLUMNS) {
      const td = document.createElement("td");
      const value = row[column];
      td.textContent = value === null || value === undefined ? "\u2014" : String(value);
      tr.appendChild(td);
    }
    table.appendChild(tr);
  }
}
renderCauses();
"#;

/// Assembles the dashboard HTML from a built [`DashboardContext`].
pub struct DashboardPage;

impl DashboardPage {
    /// Render the complete page. Called once at startup; the result is
    /// immutable for the lifetime of the server.
    pub fn render(ctx: &DashboardContext) -> Result<String, PageError> {
        let bubbles = Geocoder::bubbles(&ctx.department_map)?;
        let map_svg = ChartRenderer::department_map(&bubbles)?;

        let months = key_totals(&ctx.summaries.by_month, "MES")?;
        let month_svg = ChartRenderer::monthly_line(&months)?;

        let violent = label_totals(&ctx.summaries.violent_cities, "MUNICIPIO")?;
        let violent_svg = ChartRenderer::violent_cities_bar(&violent)?;

        let quietest = label_totals(&ctx.summaries.quietest_cities, "MUNICIPIO")?;
        let pie_svg = ChartRenderer::quietest_cities_pie(&quietest)?;

        let sexes = sex_department_rows(&ctx.summaries.by_sex_department)?;
        let sex_svg = ChartRenderer::sex_department_bars(&sexes)?;

        let ages: Vec<(String, u64)> = key_totals(&ctx.summaries.by_age_group, "GRUPO_EDAD1")?
            .into_iter()
            .map(|(age, total)| (age.to_string(), total))
            .collect();
        let age_svg = ChartRenderer::age_group_bar(&ages)?;

        let grid_json = Self::cause_rows_json(&ctx.summaries.leading_causes)?;
        let grid_panel = "<div class=\"grid\"><table id=\"causas-table\"></table></div>".to_string();

        let panels = [
            map_svg, month_svg, violent_svg, pie_svg, grid_panel, sex_svg, age_svg,
        ];
        Ok(Self::assemble(&panels, &grid_json))
    }

    /// Serialize the leading-causes table for the grid script. `<` is
    /// escaped so a description can never terminate the script element.
    fn cause_rows_json(leading_causes: &DataFrame) -> Result<String, PageError> {
        let codes = leading_causes.column("COD_MUERTE")?.str()?;
        let totals = leading_causes.column("TOTAL")?.cast(&DataType::UInt64)?;
        let totals = totals.u64()?;
        let descriptions = leading_causes.column("DESCRIPCION")?.str()?;

        let mut rows = Vec::with_capacity(leading_causes.height());
        for i in 0..leading_causes.height() {
            rows.push(CauseRow {
                code: codes.get(i).unwrap_or_default().to_string(),
                total: totals.get(i).unwrap_or(0),
                description: descriptions.get(i).map(str::to_string),
            });
        }

        let json = serde_json::to_string(&rows)?;
        Ok(json.replace('<', "\\u003c"))
    }

    fn assemble(panels: &[String; 7], grid_json: &str) -> String {
        let mut page = String::with_capacity(64 * 1024);
        page.push_str("<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(&format!("<title>{PAGE_TITLE}</title>\n"));
        page.push_str("<style>\n");
        page.push_str(BASE_CSS);
        for i in 1..=TAB_LABELS.len() {
            page.push_str(&format!(
                "#tab-{i}:checked ~ .panels #panel-{i} {{ display: block; }}\n"
            ));
        }
        page.push_str("</style>\n</head>\n<body>\n");
        page.push_str(&format!(
            "<h1>{PAGE_TITLE}</h1>\n<p class=\"source\">{PAGE_SOURCE}</p>\n"
        ));

        page.push_str("<div class=\"tabs\">\n");
        for (i, label) in TAB_LABELS.iter().enumerate() {
            let checked = if i == 0 { " checked" } else { "" };
            page.push_str(&format!(
                "<input type=\"radio\" name=\"tabs\" id=\"tab-{}\"{}>\n<label for=\"tab-{}\">{}</label>\n",
                i + 1,
                checked,
                i + 1,
                label
            ));
        }
        page.push_str("<div class=\"panels\">\n");
        for (i, panel) in panels.iter().enumerate() {
            page.push_str(&format!(
                "<section class=\"panel\" id=\"panel-{}\">\n{}\n</section>\n",
                i + 1,
                panel
            ));
        }
        page.push_str("</div>\n</div>\n");

        page.push_str("<script>\n");
        page.push_str(&format!("const CAUSE_ROWS = {grid_json};\n"));
        page.push_str(GRID_SCRIPT);
        page.push_str("</script>\n</body>\n</html>\n");
        page
    }
}
