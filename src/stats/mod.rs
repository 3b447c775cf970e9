//! Stats module - summary tables behind the dashboard views

mod aggregator;

pub use aggregator::{
    key_totals, label_totals, sex_department_rows, AggregateError, Aggregator, Summaries,
    MISSING_LABEL, VIOLENT_CAUSE_PREFIX,
};
