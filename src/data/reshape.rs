use super::model::{Observation, Observations, RawTable, YearRange};
use crate::error::{PipelineError, Result};

/// Melt the wide table into one observation per (country, year in `range`).
///
/// Every year in `range` must have a column; a missing one is a schema error.
/// Cells that are empty or not numeric become NaN.
pub fn melt(table: &RawTable, range: YearRange) -> Result<Observations> {
    let records = melt_years(table, range.years())?;
    let names = table
        .records
        .iter()
        .map(|r| (r.country_code.clone(), r.country_name.clone()))
        .collect();
    Ok(Observations::new(records, range).with_names(names))
}

/// Melt over an explicit list of years, which need not be contiguous.
pub fn melt_years(
    table: &RawTable,
    years: impl IntoIterator<Item = i32>,
) -> Result<Vec<Observation>> {
    let columns: Vec<(i32, &str)> = years
        .into_iter()
        .map(|year| {
            table
                .year_column(year)
                .map(|header| (year, header))
                .ok_or_else(|| PipelineError::MissingColumn {
                    column: year.to_string(),
                })
        })
        .collect::<Result<_>>()?;

    let mut records = Vec::with_capacity(table.len() * columns.len());
    for raw in &table.records {
        for &(year, header) in &columns {
            let value = raw.cells.get(header).map_or(f64::NAN, |c| c.as_f64());
            records.push(Observation {
                country_code: raw.country_code.clone(),
                year,
                value,
            });
        }
    }

    log::debug!(
        "Melted {} rows × {} years into {} observations",
        table.len(),
        columns.len(),
        records.len()
    );
    Ok(records)
}
