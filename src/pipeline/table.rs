//! Reshape the extracted line-item table into a row/column grid.
//!
//! The analysis service reports table cells as one flat, row-major sequence
//! plus a declared row count. The column count is NOT inferred: it is a
//! fixed contract with the upstream recognition model (see
//! [`LINE_ITEM_COLUMNS`]), supplied by the caller.
//!
//! Row 0 is always the header row and never becomes a line item.

use crate::error::FacturaeError;
use crate::fields::ExtractedTable;

/// Number of columns the line-item recognition model emits.
pub const LINE_ITEM_COLUMNS: usize = 6;

/// Column holding the line description.
pub const COL_DESCRIPTION: usize = 0;
/// Column holding the quantity (blank means zero).
pub const COL_QUANTITY: usize = 1;
/// Column holding the gross line amount.
pub const COL_GROSS_AMOUNT: usize = 2;
/// Column holding the line taxable base.
pub const COL_TAXABLE_BASE: usize = 3;
/// Column holding the line tax amount.
pub const COL_TAX_AMOUNT: usize = 4;

/// A row-major grid of cell texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGrid {
    columns: usize,
    rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Build a grid from a flat cell sequence and declared dimensions.
    ///
    /// Fails with [`FacturaeError::TableShape`] when `row_count *
    /// column_count` exceeds the number of supplied cells — the table is
    /// never silently truncated or wrapped. Surplus cells beyond the
    /// declared shape are ignored.
    pub fn from_cells(
        cells: &[String],
        row_count: usize,
        column_count: usize,
    ) -> Result<TableGrid, FacturaeError> {
        let needed = row_count * column_count;
        if needed > cells.len() {
            return Err(FacturaeError::TableShape {
                rows: row_count,
                columns: column_count,
                cells: cells.len(),
            });
        }
        let rows = cells[..needed]
            .chunks(column_count)
            .map(|chunk| chunk.to_vec())
            .collect();
        Ok(TableGrid {
            columns: column_count,
            rows,
        })
    }

    /// Build a grid from an [`ExtractedTable`] using the fixed line-item
    /// column contract.
    pub fn from_extracted(table: &ExtractedTable) -> Result<TableGrid, FacturaeError> {
        TableGrid::from_cells(&table.cells, table.row_count, LINE_ITEM_COLUMNS)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Cell text at `(row, column)`.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        &self.rows[row][column]
    }

    /// Data rows with their 0-based row index — row 0 (the header) is
    /// excluded, so an `N`-row table yields `N - 1` entries.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, row)| (i, row.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn reshapes_row_major() {
        let grid = TableGrid::from_cells(&cells(&["a", "b", "c", "d", "e", "f"]), 2, 3).unwrap();
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.cell(0, 0), "a");
        assert_eq!(grid.cell(0, 2), "c");
        assert_eq!(grid.cell(1, 0), "d");
        assert_eq!(grid.cell(1, 2), "f");
    }

    #[test]
    fn too_few_cells_is_a_shape_error() {
        let err = TableGrid::from_cells(&cells(&["a", "b", "c"]), 2, 2).unwrap_err();
        match err {
            FacturaeError::TableShape {
                rows,
                columns,
                cells,
            } => {
                assert_eq!((rows, columns, cells), (2, 2, 3));
            }
            other => panic!("expected TableShape, got {other:?}"),
        }
    }

    #[test]
    fn surplus_cells_are_ignored() {
        let grid = TableGrid::from_cells(&cells(&["a", "b", "c", "d", "e"]), 2, 2).unwrap();
        assert_eq!(grid.cell(1, 1), "d");
    }

    #[test]
    fn data_rows_exclude_the_header() {
        let grid = TableGrid::from_cells(&cells(&["h1", "h2", "x", "y", "p", "q"]), 3, 2).unwrap();
        let rows: Vec<_> = grid.data_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1, ["x".to_string(), "y".to_string()]);
        assert_eq!(rows[1].0, 2);
    }

    #[test]
    fn header_only_table_yields_no_data_rows() {
        let grid = TableGrid::from_cells(&cells(&["h1", "h2"]), 1, 2).unwrap();
        assert_eq!(grid.data_rows().count(), 0);
    }
}
