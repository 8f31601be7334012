use crate::extraction::Table;

/// Reconstruct table grids from pdftotext -layout output.
///
/// pdftotext -layout preserves column alignment using spaces, so a run of
/// consecutive lines that each split into two or more segments is read as one
/// table. A blank or single-segment line closes the current table.
pub fn reconstruct_tables(page_text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<&str>> = Vec::new();

    for line in page_text.lines() {
        let segments = split_by_whitespace_gaps(line);
        if segments.len() >= 2 {
            current.push(segments);
        } else {
            flush_table(&mut current, &mut tables);
        }
    }
    flush_table(&mut current, &mut tables);

    tables
}

fn flush_table(rows: &mut Vec<Vec<&str>>, tables: &mut Vec<Table>) {
    if rows.len() >= 2 {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let grid = rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Option<String>> =
                    row.iter().map(|s| Some(s.trim().to_string())).collect();
                cells.resize(width, None);
                cells
            })
            .collect();
        tables.push(grid);
    }
    rows.clear();
}

/// Split a line by gaps of 2+ whitespace characters.
pub fn split_by_whitespace_gaps(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = None;
    let mut space_count = 0;
    let mut gap_start = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if space_count == 0 {
                gap_start = i;
            }
            space_count += 1;
            if space_count == 2 {
                if let Some(s) = start.take() {
                    segments.push(&line[s..gap_start]);
                }
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            space_count = 0;
        }
    }

    if let Some(s) = start {
        segments.push(line[s..].trim_end());
    }

    segments
}
