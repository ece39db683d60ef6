//! Concatenate workbooks that share a header into one workbook.

use std::path::Path;

use tabkit_io_fs::create_output_dir;

use crate::conf::{C_MSG_EMPTY_MERGE, C_MSG_MERGE_LOCKED};
use crate::error::XlsxIoError;
use crate::reader::XlsxReader;
use crate::report::ReportMerge;
use crate::spec::SpecMergeOptions;
use crate::transfer::transfer_row;
use crate::writer::XlsxWriter;

/// Merge the active sheets of `paths`, in order, into one workbook.
///
/// The header row is written once, from the first input that has one. Every
/// input's data rows follow in file order; each input's own header texts
/// drive the date heuristic for its rows. Columns are matched by position
/// only.
///
/// Nothing is written unless every input is read successfully; the run
/// directory is created only then, holding `<stem_merged>.<extension>`.
pub fn merge_workbooks<P: AsRef<Path>>(
    paths: &[P],
    dir_base: &Path,
    options: &SpecMergeOptions,
) -> Result<ReportMerge, XlsxIoError> {
    if paths.is_empty() {
        return Err(XlsxIoError::EmptyInput(C_MSG_EMPTY_MERGE.to_string()));
    }

    let policy = &options.transfer_policy;
    let mut writer = XlsxWriter::new();
    let mut if_header_written = false;
    let mut n_rows_written = 0u64;

    for path_src in paths.iter().map(AsRef::as_ref) {
        let mut reader = XlsxReader::open(path_src, C_MSG_MERGE_LOCKED)?;
        let epoch = reader.epoch();
        let mut rows = reader.rows()?;

        let l_header_cells = rows.next().transpose()?.unwrap_or_default();
        let l_header_texts: Vec<String> =
            l_header_cells.iter().map(|cell| cell.text(epoch)).collect();
        if !l_header_cells.is_empty() && !if_header_written {
            writer.write_row(&transfer_row(&l_header_cells, &l_header_texts, epoch, policy))?;
            if_header_written = true;
        }

        let n_rows_before = n_rows_written;
        for row in rows {
            let l_cells = row?;
            writer.write_row(&transfer_row(&l_cells, &l_header_texts, epoch, policy))?;
            n_rows_written += 1;
        }
        tracing::debug!(
            path = %path_src.display(),
            rows = n_rows_written - n_rows_before,
            "merged source workbook"
        );
    }

    let dir_output = create_output_dir(dir_base, &options.output_dir_policy)?;
    let path_out = dir_output.join(format!("{}.{}", options.stem_merged, options.extension));
    writer.save(&path_out)?;

    let report = ReportMerge {
        dir_output,
        file_written: path_out,
        cnt_files: paths.len() as u64,
        cnt_rows_written: n_rows_written,
    };
    tracing::info!(
        files = report.cnt_files,
        rows = report.cnt_rows_written,
        out = %report.file_written.display(),
        "merge finished"
    );
    Ok(report)
}
