//! Split one workbook into one workbook per distinct key of a column.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tabkit_io_fs::{
    create_output_dir, derive_reserved_key, derive_unique_path, sanitize_file_name,
};

use crate::conf::{C_MSG_EMPTY_SHEET, C_MSG_SPLIT_LOCKED};
use crate::error::XlsxIoError;
use crate::reader::{SourceCell, XlsxReader};
use crate::report::ReportSplit;
use crate::spec::{EnumDateEpoch, EnumGroupKey, SpecSplitOptions};
use crate::transfer::transfer_row;
use crate::writer::XlsxWriter;

/// Progress observer: `(rows processed so far, groups so far)`.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, usize);

struct SpecGroupOutput {
    path_out: PathBuf,
    writer: XlsxWriter,
}

/// Per-invocation split state; dropped when the run ends.
struct SplitRun<'a, 'cb> {
    options: &'a SpecSplitOptions,
    epoch: EnumDateEpoch,
    dir_output: &'a Path,
    n_idx_col: usize,
    l_header_cells: Vec<SourceCell>,
    l_header_texts: Vec<String>,
    dict_group_idx: HashMap<EnumGroupKey, usize>,
    l_groups: Vec<SpecGroupOutput>,
    set_names_reserved: HashSet<String>,
    n_rows_processed: usize,
    n_rows_skipped: usize,
    progress_cb: Option<ProgressCallback<'cb>>,
}

impl SplitRun<'_, '_> {
    fn notify(&mut self) {
        let n_groups = self.l_groups.len();
        if let Some(cb) = self.progress_cb.as_mut() {
            cb(self.n_rows_processed, n_groups);
        }
    }

    fn notify_on_cadence(&mut self) {
        let n_every = self.options.progress_every_rows;
        if n_every > 0 && self.n_rows_processed % n_every == 0 {
            self.notify();
        }
    }

    fn create_group(
        &mut self,
        key: EnumGroupKey,
        cell_key: &SourceCell,
    ) -> Result<usize, XlsxIoError> {
        let mut writer = XlsxWriter::new();
        writer.write_row(&transfer_row(
            &self.l_header_cells,
            &self.l_header_texts,
            self.epoch,
            &self.options.transfer_policy,
        ))?;

        let policy_name = &self.options.file_name_policy;
        let c_stem = sanitize_file_name(&cell_key.text(self.epoch), policy_name);
        let path_out = derive_unique_path(
            self.dir_output,
            &c_stem,
            &policy_name.extension,
            &self.set_names_reserved,
        );
        self.set_names_reserved.insert(derive_reserved_key(&path_out));
        tracing::debug!(key = ?key, path = %path_out.display(), "new split group");

        let n_idx_group = self.l_groups.len();
        self.l_groups.push(SpecGroupOutput { path_out, writer });
        self.dict_group_idx.insert(key, n_idx_group);
        self.notify();
        Ok(n_idx_group)
    }

    fn consume_row(&mut self, l_cells: Vec<SourceCell>) -> Result<(), XlsxIoError> {
        self.n_rows_processed += 1;

        let cell_key = l_cells.get(self.n_idx_col).cloned().unwrap_or_default();
        let Some(key) = EnumGroupKey::from_value(&cell_key.value) else {
            self.n_rows_skipped += 1;
            self.notify_on_cadence();
            return Ok(());
        };

        let n_idx_group = match self.dict_group_idx.get(&key) {
            Some(n_idx) => *n_idx,
            None => self.create_group(key, &cell_key)?,
        };
        let l_row_out = transfer_row(
            &l_cells,
            &self.l_header_texts,
            self.epoch,
            &self.options.transfer_policy,
        );
        self.l_groups[n_idx_group].writer.write_row(&l_row_out)?;

        self.notify_on_cadence();
        Ok(())
    }
}

/// Split the active sheet of `path_src` by the values of `column`.
///
/// Creates a run directory under `dir_base` and one workbook per distinct
/// non-empty key, each starting with the source header. Rows with an empty
/// key are skipped but counted. `progress_cb` fires on every new group and
/// every `options.progress_every_rows` rows.
///
/// Every group created before a mid-stream failure is still saved; the
/// stream failure is then returned.
pub fn split_workbook(
    path_src: &Path,
    dir_base: &Path,
    column: &str,
    progress_cb: Option<ProgressCallback<'_>>,
    options: &SpecSplitOptions,
) -> Result<ReportSplit, XlsxIoError> {
    let mut reader = XlsxReader::open(path_src, C_MSG_SPLIT_LOCKED)?;
    let epoch = reader.epoch();
    let mut rows = reader.rows()?;

    let l_header_cells = rows.next().transpose()?.unwrap_or_default();
    if l_header_cells.is_empty() {
        return Err(XlsxIoError::EmptyInput(C_MSG_EMPTY_SHEET.to_string()));
    }
    let l_header_texts: Vec<String> = l_header_cells.iter().map(|cell| cell.text(epoch)).collect();
    let n_idx_col = l_header_texts
        .iter()
        .position(|c_name| c_name == column)
        .ok_or_else(|| XlsxIoError::ColumnNotFound(column.to_string()))?;

    let dir_output = create_output_dir(dir_base, &options.output_dir_policy)?;

    let mut run = SplitRun {
        options,
        epoch,
        dir_output: &dir_output,
        n_idx_col,
        l_header_cells,
        l_header_texts,
        dict_group_idx: HashMap::new(),
        l_groups: Vec::new(),
        set_names_reserved: HashSet::new(),
        n_rows_processed: 0,
        n_rows_skipped: 0,
        progress_cb,
    };

    let result_stream = rows.try_for_each(|row| run.consume_row(row?));
    drop(rows);
    drop(reader);

    let mut l_files_written = Vec::with_capacity(run.l_groups.len());
    let mut err_save: Option<XlsxIoError> = None;
    for mut group in run.l_groups.drain(..) {
        match group.writer.save(&group.path_out) {
            Ok(()) => l_files_written.push(group.path_out),
            Err(err) => {
                tracing::warn!(path = %group.path_out.display(), %err, "failed to save split group");
                err_save.get_or_insert(err);
            }
        }
    }

    result_stream?;
    if let Some(err) = err_save {
        return Err(err);
    }

    let report = ReportSplit {
        dir_output: dir_output.clone(),
        files_written: l_files_written,
        cnt_rows_processed: run.n_rows_processed as u64,
        cnt_rows_skipped: run.n_rows_skipped as u64,
        cnt_groups: run.dict_group_idx.len() as u64,
    };
    tracing::info!(
        rows = report.cnt_rows_processed,
        skipped = report.cnt_rows_skipped,
        groups = report.cnt_groups,
        dir = %report.dir_output.display(),
        "split finished"
    );
    Ok(report)
}
