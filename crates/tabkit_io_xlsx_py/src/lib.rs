use std::path::{Path, PathBuf};

use pyo3::exceptions::{PyKeyError, PyOSError, PyPermissionError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use tabkit_io_fs::{FsNamingError, filter_workbook_paths};
use tabkit_io_xlsx::{
    ProgressCallback, SpecMergeOptions, SpecSplitOptions, XlsxIoError, merge_workbooks,
    read_headers, split_workbook,
};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "tabkit.xlsx.split_merge.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

fn map_xlsx_io_error(exception: XlsxIoError) -> PyErr {
    match exception {
        XlsxIoError::Locked { message, .. } => PyPermissionError::new_err(message),
        XlsxIoError::EmptyInput(message) => PyValueError::new_err(message),
        err @ XlsxIoError::ColumnNotFound(_) => PyKeyError::new_err(err.to_string()),
        XlsxIoError::Io(err) => PyErr::from(err),
        err @ XlsxIoError::Fs(_) => PyOSError::new_err(err.to_string()),
        err => PyRuntimeError::new_err(err.to_string()),
    }
}

fn map_fs_naming_error(exception: FsNamingError) -> PyErr {
    match exception {
        FsNamingError::InvalidPattern(message) => PyValueError::new_err(message),
        err @ FsNamingError::OutputDirCreateFailed { .. } => PyOSError::new_err(err.to_string()),
    }
}

fn derive_path_text(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[pyfunction(name = "read_headers")]
fn read_headers_py(py: Python<'_>, path: PathBuf) -> PyResult<Vec<String>> {
    py.allow_threads(|| read_headers(&path))
        .map_err(map_xlsx_io_error)
}

/// Returns `(output_dir, written_files)`.
///
/// `progress_cb(rows_processed, groups)` runs with the GIL re-acquired; the
/// first exception it raises is re-raised once the split has finished.
#[pyfunction(name = "split_excel")]
#[pyo3(signature = (path, base_dir, column, progress_cb = None, progress_every_rows = None))]
fn split_excel_py(
    py: Python<'_>,
    path: PathBuf,
    base_dir: PathBuf,
    column: String,
    progress_cb: Option<Py<PyAny>>,
    progress_every_rows: Option<usize>,
) -> PyResult<(String, Vec<String>)> {
    let mut options = SpecSplitOptions::default();
    if let Some(n_every) = progress_every_rows {
        options.progress_every_rows = n_every;
    }

    let (result_split, err_cb) = py.allow_threads(|| {
        let mut err_cb: Option<PyErr> = None;
        let mut on_progress = |n_rows: usize, n_groups: usize| {
            let Some(cb) = progress_cb.as_ref() else {
                return;
            };
            if err_cb.is_some() {
                return;
            }
            Python::with_gil(|py| {
                if let Err(err) = cb.call1(py, (n_rows, n_groups)) {
                    err_cb = Some(err);
                }
            });
        };
        let progress: ProgressCallback<'_> = &mut on_progress;
        let result_split = split_workbook(&path, &base_dir, &column, Some(progress), &options);
        (result_split, err_cb)
    });

    let report = result_split.map_err(map_xlsx_io_error)?;
    if let Some(err) = err_cb {
        return Err(err);
    }
    Ok((
        derive_path_text(&report.dir_output),
        report
            .files_written
            .iter()
            .map(|path_out| derive_path_text(path_out))
            .collect(),
    ))
}

/// Returns `(output_dir, merged_file)`.
#[pyfunction(name = "merge_excels")]
fn merge_excels_py(
    py: Python<'_>,
    paths: Vec<PathBuf>,
    base_dir: PathBuf,
) -> PyResult<(String, String)> {
    let report = py
        .allow_threads(|| merge_workbooks(&paths, &base_dir, &SpecMergeOptions::default()))
        .map_err(map_xlsx_io_error)?;
    Ok((
        derive_path_text(&report.dir_output),
        derive_path_text(&report.file_written),
    ))
}

#[pyfunction(name = "filter_workbook_paths")]
fn filter_workbook_paths_py(paths: Vec<PathBuf>) -> PyResult<Vec<String>> {
    let l_paths = filter_workbook_paths(&paths).map_err(map_fs_naming_error)?;
    Ok(l_paths.iter().map(|path| derive_path_text(path)).collect())
}

#[pymodule]
fn _tabkit_io_xlsx_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(read_headers_py, module)?)?;
    module.add_function(wrap_pyfunction!(split_excel_py, module)?)?;
    module.add_function(wrap_pyfunction!(merge_excels_py, module)?)?;
    module.add_function(wrap_pyfunction!(filter_workbook_paths_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
