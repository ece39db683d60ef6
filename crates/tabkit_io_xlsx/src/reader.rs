//! Streaming reader for the active worksheet of an `.xlsx` package.
//!
//! Package metadata (sheet resolution, date system, shared strings, cell
//! styles) is loaded once on open; worksheet rows are then pulled one at a
//! time from the zipped XML so memory stays bounded by the widest row.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tabkit_io_fs::is_lock_error;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::conf::C_MSG_HEADERS_LOCKED;
use crate::error::XlsxIoError;
use crate::spec::{EnumCellValue, EnumDateEpoch, SpecCellStyle};
use crate::styles::{read_cell_styles, read_theme_colors};
use crate::util::{convert_serial_to_datetime, is_date_format, split_cell_reference};

const C_PATH_WORKBOOK: &str = "xl/workbook.xml";
const C_PATH_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const C_PATH_SHEET_DEFAULT: &str = "xl/worksheets/sheet1.xml";
const C_PATH_SHARED_STRINGS_DEFAULT: &str = "xl/sharedStrings.xml";
const C_PATH_STYLES_DEFAULT: &str = "xl/styles.xml";
const C_PATH_THEME_DEFAULT: &str = "xl/theme/theme1.xml";

////////////////////////////////////////////////////////////////////////////////
// #region SourceCell

/// One cell of a source row: raw value plus its shared style record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCell {
    /// Raw value; date serials stay numeric.
    pub value: EnumCellValue,
    /// Style record, `None` when the cell carries no style index.
    pub style: Option<Arc<SpecCellStyle>>,
}

impl SourceCell {
    /// Number format code of the cell, if any.
    pub fn number_format(&self) -> Option<&str> {
        self.style.as_ref()?.num_format.as_deref()
    }

    /// Display text; date-formatted serials render as date-times.
    pub fn text(&self, epoch: EnumDateEpoch) -> String {
        if let EnumCellValue::Number(n_serial) = self.value
            && self.number_format().is_some_and(is_date_format)
            && let Ok(dt) = convert_serial_to_datetime(n_serial, epoch)
        {
            return EnumCellValue::DateTime(dt).to_string();
        }
        self.value.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PackageMetadata

#[derive(Debug, Default)]
struct SpecWorkbookInfo {
    l_sheet_rids: Vec<String>,
    n_active_tab: usize,
    if_date1904: bool,
}

#[derive(Debug, Clone)]
struct SpecRelationship {
    kind: String,
    target: String,
}

#[derive(Debug)]
struct SpecWorkbookMeta {
    path_sheet: String,
    epoch: EnumDateEpoch,
    l_shared_strings: Vec<String>,
    l_styles: Vec<Arc<SpecCellStyle>>,
}

fn derive_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, XlsxIoError> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn read_optional_part<R, T>(
    archive: &mut ZipArchive<R>,
    name: &str,
    parse: impl FnOnce(&mut dyn BufRead) -> Result<T, XlsxIoError>,
) -> Result<Option<T>, XlsxIoError>
where
    R: Read + Seek,
{
    match archive.by_name(name) {
        Ok(file) => {
            let mut source = BufReader::new(file);
            parse(&mut source).map(Some)
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn read_workbook_info<R: BufRead>(source: R) -> Result<SpecWorkbookInfo, XlsxIoError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut info = SpecWorkbookInfo::default();
    let mut if_view_seen = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    info.if_date1904 = derive_attr(&e, b"date1904")?
                        .is_some_and(|val| matches!(val.as_str(), "1" | "true"));
                }
                b"workbookView" if !if_view_seen => {
                    if_view_seen = true;
                    info.n_active_tab = derive_attr(&e, b"activeTab")?
                        .and_then(|val| val.parse().ok())
                        .unwrap_or(0);
                }
                b"sheet" => {
                    if let Some(rid) = derive_attr(&e, b"id")? {
                        info.l_sheet_rids.push(rid);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(info)
}

fn read_relationships<R: BufRead>(
    source: R,
) -> Result<HashMap<String, SpecRelationship>, XlsxIoError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut dict_rels = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (derive_attr(&e, b"Id")?, derive_attr(&e, b"Target")?)
                {
                    let kind = derive_attr(&e, b"Type")?.unwrap_or_default();
                    dict_rels.insert(id, SpecRelationship { kind, target });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(dict_rels)
}

fn read_shared_strings<R: BufRead>(source: R) -> Result<Vec<String>, XlsxIoError> {
    let mut reader = Reader::from_reader(source);

    let mut l_strings = Vec::new();
    let mut c_current = String::new();
    let mut if_in_text = false;
    let mut if_in_phonetic = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => c_current.clear(),
                b"t" => if_in_text = !if_in_phonetic,
                b"rPh" => if_in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => l_strings.push(String::new()),
            Event::Text(e) if if_in_text => c_current.push_str(&e.unescape()?),
            Event::CData(e) if if_in_text => c_current.push_str(&String::from_utf8_lossy(&e)),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => l_strings.push(std::mem::take(&mut c_current)),
                b"t" => if_in_text = false,
                b"rPh" => if_in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(l_strings)
}

fn derive_part_path(target: &str) -> String {
    if let Some(c_absolute) = target.strip_prefix('/') {
        c_absolute.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn derive_related_part(
    dict_rels: &HashMap<String, SpecRelationship>,
    kind_suffix: &str,
    path_default: &str,
) -> String {
    dict_rels
        .values()
        .find(|rel| rel.kind.ends_with(kind_suffix))
        .map_or_else(|| path_default.to_string(), |rel| derive_part_path(&rel.target))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Reader

fn map_open_error(err: io::Error, path: &Path, msg_locked: &str) -> XlsxIoError {
    if is_lock_error(&err) {
        XlsxIoError::Locked {
            path: path.to_path_buf(),
            message: msg_locked.to_string(),
        }
    } else {
        XlsxIoError::Io(err)
    }
}

/// Read-only handle on an `.xlsx` package positioned at its active sheet.
pub struct XlsxReader {
    archive: ZipArchive<BufReader<File>>,
    meta: SpecWorkbookMeta,
}

impl XlsxReader {
    /// Open `path`; a lock/permission failure becomes
    /// [`XlsxIoError::Locked`] carrying `msg_locked`.
    pub fn open(path: &Path, msg_locked: &str) -> Result<Self, XlsxIoError> {
        let file = File::open(path).map_err(|err| map_open_error(err, path, msg_locked))?;

        let reader = Self::from_file(file)?;
        tracing::debug!(
            path = %path.display(),
            sheet = %reader.meta.path_sheet,
            epoch = ?reader.meta.epoch,
            "opened source workbook"
        );
        Ok(reader)
    }

    /// Load package metadata from an already opened file.
    pub fn from_file(file: File) -> Result<Self, XlsxIoError> {
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let info = read_optional_part(&mut archive, C_PATH_WORKBOOK, |src| {
            read_workbook_info(src)
        })?
        .ok_or_else(|| XlsxIoError::Malformed(format!("missing {C_PATH_WORKBOOK}")))?;
        let dict_rels = read_optional_part(&mut archive, C_PATH_WORKBOOK_RELS, |src| {
            read_relationships(src)
        })?
        .unwrap_or_default();

        let path_sheet = info
            .l_sheet_rids
            .get(info.n_active_tab)
            .or_else(|| info.l_sheet_rids.first())
            .and_then(|rid| dict_rels.get(rid))
            .map_or_else(
                || C_PATH_SHEET_DEFAULT.to_string(),
                |rel| derive_part_path(&rel.target),
            );

        let path_shared =
            derive_related_part(&dict_rels, "/sharedStrings", C_PATH_SHARED_STRINGS_DEFAULT);
        let l_shared_strings =
            read_optional_part(&mut archive, &path_shared, |src| read_shared_strings(src))?
                .unwrap_or_default();

        let path_theme = derive_related_part(&dict_rels, "/theme", C_PATH_THEME_DEFAULT);
        let l_theme_colors =
            read_optional_part(&mut archive, &path_theme, |src| read_theme_colors(src))?
                .unwrap_or_default();

        let path_styles = derive_related_part(&dict_rels, "/styles", C_PATH_STYLES_DEFAULT);
        let l_styles = read_optional_part(&mut archive, &path_styles, |src| {
            read_cell_styles(src, &l_theme_colors)
        })?
        .unwrap_or_default();

        Ok(Self {
            archive,
            meta: SpecWorkbookMeta {
                path_sheet,
                epoch: if info.if_date1904 {
                    EnumDateEpoch::Mac1904
                } else {
                    EnumDateEpoch::Windows1900
                },
                l_shared_strings,
                l_styles,
            },
        })
    }

    /// Date system of the workbook.
    pub fn epoch(&self) -> EnumDateEpoch {
        self.meta.epoch
    }

    /// Stream rows of the active sheet from row 1.
    pub fn rows(&mut self) -> Result<XlsxRowStream<'_>, XlsxIoError> {
        let Self { archive, meta } = self;
        let file_sheet = archive.by_name(&meta.path_sheet)?;
        let source: Box<dyn Read + '_> = Box::new(file_sheet);

        Ok(XlsxRowStream {
            reader: Reader::from_reader(BufReader::new(source)),
            meta,
            buf: Vec::new(),
            n_row_next: 0,
            n_row_parsed_next: 0,
            row_pending: None,
            if_done: false,
        })
    }
}

/// Read row 1 of the active sheet as display strings (absent cells are `""`).
///
/// Returns an empty list when the sheet has no first row.
pub fn read_headers(path: &Path) -> Result<Vec<String>, XlsxIoError> {
    let mut reader = XlsxReader::open(path, C_MSG_HEADERS_LOCKED)?;
    let epoch = reader.epoch();
    let l_header = reader.rows()?.next().transpose()?.unwrap_or_default();

    Ok(l_header.iter().map(|cell| cell.text(epoch)).collect())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowStream

#[derive(Debug, Default)]
struct SpecRawCell {
    n_col: usize,
    n_style: Option<usize>,
    c_kind: String,
    c_text: String,
    if_has_value: bool,
}

/// Iterator over worksheet rows in order.
///
/// Missing rows come back as empty rows and missing leading/inner columns as
/// empty cells, so the `n`-th item is always sheet row `n + 1`.
pub struct XlsxRowStream<'a> {
    reader: Reader<BufReader<Box<dyn Read + 'a>>>,
    meta: &'a SpecWorkbookMeta,
    buf: Vec<u8>,
    n_row_next: usize,
    n_row_parsed_next: usize,
    row_pending: Option<(usize, Vec<SourceCell>)>,
    if_done: bool,
}

impl XlsxRowStream<'_> {
    fn read_next_row(&mut self) -> Result<Option<(usize, Vec<SourceCell>)>, XlsxIoError> {
        let meta = self.meta;
        let mut row: Option<(usize, Vec<SourceCell>)> = None;
        let mut cell: Option<SpecRawCell> = None;
        let mut if_in_value = false;
        let mut if_in_phonetic = false;

        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            let if_empty = matches!(event, Event::Empty(_));
            match event {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"row" => {
                        let n_row = match derive_attr(&e, b"r")?.and_then(|val| val.parse::<usize>().ok()) {
                            Some(n_row_1based) if n_row_1based > 0 => n_row_1based - 1,
                            _ => self.n_row_parsed_next,
                        };
                        self.n_row_parsed_next = n_row + 1;
                        if if_empty {
                            return Ok(Some((n_row, Vec::new())));
                        }
                        row = Some((n_row, Vec::new()));
                    }
                    b"c" => {
                        let n_col_default = row.as_ref().map_or(0, |(_, l_cells)| l_cells.len());
                        let raw = SpecRawCell {
                            n_col: derive_attr(&e, b"r")?
                                .and_then(|val| split_cell_reference(&val))
                                .map_or(n_col_default, |(_, n_col)| n_col),
                            n_style: derive_attr(&e, b"s")?.and_then(|val| val.parse().ok()),
                            c_kind: derive_attr(&e, b"t")?.unwrap_or_default(),
                            ..Default::default()
                        };
                        if if_empty {
                            push_cell(&mut row, raw.n_col, resolve_cell(raw, meta)?);
                        } else {
                            cell = Some(raw);
                        }
                    }
                    b"v" | b"is" => {
                        if let Some(raw) = cell.as_mut() {
                            raw.if_has_value = true;
                        }
                        if_in_value = !if_empty && e.local_name().as_ref() == b"v";
                    }
                    b"t" if cell.is_some() => if_in_value = !if_empty && !if_in_phonetic,
                    b"rPh" => if_in_phonetic = !if_empty,
                    _ => {}
                },
                Event::Text(e) if if_in_value => {
                    if let Some(raw) = cell.as_mut() {
                        raw.c_text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) if if_in_value => {
                    if let Some(raw) = cell.as_mut() {
                        raw.c_text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"t" => if_in_value = false,
                    b"rPh" => if_in_phonetic = false,
                    b"c" => {
                        if let Some(raw) = cell.take() {
                            push_cell(&mut row, raw.n_col, resolve_cell(raw, meta)?);
                        }
                    }
                    b"row" | b"sheetData" => return Ok(row),
                    _ => {}
                },
                Event::Eof => return Ok(row),
                _ => {}
            }
        }
    }
}

impl Iterator for XlsxRowStream<'_> {
    type Item = Result<Vec<SourceCell>, XlsxIoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.row_pending.is_none() && !self.if_done {
            match self.read_next_row() {
                Ok(Some(row)) => self.row_pending = Some(row),
                Ok(None) => self.if_done = true,
                Err(err) => {
                    self.if_done = true;
                    return Some(Err(err));
                }
            }
        }

        let (n_row_pending, _) = self.row_pending.as_ref()?;
        if *n_row_pending > self.n_row_next {
            self.n_row_next += 1;
            return Some(Ok(Vec::new()));
        }

        let (n_row, l_cells) = self.row_pending.take()?;
        self.n_row_next = usize::max(self.n_row_next, n_row + 1);
        Some(Ok(l_cells))
    }
}

fn push_cell(row: &mut Option<(usize, Vec<SourceCell>)>, n_col: usize, cell: SourceCell) {
    let Some((_, l_cells)) = row.as_mut() else {
        return;
    };
    if n_col < l_cells.len() {
        l_cells[n_col] = cell;
        return;
    }
    l_cells.resize_with(n_col, SourceCell::default);
    l_cells.push(cell);
}

fn resolve_cell(raw: SpecRawCell, meta: &SpecWorkbookMeta) -> Result<SourceCell, XlsxIoError> {
    let style = raw.n_style.and_then(|idx| meta.l_styles.get(idx).cloned());
    if !raw.if_has_value {
        return Ok(SourceCell {
            value: EnumCellValue::None,
            style,
        });
    }

    let c_text = raw.c_text;
    let value = match raw.c_kind.as_str() {
        "s" => {
            let c_shared = c_text
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| meta.l_shared_strings.get(idx))
                .ok_or_else(|| {
                    XlsxIoError::Malformed(format!("invalid shared string index {c_text:?}"))
                })?;
            EnumCellValue::String(c_shared.clone())
        }
        "str" | "inlineStr" | "e" => EnumCellValue::String(c_text),
        "b" => EnumCellValue::Boolean(matches!(c_text.trim(), "1" | "true")),
        "d" => derive_iso_datetime(c_text.trim())
            .map_or(EnumCellValue::String(c_text), EnumCellValue::DateTime),
        _ => {
            let c_num = c_text.trim();
            if c_num.is_empty() {
                EnumCellValue::None
            } else {
                c_num
                    .parse::<f64>()
                    .map_err(|_| XlsxIoError::Malformed(format!("invalid number {c_num:?}")))
                    .map(EnumCellValue::Number)?
            }
        }
    };
    Ok(SourceCell { value, style })
}

fn derive_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
