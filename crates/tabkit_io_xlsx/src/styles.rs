//! `xl/styles.xml` reader: resolves each cell-format index to a style record.
//!
//! Colors come out as `#RRGGBB`. `rgb`, `indexed` and `theme` references are
//! resolved against the legacy palette and the package theme, then `tint` is
//! applied as an HLS luminance shift.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::conf::{TUP_INDEXED_COLORS, derive_builtin_num_format};
use crate::error::XlsxIoError;
use crate::spec::{SpecAlignment, SpecBorder, SpecBorderSide, SpecCellStyle, SpecFill, SpecFont};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumStyleSection {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumBorderEdge {
    Top,
    Bottom,
    Left,
    Right,
}

/// `clrScheme` slots in document order.
const TUP_THEME_SLOTS: [&[u8]; 12] = [
    b"dk1", b"lt1", b"dk2", b"lt2", b"accent1", b"accent2", b"accent3", b"accent4",
    b"accent5", b"accent6", b"hlink", b"folHlink",
];

#[derive(Debug, Default)]
struct SpecXfRef {
    num_fmt_id: u32,
    font_id: Option<usize>,
    fill_id: Option<usize>,
    border_id: Option<usize>,
    alignment: Option<SpecAlignment>,
}

/// Convert an `ARGB`/`RGB` hex color to `#RRGGBB`.
pub fn derive_hex_color(rgb: &str) -> Option<String> {
    let c_rgb = rgb.trim();
    if !c_rgb.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    match c_rgb.len() {
        8 => Some(format!("#{}", c_rgb[2..].to_ascii_uppercase())),
        6 => Some(format!("#{}", c_rgb.to_ascii_uppercase())),
        _ => None,
    }
}

/// Map a border style name to its numeric code (`0` = none).
pub fn derive_border_code(style: &str) -> i64 {
    match style {
        "thin" => 1,
        "medium" => 2,
        "dashed" => 3,
        "dotted" => 4,
        "thick" => 5,
        "double" => 6,
        "hair" => 7,
        "mediumDashed" => 8,
        "dashDot" => 9,
        "mediumDashDot" => 10,
        "dashDotDot" => 11,
        "mediumDashDotDot" => 12,
        "slantDashDot" => 13,
        _ => 0,
    }
}

fn derive_attrs(e: &BytesStart<'_>) -> Result<HashMap<String, String>, XlsxIoError> {
    let mut dict_attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let c_key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        dict_attrs.insert(c_key, attr.unescape_value()?.into_owned());
    }
    Ok(dict_attrs)
}

fn is_flag_on(dict_attrs: &HashMap<String, String>) -> bool {
    dict_attrs
        .get("val")
        .is_none_or(|val| !matches!(val.as_str(), "0" | "false"))
}

/// Lighten (`tint > 0`) or darken (`tint < 0`) a `#RRGGBB` color.
///
/// Only the HLS luminance moves: `l * (1 + tint)` when darkening,
/// `l * (1 - tint) + tint` when lightening.
pub fn apply_tint(color: &str, tint: f64) -> Option<String> {
    let c_hex = color.strip_prefix('#').unwrap_or(color);
    if c_hex.len() != 6 || !c_hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let derive_channel = |n_pos: usize| {
        u8::from_str_radix(&c_hex[n_pos..n_pos + 2], 16)
            .ok()
            .map(|val| f64::from(val) / 255.0)
    };
    let (n_hue, n_lum, n_sat) =
        convert_rgb_to_hls(derive_channel(0)?, derive_channel(2)?, derive_channel(4)?);

    let n_lum = if tint < 0.0 {
        n_lum * (1.0 + tint)
    } else {
        n_lum * (1.0 - tint) + tint
    };
    let (n_red, n_green, n_blue) = convert_hls_to_rgb(n_hue, n_lum.clamp(0.0, 1.0), n_sat);

    let cast_byte = |val: f64| (val * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(format!(
        "#{:02X}{:02X}{:02X}",
        cast_byte(n_red),
        cast_byte(n_green),
        cast_byte(n_blue)
    ))
}

fn convert_rgb_to_hls(n_red: f64, n_green: f64, n_blue: f64) -> (f64, f64, f64) {
    let n_max = n_red.max(n_green).max(n_blue);
    let n_min = n_red.min(n_green).min(n_blue);
    let n_lum = (n_max + n_min) / 2.0;
    if n_max == n_min {
        return (0.0, n_lum, 0.0);
    }

    let n_delta = n_max - n_min;
    let n_sat = if n_lum <= 0.5 {
        n_delta / (n_max + n_min)
    } else {
        n_delta / (2.0 - n_max - n_min)
    };
    let n_rc = (n_max - n_red) / n_delta;
    let n_gc = (n_max - n_green) / n_delta;
    let n_bc = (n_max - n_blue) / n_delta;
    let n_hue = if n_red == n_max {
        n_bc - n_gc
    } else if n_green == n_max {
        2.0 + n_rc - n_bc
    } else {
        4.0 + n_gc - n_rc
    };
    ((n_hue / 6.0).rem_euclid(1.0), n_lum, n_sat)
}

fn convert_hls_to_rgb(n_hue: f64, n_lum: f64, n_sat: f64) -> (f64, f64, f64) {
    if n_sat == 0.0 {
        return (n_lum, n_lum, n_lum);
    }
    let n_m2 = if n_lum <= 0.5 {
        n_lum * (1.0 + n_sat)
    } else {
        n_lum + n_sat - n_lum * n_sat
    };
    let n_m1 = 2.0 * n_lum - n_m2;
    let derive_channel = |n_hue: f64| {
        let n_hue = n_hue.rem_euclid(1.0);
        if n_hue < 1.0 / 6.0 {
            n_m1 + (n_m2 - n_m1) * n_hue * 6.0
        } else if n_hue < 0.5 {
            n_m2
        } else if n_hue < 2.0 / 3.0 {
            n_m1 + (n_m2 - n_m1) * (2.0 / 3.0 - n_hue) * 6.0
        } else {
            n_m1
        }
    };
    (
        derive_channel(n_hue + 1.0 / 3.0),
        derive_channel(n_hue),
        derive_channel(n_hue - 1.0 / 3.0),
    )
}

/// Parse the first `clrScheme` of a theme part into its 12 slots, in order
/// `dk1 lt1 dk2 lt2 accent1..accent6 hlink folHlink`.
pub fn read_theme_colors<R: BufRead>(source: R) -> Result<Vec<Option<String>>, XlsxIoError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut l_colors: Vec<Option<String>> = vec![None; TUP_THEME_SLOTS.len()];
    let mut if_in_scheme = false;
    let mut slot_current: Option<usize> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name();
                let tag = name.as_ref();
                if tag == b"clrScheme" {
                    if_in_scheme = true;
                } else if if_in_scheme
                    && let Some(n_slot) = TUP_THEME_SLOTS.iter().position(|slot| *slot == tag)
                {
                    slot_current = Some(n_slot);
                } else if let Some(n_slot) = slot_current
                    && matches!(tag, b"srgbClr" | b"sysClr")
                {
                    let dict_attrs = derive_attrs(&e)?;
                    let c_key = if tag == b"srgbClr" { "val" } else { "lastClr" };
                    l_colors[n_slot] = dict_attrs.get(c_key).and_then(|val| derive_hex_color(val));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"clrScheme" => break,
                tag if TUP_THEME_SLOTS.iter().any(|slot| *slot == tag) => slot_current = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(l_colors)
}

fn derive_theme_color(l_theme_colors: &[Option<String>], n_theme: usize) -> Option<String> {
    // Style references swap each dark/light pair of the scheme.
    let n_slot = match n_theme {
        0 => 1,
        1 => 0,
        2 => 3,
        3 => 2,
        n => n,
    };
    l_theme_colors.get(n_slot).cloned().flatten()
}

fn derive_base_color(
    dict_attrs: &HashMap<String, String>,
    l_theme_colors: &[Option<String>],
) -> Option<String> {
    let parse_index = |key: &str| dict_attrs.get(key).and_then(|val| val.parse::<usize>().ok());
    if let Some(rgb) = dict_attrs.get("rgb") {
        derive_hex_color(rgb)
    } else if let Some(n_theme) = parse_index("theme") {
        derive_theme_color(l_theme_colors, n_theme)
    } else if let Some(n_indexed) = parse_index("indexed") {
        TUP_INDEXED_COLORS.get(n_indexed).map(|color| color.to_string())
    } else {
        None
    }
}

fn derive_color(
    dict_attrs: &HashMap<String, String>,
    l_theme_colors: &[Option<String>],
) -> Option<String> {
    let c_base = derive_base_color(dict_attrs, l_theme_colors)?;
    match dict_attrs.get("tint").and_then(|val| val.parse::<f64>().ok()) {
        Some(n_tint) if n_tint != 0.0 => apply_tint(&c_base, n_tint),
        _ => Some(c_base),
    }
}

/// Parse a styles part into one shared style record per `cellXfs` entry.
///
/// `l_theme_colors` is the output of [`read_theme_colors`]; pass an empty
/// slice when the package has no theme. A fill whose foreground color
/// cannot be resolved is dropped rather than written with the writer's
/// default color.
pub fn read_cell_styles<R: BufRead>(
    source: R,
    l_theme_colors: &[Option<String>],
) -> Result<Vec<Arc<SpecCellStyle>>, XlsxIoError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut dict_num_fmts: HashMap<u32, String> = HashMap::new();
    let mut l_fonts: Vec<SpecFont> = Vec::new();
    let mut l_fills: Vec<SpecFill> = Vec::new();
    let mut l_fills_unresolved: Vec<bool> = Vec::new();
    let mut l_borders: Vec<SpecBorder> = Vec::new();
    let mut l_xfs: Vec<SpecXfRef> = Vec::new();

    let mut section = EnumStyleSection::Other;
    let mut edge_current: Option<EnumBorderEdge> = None;
    let mut if_in_pattern_fill = false;

    let mut buf = Vec::new();
    loop {
        let event = reader.read_event_into(&mut buf)?;
        let if_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let dict_attrs = derive_attrs(&e)?;
                match (section, e.local_name().as_ref()) {
                    (_, b"numFmt") => {
                        if let (Some(id), Some(code)) =
                            (dict_attrs.get("numFmtId"), dict_attrs.get("formatCode"))
                            && let Ok(n_id) = id.parse::<u32>()
                        {
                            dict_num_fmts.insert(n_id, code.clone());
                        }
                    }
                    (EnumStyleSection::Other, b"fonts") if !if_empty => {
                        section = EnumStyleSection::Fonts
                    }
                    (EnumStyleSection::Other, b"fills") if !if_empty => {
                        section = EnumStyleSection::Fills
                    }
                    (EnumStyleSection::Other, b"borders") if !if_empty => {
                        section = EnumStyleSection::Borders
                    }
                    (EnumStyleSection::Other, b"cellXfs") if !if_empty => {
                        section = EnumStyleSection::CellXfs
                    }

                    (EnumStyleSection::Fonts, b"font") => l_fonts.push(SpecFont::default()),
                    (EnumStyleSection::Fonts, tag) => {
                        if let Some(font) = l_fonts.last_mut() {
                            match tag {
                                b"name" => font.name = dict_attrs.get("val").cloned(),
                                b"sz" => {
                                    font.size =
                                        dict_attrs.get("val").and_then(|val| val.parse().ok())
                                }
                                b"b" => font.bold = is_flag_on(&dict_attrs),
                                b"i" => font.italic = is_flag_on(&dict_attrs),
                                b"strike" => font.strikethrough = is_flag_on(&dict_attrs),
                                b"u" => {
                                    let c_kind = dict_attrs
                                        .get("val")
                                        .cloned()
                                        .unwrap_or_else(|| "single".to_string());
                                    font.underline = (c_kind != "none").then_some(c_kind);
                                }
                                b"color" => font.color = derive_color(&dict_attrs, l_theme_colors),
                                _ => {}
                            }
                        }
                    }

                    (EnumStyleSection::Fills, b"fill") => {
                        l_fills.push(SpecFill::default());
                        l_fills_unresolved.push(false);
                    }
                    (EnumStyleSection::Fills, tag) => {
                        if let Some(fill) = l_fills.last_mut() {
                            match tag {
                                b"patternFill" => {
                                    fill.pattern = dict_attrs.get("patternType").cloned();
                                    if_in_pattern_fill = !if_empty;
                                }
                                b"fgColor" if if_in_pattern_fill => {
                                    fill.fg_color = derive_color(&dict_attrs, l_theme_colors);
                                    if fill.fg_color.is_none()
                                        && let Some(if_unresolved) = l_fills_unresolved.last_mut()
                                    {
                                        *if_unresolved = !is_auto_color(&dict_attrs);
                                    }
                                }
                                b"bgColor" if if_in_pattern_fill => {
                                    fill.bg_color = derive_color(&dict_attrs, l_theme_colors)
                                }
                                _ => {}
                            }
                        }
                    }

                    (EnumStyleSection::Borders, b"border") => l_borders.push(SpecBorder::default()),
                    (EnumStyleSection::Borders, tag) => {
                        let edge = match tag {
                            b"top" => Some(EnumBorderEdge::Top),
                            b"bottom" => Some(EnumBorderEdge::Bottom),
                            b"left" | b"start" => Some(EnumBorderEdge::Left),
                            b"right" | b"end" => Some(EnumBorderEdge::Right),
                            _ => None,
                        };
                        if let Some(border) = l_borders.last_mut() {
                            if let Some(edge) = edge {
                                let side = derive_border_side(border, edge);
                                side.style = dict_attrs
                                    .get("style")
                                    .map_or(0, |style| derive_border_code(style));
                                edge_current = (!if_empty).then_some(edge);
                            } else if tag == b"color"
                                && let Some(edge) = edge_current
                            {
                                derive_border_side(border, edge).color =
                                    derive_color(&dict_attrs, l_theme_colors);
                            } else if tag == b"diagonal" {
                                edge_current = None;
                            }
                        }
                    }

                    (EnumStyleSection::CellXfs, b"xf") => l_xfs.push(SpecXfRef {
                        num_fmt_id: dict_attrs
                            .get("numFmtId")
                            .and_then(|val| val.parse().ok())
                            .unwrap_or(0),
                        font_id: dict_attrs.get("fontId").and_then(|val| val.parse().ok()),
                        fill_id: dict_attrs.get("fillId").and_then(|val| val.parse().ok()),
                        border_id: dict_attrs.get("borderId").and_then(|val| val.parse().ok()),
                        alignment: None,
                    }),
                    (EnumStyleSection::CellXfs, b"alignment") => {
                        if let Some(xf) = l_xfs.last_mut() {
                            xf.alignment = Some(SpecAlignment {
                                horizontal: dict_attrs.get("horizontal").cloned(),
                                vertical: dict_attrs.get("vertical").cloned(),
                                wrap_text: dict_attrs
                                    .get("wrapText")
                                    .is_some_and(|val| matches!(val.as_str(), "1" | "true")),
                                indent: dict_attrs
                                    .get("indent")
                                    .and_then(|val| val.parse().ok())
                                    .unwrap_or(0),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"fonts" | b"fills" | b"borders" | b"cellXfs" => section = EnumStyleSection::Other,
                b"patternFill" => if_in_pattern_fill = false,
                b"top" | b"bottom" | b"left" | b"right" | b"start" | b"end" => edge_current = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(l_xfs
        .into_iter()
        .map(|xf| {
            let num_format = dict_num_fmts
                .get(&xf.num_fmt_id)
                .cloned()
                .or_else(|| derive_builtin_num_format(xf.num_fmt_id).map(ToString::to_string));
            Arc::new(SpecCellStyle {
                num_format,
                font: xf.font_id.and_then(|idx| l_fonts.get(idx).cloned()),
                fill: xf.fill_id.and_then(|idx| {
                    let fill = l_fills.get(idx)?;
                    if l_fills_unresolved.get(idx).copied().unwrap_or(false) {
                        Some(SpecFill::default())
                    } else {
                        Some(fill.clone())
                    }
                }),
                border: xf.border_id.and_then(|idx| l_borders.get(idx).cloned()),
                alignment: xf.alignment,
            })
        })
        .collect())
}

fn is_auto_color(dict_attrs: &HashMap<String, String>) -> bool {
    dict_attrs
        .get("auto")
        .is_some_and(|val| matches!(val.as_str(), "1" | "true"))
        || dict_attrs
            .get("indexed")
            .is_some_and(|val| matches!(val.as_str(), "64" | "65"))
}

fn derive_border_side(border: &mut SpecBorder, edge: EnumBorderEdge) -> &mut SpecBorderSide {
    match edge {
        EnumBorderEdge::Top => &mut border.top,
        EnumBorderEdge::Bottom => &mut border.bottom,
        EnumBorderEdge::Left => &mut border.left,
        EnumBorderEdge::Right => &mut border.right,
    }
}
