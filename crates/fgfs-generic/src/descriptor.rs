//! Generic-protocol descriptor loading.
//!
//! FlightGear describes a generic protocol in an XML property list:
//!
//! ```xml
//! <PropertyList>
//!   <generic>
//!     <output>
//!       <var_separator>,</var_separator>
//!       <chunk>
//!         <name>ALT:altitude-ft</name>
//!         <conversion function="multiply" value="0.3048"/>
//!       </chunk>
//!     </output>
//!   </generic>
//! </PropertyList>
//! ```
//!
//! Each `chunk` becomes one positional [`FieldSpec`]. The registry key is the
//! part of `<name>` before the first `:`.

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use tracing::{debug, error};

use crate::conversion::Conversion;
use crate::error::{ConversionDefinitionError, DESCRIPTOR_ROOT_TAG, DescriptorError};

/// How a field's raw text is turned into a slot value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "conversion", rename_all = "snake_case")]
pub enum FieldConversion {
    /// Raw text is written unchanged.
    None,
    /// Raw text is converted to a float first.
    Apply(Conversion),
    /// The descriptor's conversion could not be resolved; the field is never
    /// written.
    Defective(#[serde(serialize_with = "serialize_display")] ConversionDefinitionError),
}

impl FieldConversion {
    /// Whether the field is flagged defective.
    #[must_use]
    pub fn is_defective(&self) -> bool {
        matches!(self, FieldConversion::Defective(_))
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &ConversionDefinitionError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// One positional field of a generic-protocol frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Zero-based position in the frame.
    pub position: usize,
    /// `<name>` text as written in the descriptor.
    pub name: Option<String>,
    /// Registry key derived from the name.
    pub key: Option<String>,
    /// Conversion applied before the write.
    pub conversion: FieldConversion,
}

/// Ordered field layout loaded from a descriptor. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMap {
    fields: Vec<FieldSpec>,
    separator: Option<char>,
}

impl FieldMap {
    /// Build a field map directly, mostly for tests.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>, separator: Option<char>) -> Self {
        Self { fields, separator }
    }

    /// Load and parse the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError`] when the file cannot be read or is not a
    /// usable generic-protocol descriptor.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| DescriptorError::io(path, source))?;
        let map = Self::parse_str(&raw)?;
        debug!(path = %path.display(), fields = map.len(), "loaded protocol descriptor");
        Ok(map)
    }

    /// Parse descriptor XML held in memory.
    ///
    /// # Errors
    ///
    /// See [`FieldMap::load`].
    pub fn parse_str(raw: &str) -> Result<Self, DescriptorError> {
        parse_descriptor(raw)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the descriptor declared no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&FieldSpec> {
        self.fields.get(position)
    }

    /// Iterate fields in frame order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    /// All fields in frame order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Separator declared by `var_separator`, if any.
    #[must_use]
    pub fn separator(&self) -> Option<char> {
        self.separator
    }

    /// Registry keys in frame order, skipping nameless chunks.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|field| field.key.as_deref())
    }

    /// Number of fields flagged defective.
    #[must_use]
    pub fn defective_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| field.conversion.is_defective())
            .count()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Registry key for a chunk name: the trimmed text before the first `:`.
#[must_use]
pub fn key_from_name(name: &str) -> Option<String> {
    let key = name.split(':').next().unwrap_or_default().trim();
    (!key.is_empty()).then(|| key.to_string())
}

/// Interpret a `var_separator` value.
///
/// Surrounding whitespace is ignored unless the value is nothing but a
/// single whitespace character, which is then the separator itself.
///
/// # Errors
///
/// Returns [`DescriptorError::InvalidSeparator`] for `newline` or anything
/// that is not exactly one character.
pub fn parse_separator(raw: &str) -> Result<char, DescriptorError> {
    let trimmed = raw.trim();
    let symbolic = match trimmed.to_ascii_lowercase().as_str() {
        "comma" => Some(','),
        "semicolon" => Some(';'),
        "colon" => Some(':'),
        "tab" => Some('\t'),
        "space" => Some(' '),
        "pipe" => Some('|'),
        "period" => Some('.'),
        "formfeed" => Some('\x0c'),
        "verticaltab" => Some('\x0b'),
        "carriagereturn" => Some('\r'),
        _ => None,
    };
    if let Some(sep) = symbolic {
        return Ok(sep);
    }

    let literal = if trimmed.is_empty() { raw } else { trimmed };
    let mut chars = literal.chars();
    match (chars.next(), chars.next()) {
        (Some(sep), None) if sep != '\n' => Ok(sep),
        _ => Err(DescriptorError::InvalidSeparator(raw.to_string())),
    }
}

#[derive(Debug, Default)]
struct PendingChunk {
    name: Option<String>,
    saw_name: bool,
    conversion: Option<Result<Conversion, ConversionDefinitionError>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    ChunkName,
    Separator,
}

fn parse_descriptor(raw: &str) -> Result<FieldMap, DescriptorError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    // Element path below the document root, root included.
    let mut path: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut saw_generic = false;
    let mut saw_output = false;

    let mut fields = Vec::new();
    let mut separator = None;
    let mut chunk: Option<PendingChunk> = None;
    let mut text_target: Option<TextTarget> = None;
    let mut separator_text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DescriptorError::xml(reader.error_position(), e.to_string()))?;

        match event {
            Event::Start(element) => {
                let tag = tag_name(&element);
                enter(&tag, &path, &mut saw_root)?;
                path.push(tag);

                match path_str(&path).as_slice() {
                    [_, "generic"] => saw_generic = true,
                    [_, "generic", "output"] => saw_output = true,
                    [_, "generic", "output", "chunk"] => chunk = Some(PendingChunk::default()),
                    [_, "generic", "output", "chunk", "name"] => {
                        // Only the first <name> of a chunk counts.
                        if let Some(pending) = chunk.as_mut()
                            && !pending.saw_name
                        {
                            pending.saw_name = true;
                            text_target = Some(TextTarget::ChunkName);
                        }
                    }
                    [_, "generic", "output", "chunk", "conversion"] => {
                        if let Some(pending) = chunk.as_mut() {
                            pending.conversion = Some(conversion_from(&element, &reader)?);
                        }
                    }
                    [_, "generic", "output", "var_separator"] => {
                        separator_text.clear();
                        text_target = Some(TextTarget::Separator);
                        // A lone space is a valid separator.
                        reader.config_mut().trim_text(false);
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                let tag = tag_name(&element);
                enter(&tag, &path, &mut saw_root)?;

                let mut child = path_str(&path);
                child.push(tag.as_str());
                match child.as_slice() {
                    [_, "generic"] => saw_generic = true,
                    [_, "generic", "output"] => saw_output = true,
                    [_, "generic", "output", "chunk"] => {
                        fields.push(finish_chunk(fields.len(), PendingChunk::default()));
                    }
                    [_, "generic", "output", "chunk", "name"] => {
                        if let Some(pending) = chunk.as_mut() {
                            pending.saw_name = true;
                        }
                    }
                    [_, "generic", "output", "chunk", "conversion"] => {
                        if let Some(pending) = chunk.as_mut() {
                            pending.conversion = Some(conversion_from(&element, &reader)?);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| DescriptorError::xml(reader.buffer_position(), e.to_string()))?;
                append_text(text_target, &text, chunk.as_mut(), &mut separator_text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data);
                append_text(text_target, &text, chunk.as_mut(), &mut separator_text);
            }
            Event::End(_) => {
                match path_str(&path).as_slice() {
                    [_, "generic", "output", "chunk"] => {
                        if let Some(pending) = chunk.take() {
                            fields.push(finish_chunk(fields.len(), pending));
                        }
                    }
                    [_, "generic", "output", "var_separator"] => {
                        reader.config_mut().trim_text(true);
                        separator = Some(parse_separator(&separator_text)?);
                    }
                    _ => {}
                }
                text_target = None;
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(DescriptorError::Empty);
    }
    if !saw_generic {
        return Err(DescriptorError::MissingSection("generic"));
    }
    if !saw_output {
        return Err(DescriptorError::MissingSection("output"));
    }

    Ok(FieldMap { fields, separator })
}

/// Check the root tag when the first element opens.
fn enter(tag: &str, path: &[String], saw_root: &mut bool) -> Result<(), DescriptorError> {
    if path.is_empty() {
        if *saw_root || tag != DESCRIPTOR_ROOT_TAG {
            return Err(DescriptorError::UnexpectedRoot {
                found: tag.to_string(),
            });
        }
        *saw_root = true;
    }
    Ok(())
}

fn path_str(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

fn tag_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn append_text(
    target: Option<TextTarget>,
    text: &str,
    chunk: Option<&mut PendingChunk>,
    separator_text: &mut String,
) {
    match (target, chunk) {
        (Some(TextTarget::ChunkName), Some(pending)) => {
            pending.name.get_or_insert_with(String::new).push_str(text);
        }
        (Some(TextTarget::Separator), _) => separator_text.push_str(text),
        _ => {}
    }
}

fn conversion_from(
    element: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<Result<Conversion, ConversionDefinitionError>, DescriptorError> {
    let mut function = None;
    let mut value = None;

    for attr in element.attributes().with_checks(false) {
        let attr =
            attr.map_err(|e| DescriptorError::xml(reader.buffer_position(), e.to_string()))?;
        let text = attr
            .unescape_value()
            .map_err(|e| DescriptorError::xml(reader.buffer_position(), e.to_string()))?
            .into_owned();
        match attr.key.local_name().as_ref() {
            b"function" => function = Some(text),
            b"value" => value = Some(text),
            _ => {}
        }
    }

    Ok(match function {
        Some(function) => Conversion::resolve(&function, value.as_deref()),
        None => Err(ConversionDefinitionError::MissingFunction),
    })
}

fn finish_chunk(position: usize, pending: PendingChunk) -> FieldSpec {
    let name = pending
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());
    let key = name.as_deref().and_then(key_from_name);

    let conversion = match pending.conversion {
        None => FieldConversion::None,
        Some(Ok(conversion)) => FieldConversion::Apply(conversion),
        Some(Err(err)) => {
            error!(
                position,
                chunk = name.as_deref().unwrap_or("<unnamed>"),
                error = %err,
                "problem with conversion definition"
            );
            FieldConversion::Defective(err)
        }
    };

    if key.is_none() {
        debug!(position, "chunk has no usable name, it will not be bound");
    }

    FieldSpec {
        position,
        name,
        key,
        conversion,
    }
}
