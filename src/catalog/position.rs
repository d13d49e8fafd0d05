use super::{CatalogDecoder, DecodedFile, PositionRecord, RecordKind};

/// Decoder for `.pos` position files
///
/// A position starts at an `@P` line carrying its name. The bare numeric
/// lines right after it are the price values, and two-character `@` tags
/// introduce the remaining fields. Long text (`@T`), short text (`@R`) and
/// description (`@B`) span any number of lines and stay open until the next
/// tag that closes them.
pub struct PositionDecoder;

impl CatalogDecoder for PositionDecoder {
    fn decode(&self, source_file: &str, text: &str) -> DecodedFile {
        DecodedFile::Positions(decode_positions(source_file, text))
    }

    fn kind(&self) -> RecordKind {
        RecordKind::Positions
    }
}

/// Decode the text of a position file into records in file order
pub fn decode_positions(source_file: &str, text: &str) -> Vec<PositionRecord> {
    let mut scanner = PositionScanner::new(source_file);
    for line in text.split('\n') {
        scanner.feed(line);
    }
    scanner.finish()
}

/// Two-character field tags of the position format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    /// `@P`
    RecordStart,
    /// `@T`
    LongText,
    /// `@R`
    ShortText,
    /// `@M`
    Unit,
    /// `@E`
    UnitCode,
    /// `@C`
    Category,
    /// `@D`
    SourceId,
    /// `@B`
    Description,
    /// `@K`, `@L`, `@W`, `@H`, `@Y`, `@V`
    Meta,
    /// `@A` option/material-variant declaration; not modeled
    Attribute,
}

impl Tag {
    /// Split a right-trimmed line into its tag and trimmed trailing value
    pub(crate) fn split(line: &str) -> Option<(Tag, &str)> {
        let rest = line.strip_prefix('@')?;
        let mut chars = rest.chars();
        let tag = match chars.next()? {
            'P' => Tag::RecordStart,
            'T' => Tag::LongText,
            'R' => Tag::ShortText,
            'M' => Tag::Unit,
            'E' => Tag::UnitCode,
            'C' => Tag::Category,
            'D' => Tag::SourceId,
            'B' => Tag::Description,
            'K' | 'L' | 'W' | 'H' | 'Y' | 'V' => Tag::Meta,
            'A' => Tag::Attribute,
            _ => return None,
        };
        Some((tag, chars.as_str().trim()))
    }
}

/// Where the scanner is within the current position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    /// Before the first `@P`
    NoRecord,
    /// Right after `@P`; bare numbers are price values
    LeadingValues,
    LongText,
    ShortText,
    Description,
    /// Inside a record, nothing accumulating
    Idle,
}

/// What happens to the open multi-line buffer when a tag arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BufferAction {
    /// Write the buffer into the field of the state being left
    Flush,
    /// Write the buffer only if the state being left is `LongText`
    FlushLongText,
    /// Drop the buffer without writing it
    Discard,
    /// Leave the buffer and the state untouched
    Keep,
}

/// The transition taken on a tag: what to do with the buffer, and the next state
pub(crate) fn transition(state: ScanState, tag: Tag) -> (BufferAction, ScanState) {
    use BufferAction::{Discard, Flush, FlushLongText, Keep};

    if state == ScanState::NoRecord && tag != Tag::RecordStart {
        return (Discard, ScanState::NoRecord);
    }

    match tag {
        Tag::RecordStart => (Flush, ScanState::LeadingValues),
        Tag::LongText => (Flush, ScanState::LongText),
        Tag::ShortText => (Flush, ScanState::ShortText),
        Tag::Description => (FlushLongText, ScanState::Description),
        Tag::Unit => (Flush, ScanState::Idle),
        Tag::UnitCode => (FlushLongText, ScanState::Idle),
        Tag::Category | Tag::SourceId | Tag::Meta => (Discard, ScanState::Idle),
        // the attribute line and its value line are skipped in place
        Tag::Attribute => (Keep, state),
    }
}

struct PositionScanner<'a> {
    source_file: &'a str,
    records: Vec<PositionRecord>,
    current: Option<PositionRecord>,
    state: ScanState,
    buffer: Vec<&'a str>,
    /// Set by `@A`; the next content line is its value
    skip_value_line: bool,
}

impl<'a> PositionScanner<'a> {
    fn new(source_file: &'a str) -> Self {
        Self {
            source_file,
            records: Vec::new(),
            current: None,
            state: ScanState::NoRecord,
            buffer: Vec::new(),
            skip_value_line: false,
        }
    }

    fn feed(&mut self, line: &'a str) {
        let trimmed = line.trim_end();
        match Tag::split(trimmed) {
            Some((tag, value)) => self.on_tag(tag, value),
            None => self.on_content(line.strip_suffix('\r').unwrap_or(line)),
        }
    }

    fn on_tag(&mut self, tag: Tag, value: &'a str) {
        let (action, next) = transition(self.state, tag);
        self.skip_value_line = tag == Tag::Attribute;
        match action {
            BufferAction::Keep => return,
            BufferAction::Flush => self.flush_buffer(),
            BufferAction::FlushLongText if self.state == ScanState::LongText => {
                self.flush_buffer()
            }
            BufferAction::FlushLongText | BufferAction::Discard => {}
        }
        self.buffer.clear();

        // text on the opening tag line is the first line of the field
        let opens_text = next != ScanState::NoRecord
            && matches!(tag, Tag::LongText | Tag::ShortText | Tag::Description);
        if opens_text && !value.is_empty() {
            self.buffer.push(value);
        }

        if let Tag::RecordStart = tag {
            self.finish_record();
            self.current = Some(PositionRecord::new(value, self.source_file));
        } else if let Some(record) = self.current.as_mut() {
            let slot = match tag {
                Tag::Unit => Some(&mut record.unit),
                Tag::UnitCode => Some(&mut record.unit_code),
                Tag::Category => Some(&mut record.category_guid),
                Tag::SourceId => Some(&mut record.source_id),
                _ => None,
            };
            if let Some(slot) = slot {
                *slot = non_empty(value);
            }
        }

        self.state = next;
    }

    fn on_content(&mut self, line: &'a str) {
        if std::mem::take(&mut self.skip_value_line) {
            return;
        }
        match self.state {
            ScanState::LongText | ScanState::ShortText | ScanState::Description => {
                self.buffer.push(line);
            }
            ScanState::LeadingValues => {
                let Some(value) = parse_bare_number(line.trim()) else {
                    return;
                };
                if let Some(record) = self.current.as_mut() {
                    if record.price_value1.is_none() {
                        record.price_value1 = Some(value);
                    } else if record.price_value2.is_none() {
                        record.price_value2 = Some(value);
                    }
                }
            }
            ScanState::NoRecord | ScanState::Idle => {}
        }
    }

    /// Write the accumulated lines into the field of the current state
    fn flush_buffer(&mut self) {
        let Some(record) = self.current.as_mut() else {
            return;
        };
        let slot = match self.state {
            ScanState::LongText => &mut record.long_text,
            ScanState::ShortText => &mut record.short_text,
            ScanState::Description => &mut record.description,
            _ => return,
        };
        *slot = non_empty(self.buffer.join("\n").trim());
    }

    fn finish_record(&mut self) {
        if let Some(record) = self.current.take() {
            if !record.name.is_empty() {
                self.records.push(record);
            }
        }
    }

    fn finish(mut self) -> Vec<PositionRecord> {
        self.flush_buffer();
        self.finish_record();
        self.records
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse `^\d+([.,]\d*)?$`, treating a comma as the decimal point
pub(crate) fn parse_bare_number(line: &str) -> Option<f64> {
    let (int_part, frac_part) = match line.find([',', '.']) {
        Some(pos) => (&line[..pos], Some(&line[pos + 1..])),
        None => (line, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    line.replace(',', ".").parse().ok()
}
