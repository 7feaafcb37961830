use crate::error::{Diagnostic, PipelineError};
use crate::model::{Section, SegmentedDocument};
use crate::profile::REQUIRED_CRITERIA;

use super::incomplete_segmentation;

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub document: SegmentedDocument,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan position over the ordered header list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Expecting { header_index: usize, offset: usize },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Found {
        content_start: usize,
        content_end: usize,
        terminated: bool,
    },
    /// Present in the text, but only before the current offset.
    OutOfOrder,
    Missing,
}

/// Splits `text` into one section per header, in header order.
///
/// Each header is searched from the end of the previous section. A header that
/// cannot be found from there is skipped without moving the offset, so the next
/// header is searched from the same position. A section ends where the next
/// header in the list starts, or at end of text when that header is absent.
pub fn segment(text: &str, headers: &[String]) -> Segmentation {
    let mut sections = Vec::<Section>::new();
    let mut diagnostics = Vec::<Diagnostic>::new();
    let mut state = if headers.is_empty() {
        ScanState::Finished
    } else {
        ScanState::Expecting {
            header_index: 0,
            offset: 0,
        }
    };

    while let ScanState::Expecting {
        header_index,
        offset,
    } = state
    {
        let header = &headers[header_index];
        let next_header = headers.get(header_index + 1).map(String::as_str);

        let next_offset = match step(text, header, next_header, offset) {
            Transition::Found {
                content_start,
                content_end,
                terminated,
            } => {
                if let (false, Some(next)) = (terminated, next_header) {
                    diagnostics.push(Diagnostic::UnterminatedSection {
                        header: header.clone(),
                        next: next.to_string(),
                    });
                }
                sections.push(Section {
                    name: header.clone(),
                    text: text[content_start..content_end].trim().to_string(),
                    order_index: sections.len(),
                });
                content_end
            }
            Transition::OutOfOrder => {
                diagnostics.push(Diagnostic::OutOfOrderHeader {
                    header: header.clone(),
                });
                offset
            }
            Transition::Missing => {
                diagnostics.push(Diagnostic::MissingHeader {
                    header: header.clone(),
                });
                offset
            }
        };

        state = if header_index + 1 < headers.len() {
            ScanState::Expecting {
                header_index: header_index + 1,
                offset: next_offset,
            }
        } else {
            ScanState::Finished
        };
    }

    Segmentation {
        document: SegmentedDocument { sections },
        diagnostics,
    }
}

fn step(text: &str, header: &str, next_header: Option<&str>, offset: usize) -> Transition {
    let Some(start) = find_from(text, header, offset) else {
        if text[..offset].contains(header) {
            return Transition::OutOfOrder;
        }
        return Transition::Missing;
    };

    let content_start = start + header.len();
    let Some(next_header) = next_header else {
        return Transition::Found {
            content_start,
            content_end: text.len(),
            terminated: true,
        };
    };

    match find_from(text, next_header, content_start) {
        Some(content_end) => Transition::Found {
            content_start,
            content_end,
            terminated: true,
        },
        None => Transition::Found {
            content_start,
            content_end: text.len(),
            terminated: false,
        },
    }
}

fn find_from(text: &str, needle: &str, offset: usize) -> Option<usize> {
    text.get(offset..)
        .and_then(|tail| tail.find(needle))
        .map(|position| position + offset)
}

/// Fails unless every one of the required criteria was recovered.
pub fn verify_segmentation(
    document: &SegmentedDocument,
    headers: &[String],
) -> Result<(), PipelineError> {
    if document.len() < REQUIRED_CRITERIA {
        return Err(incomplete_segmentation(document, headers));
    }
    Ok(())
}

pub(crate) fn roman_numeral(mut value: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for (amount, symbol) in NUMERALS {
        while value >= amount {
            out.push_str(symbol);
            value -= amount;
        }
    }
    out
}
