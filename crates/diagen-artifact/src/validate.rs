use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ValidationError;
use crate::spec::ArtifactSpec;

/// Accept a candidate only if it is well-formed markup containing the
/// required domain marker.
pub fn validate(spec: &ArtifactSpec, candidate: &str) -> Result<(), ValidationError> {
    check_well_formed(candidate)?;

    if !candidate.contains(&spec.required_marker) {
        return Err(ValidationError::MissingMarker(spec.required_marker.clone()));
    }

    Ok(())
}

fn check_well_formed(markup: &str) -> Result<(), ValidationError> {
    let mut reader = Reader::from_str(markup);
    let mut depth: usize = 0;
    let mut roots: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::End(_)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ValidationError::Malformed("unexpected closing tag".to_string()))?;
            }
            Ok(Event::Text(text)) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(ValidationError::Malformed(
                        "text outside the root element".to_string(),
                    ));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ValidationError::Malformed(format!(
                    "{} (at byte {})",
                    e,
                    reader.buffer_position()
                )))
            }
        }

        if roots > 1 {
            return Err(ValidationError::Malformed("multiple root elements".to_string()));
        }
    }

    if roots == 0 {
        return Err(ValidationError::Malformed("no root element".to_string()));
    }
    if depth > 0 {
        return Err(ValidationError::Malformed(format!("{} unclosed element(s)", depth)));
    }

    Ok(())
}
