use crate::scanner::earliest_markup_trigger;
use crate::spec::ArtifactSpec;

/// Choose the artifact candidate from a complete buffer.
///
/// Priority: fenced block, then raw span from the first markup trigger to
/// the matching root closer, then the whole trimmed buffer if it starts with
/// a trigger. Returns `None` when no candidate exists.
pub fn select_candidate<'a>(spec: &ArtifactSpec, buffer: &'a str) -> Option<&'a str> {
    fenced_block(spec, buffer)
        .or_else(|| raw_span(spec, buffer))
        .or_else(|| whole_buffer(spec, buffer))
}

fn fenced_block<'a>(spec: &ArtifactSpec, buffer: &'a str) -> Option<&'a str> {
    let open = buffer.find(&spec.fence_open)?;
    let body_start = open + spec.fence_open.len();
    let close = buffer[body_start..].find(&spec.fence_close)?;

    Some(buffer[body_start..body_start + close].trim())
}

fn raw_span<'a>(spec: &ArtifactSpec, buffer: &'a str) -> Option<&'a str> {
    let start = earliest_markup_trigger(spec, buffer)?;

    // the root element that opens first at or after the trigger decides the closer
    let (root_pos, root) = spec
        .roots
        .iter()
        .filter_map(|r| buffer[start..].find(&r.open).map(|i| (start + i, r)))
        .min_by_key(|(pos, _)| *pos)?;

    let search_from = root_pos + root.open.len();
    let close = buffer[search_from..].find(&root.close)?;
    let end = search_from + close + root.close.len();

    Some(&buffer[start..end])
}

fn whole_buffer<'a>(spec: &ArtifactSpec, buffer: &'a str) -> Option<&'a str> {
    let trimmed = buffer.trim();
    spec.triggers()
        .any(|t| !t.is_empty() && trimmed.starts_with(t))
        .then_some(trimmed)
}
