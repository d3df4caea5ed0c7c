use crate::spec::ArtifactSpec;

/// Offset of the earliest trigger starting at or after `from`
pub(crate) fn earliest_trigger(spec: &ArtifactSpec, haystack: &str, from: usize) -> Option<usize> {
    earliest_of(spec.triggers(), haystack, from)
}

/// Offset of the earliest root opener or declaration
pub(crate) fn earliest_markup_trigger(spec: &ArtifactSpec, haystack: &str) -> Option<usize> {
    earliest_of(spec.markup_triggers(), haystack, 0)
}

fn earliest_of<'a>(
    needles: impl Iterator<Item = &'a str>,
    haystack: &str,
    from: usize,
) -> Option<usize> {
    let tail = haystack.get(from..)?;
    needles
        .filter(|n| !n.is_empty())
        .filter_map(|n| tail.find(n).map(|i| i + from))
        .min()
}

/// Length of the longest buffer suffix that is a proper prefix of some trigger.
///
/// That suffix may still grow into a trigger, so it must not be shown yet.
pub(crate) fn holdback_len(spec: &ArtifactSpec, buffer: &str) -> usize {
    spec.triggers()
        .map(|t| {
            (1..t.len())
                .rev()
                .filter(|&k| t.is_char_boundary(k))
                .find(|&k| buffer.ends_with(&t[..k]))
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}

/// Largest char boundary `<= index`
pub(crate) fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
