//! Wrapped-heading reconstruction
//!
//! Layout engines break long headings over several visual lines. After
//! sorting into reading order, consecutive headings that share page, style and
//! level and sit directly below one another are folded into one.

use crate::classifier::ClassifiedHeading;
use crate::OutlineOptions;

/// Sort headings into reading order and coalesce wrapped fragments
pub fn merge_fragments(
    mut headings: Vec<ClassifiedHeading>,
    options: &OutlineOptions,
) -> Vec<ClassifiedHeading> {
    if headings.is_empty() {
        return headings;
    }

    // Stable, so lines with identical tops keep extraction order
    headings.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.bbox.top.total_cmp(&b.bbox.top))
    });

    let mut iter = headings.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let (mut merged, current) = iter.fold((Vec::new(), first), |(mut done, mut current), next| {
        if continues(&current, &next, options) {
            current.text.push(' ');
            current.text.push_str(&next.text);
            current.bbox = current.bbox.union(&next.bbox);
        } else {
            done.push(std::mem::replace(&mut current, next));
        }
        (done, current)
    });
    merged.push(current);

    merged
}

/// Whether `next` is the continuation of `current` on the following line
fn continues(
    current: &ClassifiedHeading,
    next: &ClassifiedHeading,
    options: &OutlineOptions,
) -> bool {
    let gap = next.bbox.top - current.bbox.bottom;
    next.page == current.page
        && next.style() == current.style()
        && next.level == current.level
        && gap >= 0.0
        && gap < options.merge_gap
}
