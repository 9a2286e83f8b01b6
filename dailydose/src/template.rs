//! Named-slot substitution shared by prompt construction and newsletter rendering.
//!
//! Slots are written `{name}`. Every occurrence of a known slot is replaced in a
//! single left-to-right pass, so values that themselves contain `{...}` text are
//! never expanded again. Unknown `{...}` sequences are copied through verbatim.

/// Substitute `{name}` slots in `template` with the matching value from `slots`.
pub fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            slots
                .iter()
                .find(|(slot, _)| *slot == name)
                .map(|(_, value)| (close, *value))
        });

        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
