#[inline(always)]
#[cold]
pub(crate) fn cold_path() {}

/// Last dotted segment of a tag name, brackets included.
///
/// `"Obj.Items[2]"` gives `"Items[2]"`, `"Flag"` gives `"Flag"`.
pub fn short_name_of(name: &str) -> &str {
    // dots inside brackets never occur in the tag grammar
    match name.rfind('.') {
        Some(dot) => &name[dot + 1..],
        None => name,
    }
}
