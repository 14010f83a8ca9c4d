//! Symbol name demangling.

use std::borrow::Cow;

/// Demangle `name` if it is a Rust mangled name, keeping any `@VERSION`
/// or `@@VERSION` suffix. Other names are returned unchanged.
pub fn demangle(name: &str) -> Cow<'_, str> {
    let (base, suffix) = match name.find('@') {
        Some(at) => name.split_at(at),
        None => (name, ""),
    };
    match rustc_demangle::try_demangle(base) {
        Ok(d) => Cow::Owned(format!("{d:#}{suffix}")),
        Err(_) => Cow::Borrowed(name),
    }
}

/// `demangle(name)` when `enabled`, else `name`.
pub fn maybe(name: &str, enabled: bool) -> Cow<'_, str> {
    if enabled {
        demangle(name)
    } else {
        Cow::Borrowed(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demangle() {
        assert_eq!(demangle("_ZN4core3fmt5write17h0123456789abcdefE"), "core::fmt::write");
        assert_eq!(
            demangle("_ZN4core3fmt5write17h0123456789abcdefE@@GLIBC_2.2.5"),
            "core::fmt::write@@GLIBC_2.2.5"
        );
        assert_eq!(demangle("printf@GLIBC_2.2.5"), "printf@GLIBC_2.2.5");
        assert!(matches!(maybe("main", true), Cow::Borrowed("main")));
        assert_eq!(maybe("_ZN4core3fmt5write17h0123456789abcdefE", false), "_ZN4core3fmt5write17h0123456789abcdefE");
    }
}
