use std::fmt;

/// One selectable download: a display label and the absolute URL it fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub url: &'static str,
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const BUILTIN_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "RFC 9110 - HTTP Semantics",
        url: "https://www.rfc-editor.org/rfc/rfc9110.txt",
    },
    CatalogEntry {
        name: "RFC 9112 - HTTP/1.1",
        url: "https://www.rfc-editor.org/rfc/rfc9112.txt",
    },
    CatalogEntry {
        name: "RFC 9113 - HTTP/2",
        url: "https://www.rfc-editor.org/rfc/rfc9113.txt",
    },
    CatalogEntry {
        name: "Rust logo",
        url: "https://www.rust-lang.org/logos/rust-logo-512x512.png",
    },
];

/// Fixed, ordered set of downloads compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [CatalogEntry],
}

impl Catalog {
    pub const fn new(entries: &'static [CatalogEntry]) -> Self {
        Self { entries }
    }

    pub const fn builtin() -> Self {
        Self::new(BUILTIN_ENTRIES)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &'static [CatalogEntry] {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_builtin_catalog_order() {
        let catalog = Catalog::builtin();
        assert!(!catalog.entries().is_empty());
        assert_eq!(catalog.entries(), BUILTIN_ENTRIES);
        assert_eq!(catalog.entries()[0].name, "RFC 9110 - HTTP Semantics");
    }

    #[test]
    fn test_builtin_entries_are_well_formed() {
        for entry in Catalog::builtin().entries() {
            assert!(!entry.name.is_empty());
            let url = Url::parse(entry.url).unwrap();
            assert!(matches!(url.scheme(), "http" | "https"), "{}", entry.url);
        }
    }
}
