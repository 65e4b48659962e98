use indexmap::IndexSet;
use std::num::NonZeroU32;

/// Interned byte string. The zero value is reserved so that `Option<Name>`
/// costs nothing inside a token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Name(NonZeroU32);

impl Name {
    pub fn as_u32(self) -> u32 {
        self.0.get()
    }

    pub fn from_u32(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

// Injective map from byte sequences to dense 32-bit identifiers, with
// reverse lookup. Identifier names, literal spellings, and encoded token
// chunks all live here.
#[derive(Debug, Default)]
pub struct Interner {
    strings: IndexSet<Box<[u8]>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, bytes: &[u8]) -> Name {
        let index = match self.strings.get_index_of(bytes) {
            Some(index) => index,
            None => self.strings.insert_full(bytes.into()).0,
        };

        let raw = u32::try_from(index + 1).expect("interner exhausted the 32-bit ID space");
        Name(NonZeroU32::new(raw).expect("interner IDs start at one"))
    }

    pub fn intern_str(&mut self, text: &str) -> Name {
        self.intern(text.as_bytes())
    }

    pub fn resolve(&self, name: Name) -> &[u8] {
        self.strings
            .get_index(name.as_u32() as usize - 1)
            .expect("name was interned by this interner")
    }

    pub fn resolve_str(&self, name: Name) -> &str {
        std::str::from_utf8(self.resolve(name)).expect("interned spelling is valid UTF-8")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_injective_and_stable() {
        let mut interner = Interner::new();
        let a = interner.intern_str("alpha");
        let b = interner.intern_str("beta");
        let a2 = interner.intern_str("alpha");

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.resolve_str(a), "alpha");
        assert_eq!(interner.resolve_str(b), "beta");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn intern_accepts_arbitrary_bytes() {
        let mut interner = Interner::new();
        let chunk = interner.intern(&[0xFF, 0x00, 0x80]);
        assert_eq!(interner.resolve(chunk), &[0xFF, 0x00, 0x80]);
    }
}
