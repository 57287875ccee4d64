/// Which in-use reel has its usage list open
///
/// At most one reel is expanded at a time. Toggling the open reel closes it,
/// toggling any other reel moves the expansion there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    open: Option<String>,
}

impl Expansion {
    pub fn new(open: Option<String>) -> Self {
        Expansion {
            open: open.filter(|b| !b.trim().is_empty()),
        }
    }

    pub fn open(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn is_expanded(&self, barcode: &str) -> bool {
        self.open.as_deref() == Some(barcode)
    }

    pub fn toggle(&mut self, barcode: &str) {
        if self.is_expanded(barcode) {
            self.open = None;
        } else {
            self.open = Some(barcode.to_string());
        }
    }

    /// State the page would be in after clicking `barcode`'s header
    pub fn toggled(&self, barcode: &str) -> Expansion {
        let mut next = self.clone();
        next.toggle(barcode);
        next
    }
}
