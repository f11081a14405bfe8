/// Project cards where at most one card shows its details at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGallery {
    len: usize,
    expanded: Option<usize>,
}

impl ProjectGallery {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            expanded: None,
        }
    }

    /// Expands `index`, or collapses it if it is already expanded.
    pub fn toggle(&mut self, index: usize) -> Option<usize> {
        if index >= self.len {
            return self.expanded;
        }
        self.expanded = if self.expanded == Some(index) {
            None
        } else {
            Some(index)
        };
        self.expanded
    }

    pub fn expanded(&self) -> Option<usize> {
        self.expanded
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded == Some(index)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
