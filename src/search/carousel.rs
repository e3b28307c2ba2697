use serde::Serialize;

/// Which photo of a listing is on screen. Wraps in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageCarousel {
    active_index: usize,
    len: usize,
}

impl ImageCarousel {
    pub fn new(len: usize) -> Self {
        Self {
            active_index: 0,
            len,
        }
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn next(&mut self) -> usize {
        if self.len > 0 {
            self.active_index = (self.active_index + 1) % self.len;
        }
        self.active_index
    }

    pub fn previous(&mut self) -> usize {
        if self.len > 0 {
            self.active_index = (self.active_index + self.len - 1) % self.len;
        }
        self.active_index
    }
}
