use super::input::InputBuffer;

/// Model selector popup: catalog entries in server order, narrowed by a filter.
#[derive(Clone, Debug)]
pub struct ModelPickerState {
    pub filter: InputBuffer,
    pub filtered: Vec<String>,
    pub selected: usize,
}

impl ModelPickerState {
    /// Open over `all`, with the current model preselected when present.
    pub fn new(all: &[String], current: Option<&str>) -> Self {
        let selected = current
            .and_then(|c| all.iter().position(|m| m == c))
            .unwrap_or(0);
        Self {
            filter: InputBuffer::default(),
            filtered: all.to_vec(),
            selected,
        }
    }

    pub fn refilter(&mut self, all: &[String]) {
        let q = self.filter.as_str().to_lowercase();
        let keep = self.filtered.get(self.selected).cloned();
        self.filtered = if q.is_empty() {
            all.to_vec()
        } else {
            all.iter()
                .filter(|m| m.to_lowercase().contains(&q))
                .cloned()
                .collect()
        };
        self.selected = keep
            .and_then(|k| self.filtered.iter().position(|m| *m == k))
            .unwrap_or(0);
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.filtered.get(self.selected).map(String::as_str)
    }
}
