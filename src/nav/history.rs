/// Navigation collaborator: the location the shell is showing.
///
/// The core only ever sees `&mut dyn Navigator`. `History` is the shell's
/// router: a back/forward stack over plain path strings.

pub trait Navigator {
    /// `None` until the first location is known.
    fn current_location(&self) -> Option<&str>;
    fn navigate(&mut self, path: &str);
}

#[derive(Clone, Debug, Default)]
pub struct History {
    back: Vec<String>,
    current: Option<String>,
    forward: Vec<String>,
}

impl History {
    pub fn starting_at(path: &str) -> Self {
        History { back: Vec::new(), current: Some(path.to_string()), forward: Vec::new() }
    }

    /// No location yet.
    #[allow(dead_code)]
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    pub fn back(&mut self) -> bool {
        match self.back.pop() {
            Some(prev) => {
                if let Some(cur) = self.current.replace(prev) {
                    self.forward.push(cur);
                }
                true
            }
            None => false,
        }
    }

    pub fn forward(&mut self) -> bool {
        match self.forward.pop() {
            Some(next) => {
                if let Some(cur) = self.current.replace(next) {
                    self.back.push(cur);
                }
                true
            }
            None => false,
        }
    }

    #[allow(dead_code)]
    pub fn depth(&self) -> usize {
        self.back.len()
    }
}

impl Navigator for History {
    fn current_location(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn navigate(&mut self, path: &str) {
        if let Some(cur) = self.current.replace(path.to_string()) {
            self.back.push(cur);
        }
        self.forward.clear();
    }
}
