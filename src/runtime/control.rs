//! Label (escape tag) stack for structured control flow
//!
//! Every active function body, `block`, `loop` and taken `if` arm owns one
//! label. Branches are resolved by depth, 0 being the innermost label, and
//! travel back up the recursive dispatch as a [`BlockEnd`] signal.

/// Kind of construct a label belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelType {
    /// Function body; branching here is a return
    Function,
    Block,
    /// Branches target the start of the loop, not its end
    Loop,
    If,
}

/// An entry on the label stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub label_type: LabelType,
    /// Operand stack height below the construct's parameters
    pub stack_height: usize,
    pub param_arity: usize,
    pub result_arity: usize,
}

impl Label {
    pub fn new(label_type: LabelType, stack_height: usize, param_arity: usize, result_arity: usize) -> Self {
        Label {
            label_type,
            stack_height,
            param_arity,
            result_arity,
        }
    }

    /// Number of values carried by a branch to this label: the parameters
    /// for a loop, the results for everything else
    pub fn arity(&self) -> usize {
        if self.label_type == LabelType::Loop {
            self.param_arity
        } else {
            self.result_arity
        }
    }
}

/// How a sequence of instructions finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEnd {
    /// Fell off the end of the sequence
    Normal,
    /// Branch to the label at this depth, still to be unwound
    Branch(u32),
    /// `return` to the enclosing function
    Return,
}

impl BlockEnd {
    /// Outcome seen by the construct that just popped its own label.
    /// A branch to depth 0 is consumed here, deeper branches move one
    /// level out.
    pub fn leave(self) -> BlockEnd {
        match self {
            BlockEnd::Branch(0) => BlockEnd::Normal,
            BlockEnd::Branch(depth) => BlockEnd::Branch(depth - 1),
            other => other,
        }
    }
}

/// The stack of active labels, shared across calls
#[derive(Debug, Default)]
pub struct LabelStack {
    labels: Vec<Label>,
}

impl LabelStack {
    pub fn new() -> Self {
        LabelStack { labels: Vec::new() }
    }

    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn pop(&mut self) -> Option<Label> {
        self.labels.pop()
    }

    /// The label `depth` entries from the top
    pub fn get(&self, depth: u32) -> Option<&Label> {
        let len = self.labels.len();
        if depth as usize >= len {
            return None;
        }
        self.labels.get(len - 1 - depth as usize)
    }

    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    /// Drop labels until only `depth` remain
    pub fn truncate(&mut self, depth: usize) {
        self.labels.truncate(depth);
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_addressed_from_the_top() {
        let mut labels = LabelStack::new();
        labels.push(Label::new(LabelType::Function, 0, 0, 1));
        labels.push(Label::new(LabelType::Block, 2, 0, 0));
        labels.push(Label::new(LabelType::Loop, 3, 1, 2));

        assert_eq!(labels.get(0).unwrap().label_type, LabelType::Loop);
        assert_eq!(labels.get(2).unwrap().label_type, LabelType::Function);
        assert!(labels.get(3).is_none());

        labels.truncate(1);
        assert_eq!(labels.depth(), 1);
        assert!(labels.pop().is_some());
        assert!(labels.is_empty());
    }

    #[test]
    fn loop_arity_uses_parameters() {
        assert_eq!(Label::new(LabelType::Loop, 0, 1, 2).arity(), 1);
        assert_eq!(Label::new(LabelType::Block, 0, 1, 2).arity(), 2);
        assert_eq!(Label::new(LabelType::If, 0, 0, 1).arity(), 1);
    }

    #[test]
    fn leaving_a_construct() {
        assert_eq!(BlockEnd::Branch(0).leave(), BlockEnd::Normal);
        assert_eq!(BlockEnd::Branch(3).leave(), BlockEnd::Branch(2));
        assert_eq!(BlockEnd::Return.leave(), BlockEnd::Return);
        assert_eq!(BlockEnd::Normal.leave(), BlockEnd::Normal);
    }
}
