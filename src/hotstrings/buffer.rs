//! Fixed-capacity FIFO of recently typed characters.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingBuffer {
    chars: VecDeque<char>,
    capacity: usize,
}

impl RollingBuffer {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            chars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest character when full.
    pub fn push(&mut self, c: char) {
        if self.chars.len() == self.capacity {
            self.chars.pop_front();
        }
        self.chars.push_back(c);
    }

    /// Remove the newest character.
    pub fn pop(&mut self) -> Option<char> {
        self.chars.pop_back()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the newest characters spell `suffix`.
    pub fn ends_with(&self, suffix: &[char]) -> bool {
        if suffix.len() > self.chars.len() {
            return false;
        }
        let start = self.chars.len() - suffix.len();
        self.chars.range(start..).eq(suffix.iter())
    }

    pub fn contents(&self) -> String {
        self.chars.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut buffer = RollingBuffer::new(5);
        for c in ['a', 'b', 'c', 'd', 'e'] {
            buffer.push(c);
        }
        assert_eq!(buffer.contents(), "abcde");
        buffer.push('f');
        assert_eq!(buffer.contents(), "bcdef");
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn pop_removes_newest() {
        let mut buffer = RollingBuffer::new(4);
        buffer.push('x');
        buffer.push('y');
        assert_eq!(buffer.pop(), Some('y'));
        assert_eq!(buffer.contents(), "x");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn ends_with_checks_suffix() {
        let mut buffer = RollingBuffer::new(8);
        for c in "hi ;sig".chars() {
            buffer.push(c);
        }
        assert!(buffer.ends_with(&[';', 's', 'i', 'g']));
        assert!(buffer.ends_with(&[]));
        assert!(!buffer.ends_with(&[';', 's']));
        let long: Vec<char> = "xxhi ;sig".chars().collect();
        assert!(!buffer.ends_with(&long));
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut buffer = RollingBuffer::new(0);
        buffer.push('a');
        buffer.push('b');
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.contents(), "b");
    }
}
