use crate::domain::model::Flashcard;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// Walks through a deck one card at a time, remembering which cards are flipped.
#[derive(Debug, Clone)]
pub struct StudySession {
    cards: Vec<Flashcard>,
    position: usize,
    flipped: HashSet<usize>,
}

impl StudySession {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            cards,
            position: 0,
            flipped: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.position)
    }

    /// Toggles the current card; returns the face now showing.
    pub fn flip(&mut self) -> Option<Face> {
        self.current()?;
        if !self.flipped.remove(&self.position) {
            self.flipped.insert(self.position);
        }
        self.visible_face()
    }

    pub fn is_flipped(&self, index: usize) -> bool {
        self.flipped.contains(&index)
    }

    pub fn visible_face(&self) -> Option<Face> {
        self.current()?;
        Some(if self.is_flipped(self.position) {
            Face::Back
        } else {
            Face::Front
        })
    }

    pub fn visible_text(&self) -> Option<&str> {
        let card = self.current()?;
        Some(match self.visible_face()? {
            Face::Front => card.front.as_str(),
            Face::Back => card.back.as_str(),
        })
    }

    /// Moves forward; `false` at the last card.
    pub fn next(&mut self) -> bool {
        if self.position + 1 < self.cards.len() {
            self.position += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.position > 0 {
            self.position -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> StudySession {
        StudySession::new(vec![
            Flashcard::new("Q1", "A1"),
            Flashcard::new("Q2", "A2"),
        ])
    }

    #[test]
    fn test_flip_toggles_current_card() {
        let mut session = session();

        assert_eq!(session.visible_text(), Some("Q1"));
        assert_eq!(session.flip(), Some(Face::Back));
        assert_eq!(session.visible_text(), Some("A1"));
        assert_eq!(session.flip(), Some(Face::Front));
        assert!(!session.is_flipped(0));
    }

    #[test]
    fn test_flip_state_is_per_card() {
        let mut session = session();

        session.flip();
        assert!(session.next());
        assert_eq!(session.visible_face(), Some(Face::Front));
        assert!(session.previous());
        assert_eq!(session.visible_face(), Some(Face::Back));
    }

    #[test]
    fn test_navigation_bounds() {
        let mut session = session();

        assert!(!session.previous());
        assert!(session.next());
        assert!(!session.next());
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn test_empty_session() {
        let mut session = StudySession::new(Vec::new());

        assert!(session.is_empty());
        assert_eq!(session.current(), None);
        assert_eq!(session.flip(), None);
        assert!(!session.next());
    }
}
