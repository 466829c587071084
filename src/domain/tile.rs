/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TileKind {
    #[default]
    Empty,
    Wall,
    HazardUp,   // Spikes pointing up (sits on a floor)
    HazardDown, // Spikes hanging from a ceiling
    Goal,
}

impl TileKind {
    /// Does this tile stop movement? Everything except Empty does,
    /// hazards and the goal included (the player touches them, never enters them).
    pub fn is_blocking(self) -> bool {
        !matches!(self, TileKind::Empty)
    }

    /// Does touching this tile kill the player?
    pub fn is_hazard(self) -> bool {
        matches!(self, TileKind::HazardUp | TileKind::HazardDown)
    }

    pub fn is_goal(self) -> bool {
        matches!(self, TileKind::Goal)
    }

    /// Level glyph → tile. `ˆ` (modifier circumflex) is accepted as an
    /// alias of `^` since older level files were authored with it.
    pub fn from_glyph(ch: char) -> Option<TileKind> {
        match ch {
            '.' => Some(TileKind::Empty),
            '#' => Some(TileKind::Wall),
            '^' | 'ˆ' => Some(TileKind::HazardUp),
            'v' => Some(TileKind::HazardDown),
            '$' => Some(TileKind::Goal),
            _ => None,
        }
    }

    /// Canonical glyph for this tile.
    pub fn to_glyph(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Wall => '#',
            TileKind::HazardUp => '^',
            TileKind::HazardDown => 'v',
            TileKind::Goal => '$',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_empty_is_passable() {
        assert!(!TileKind::Empty.is_blocking());
        for t in [TileKind::Wall, TileKind::HazardUp, TileKind::HazardDown, TileKind::Goal] {
            assert!(t.is_blocking(), "{t:?}");
        }
    }

    #[test]
    fn hazards_and_goal_classified() {
        assert!(TileKind::HazardUp.is_hazard());
        assert!(TileKind::HazardDown.is_hazard());
        assert!(!TileKind::Wall.is_hazard());
        assert!(!TileKind::Goal.is_hazard());
        assert!(TileKind::Goal.is_goal());
        assert!(!TileKind::Wall.is_goal());
    }

    #[test]
    fn glyphs_map_both_ways() {
        for ch in ['.', '#', '^', 'v', '$'] {
            let t = TileKind::from_glyph(ch).unwrap();
            assert_eq!(t.to_glyph(), ch);
        }
        assert_eq!(TileKind::from_glyph('ˆ'), Some(TileKind::HazardUp));
        assert_eq!(TileKind::from_glyph('x'), None);
        assert_eq!(TileKind::from_glyph(' '), None);
    }
}
