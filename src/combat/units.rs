use serde::Serialize;

use crate::combat::dice::Die;

/// Ships that appear in the modeled battles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unit {
    YWing,
    TieFighter,
    Corvette,
    Destroyer,
}

impl Unit {
    pub fn name(self) -> &'static str {
        match self {
            Self::YWing => "y-wing",
            Self::TieFighter => "tie fighter",
            Self::Corvette => "corvette",
            Self::Destroyer => "destroyer",
        }
    }

    /// Damage at which the unit is destroyed.
    pub const fn threshold(self) -> u8 {
        match self {
            Self::YWing | Self::TieFighter => 1,
            Self::Corvette => 2,
            Self::Destroyer => 4,
        }
    }

    pub const fn attack(self) -> &'static [Die] {
        match self {
            Self::YWing => &[Die::Red],
            Self::TieFighter => &[Die::Black],
            Self::Corvette => &[Die::Black, Die::Red],
            Self::Destroyer => &[Die::Black, Die::Red, Die::Red],
        }
    }

    pub fn dice(self) -> u8 {
        self.attack().len() as u8
    }

    pub fn is_destroyed(self, damage: u8) -> bool {
        damage >= self.threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_and_pools() {
        assert_eq!(Unit::Destroyer.threshold(), 4);
        assert_eq!(Unit::Destroyer.dice(), 3);
        assert_eq!(Unit::Corvette.attack(), &[Die::Black, Die::Red]);
        assert!(Unit::Corvette.is_destroyed(2));
        assert!(!Unit::YWing.is_destroyed(0));
    }
}
