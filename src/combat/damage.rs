//! Damage application rules.
//!
//! Every rule is monotone and capped at the unit's threshold. Black hits
//! only hurt small ships, red hits only hurt big ships, criticals hurt
//! anything.

use crate::combat::dice::Hits;
use crate::combat::units::Unit;
use crate::error::BattleError;

fn absorb(unit: Unit, damage: u8, incoming: u8) -> u8 {
    damage + incoming.min(unit.threshold().saturating_sub(damage))
}

pub fn apply_hits_to_y_wing(damage: u8, hits: Hits) -> u8 {
    absorb(Unit::YWing, damage, hits.black + hits.critical)
}

pub fn apply_hits_to_tie_fighter(damage: u8, hits: Hits) -> u8 {
    absorb(Unit::TieFighter, damage, hits.black + hits.critical)
}

pub fn apply_hits_to_destroyer(damage: u8, hits: Hits) -> u8 {
    absorb(Unit::Destroyer, damage, hits.red + hits.critical)
}

/// Applies an imperial attack to the Y-wing and corvette.
///
/// Black hits go to the Y-wing and red hits to the corvette. Criticals
/// then destroy the corvette if there are enough of them, otherwise
/// destroy the Y-wing, and whatever is left damages the corvette.
///
/// Returns `(y_wing, corvette)` damage.
pub fn apply_hits_to_rebels(y_wing: u8, corvette: u8, hits: Hits) -> Result<(u8, u8), BattleError> {
    let y_cap = Unit::YWing.threshold();
    let c_cap = Unit::Corvette.threshold();

    let mut y_wing = y_wing;
    let mut corvette = corvette;
    let mut black = hits.black;
    let mut red = hits.red;
    let mut critical = hits.critical;

    let applied = black.min(y_cap.saturating_sub(y_wing));
    y_wing += applied;
    black -= applied;

    let applied = red.min(c_cap.saturating_sub(corvette));
    corvette += applied;
    red -= applied;

    if corvette + critical >= c_cap {
        let applied = critical.min(c_cap.saturating_sub(corvette));
        corvette += applied;
        critical -= applied;
    }
    if y_wing + critical >= y_cap {
        let applied = critical.min(y_cap.saturating_sub(y_wing));
        y_wing += applied;
        critical -= applied;
    }
    if critical > 0 {
        let applied = critical.min(c_cap.saturating_sub(corvette));
        corvette += applied;
        critical -= applied;
    }

    if black > 0 {
        require_destroyed("black", Unit::YWing, y_wing)?;
    }
    if red > 0 {
        require_destroyed("red", Unit::Corvette, corvette)?;
    }
    if critical > 0 {
        require_destroyed("critical", Unit::YWing, y_wing)?;
        require_destroyed("critical", Unit::Corvette, corvette)?;
    }
    Ok((y_wing, corvette))
}

fn require_destroyed(category: &'static str, unit: Unit, damage: u8) -> Result<(), BattleError> {
    if damage == unit.threshold() {
        Ok(())
    } else {
        Err(BattleError::LeftoverHits {
            category,
            unit: unit.name(),
            damage,
            threshold: unit.threshold(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_units_cap_at_threshold() {
        assert_eq!(apply_hits_to_y_wing(0, Hits::new(2, 0, 1, 0)), 1);
        assert_eq!(apply_hits_to_y_wing(0, Hits::new(0, 3, 0, 0)), 0);
        assert_eq!(apply_hits_to_tie_fighter(0, Hits::new(0, 0, 1, 0)), 1);
        assert_eq!(apply_hits_to_tie_fighter(1, Hits::new(1, 0, 0, 0)), 1);
        assert_eq!(apply_hits_to_destroyer(3, Hits::new(1, 2, 1, 0)), 4);
        assert_eq!(apply_hits_to_destroyer(1, Hits::new(2, 0, 0, 1)), 1);
        assert_eq!(apply_hits_to_destroyer(1, Hits::new(0, 1, 1, 0)), 3);
    }

    #[test]
    fn criticals_finish_the_corvette_first() {
        // corvette at 1 + one crit: corvette dies, y-wing untouched
        assert_eq!(apply_hits_to_rebels(0, 1, Hits::new(0, 0, 1, 2)).unwrap(), (0, 2));
        // red hit plus crit kills the corvette
        assert_eq!(apply_hits_to_rebels(0, 0, Hits::new(0, 1, 1, 1)).unwrap(), (0, 2));
    }

    #[test]
    fn lone_critical_kills_the_y_wing() {
        assert_eq!(apply_hits_to_rebels(0, 0, Hits::new(0, 0, 1, 2)).unwrap(), (1, 0));
    }

    #[test]
    fn spare_criticals_spill_onto_the_corvette() {
        // y-wing already dead, one crit cannot kill a fresh corvette
        assert_eq!(apply_hits_to_rebels(1, 0, Hits::new(0, 0, 1, 2)).unwrap(), (1, 1));
        // three crits: two kill the corvette, one kills the y-wing
        assert_eq!(apply_hits_to_rebels(0, 0, Hits::new(0, 0, 3, 0)).unwrap(), (1, 2));
    }

    #[test]
    fn leftovers_only_on_destroyed_units() {
        assert_eq!(apply_hits_to_rebels(1, 2, Hits::new(1, 2, 0, 0)).unwrap(), (1, 2));
        assert_eq!(apply_hits_to_rebels(1, 2, Hits::new(0, 0, 3, 0)).unwrap(), (1, 2));
    }

    #[test]
    fn single_unit_damage_is_monotone_and_bounded() {
        let rules: [(Unit, fn(u8, Hits) -> u8); 3] = [
            (Unit::YWing, apply_hits_to_y_wing),
            (Unit::TieFighter, apply_hits_to_tie_fighter),
            (Unit::Destroyer, apply_hits_to_destroyer),
        ];
        for (unit, apply) in rules {
            let cap = unit.threshold();
            for damage in 0..=cap {
                for black in 0..=3u8 {
                    for red in 0..=(3 - black) {
                        for critical in 0..=(3 - black - red) {
                            let hits = Hits::new(black, red, critical, 0);
                            let next = apply(damage, hits);
                            assert!(
                                next >= damage && next <= cap,
                                "{} {damage} -> {next} for {hits:?}",
                                unit.name()
                            );
                            let more = Hits::new(black, red, critical + 1, 0);
                            assert!(apply(damage, more) >= next, "{} not monotone in hits", unit.name());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn rebel_damage_is_monotone_and_bounded() {
        for y in 0..=1u8 {
            for c in 0..=2u8 {
                for black in 0..=1u8 {
                    for red in 0..=2u8 {
                        for critical in 0..=(3 - black - red.min(2)) {
                            let hits = Hits::new(black, red, critical, 0);
                            let (ny, nc) = apply_hits_to_rebels(y, c, hits).unwrap();
                            assert!(ny >= y && ny <= 1, "y-wing {y} -> {ny} for {hits:?}");
                            assert!(nc >= c && nc <= 2, "corvette {c} -> {nc} for {hits:?}");
                        }
                    }
                }
            }
        }
    }
}
