//! Air strike resolution
//!
//! Damage scales with the attacker's remaining hp, plus a uniform roll of
//! +/- 20% of the base. A strike and the carrier's anti-air fire are rolled
//! from pre-strike hp and applied together.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::constants::DAMAGE_VARIANCE;
use crate::battle::units::Unit;
use crate::core::config::EngineConfig;

/// Damage dealt by an attacker at `hp` of `max_hp`
///
/// Never negative and never above `base * 1.2`.
pub fn scaled_damage(hp: i32, max_hp: i32, base: i32, rng: &mut impl Rng) -> i32 {
    let scale = if max_hp > 0 {
        (hp as f32 / max_hp as f32).clamp(0.0, 1.0)
    } else {
        0.0
    };
    // Truncated so the roll never exceeds base * 1.2
    let variance = (base.max(0) as f32 * DAMAGE_VARIANCE) as i32;
    let roll = if variance == 0 {
        0
    } else {
        rng.gen_range(-variance..=variance)
    };
    let raw = base + roll;
    ((raw as f32 * scale).round() as i32).max(0)
}

/// Outcome of one squadron striking one carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeOutcome {
    pub damage_to_carrier: i32,
    pub anti_air_damage: i32,
    pub carrier_sunk: bool,
    pub squadron_lost: bool,
}

/// Resolve a strike: the squadron bombs, the carrier fires back
pub fn resolve_strike(
    squadron: &mut Unit,
    carrier: &mut Unit,
    config: &EngineConfig,
    rng: &mut impl Rng,
) -> StrikeOutcome {
    let anti_air_damage = scaled_damage(carrier.hp, carrier.max_hp, config.anti_air_damage_base, rng);
    let damage_to_carrier = scaled_damage(squadron.hp, squadron.max_hp, config.strike_damage_base, rng);

    let carrier_sunk = carrier.take_damage(damage_to_carrier);
    let squadron_lost = squadron.take_damage(anti_air_damage);

    StrikeOutcome {
        damage_to_carrier,
        anti_air_damage,
        carrier_sunk,
        squadron_lost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::battle::units::SquadronState;
    use crate::core::types::Side;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_full_strength_damage_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let dmg = scaled_damage(40, 40, 25, &mut rng);
            assert!((20..=30).contains(&dmg), "damage {dmg}");
        }
    }

    #[test]
    fn test_damage_scales_with_hp() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            let dmg = scaled_damage(50, 100, 20, &mut rng);
            assert!((8..=12).contains(&dmg), "damage {dmg}");
        }
    }

    #[test]
    fn test_dead_attacker_deals_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(scaled_damage(0, 40, 25, &mut rng), 0);
        assert_eq!(scaled_damage(-10, 40, 25, &mut rng), 0);
        assert_eq!(scaled_damage(10, 0, 25, &mut rng), 0);
    }

    #[test]
    fn test_variance_never_exceeds_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            // 28 * 0.2 = 5.6 would round up past 28 * 1.2
            assert!(scaled_damage(40, 40, 28, &mut rng) <= 33);
        }
    }

    #[test]
    fn test_zero_base_has_no_variance() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(scaled_damage(40, 40, 0, &mut rng), 0);
    }

    fn engaged_pair() -> (Unit, Unit) {
        let mut squadron = Unit::squadron(Side::A, 1);
        squadron.set_squadron_state(SquadronState::Outbound);
        squadron.set_squadron_state(SquadronState::Engaging);
        squadron.pos = HexCoord::new(5, 5);
        let carrier = Unit::carrier(Side::B, 1, HexCoord::new(6, 5));
        (squadron, carrier)
    }

    #[test]
    fn test_strike_damages_both() {
        let (mut squadron, mut carrier) = engaged_pair();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = resolve_strike(&mut squadron, &mut carrier, &EngineConfig::default(), &mut rng);

        assert_eq!(carrier.hp, 100 - outcome.damage_to_carrier);
        assert_eq!(squadron.hp, 40 - outcome.anti_air_damage);
        assert!(!outcome.carrier_sunk);
        assert!(!outcome.squadron_lost);
    }

    #[test]
    fn test_strike_can_sink_weak_carrier() {
        let (mut squadron, mut carrier) = engaged_pair();
        carrier.hp = 5;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = resolve_strike(&mut squadron, &mut carrier, &EngineConfig::default(), &mut rng);

        assert!(outcome.carrier_sunk);
        assert_eq!(carrier.hp, 0);
        assert!(!carrier.pos.is_valid());
    }

    #[test]
    fn test_weak_squadron_is_shot_down() {
        let (mut squadron, mut carrier) = engaged_pair();
        squadron.hp = 1;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let outcome = resolve_strike(&mut squadron, &mut carrier, &EngineConfig::default(), &mut rng);

        assert!(outcome.squadron_lost);
        assert_eq!(squadron.squadron_state(), Some(SquadronState::Lost));
        assert!(!squadron.pos.is_valid());
    }
}
