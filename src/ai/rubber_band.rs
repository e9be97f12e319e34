// ==============================================================================
// rubber_band.rs — RELATIVE-POSITION SPEED MODIFIER
// ------------------------------------------------------------------------------
// Positions are race ranks (1 = leader). Against the reference racer:
//
// - same rank: 1.0
// - ahead by k places: penalty remapped over k in [1, total-1] -> [0.97, 0.92]
// - behind by k places: catch-up remapped over k / (total-1) -> [1.03, 1.08],
//   then scaled by distance: 1 + (catch_up - 1) * min(distance / 100, 1)
// ==============================================================================

pub const PENALTY_ADJACENT: f32 = 0.97;
pub const PENALTY_FARTHEST: f32 = 0.92;
pub const BOOST_MIN: f32 = 1.03;
pub const BOOST_MAX: f32 = 1.08;
/// Gap (m) at which the full catch-up boost applies.
pub const FULL_BOOST_DISTANCE: f32 = 100.0;

/// Linear map of `v` from [in_lo, in_hi] onto [out_lo, out_hi], clamped.
/// A degenerate input range maps everything to `out_lo`.
pub fn remap(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    if span.abs() < f32::EPSILON {
        return out_lo;
    }
    let u = ((v - in_lo) / span).clamp(0.0, 1.0);
    out_lo + (out_hi - out_lo) * u
}

pub fn compute_rubber_band_modifier(
    ai_position: u32,
    player_position: u32,
    total_racers: u32,
    distance_behind_player: f32,
) -> f32 {
    if ai_position == player_position {
        return 1.0;
    }

    let last = total_racers.saturating_sub(1).max(1) as f32;

    if ai_position < player_position {
        let places_ahead = (player_position - ai_position) as f32;
        return remap(places_ahead, 1.0, last, PENALTY_ADJACENT, PENALTY_FARTHEST);
    }

    let places_behind = (ai_position - player_position) as f32;
    let catch_up = remap(places_behind, 0.0, last, BOOST_MIN, BOOST_MAX);
    let distance = if distance_behind_player.is_finite() { distance_behind_player } else { 0.0 };
    let dist_factor = (distance / FULL_BOOST_DISTANCE).clamp(0.0, 1.0);

    1.0 + (catch_up - 1.0) * dist_factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_position_is_neutral() {
        for total in 1..8 {
            for pos in 1..=total {
                assert_eq!(compute_rubber_band_modifier(pos, pos, total, 42.0), 1.0);
            }
        }
    }

    #[test]
    fn test_catch_up_scenario() {
        let m = compute_rubber_band_modifier(3, 1, 6, 50.0);
        assert!((m - 1.025).abs() < 1e-4, "m={m}");
        // full boost branch value at and past 100 m
        let full = compute_rubber_band_modifier(3, 1, 6, 100.0);
        assert!((full - 1.05).abs() < 1e-4);
        assert_eq!(compute_rubber_band_modifier(3, 1, 6, 250.0), full);
    }

    #[test]
    fn test_penalty_grows_with_lead() {
        let mut prev = 1.0;
        for ai in (1..6).rev() {
            let m = compute_rubber_band_modifier(ai, 6, 6, 0.0);
            assert!(m < prev, "ai={ai} m={m} prev={prev}");
            prev = m;
        }
        assert!((compute_rubber_band_modifier(5, 6, 6, 0.0) - PENALTY_ADJACENT).abs() < 1e-6);
        assert!((compute_rubber_band_modifier(1, 6, 6, 0.0) - PENALTY_FARTHEST).abs() < 1e-6);
    }

    #[test]
    fn test_boost_grows_with_gap() {
        let mut prev = 1.0;
        for d in [0.0, 10.0, 40.0, 80.0, 100.0] {
            let m = compute_rubber_band_modifier(4, 2, 6, d);
            assert!(m >= prev);
            prev = m;
        }
        assert!(prev <= BOOST_MAX);
        assert_eq!(compute_rubber_band_modifier(4, 2, 6, 0.0), 1.0);
    }

    #[test]
    fn test_small_fields_stay_in_range() {
        let ahead = compute_rubber_band_modifier(1, 2, 2, 0.0);
        assert!((ahead - PENALTY_ADJACENT).abs() < 1e-6);
        let behind = compute_rubber_band_modifier(2, 1, 2, 1_000.0);
        assert!(behind > 1.0 && behind <= BOOST_MAX);
        assert!(compute_rubber_band_modifier(2, 1, 2, f32::NAN).is_finite());
    }

    #[test]
    fn test_remap_clamps_and_handles_degenerate_range() {
        assert_eq!(remap(5.0, 0.0, 1.0, 0.0, 10.0), 10.0);
        assert_eq!(remap(-5.0, 0.0, 1.0, 0.0, 10.0), 0.0);
        assert_eq!(remap(3.0, 1.0, 1.0, 0.97, 0.92), 0.97);
    }
}
