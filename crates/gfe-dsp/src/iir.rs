//! IIR approximations of the target curve
//!
//! Two strategies, both fed by the zone tables:
//! - Peaking: one octave-wide peaking biquad per equivalent zone. Adjacent
//!   bands overlap, so each band's gain is corrected by its neighbours'.
//! - Shelf: a cascade of low shelves, one per shelf zone. Stage `k` lifts
//!   every zone at or below `k`, so its gain is the step between zone `k`
//!   and zone `k + 1`.

use std::f64::consts::LN_2;

use gfe_core::{EQUIVALENT_ZONE_COUNT, IirType, MINIMUM_DB, SHELF_ZONE_COUNT};

use crate::FrequencyResponse;
use crate::axis::{EQUIVALENT_ZONES, SHELF_ZONES, ZoneTable};
use crate::biquad::BiquadCoeffs;
use crate::curve::{Curve, y_to_db};

// ============================================================================
// Constants
// ============================================================================

/// Share of each neighbour's target subtracted from a peaking band's gain
pub const PEAKING_NEIGHBOUR_CORRELATION: f64 = 0.15;

/// Shelf slope used by every low-shelf stage
pub const SHELF_SLOPE: f64 = 2.0;

/// Largest gain a single shelf stage may take; beyond ~22.9 dB the
/// cookbook design for `SHELF_SLOPE` has no real solution
pub const MAX_SHELF_STAGE_GAIN_DB: f64 = 22.0;

/// Shelf corners are kept below this fraction of the sample rate
pub const MAX_CORNER_RATIO: f64 = 0.45;

/// Peaking bandwidth in octaves
const PEAKING_BANDWIDTH_OCTAVES: f64 = 1.0;

// ============================================================================
// Stages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Peaking,
    LowShelf,
}

/// One biquad of a cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IirStage {
    pub kind: StageKind,
    /// Zone this stage was derived from
    pub zone: usize,
    /// Center (peaking) or corner (shelf) frequency in Hz
    pub frequency: f64,
    /// Quality factor; unused by shelves
    pub q: f64,
    pub gain_db: f64,
    pub coeffs: BiquadCoeffs,
}

impl IirStage {
    /// Parameters as a host peaking node takes them: `(frequency, Q, gain)`
    pub fn peaking_parameters(&self) -> [f64; 3] {
        [self.frequency, self.q, self.gain_db]
    }

    /// Parameters as a host IIR node takes them: `(gain, b0, b1, b2, a0, a1, a2)`
    pub fn shelf_parameters(&self) -> [f64; 7] {
        let c = &self.coeffs;
        [self.gain_db, c.b0, c.b1, c.b2, c.a0, c.a1, c.a2]
    }
}

impl FrequencyResponse for IirStage {
    /// Like the host primitives, evaluation past Nyquist yields NaN
    fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        if freq > sample_rate / 2.0 {
            f64::NAN
        } else {
            self.coeffs.magnitude_at(freq, sample_rate)
        }
    }
}

/// Q giving `octaves` of bandwidth at `omega` once the bilinear warp is accounted for
pub fn peaking_q(omega: f64, octaves: f64) -> f64 {
    1.0 / (2.0 * (LN_2 / 2.0 * octaves * omega / omega.sin()).sinh())
}

/// Target gain of every zone, read from the first bin of each zone
fn zone_targets<const N: usize>(curve: &Curve, zones: &ZoneTable) -> [f64; N] {
    let mut targets = [0.0; N];
    for (zone, target) in targets.iter_mut().enumerate() {
        *target = y_to_db(curve[zones.range(zone).start]).max(MINIMUM_DB);
    }
    targets
}

// ============================================================================
// Chain
// ============================================================================

/// Biquad cascade approximating one channel's curve
#[derive(Debug, Clone)]
pub struct IirChain {
    kind: IirType,
    sample_rate: f64,
    stages: Vec<IirStage>,
}

impl IirChain {
    pub fn new(kind: IirType, sample_rate: u32) -> Self {
        Self {
            kind,
            sample_rate: sample_rate as f64,
            stages: Vec::with_capacity(EQUIVALENT_ZONE_COUNT),
        }
    }

    #[inline]
    pub fn kind(&self) -> IirType {
        self.kind
    }

    /// Live stages in connection order (highest band first)
    #[inline]
    pub fn stages(&self) -> &[IirStage] {
        &self.stages
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Re-derive every stage from `curve`
    pub fn update(&mut self, curve: &Curve) {
        match self.kind {
            IirType::None => self.stages.clear(),
            IirType::Peaking => self.design_peaking(curve),
            IirType::Shelf => self.design_shelf(curve),
        }
        log::trace!("{:?} chain: {} live stages", self.kind, self.stages.len());
    }

    fn design_peaking(&mut self, curve: &Curve) {
        let targets: [f64; EQUIVALENT_ZONE_COUNT] = zone_targets(curve, &EQUIVALENT_ZONES);
        let nyquist = self.sample_rate / 2.0;

        self.stages.clear();
        for zone in (0..EQUIVALENT_ZONE_COUNT).rev() {
            let frequency = EQUIVALENT_ZONES.center(zone) as f64;
            if frequency >= nyquist {
                continue;
            }
            let below = if zone > 0 { targets[zone - 1] } else { 0.0 };
            let above = targets.get(zone + 1).copied().unwrap_or(0.0);
            let gain_db = targets[zone] - PEAKING_NEIGHBOUR_CORRELATION * (below + above);

            let omega = 2.0 * std::f64::consts::PI * frequency / self.sample_rate;
            let q = peaking_q(omega, PEAKING_BANDWIDTH_OCTAVES);

            self.stages.push(IirStage {
                kind: StageKind::Peaking,
                zone,
                frequency,
                q,
                gain_db,
                coeffs: BiquadCoeffs::peaking(frequency, q, gain_db, self.sample_rate),
            });
        }
    }

    /// Corner between shelf zone `zone` and the one above it
    ///
    /// The top zone reaches the end of the visible axis, so its stage
    /// shelves everything up to the highest usable corner.
    fn shelf_corner(&self, zone: usize) -> f64 {
        let highest = self.sample_rate * MAX_CORNER_RATIO;
        let center = SHELF_ZONES.center(zone) as f64;
        match SHELF_ZONES.centers().get(zone + 1) {
            Some(&next) => (center * next as f64).sqrt().min(highest),
            None => highest,
        }
    }

    fn design_shelf(&mut self, curve: &Curve) {
        let targets: [f64; SHELF_ZONE_COUNT] = zone_targets(curve, &SHELF_ZONES);

        self.stages.clear();
        let mut leftover = 0.0;
        for zone in (0..SHELF_ZONE_COUNT).rev() {
            let above = targets.get(zone + 1).copied().unwrap_or(0.0);
            let desired = targets[zone] - above + leftover;
            let gain_db = desired.clamp(-MAX_SHELF_STAGE_GAIN_DB, MAX_SHELF_STAGE_GAIN_DB);
            leftover = desired - gain_db;

            if gain_db == 0.0 {
                continue;
            }

            let frequency = self.shelf_corner(zone);
            self.stages.push(IirStage {
                kind: StageKind::LowShelf,
                zone,
                frequency,
                q: 0.0,
                gain_db,
                coeffs: BiquadCoeffs::low_shelf_with_slope(
                    frequency,
                    SHELF_SLOPE,
                    gain_db,
                    self.sample_rate,
                ),
            });
        }
        if leftover != 0.0 {
            log::debug!("shelf cascade could not realize {leftover:.2} dB below the lowest corner");
        }
    }
}

impl FrequencyResponse for IirChain {
    fn magnitude_at(&self, freq: f64, sample_rate: f64) -> f64 {
        self.stages
            .iter()
            .map(|stage| stage.magnitude_at(freq, sample_rate))
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{FLAT_CURVE, db_to_y};

    fn db(magnitude: f64) -> f64 {
        20.0 * magnitude.log10()
    }

    fn shelf_curve(targets_db: &[f64; SHELF_ZONE_COUNT]) -> Curve {
        let mut curve = FLAT_CURVE;
        for (zone, &target) in targets_db.iter().enumerate() {
            curve[SHELF_ZONES.range(zone)].fill(db_to_y(target));
        }
        curve
    }

    #[test]
    fn test_peaking_q_one_octave() {
        // Low frequencies: warp negligible, one octave is Q ~ 1.414
        let q = peaking_q(2.0 * std::f64::consts::PI * 31.0 / 48000.0, 1.0);
        assert!((q - std::f64::consts::SQRT_2).abs() < 1e-3);
    }

    #[test]
    fn test_flat_peaking_chain_is_unity() {
        let mut chain = IirChain::new(IirType::Peaking, 48000);
        chain.update(&FLAT_CURVE);
        assert_eq!(chain.stages().len(), EQUIVALENT_ZONE_COUNT);
        for freq in [20.0, 440.0, 9000.0, 20000.0] {
            assert!((chain.magnitude_at(freq, 48000.0) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_peaking_neighbour_correction() {
        let mut curve = FLAT_CURVE;
        curve[EQUIVALENT_ZONES.range(5)].fill(db_to_y(10.0));
        curve[EQUIVALENT_ZONES.range(6)].fill(db_to_y(-4.0));
        let mut chain = IirChain::new(IirType::Peaking, 44100);
        chain.update(&curve);

        let gain_of = |zone: usize| {
            chain
                .stages()
                .iter()
                .find(|s| s.zone == zone)
                .map(|s| s.gain_db)
                .unwrap()
        };
        assert!((gain_of(5) - (10.0 + 0.15 * 4.0)).abs() < 1e-9);
        assert!((gain_of(6) - (-4.0 - 0.15 * 10.0)).abs() < 1e-9);
        assert!((gain_of(4) + 1.5).abs() < 1e-9);
        assert!(gain_of(0).abs() < 1e-12);
    }

    #[test]
    fn test_peaking_stages_ordered_high_to_low() {
        let mut chain = IirChain::new(IirType::Peaking, 44100);
        chain.update(&FLAT_CURVE);
        let stages = chain.stages();
        assert!(stages.windows(2).all(|w| w[0].frequency > w[1].frequency));
    }

    #[test]
    fn test_peaking_prunes_bands_past_nyquist() {
        let mut chain = IirChain::new(IirType::Peaking, 22050);
        chain.update(&FLAT_CURVE);
        assert_eq!(chain.stages().len(), EQUIVALENT_ZONE_COUNT - 1);
        assert!(chain.stages().iter().all(|s| s.frequency < 11025.0));
    }

    #[test]
    fn test_flat_shelf_chain_is_empty() {
        let mut chain = IirChain::new(IirType::Shelf, 44100);
        chain.update(&FLAT_CURVE);
        assert!(chain.stages().is_empty());
    }

    #[test]
    fn test_shelf_gain_conservation() {
        let targets = [12.0, 12.0, 3.0, -6.0, 0.0, 9.0, 4.0];
        let mut chain = IirChain::new(IirType::Shelf, 48000);
        chain.update(&shelf_curve(&targets));

        for zone in 0..SHELF_ZONE_COUNT {
            let total: f64 = chain
                .stages()
                .iter()
                .filter(|s| s.zone >= zone)
                .map(|s| s.gain_db)
                .sum();
            assert!((total - targets[zone]).abs() < 1e-9, "zone {zone}: {total}");
        }
    }

    #[test]
    fn test_shelf_large_step_carries_leftover() {
        let targets = [-40.0, -40.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut chain = IirChain::new(IirType::Shelf, 48000);
        chain.update(&shelf_curve(&targets));

        let gains: Vec<(usize, f64)> = chain.stages().iter().map(|s| (s.zone, s.gain_db)).collect();
        assert_eq!(gains, vec![(1, -22.0), (0, -18.0)]);
        assert!(chain.stages().iter().all(|s| s.coeffs.is_finite()));
    }

    #[test]
    fn test_shelf_response_near_targets() {
        let targets = [6.0, 4.0, 2.0, 0.0, -2.0, -4.0, -6.0];
        let mut chain = IirChain::new(IirType::Shelf, 44100);
        chain.update(&shelf_curve(&targets));

        for zone in 0..SHELF_ZONE_COUNT {
            let freq = SHELF_ZONES.center(zone) as f64;
            let realized = db(chain.magnitude_at(freq, 44100.0));
            assert!((realized - targets[zone]).abs() < 1.0, "zone {zone}: {realized}");
        }
    }

    #[test]
    fn test_shelf_corners_stay_below_nyquist() {
        let targets = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 6.0];
        let mut chain = IirChain::new(IirType::Shelf, 8000);
        chain.update(&shelf_curve(&targets));
        // +6 dB on top, then -6 dB back down for everything below it
        assert_eq!(chain.stages().len(), 2);
        for stage in chain.stages() {
            assert!((stage.frequency - 3600.0).abs() < 1e-9);
            assert!(stage.coeffs.is_finite());
        }
    }

    #[test]
    fn test_shelf_top_zone_lifts_whole_treble() {
        let mut chain = IirChain::new(IirType::Shelf, 44100);
        chain.update(&shelf_curve(&[12.0; SHELF_ZONE_COUNT]));
        assert_eq!(chain.stages().len(), 1);
        assert!((chain.stages()[0].frequency - 44100.0 * MAX_CORNER_RATIO).abs() < 1e-9);

        for freq in [62.0, 1000.0, 8000.0, 11498.0, 14000.0, 16000.0] {
            let realized = db(chain.magnitude_at(freq, 44100.0));
            assert!((realized - 12.0).abs() < 1.0, "{freq} Hz: {realized}");
        }
    }

    #[test]
    fn test_shelf_top_zone_alone() {
        let targets = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 6.0];
        let mut chain = IirChain::new(IirType::Shelf, 48000);
        chain.update(&shelf_curve(&targets));
        assert!(db(chain.magnitude_at(1000.0, 48000.0)).abs() < 0.5);
        for freq in [8000.0, 12000.0, 16000.0] {
            let realized = db(chain.magnitude_at(freq, 48000.0));
            assert!((realized - 6.0).abs() < 0.75, "{freq} Hz: {realized}");
        }
    }

    #[test]
    fn test_stage_is_nan_past_nyquist() {
        let mut chain = IirChain::new(IirType::Peaking, 44100);
        chain.update(&FLAT_CURVE);
        assert!(chain.stages()[0].magnitude_at(22100.0, 44100.0).is_nan());
    }
}
