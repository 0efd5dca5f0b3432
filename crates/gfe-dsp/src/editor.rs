//! Graphical filter editor engine
//!
//! Ties the curve store to the synthesizers: edits land in the curve store,
//! `update_filter` turns a channel's curve into an FIR kernel or a biquad
//! cascade, and `update_actual_channel_curve` measures what was realized.

use gfe_core::{
    AnalysisWindow, Channel, EngineConfig, GfeResult, HostCapabilities, IirType, VISIBLE_BIN_COUNT,
};

use crate::axis::VisibleAxis;
use crate::codec::{decode_curve, encode_curve};
use crate::curve::{Curve, CurveStore};
use crate::fir::FirSynthesizer;
use crate::iir::{IirChain, IirStage};
use crate::response::ResponseEstimator;

/// Curve editor plus filter synthesis for a stereo pair
#[derive(Debug, Clone)]
pub struct GraphicalFilterEditor {
    config: EngineConfig,
    host: HostCapabilities,
    axis: VisibleAxis,
    curves: CurveStore,
    fir: FirSynthesizer,
    estimator: ResponseEstimator,
    chains: [IirChain; 2],
}

impl GraphicalFilterEditor {
    /// Convolution-only editor with flat curves
    pub fn new(filter_length: usize, sample_rate: u32) -> GfeResult<Self> {
        Self::with_config(
            EngineConfig::new(filter_length, sample_rate),
            HostCapabilities::default(),
        )
    }

    pub fn with_config(mut config: EngineConfig, host: HostCapabilities) -> GfeResult<Self> {
        config.validate()?;
        if config.iir_type.is_iir() && !host.iir_filters {
            log::warn!(
                "host has no IIR filters, {:?} mode unavailable; using convolution",
                config.iir_type
            );
            config.iir_type = IirType::None;
        }

        let mut editor = Self {
            host,
            axis: VisibleAxis::new(),
            curves: CurveStore::new(),
            fir: FirSynthesizer::new(config.filter_length, config.sample_rate)?,
            estimator: ResponseEstimator::new(config.window),
            chains: [
                IirChain::new(config.iir_type, config.sample_rate),
                IirChain::new(config.iir_type, config.sample_rate),
            ],
            config,
        };
        log::debug!(
            "editor created: {} taps at {} Hz, {:?}",
            config.filter_length,
            config.sample_rate,
            config.iir_type
        );

        editor.update_filter(Channel::Left, false, true);
        editor.update_actual_channel_curve(Channel::Left);
        Ok(editor)
    }

    // ============ Accessors ============

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn host(&self) -> HostCapabilities {
        self.host
    }

    #[inline]
    pub fn filter_length(&self) -> usize {
        self.config.filter_length
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.config.normalized
    }

    #[inline]
    pub fn iir_type(&self) -> IirType {
        self.config.iir_type
    }

    #[inline]
    pub fn axis(&self) -> &VisibleAxis {
        &self.axis
    }

    #[inline]
    pub fn visible_frequencies(&self) -> &[u32; VISIBLE_BIN_COUNT] {
        self.axis.frequencies()
    }

    #[inline]
    pub fn channel_curve(&self, channel: Channel) -> &Curve {
        self.curves.channel(channel)
    }

    /// Raw curve access for hosts that draw directly into it
    #[inline]
    pub fn channel_curve_mut(&mut self, channel: Channel) -> &mut Curve {
        self.curves.channel_mut(channel)
    }

    #[inline]
    pub fn actual_channel_curve(&self) -> &Curve {
        self.curves.actual()
    }

    /// FIR kernel for the host convolver (stale while an IIR mode is active)
    #[inline]
    pub fn filter_kernel(&self, channel: Channel) -> &[f32] {
        self.fir.kernel(channel)
    }

    #[inline]
    pub fn iir_chain(&self, channel: Channel) -> &IirChain {
        &self.chains[channel.index()]
    }

    #[inline]
    pub fn iir_stages(&self, channel: Channel) -> &[IirStage] {
        self.chains[channel.index()].stages()
    }

    // ============ Visible axis ============

    pub fn visible_bin_to_zone_index(&self, bin: usize) -> usize {
        self.axis.visible_bin_to_zone_index(bin)
    }

    pub fn visible_bin_to_frequency(&self, bin: usize) -> u32 {
        self.axis.visible_bin_to_frequency(bin)
    }

    pub fn visible_bin_to_frequency_group(&self, bin: usize) -> (u32, u32) {
        self.axis.visible_bin_to_frequency_group(bin)
    }

    // ============ Curve edits ============

    pub fn change_zone_y(&mut self, channel: Channel, x: i32, y: i32) {
        self.curves.change_zone_y(channel, x, y);
    }

    pub fn change_shelf_zone_y(&mut self, channel: Channel, x: i32, y: i32) {
        self.curves.change_shelf_zone_y(channel, x, y);
    }

    pub fn change_point_y(&mut self, channel: Channel, x: i32, y: i32) {
        self.curves.change_point_y(channel, x, y);
    }

    pub fn change_line_y(&mut self, channel: Channel, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.curves.change_line_y(channel, x0, y0, x1, y1);
    }

    pub fn start_smooth_edition(&mut self, channel: Channel) {
        self.curves.start_smooth_edition(channel);
    }

    pub fn change_smooth_y(&mut self, channel: Channel, x: i32, y: i32, width: i32) {
        self.curves.change_smooth_y(channel, x, y, width);
    }

    pub fn reset_channel_curve(&mut self, channel: Channel) {
        self.curves.reset(channel);
    }

    // ============ Persistence ============

    pub fn encode_channel_curve(&self, channel: Channel) -> String {
        encode_curve(self.curves.channel(channel))
    }

    /// Replace the curve of `channel` with a decoded one; `false` if `text` is not a curve
    pub fn load_channel_curve(&mut self, channel: Channel, text: &str) -> bool {
        match decode_curve(text) {
            Some(curve) => {
                *self.curves.channel_mut(channel) = curve;
                true
            }
            None => false,
        }
    }

    // ============ Synthesis ============

    fn synthesize(&mut self, channel: Channel) {
        let curve = self.curves.channel(channel);
        if self.config.iir_type.is_iir() {
            self.chains[channel.index()].update(curve);
        } else {
            self.fir.synthesize(
                channel,
                curve,
                &self.axis,
                self.config.normalized,
                &mut self.estimator,
            );
        }
    }

    /// Rebuild the filter of `channel` from its curve
    ///
    /// With `lock_channels` the other channel receives a copy of the result;
    /// otherwise `update_both` rebuilds the other channel from its own curve.
    pub fn update_filter(&mut self, channel: Channel, lock_channels: bool, update_both: bool) {
        self.synthesize(channel);
        let other = channel.other();
        if lock_channels {
            self.copy_filter(channel, other);
        } else if update_both {
            self.synthesize(other);
        }
    }

    /// Copy the active filter of `source` onto `destination`
    pub fn copy_filter(&mut self, source: Channel, destination: Channel) {
        if source == destination {
            return;
        }
        if self.config.iir_type.is_iir() {
            self.chains[destination.index()] = self.chains[source.index()].clone();
        } else {
            self.fir.copy_kernel(source, destination);
        }
    }

    /// Measure the filter of `channel` into the actual curve
    pub fn update_actual_channel_curve(&mut self, channel: Channel) {
        let sample_rate = self.config.sample_rate;
        if self.config.iir_type.is_iir() {
            ResponseEstimator::chain_curve(
                self.chains[channel.index()].stages(),
                &self.axis,
                sample_rate,
                self.curves.actual_mut(),
            );
        } else {
            self.fir.measure(channel, &mut self.estimator);
            self.estimator
                .kernel_curve(&self.axis, sample_rate, self.curves.actual_mut());
        }
    }

    // ============ Mode changes ============

    /// Returns `false` when `filter_length` is already in use
    pub fn change_filter_length(
        &mut self,
        filter_length: usize,
        channel: Channel,
        lock_channels: bool,
    ) -> GfeResult<bool> {
        if !self.fir.change_filter_length(filter_length)? {
            return Ok(false);
        }
        log::debug!("filter length changed to {filter_length}");
        self.config.filter_length = filter_length;
        self.update_filter(channel, lock_channels, true);
        Ok(true)
    }

    /// Returns `false` when `sample_rate` is already in use
    pub fn change_sample_rate(
        &mut self,
        sample_rate: u32,
        channel: Channel,
        lock_channels: bool,
    ) -> GfeResult<bool> {
        if !self.fir.change_sample_rate(sample_rate)? {
            return Ok(false);
        }
        log::debug!("sample rate changed to {sample_rate} Hz");
        self.config.sample_rate = sample_rate;
        self.chains = [
            IirChain::new(self.config.iir_type, sample_rate),
            IirChain::new(self.config.iir_type, sample_rate),
        ];
        self.update_filter(channel, lock_channels, true);
        Ok(true)
    }

    pub fn change_is_normalized(
        &mut self,
        normalized: bool,
        channel: Channel,
        lock_channels: bool,
    ) -> bool {
        if normalized == self.config.normalized {
            return false;
        }
        log::debug!("normalization {}", if normalized { "on" } else { "off" });
        self.config.normalized = normalized;
        self.update_filter(channel, lock_channels, true);
        true
    }

    /// Switch between convolution and the IIR approximations
    ///
    /// Refused (returns `false`) for IIR modes when the host lacks IIR filters.
    pub fn change_iir_type(&mut self, iir_type: IirType, channel: Channel, lock_channels: bool) -> bool {
        if iir_type == self.config.iir_type {
            return false;
        }
        if iir_type.is_iir() && !self.host.iir_filters {
            log::warn!("host has no IIR filters, ignoring switch to {iir_type:?}");
            return false;
        }
        log::debug!("IIR mode {:?} -> {iir_type:?}", self.config.iir_type);
        self.config.iir_type = iir_type;
        let sample_rate = self.config.sample_rate;
        self.chains = [
            IirChain::new(iir_type, sample_rate),
            IirChain::new(iir_type, sample_rate),
        ];
        self.update_filter(channel, lock_channels, true);
        true
    }

    /// Window used to measure FIR kernels; takes effect on the next measurement
    pub fn change_analysis_window(&mut self, window: AnalysisWindow) -> bool {
        if window == self.config.window {
            return false;
        }
        self.config.window = window;
        self.estimator.set_window(window);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfe_core::{GfeError, ZERO_CHANNEL_VALUE_Y};

    fn iir_editor() -> GraphicalFilterEditor {
        GraphicalFilterEditor::with_config(EngineConfig::default(), HostCapabilities::full()).unwrap()
    }

    #[test]
    fn test_new_editor_is_flat() {
        let editor = GraphicalFilterEditor::new(2048, 44100).unwrap();
        assert!(editor
            .actual_channel_curve()
            .iter()
            .all(|&y| y == ZERO_CHANNEL_VALUE_Y));
        assert_eq!(editor.filter_kernel(Channel::Left), editor.filter_kernel(Channel::Right));
    }

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            GraphicalFilterEditor::new(100, 44100).unwrap_err(),
            GfeError::InvalidFilterLength(100)
        );
        assert_eq!(
            GraphicalFilterEditor::new(1024, 0).unwrap_err(),
            GfeError::InvalidSampleRate(0)
        );
    }

    #[test]
    fn test_iir_mode_downgraded_without_host_support() {
        let config = EngineConfig {
            iir_type: IirType::Shelf,
            ..EngineConfig::default()
        };
        let editor = GraphicalFilterEditor::with_config(config, HostCapabilities::default()).unwrap();
        assert_eq!(editor.iir_type(), IirType::None);
    }

    #[test]
    fn test_change_iir_type_refused_without_host_support() {
        let mut editor = GraphicalFilterEditor::new(1024, 48000).unwrap();
        assert!(!editor.change_iir_type(IirType::Peaking, Channel::Left, false));
        assert_eq!(editor.iir_type(), IirType::None);
        assert!(editor.iir_stages(Channel::Left).is_empty());
    }

    #[test]
    fn test_change_iir_type_builds_chains() {
        let mut editor = iir_editor();
        assert!(editor.change_iir_type(IirType::Peaking, Channel::Left, false));
        assert!(!editor.change_iir_type(IirType::Peaking, Channel::Left, false));
        assert_eq!(editor.iir_stages(Channel::Left).len(), 10);
        assert_eq!(editor.iir_stages(Channel::Right).len(), 10);
    }

    #[test]
    fn test_lock_copies_iir_chain() {
        let mut editor = iir_editor();
        editor.change_iir_type(IirType::Shelf, Channel::Left, false);
        editor.change_shelf_zone_y(Channel::Left, 0, 120);
        editor.update_filter(Channel::Left, true, false);
        assert_eq!(editor.iir_stages(Channel::Left), editor.iir_stages(Channel::Right));
        assert!(!editor.iir_stages(Channel::Right).is_empty());
    }

    #[test]
    fn test_update_without_both_leaves_other_channel() {
        let mut editor = GraphicalFilterEditor::new(512, 44100).unwrap();
        let before = editor.filter_kernel(Channel::Right).to_vec();
        editor.change_zone_y(Channel::Right, 200, 60);
        editor.update_filter(Channel::Left, false, false);
        assert_eq!(editor.filter_kernel(Channel::Right), before.as_slice());
        editor.update_filter(Channel::Left, false, true);
        assert_ne!(editor.filter_kernel(Channel::Right), before.as_slice());
    }

    #[test]
    fn test_mode_changes_report_changes() {
        let mut editor = GraphicalFilterEditor::new(512, 44100).unwrap();
        assert_eq!(editor.change_filter_length(512, Channel::Left, false), Ok(false));
        assert_eq!(editor.change_filter_length(1024, Channel::Left, false), Ok(true));
        assert_eq!(editor.filter_kernel(Channel::Right).len(), 1024);
        assert!(editor.change_filter_length(1000, Channel::Left, false).is_err());

        assert_eq!(editor.change_sample_rate(44100, Channel::Left, false), Ok(false));
        assert_eq!(editor.change_sample_rate(48000, Channel::Left, false), Ok(true));
        assert_eq!(editor.sample_rate(), 48000);

        assert!(editor.change_is_normalized(true, Channel::Left, false));
        assert!(!editor.change_is_normalized(true, Channel::Left, false));

        assert!(editor.change_analysis_window(AnalysisWindow::Hann));
        assert!(!editor.change_analysis_window(AnalysisWindow::Hann));
    }

    #[test]
    fn test_load_channel_curve() {
        let mut editor = GraphicalFilterEditor::new(512, 44100).unwrap();
        editor.change_zone_y(Channel::Left, 50, 100);
        let text = editor.encode_channel_curve(Channel::Left);
        assert!(editor.load_channel_curve(Channel::Right, &text));
        assert_eq!(editor.channel_curve(Channel::Left), editor.channel_curve(Channel::Right));
        assert!(!editor.load_channel_curve(Channel::Right, "nope"));
    }
}
