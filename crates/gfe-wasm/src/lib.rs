// ============================================================================
// GRAPHICAL FILTER EDITOR - WASM Port
// WebAssembly bindings for the filter design engine
// The browser UI draws curves; the host audio graph runs the results
// ============================================================================

use gfe_core::{Channel, EngineConfig, GfeError, GfeResult, HostCapabilities, IirType, VISIBLE_BIN_COUNT};
use gfe_dsp::curve::{Curve, clamp_y};
use gfe_dsp::iir::{IirStage, StageKind};
use gfe_dsp::{FLAT_CURVE, GraphicalFilterEditor};
use js_sys::{Float32Array, Int32Array};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ============================================================================
// INITIALIZATION
// ============================================================================

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("[GFE WASM] Initialized");
}

// ============================================================================
// TYPES
// ============================================================================

/// Filter the host should run
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    Convolution = 0,
    Peaking = 1,
    Shelf = 2,
}

impl From<FilterMode> for IirType {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Convolution => IirType::None,
            FilterMode::Peaking => IirType::Peaking,
            FilterMode::Shelf => IirType::Shelf,
        }
    }
}

impl From<IirType> for FilterMode {
    fn from(iir_type: IirType) -> Self {
        match iir_type {
            IirType::None => FilterMode::Convolution,
            IirType::Peaking => FilterMode::Peaking,
            IirType::Shelf => FilterMode::Shelf,
        }
    }
}

/// One biquad as handed to JavaScript
#[derive(Clone, Debug, Serialize)]
pub struct StageDescriptor {
    pub kind: &'static str,
    pub frequency: f64,
    pub q: f64,
    pub gain_db: f64,
    /// `[b0, b1, b2, a0, a1, a2]`
    pub coefficients: [f64; 6],
}

impl From<&IirStage> for StageDescriptor {
    fn from(stage: &IirStage) -> Self {
        let c = &stage.coeffs;
        Self {
            kind: match stage.kind {
                StageKind::Peaking => "peaking",
                StageKind::LowShelf => "lowshelf",
            },
            frequency: stage.frequency,
            q: stage.q,
            gain_db: stage.gain_db,
            coefficients: [c.b0, c.b1, c.b2, c.a0, c.a1, c.a2],
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn js_error(err: GfeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn channel(index: u32) -> Result<Channel, JsValue> {
    Channel::from_index(index as usize).map_err(js_error)
}

fn parse_config(json: &str) -> GfeResult<EngineConfig> {
    let config: EngineConfig = serde_json::from_str(json)
        .map_err(|e| GfeError::InvalidParam(format!("JSON parse error: {}", e)))?;
    config.validate()?;
    Ok(config)
}

fn curve_from_values(values: &[i32]) -> GfeResult<Curve> {
    if values.len() != VISIBLE_BIN_COUNT {
        return Err(GfeError::InvalidParam(format!(
            "curve needs {} values, got {}",
            VISIBLE_BIN_COUNT,
            values.len()
        )));
    }
    let mut curve = FLAT_CURVE;
    for (dst, &y) in curve.iter_mut().zip(values) {
        *dst = clamp_y(y);
    }
    Ok(curve)
}

/// Flattened parameters: three per peaking stage, seven per shelf stage
fn stage_parameters(stages: &[IirStage]) -> Vec<f64> {
    stages
        .iter()
        .flat_map(|stage| match stage.kind {
            StageKind::Peaking => stage.peaking_parameters().to_vec(),
            StageKind::LowShelf => stage.shelf_parameters().to_vec(),
        })
        .collect()
}

// ============================================================================
// EDITOR (JS-visible)
// ============================================================================

#[wasm_bindgen]
pub struct WasmGraphicalFilterEditor {
    inner: GraphicalFilterEditor,
}

#[wasm_bindgen]
impl WasmGraphicalFilterEditor {
    /// `iir_filters` tells the engine whether the host graph has IIR nodes
    #[wasm_bindgen(constructor)]
    pub fn new(filter_length: usize, sample_rate: u32, iir_filters: bool) -> Result<WasmGraphicalFilterEditor, JsValue> {
        let host = HostCapabilities { iir_filters };
        let inner = GraphicalFilterEditor::with_config(EngineConfig::new(filter_length, sample_rate), host)
            .map_err(js_error)?;
        Ok(Self { inner })
    }

    /// Build from a JSON `EngineConfig`; missing fields take their defaults
    pub fn from_config_json(json: &str, iir_filters: bool) -> Result<WasmGraphicalFilterEditor, JsValue> {
        let config = parse_config(json).map_err(js_error)?;
        let inner = GraphicalFilterEditor::with_config(config, HostCapabilities { iir_filters })
            .map_err(js_error)?;
        Ok(Self { inner })
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.config()).map_err(JsValue::from)
    }

    // ============ Getters ============

    #[wasm_bindgen(getter)]
    pub fn filter_length(&self) -> usize {
        self.inner.filter_length()
    }

    #[wasm_bindgen(getter)]
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    #[wasm_bindgen(getter)]
    pub fn is_normalized(&self) -> bool {
        self.inner.is_normalized()
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> FilterMode {
        self.inner.iir_type().into()
    }

    pub fn visible_frequencies(&self) -> Vec<u32> {
        self.inner.visible_frequencies().to_vec()
    }

    pub fn visible_bin_to_zone_index(&self, bin: usize) -> usize {
        self.inner.visible_bin_to_zone_index(bin)
    }

    pub fn visible_bin_to_frequency(&self, bin: usize) -> u32 {
        self.inner.visible_bin_to_frequency(bin)
    }

    /// `[bin frequency, equivalent-zone center]`, both in Hz
    pub fn visible_bin_to_frequency_group(&self, bin: usize) -> Vec<u32> {
        let (low, high) = self.inner.visible_bin_to_frequency_group(bin);
        vec![low, high]
    }

    // ============ Curves ============

    pub fn channel_curve(&self, channel_index: u32) -> Result<Int32Array, JsValue> {
        let curve = self.inner.channel_curve(channel(channel_index)?);
        Ok(Int32Array::from(&curve[..]))
    }

    pub fn set_channel_curve(&mut self, channel_index: u32, values: &[i32]) -> Result<(), JsValue> {
        let curve = curve_from_values(values).map_err(js_error)?;
        *self.inner.channel_curve_mut(channel(channel_index)?) = curve;
        Ok(())
    }

    pub fn actual_channel_curve(&self) -> Int32Array {
        Int32Array::from(&self.inner.actual_channel_curve()[..])
    }

    pub fn change_zone_y(&mut self, channel_index: u32, x: i32, y: i32) -> Result<(), JsValue> {
        self.inner.change_zone_y(channel(channel_index)?, x, y);
        Ok(())
    }

    pub fn change_shelf_zone_y(&mut self, channel_index: u32, x: i32, y: i32) -> Result<(), JsValue> {
        self.inner.change_shelf_zone_y(channel(channel_index)?, x, y);
        Ok(())
    }

    pub fn change_point_y(&mut self, channel_index: u32, x: i32, y: i32) -> Result<(), JsValue> {
        self.inner.change_point_y(channel(channel_index)?, x, y);
        Ok(())
    }

    pub fn change_line_y(&mut self, channel_index: u32, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<(), JsValue> {
        self.inner.change_line_y(channel(channel_index)?, x0, y0, x1, y1);
        Ok(())
    }

    pub fn start_smooth_edition(&mut self, channel_index: u32) -> Result<(), JsValue> {
        self.inner.start_smooth_edition(channel(channel_index)?);
        Ok(())
    }

    pub fn change_smooth_y(&mut self, channel_index: u32, x: i32, y: i32, width: i32) -> Result<(), JsValue> {
        self.inner.change_smooth_y(channel(channel_index)?, x, y, width);
        Ok(())
    }

    pub fn reset_channel_curve(&mut self, channel_index: u32) -> Result<(), JsValue> {
        self.inner.reset_channel_curve(channel(channel_index)?);
        Ok(())
    }

    pub fn encode_channel_curve(&self, channel_index: u32) -> Result<String, JsValue> {
        Ok(self.inner.encode_channel_curve(channel(channel_index)?))
    }

    pub fn load_channel_curve(&mut self, channel_index: u32, text: &str) -> Result<bool, JsValue> {
        Ok(self.inner.load_channel_curve(channel(channel_index)?, text))
    }

    // ============ Synthesis ============

    pub fn update_filter(&mut self, channel_index: u32, lock_channels: bool, update_both: bool) -> Result<(), JsValue> {
        self.inner
            .update_filter(channel(channel_index)?, lock_channels, update_both);
        Ok(())
    }

    pub fn update_actual_channel_curve(&mut self, channel_index: u32) -> Result<(), JsValue> {
        self.inner.update_actual_channel_curve(channel(channel_index)?);
        Ok(())
    }

    /// Kernel for a `ConvolverNode` buffer
    pub fn filter_kernel(&self, channel_index: u32) -> Result<Float32Array, JsValue> {
        Ok(Float32Array::from(self.inner.filter_kernel(channel(channel_index)?)))
    }

    /// Flattened stage parameters, see `IirStage::peaking_parameters` and
    /// `IirStage::shelf_parameters`
    pub fn iir_parameters(&self, channel_index: u32) -> Result<Vec<f64>, JsValue> {
        Ok(stage_parameters(self.inner.iir_stages(channel(channel_index)?)))
    }

    pub fn iir_stages(&self, channel_index: u32) -> Result<JsValue, JsValue> {
        let stages: Vec<StageDescriptor> = self
            .inner
            .iir_stages(channel(channel_index)?)
            .iter()
            .map(StageDescriptor::from)
            .collect();
        serde_wasm_bindgen::to_value(&stages).map_err(JsValue::from)
    }

    // ============ Mode changes ============

    pub fn change_filter_length(&mut self, filter_length: usize, channel_index: u32, lock_channels: bool) -> Result<bool, JsValue> {
        self.inner
            .change_filter_length(filter_length, channel(channel_index)?, lock_channels)
            .map_err(js_error)
    }

    pub fn change_sample_rate(&mut self, sample_rate: u32, channel_index: u32, lock_channels: bool) -> Result<bool, JsValue> {
        self.inner
            .change_sample_rate(sample_rate, channel(channel_index)?, lock_channels)
            .map_err(js_error)
    }

    pub fn change_is_normalized(&mut self, normalized: bool, channel_index: u32, lock_channels: bool) -> Result<bool, JsValue> {
        Ok(self
            .inner
            .change_is_normalized(normalized, channel(channel_index)?, lock_channels))
    }

    pub fn change_mode(&mut self, mode: FilterMode, channel_index: u32, lock_channels: bool) -> Result<bool, JsValue> {
        Ok(self
            .inner
            .change_iir_type(mode.into(), channel(channel_index)?, lock_channels))
    }
}

// ============================================================================
// TESTS
// ============================================================================
